//! Filesystem-safe path components.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Sanitizes one path component (show, season or file name) for local storage.
///
/// - Replaces NUL, `/`, `\` and control characters with `_` (runs collapse to one)
/// - Keeps ordinary spaces, so "The Show" stays "The Show"
/// - Trims leading/trailing spaces and dots
/// - Limits length to 255 bytes on a char boundary
pub fn sanitize_path_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_replaced = false;

    for c in name.chars() {
        if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            if !prev_replaced {
                out.push('_');
            }
            prev_replaced = true;
        } else {
            out.push(c);
            prev_replaced = false;
        }
    }

    let trimmed = out.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].to_string()
    } else {
        trimmed.to_string()
    }
}
