//! Local layout of downloaded episodes: `root/<show>/Season_<n>/<file>`.

use std::path::{Path, PathBuf};

use super::safe_component;

/// Season directory label used when the catalog has no index number.
pub const UNKNOWN_SEASON: &str = "Unknown_Season";

/// Extracts the final segment of a server-side media path.
///
/// Servers may report POSIX or Windows paths, so both `/` and `\` separate segments.
/// Returns `None` for empty paths or paths ending in a separator.
pub fn filename_from_media_path(path: &str) -> Option<String> {
    let segment = path.rsplit(|c| c == '/' || c == '\\').next()?.trim();
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// `Season_<index>` or `Season_Unknown_Season`.
pub fn season_dir_name(index: Option<i64>) -> String {
    match index {
        Some(n) => format!("Season_{}", n),
        None => format!("Season_{}", UNKNOWN_SEASON),
    }
}

/// Destination of one episode file under `root`.
pub fn episode_destination(
    root: &Path,
    show_name: &str,
    season_index: Option<i64>,
    filename: &str,
) -> PathBuf {
    root.join(safe_component(show_name, super::UNKNOWN_SHOW))
        .join(season_dir_name(season_index))
        .join(safe_component(filename, super::DEFAULT_FILENAME))
}
