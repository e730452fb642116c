//! Catalog link parsing and local filename derivation.
//!
//! Turns a web-client link into a container id and catalog names into a
//! sanitized `root/<show>/Season_<n>/<file>` layout.

mod fragment;
mod path;
mod sanitize;

pub use fragment::container_id_from_url;
pub use path::{episode_destination, filename_from_media_path, season_dir_name, UNKNOWN_SEASON};
pub use sanitize::sanitize_path_component;

/// Extension of synthesized episode filenames.
pub const SYNTHESIZED_EXTENSION: &str = "mp4";

/// Show name used when the catalog reports neither a series name nor a name.
pub const UNKNOWN_SHOW: &str = "Unknown_Show";

/// Filename used when nothing usable remains after sanitizing.
const DEFAULT_FILENAME: &str = "episode.mp4";

/// Sanitizes `raw`, falling back to `default` when nothing usable remains.
fn safe_component(raw: &str, default: &str) -> String {
    let sanitized = sanitize_path_component(raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        default.to_string()
    } else {
        sanitized
    }
}

/// Filename for an episode whose original media path is unknown: `<name>.mp4`.
pub fn synthesized_filename(episode_name: &str, episode_id: &str) -> String {
    let base = if episode_name.trim().is_empty() {
        episode_id
    } else {
        episode_name
    };
    safe_component(
        &format!("{}.{}", base, SYNTHESIZED_EXTENSION),
        DEFAULT_FILENAME,
    )
}
