//! Client for the remote media catalog (Jellyfin/Emby REST API).
//!
//! Fetches the principal list, direct children of a container and item detail.
//! Every call carries the API token, is attempted once, and reports failure as
//! a typed `FetchError`.

mod http;
mod types;

pub use http::TOKEN_HEADER;
pub use types::{CatalogNode, MediaFileRef, NodeKind, PrincipalId};

use std::time::Duration;
use url::Url;

use crate::config::JfdConfig;
use crate::error::FetchError;
use crate::url_model::{filename_from_media_path, sanitize_path_component};
use types::{ItemDetailDto, ItemsDto, UserDto};

#[derive(Debug, Clone)]
pub struct CatalogClient {
    base: Url,
    token: String,
    connect_timeout: Duration,
}

impl CatalogClient {
    /// `server_url` is the API root, with or without a path prefix such as `/emby`.
    pub fn new(
        server_url: &str,
        token: &str,
        connect_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let base = Url::parse(server_url.trim())
            .map_err(|e| FetchError::MalformedInput(format!("server URL {}: {}", server_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(FetchError::MalformedInput(format!(
                "server URL {} cannot carry a path",
                server_url
            )));
        }
        Ok(Self {
            base,
            token: token.to_string(),
            connect_timeout,
        })
    }

    pub fn from_config(cfg: &JfdConfig) -> Result<Self, FetchError> {
        Self::new(
            &cfg.server_url,
            &cfg.api_token,
            cfg.transfer.connect_timeout(),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Id of the first user the token can see.
    pub fn resolve_first_principal(&self) -> Result<PrincipalId, FetchError> {
        let url = self.endpoint(&["Users"]);
        let users: Vec<UserDto> = http::get_json(url.as_str(), &self.token, self.connect_timeout)?;
        match users.into_iter().next() {
            Some(user) => {
                tracing::debug!(user_id = %user.id, "resolved catalog principal");
                Ok(user.id)
            }
            None => {
                tracing::error!("no users found on catalog server");
                Err(FetchError::NotFound("catalog server returned no users".into()))
            }
        }
    }

    /// Direct children of `parent_id` as seen by `principal`, in listing order.
    pub fn list_children(
        &self,
        parent_id: &str,
        principal: &str,
    ) -> Result<Vec<CatalogNode>, FetchError> {
        let mut url = self.endpoint(&["Users", principal, "Items"]);
        url.query_pairs_mut().append_pair("ParentId", parent_id);
        let listing: ItemsDto = http::get_json(url.as_str(), &self.token, self.connect_timeout)?;
        if listing.items.is_empty() {
            tracing::warn!(parent_id, "no items found under parent");
        }
        Ok(listing.items.into_iter().map(CatalogNode::from).collect())
    }

    /// Download location and original filename of an episode.
    ///
    /// Returns `NotFound` when the item has no media source or the first source has
    /// no usable path; the caller then synthesizes a filename.
    pub fn resolve_file_ref(&self, episode_id: &str) -> Result<MediaFileRef, FetchError> {
        let mut url = self.endpoint(&["Items", episode_id]);
        url.query_pairs_mut().append_pair("api_key", &self.token);
        let detail: ItemDetailDto = http::get_json(url.as_str(), &self.token, self.connect_timeout)?;

        let source = detail.media_sources.into_iter().next().ok_or_else(|| {
            FetchError::NotFound(format!("no media sources for item {}", episode_id))
        })?;
        let name = source
            .path
            .as_deref()
            .and_then(filename_from_media_path)
            .map(|n| sanitize_path_component(&n))
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                FetchError::NotFound(format!("no file path for item {}", episode_id))
            })?;

        Ok(MediaFileRef {
            remote_id: episode_id.to_string(),
            download_url: self.download_url(episode_id),
            suggested_name: name,
        })
    }

    /// Streamed download endpoint of an item.
    pub fn download_url(&self, item_id: &str) -> String {
        self.endpoint(&["Items", item_id, "Download"]).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(base, "tok", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoints_keep_path_prefix() {
        let c = client("https://jf.example.com/emby/");
        assert_eq!(
            c.endpoint(&["Users"]).as_str(),
            "https://jf.example.com/emby/Users"
        );
        assert_eq!(
            c.download_url("abc"),
            "https://jf.example.com/emby/Items/abc/Download"
        );
    }

    #[test]
    fn endpoints_without_prefix() {
        let c = client("http://127.0.0.1:8096");
        assert_eq!(
            c.endpoint(&["Users", "u1", "Items"]).as_str(),
            "http://127.0.0.1:8096/Users/u1/Items"
        );
    }

    #[test]
    fn ids_are_percent_encoded() {
        let c = client("http://host");
        assert_eq!(c.download_url("a b/c"), "http://host/Items/a%20b%2Fc/Download");
    }

    #[test]
    fn rejects_unusable_server_urls() {
        assert!(CatalogClient::new("nope", "t", Duration::from_secs(1)).is_err());
        assert!(CatalogClient::new("mailto:a@b.c", "t", Duration::from_secs(1)).is_err());
    }
}
