//! Catalog nodes and the wire shapes they are decoded from.

use serde::{Deserialize, Serialize};

/// Account under which catalog listings are requested.
pub type PrincipalId = String;

/// Kind of a catalog item, from its `Type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Series,
    Season,
    Episode,
    /// Any other item type (folders, extras, movies); skipped by enumeration.
    Other(String),
}

impl NodeKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Series" => NodeKind::Series,
            "Season" => NodeKind::Season,
            "Episode" => NodeKind::Episode,
            other => NodeKind::Other(other.to_string()),
        }
    }
}

/// One node of the show → season → episode hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogNode {
    pub id: String,
    pub kind: NodeKind,
    /// Display name; empty when the server omitted it.
    pub name: String,
    pub series_name: Option<String>,
    pub index_number: Option<i64>,
}

impl CatalogNode {
    pub fn is_season(&self) -> bool {
        self.kind == NodeKind::Season
    }

    pub fn is_episode(&self) -> bool {
        self.kind == NodeKind::Episode
    }
}

/// File to download for one episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFileRef {
    pub remote_id: String,
    pub download_url: String,
    /// Sanitized local filename.
    pub suggested_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UserDto {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemsDto {
    #[serde(default)]
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemDto {
    pub id: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub index_number: Option<i64>,
}

impl From<ItemDto> for CatalogNode {
    fn from(dto: ItemDto) -> Self {
        Self {
            id: dto.id,
            kind: NodeKind::from_type_name(&dto.kind),
            name: dto.name.unwrap_or_default(),
            series_name: dto.series_name.filter(|s| !s.is_empty()),
            index_number: dto.index_number,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemDetailDto {
    #[serde(default)]
    pub media_sources: Vec<MediaSourceDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MediaSourceDto {
    #[serde(default)]
    pub path: Option<String>,
}
