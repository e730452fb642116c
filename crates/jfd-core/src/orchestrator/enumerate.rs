//! Enumeration of a series: seasons and their episodes, counted before any transfer.

use crate::catalog::{CatalogClient, CatalogNode};
use crate::error::FetchError;
use crate::url_model::{UNKNOWN_SEASON, UNKNOWN_SHOW};

/// One season and the episodes listed under it.
#[derive(Debug, Clone)]
pub struct SeasonPlan {
    pub season: CatalogNode,
    pub episodes: Vec<CatalogNode>,
}

impl SeasonPlan {
    /// Human-readable label for status, e.g. `Season 2`.
    pub fn label(&self) -> String {
        match self.season.index_number {
            Some(n) => format!("Season {}", n),
            None => format!("Season {}", UNKNOWN_SEASON),
        }
    }
}

/// Everything the transfer pass walks, in listing order.
#[derive(Debug, Clone)]
pub struct SeriesPlan {
    pub show_name: String,
    pub seasons: Vec<SeasonPlan>,
}

impl SeriesPlan {
    pub fn total_episodes(&self) -> u64 {
        self.seasons.iter().map(|s| s.episodes.len() as u64).sum()
    }
}

/// Show name from the first child of the root: series name, then name, then a placeholder.
pub fn show_name_of(first: &CatalogNode) -> String {
    first
        .series_name
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| Some(first.name.as_str()).filter(|s| !s.trim().is_empty()))
        .unwrap_or(UNKNOWN_SHOW)
        .to_string()
}

/// Lists the episodes of every Season child once. The listings are kept so the
/// transfer pass does not fetch them again. Non-season children and non-episode
/// grandchildren are skipped. Returns `None` if `should_stop` fires between calls.
pub fn plan_seasons(
    catalog: &CatalogClient,
    principal: &str,
    show_name: String,
    children: Vec<CatalogNode>,
    should_stop: impl Fn() -> bool,
) -> Result<Option<SeriesPlan>, FetchError> {
    let mut seasons = Vec::new();
    for season in children.into_iter().filter(CatalogNode::is_season) {
        if should_stop() {
            return Ok(None);
        }
        let episodes: Vec<CatalogNode> = catalog
            .list_children(&season.id, principal)?
            .into_iter()
            .filter(CatalogNode::is_episode)
            .collect();
        tracing::debug!(season_id = %season.id, episodes = episodes.len(), "season enumerated");
        seasons.push(SeasonPlan { season, episodes });
    }
    Ok(Some(SeriesPlan { show_name, seasons }))
}
