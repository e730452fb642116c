//! Series download orchestration.
//!
//! One run walks `Idle → Resolving → Enumerating → Transferring` and ends in
//! `Completed`, `Aborted` or `Failed`. Episodes are transferred strictly one at a
//! time; the first failure ends the run. While transferring, a timing thread
//! keeps the session paused outside the configured window.

mod enumerate;
mod manager;

pub use enumerate::{plan_seasons, show_name_of, SeasonPlan, SeriesPlan};
pub use manager::{DownloadManager, StartReceipt};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{CatalogClient, CatalogNode, MediaFileRef};
use crate::config::{JfdConfig, PartialFilePolicy};
use crate::error::FetchError;
use crate::schedule::{is_within_window, Clock, TimeWindow, TimingEnforcer};
use crate::session::{RunPhase, SessionState};
use crate::transfer::{TransferEngine, TransferOutcome};
use crate::url_model::{container_id_from_url, episode_destination, synthesized_filename};

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub catalog_url: String,
    pub destination_root: PathBuf,
}

/// Non-failure end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    Completed,
    Aborted,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub window: TimeWindow,
    pub window_check_interval: Duration,
    pub partial_files: PartialFilePolicy,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &JfdConfig) -> Self {
        Self {
            window: cfg.window,
            window_check_interval: cfg.transfer.window_check_interval(),
            partial_files: cfg.transfer.partial_files,
        }
    }
}

pub struct Orchestrator {
    catalog: CatalogClient,
    engine: TransferEngine,
    settings: OrchestratorSettings,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        catalog: CatalogClient,
        engine: TransferEngine,
        settings: OrchestratorSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            engine,
            settings,
            clock,
        }
    }

    pub fn from_config(cfg: &JfdConfig, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        Ok(Self::new(
            CatalogClient::from_config(cfg)?,
            TransferEngine::from_config(cfg),
            OrchestratorSettings::from_config(cfg),
            clock,
        ))
    }

    /// True if the window currently permits transfers.
    pub fn window_open(&self) -> bool {
        is_within_window(&self.settings.window, &self.clock.now())
    }

    /// Drives one run to a terminal phase. Never panics on remote or local
    /// failures: they end in `Failed` with the error recorded on the session.
    pub fn run(&self, request: &RunRequest, session: &Arc<SessionState>) -> RunPhase {
        let phase = match self.drive(request, session) {
            Ok(RunEnd::Completed) => {
                tracing::info!(
                    completed = session.completed_items(),
                    total = session.total_items(),
                    "series download completed"
                );
                RunPhase::Completed
            }
            Ok(RunEnd::Aborted) => {
                tracing::info!(
                    completed = session.completed_items(),
                    total = session.total_items(),
                    "series download aborted"
                );
                RunPhase::Aborted
            }
            Err(e) => {
                tracing::error!(kind = ?e.kind(), "series download failed: {}", e);
                session.record_error(&e);
                RunPhase::Failed
            }
        };
        session.finish(phase);
        phase
    }

    fn drive(&self, request: &RunRequest, session: &Arc<SessionState>) -> Result<RunEnd, FetchError> {
        session.set_phase(RunPhase::Resolving);
        let container_id = container_id_from_url(&request.catalog_url)?;
        tracing::info!(container_id = %container_id, root = %request.destination_root.display(), "resolving series");
        if session.is_aborted() {
            return Ok(RunEnd::Aborted);
        }

        let principal = self.catalog.resolve_first_principal()?;
        let children = self.catalog.list_children(&container_id, &principal)?;
        let Some(first) = children.first() else {
            return Err(FetchError::NotFound(format!(
                "no seasons found under {}",
                container_id
            )));
        };
        let show_name = show_name_of(first);
        session.set_show(&show_name);
        tracing::info!(show = %show_name, "detected series");

        session.set_phase(RunPhase::Enumerating);
        let plan = match plan_seasons(&self.catalog, &principal, show_name, children, || {
            session.is_aborted()
        })? {
            Some(plan) => plan,
            None => return Ok(RunEnd::Aborted),
        };
        session.set_total_items(plan.total_episodes());
        tracing::info!(
            seasons = plan.seasons.len(),
            episodes = plan.total_episodes(),
            "series enumerated"
        );
        if session.is_aborted() {
            return Ok(RunEnd::Aborted);
        }

        session.set_active(true);
        session.set_paused(!self.window_open());
        if session.is_paused() {
            tracing::info!("outside allowed time window; transfers start paused");
        }
        session.set_phase(RunPhase::Transferring);
        let _timing = TimingEnforcer::spawn(
            Arc::clone(session),
            self.settings.window,
            Arc::clone(&self.clock),
            self.settings.window_check_interval,
        )
        .map_err(|e| FetchError::Internal(format!("start timing loop: {}", e)))?;

        self.transfer_plan(&plan, &request.destination_root, session)
    }

    fn transfer_plan(
        &self,
        plan: &SeriesPlan,
        root: &Path,
        session: &SessionState,
    ) -> Result<RunEnd, FetchError> {
        let total = plan.total_episodes();
        for season in &plan.seasons {
            session.set_season(&season.label());
            for episode in &season.episodes {
                if session.is_aborted() {
                    return Ok(RunEnd::Aborted);
                }
                match self.transfer_episode(plan, season, episode, root, session)? {
                    TransferOutcome::Completed { bytes } => {
                        let done = session.complete_item();
                        tracing::info!(episode = %episode.name, bytes, "episode {}/{} downloaded", done, total);
                    }
                    TransferOutcome::Aborted { .. } => return Ok(RunEnd::Aborted),
                }
            }
        }
        Ok(RunEnd::Completed)
    }

    /// Resolves the file of one episode, falling back to a synthesized name when
    /// the catalog has no media path.
    fn file_ref_for(&self, episode: &CatalogNode) -> Result<MediaFileRef, FetchError> {
        match self.catalog.resolve_file_ref(&episode.id) {
            Ok(file_ref) => Ok(file_ref),
            Err(FetchError::NotFound(reason)) => {
                tracing::warn!(episode_id = %episode.id, "{}; using synthesized filename", reason);
                Ok(MediaFileRef {
                    remote_id: episode.id.clone(),
                    download_url: self.catalog.download_url(&episode.id),
                    suggested_name: synthesized_filename(&episode.name, &episode.id),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn transfer_episode(
        &self,
        plan: &SeriesPlan,
        season: &SeasonPlan,
        episode: &CatalogNode,
        root: &Path,
        session: &SessionState,
    ) -> Result<TransferOutcome, FetchError> {
        let file_ref = self.file_ref_for(episode)?;
        let destination = episode_destination(
            root,
            &plan.show_name,
            season.season.index_number,
            &file_ref.suggested_name,
        );

        session.set_episode(&episode.name);
        session.begin_file();
        tracing::info!(episode = %episode.name, path = %destination.display(), "downloading episode");

        let outcome = self
            .engine
            .transfer(&file_ref.download_url, &destination, session)?;
        if matches!(outcome, TransferOutcome::Aborted { .. })
            && self.settings.partial_files == PartialFilePolicy::Delete
        {
            match std::fs::remove_file(&destination) {
                Ok(()) => tracing::debug!(path = %destination.display(), "deleted partial file"),
                Err(e) => tracing::warn!(path = %destination.display(), "could not delete partial file: {}", e),
            }
        }
        Ok(outcome)
    }
}
