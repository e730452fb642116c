//! Front door used by the shell: start a run, flip control flags, read status.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use super::{Orchestrator, RunRequest};
use crate::config::JfdConfig;
use crate::error::FetchError;
use crate::schedule::{Clock, LocalClock};
use crate::session::{RunPhase, SessionState, StatusSnapshot};

/// Answer to a start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReceipt {
    pub accepted: bool,
    pub effective_directory: PathBuf,
    /// True if the run starts outside the window and will wait for it.
    pub paused: bool,
    /// Why the request was rejected.
    pub reason: Option<String>,
}

impl StartReceipt {
    fn rejected(effective_directory: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            effective_directory,
            paused: false,
            reason: Some(reason.into()),
        }
    }
}

struct CurrentRun {
    session: Arc<SessionState>,
    handle: Option<JoinHandle<RunPhase>>,
}

/// Owns at most one live session and the thread running it.
pub struct DownloadManager {
    orchestrator: Arc<Orchestrator>,
    media_root: PathBuf,
    current: Mutex<Option<CurrentRun>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DownloadManager {
    pub fn new(orchestrator: Orchestrator, media_root: PathBuf) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            media_root,
            current: Mutex::new(None),
        }
    }

    pub fn from_config(cfg: &JfdConfig) -> Result<Self, FetchError> {
        Self::from_config_with_clock(cfg, Arc::new(LocalClock))
    }

    pub fn from_config_with_clock(
        cfg: &JfdConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(
            Orchestrator::from_config(cfg, clock)?,
            cfg.media_root.clone(),
        ))
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// `media_root/subpath`. Absolute subpaths and `..` components are refused.
    pub fn resolve_destination(&self, subpath: &str) -> Result<PathBuf, String> {
        let sub = Path::new(subpath.trim());
        for component in sub.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(format!("destination {:?} leaves the media root", subpath))
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(format!("destination {:?} must be relative", subpath))
                }
            }
        }
        Ok(self.media_root.join(sub))
    }

    /// Starts a run in a background thread. Rejected while another run has not
    /// reached a terminal phase, or when the subpath is unusable.
    pub fn start(&self, catalog_url: &str, subpath: &str) -> StartReceipt {
        let mut current = lock(&self.current);

        let destination = match self.resolve_destination(subpath) {
            Ok(d) => d,
            Err(reason) => {
                tracing::warn!("start rejected: {}", reason);
                return StartReceipt::rejected(self.media_root.clone(), reason);
            }
        };
        if let Some(run) = current.as_ref() {
            if !run.session.phase().is_terminal() {
                tracing::warn!("start rejected: a download is already running");
                return StartReceipt::rejected(destination, "a download is already running");
            }
        }
        if let Some(handle) = current.take().and_then(|run| run.handle) {
            let _ = handle.join();
        }

        let session = Arc::new(SessionState::new());
        session.set_phase(RunPhase::Resolving);
        let request = RunRequest {
            catalog_url: catalog_url.to_string(),
            destination_root: destination.clone(),
        };
        let paused = !self.orchestrator.window_open();

        let orchestrator = Arc::clone(&self.orchestrator);
        let run_session = Arc::clone(&session);
        let spawned = std::thread::Builder::new()
            .name("jfd-run".into())
            .spawn(move || orchestrator.run(&request, &run_session));
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                let err = FetchError::Internal(format!("start run thread: {}", e));
                tracing::error!("{}", err);
                session.record_error(&err);
                session.finish(RunPhase::Failed);
                *current = Some(CurrentRun {
                    session,
                    handle: None,
                });
                return StartReceipt::rejected(destination, err.to_string());
            }
        };

        tracing::info!(url = catalog_url, dir = %destination.display(), paused, "download started");
        *current = Some(CurrentRun {
            session,
            handle: Some(handle),
        });
        StartReceipt {
            accepted: true,
            effective_directory: destination,
            paused,
            reason: None,
        }
    }

    fn session(&self) -> Option<Arc<SessionState>> {
        lock(&self.current)
            .as_ref()
            .map(|run| Arc::clone(&run.session))
    }

    pub fn pause(&self) {
        if let Some(s) = self.session() {
            s.pause();
            tracing::info!("download paused");
        }
    }

    pub fn resume(&self) {
        if let Some(s) = self.session() {
            s.resume();
            tracing::info!("download resumed");
        }
    }

    pub fn abort(&self) {
        if let Some(s) = self.session() {
            s.abort();
            tracing::info!("download abort requested");
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        self.session()
            .map(|s| s.snapshot())
            .unwrap_or_else(StatusSnapshot::idle)
    }

    /// Blocks until the current run ends. `None` if no run was started.
    pub fn wait(&self) -> Option<RunPhase> {
        let (session, handle) = {
            let mut current = lock(&self.current);
            let run = current.as_mut()?;
            (Arc::clone(&run.session), run.handle.take())
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("run thread panicked");
            }
        }
        Some(session.phase())
    }
}
