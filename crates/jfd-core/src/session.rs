//! Shared control-and-progress record of one download run.
//!
//! The orchestrator is the only writer of progress, target, phase and `active`;
//! control requests only flip `paused` and `aborted`. Flags and counters are
//! atomics so status reads never wait on the transfer; the target strings and
//! the last error sit behind short mutex sections.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{ErrorReport, FetchError};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Resolving,
    Enumerating,
    Transferring,
    Completed,
    Aborted,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Aborted | RunPhase::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Resolving => "resolving",
            RunPhase::Enumerating => "enumerating",
            RunPhase::Transferring => "transferring",
            RunPhase::Completed => "completed",
            RunPhase::Aborted => "aborted",
            RunPhase::Failed => "failed",
        }
    }

    fn to_u8(self) -> u8 {
        self as u8
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunPhase::Idle,
            1 => RunPhase::Resolving,
            2 => RunPhase::Enumerating,
            3 => RunPhase::Transferring,
            4 => RunPhase::Completed,
            5 => RunPhase::Aborted,
            _ => RunPhase::Failed,
        }
    }
}

/// What is being downloaded right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTarget {
    pub show_name: String,
    pub season_label: String,
    pub episode_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    pub paused: bool,
    pub aborted: bool,
    pub active: bool,
}

/// Point-in-time copy of a session, safe to hand to status readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub phase: RunPhase,
    pub completed_items: u64,
    pub total_items: u64,
    /// Fraction of the current file written, in [0, 1]; 0 when the size is unknown.
    pub current_file_fraction: f64,
    pub current_target: CurrentTarget,
    pub control: ControlFlags,
    pub error: Option<ErrorReport>,
}

impl StatusSnapshot {
    /// Snapshot reported when no run has been started.
    pub fn idle() -> Self {
        SessionState::new().snapshot()
    }
}

#[derive(Debug)]
pub struct SessionState {
    paused: AtomicBool,
    aborted: AtomicBool,
    active: AtomicBool,
    phase: AtomicU8,
    completed_items: AtomicU64,
    total_items: AtomicU64,
    file_bytes_done: AtomicU64,
    /// Advertised size of the current file; 0 when unknown.
    file_bytes_total: AtomicU64,
    target: Mutex<CurrentTarget>,
    error: Mutex<Option<ErrorReport>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            active: AtomicBool::new(false),
            phase: AtomicU8::new(RunPhase::Idle.to_u8()),
            completed_items: AtomicU64::new(0),
            total_items: AtomicU64::new(0),
            file_bytes_done: AtomicU64::new(0),
            file_bytes_total: AtomicU64::new(0),
            target: Mutex::new(CurrentTarget::default()),
            error: Mutex::new(None),
        }
    }

    // Control flags.

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    // Lifecycle.

    pub fn phase(&self) -> RunPhase {
        RunPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: RunPhase) {
        tracing::debug!(phase = phase.as_str(), "session phase");
        self.phase.store(phase.to_u8(), Ordering::SeqCst);
    }

    /// Enters a terminal phase and drops `active`.
    pub fn finish(&self, phase: RunPhase) {
        debug_assert!(phase.is_terminal());
        self.set_active(false);
        self.set_phase(phase);
    }

    pub fn record_error(&self, e: &FetchError) {
        *lock(&self.error) = Some(ErrorReport::from(e));
    }

    // Aggregate progress.

    pub fn set_total_items(&self, total: u64) {
        self.total_items.store(total, Ordering::SeqCst);
    }

    /// Counts one finished item. Never exceeds the known total.
    pub fn complete_item(&self) -> u64 {
        let total = self.total_items.load(Ordering::SeqCst);
        match self
            .completed_items
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |done| {
                (done < total).then_some(done + 1)
            }) {
            Ok(prev) => prev + 1,
            Err(done) => {
                tracing::warn!(done, total, "completed count already at total");
                done
            }
        }
    }

    pub fn completed_items(&self) -> u64 {
        self.completed_items.load(Ordering::SeqCst)
    }

    pub fn total_items(&self) -> u64 {
        self.total_items.load(Ordering::SeqCst)
    }

    // Per-file progress.

    pub fn begin_file(&self) {
        self.file_bytes_done.store(0, Ordering::SeqCst);
        self.file_bytes_total.store(0, Ordering::SeqCst);
    }

    pub fn record_file_progress(&self, bytes_done: u64, bytes_total: Option<u64>) {
        self.file_bytes_total
            .store(bytes_total.unwrap_or(0), Ordering::SeqCst);
        self.file_bytes_done.store(bytes_done, Ordering::SeqCst);
    }

    pub fn current_file_fraction(&self) -> f64 {
        let total = self.file_bytes_total.load(Ordering::SeqCst);
        if total == 0 {
            return 0.0;
        }
        let done = self.file_bytes_done.load(Ordering::SeqCst);
        (done as f64 / total as f64).min(1.0)
    }

    // Target.

    pub fn set_show(&self, show_name: &str) {
        lock(&self.target).show_name = show_name.to_string();
    }

    pub fn set_season(&self, season_label: &str) {
        lock(&self.target).season_label = season_label.to_string();
    }

    pub fn set_episode(&self, episode_name: &str) {
        lock(&self.target).episode_name = episode_name.to_string();
    }

    pub fn current_target(&self) -> CurrentTarget {
        lock(&self.target).clone()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.phase(),
            completed_items: self.completed_items(),
            total_items: self.total_items(),
            current_file_fraction: self.current_file_fraction(),
            current_target: self.current_target(),
            control: ControlFlags {
                paused: self.is_paused(),
                aborted: self.is_aborted(),
                active: self.is_active(),
            },
            error: lock(&self.error).clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn new_session_is_idle() {
        let s = StatusSnapshot::idle();
        assert_eq!(s.phase, RunPhase::Idle);
        assert_eq!(s.completed_items, 0);
        assert_eq!(s.control, ControlFlags::default());
        assert!(s.error.is_none());
    }

    #[test]
    fn pause_and_abort_are_independent() {
        let s = SessionState::new();
        s.pause();
        s.abort();
        assert!(s.is_paused());
        assert!(s.is_aborted());
        s.resume();
        assert!(!s.is_paused());
        assert!(s.is_aborted());
    }

    #[test]
    fn completed_never_exceeds_total() {
        let s = SessionState::new();
        s.set_total_items(2);
        assert_eq!(s.complete_item(), 1);
        assert_eq!(s.complete_item(), 2);
        assert_eq!(s.complete_item(), 2);
        assert_eq!(s.completed_items(), 2);
    }

    #[test]
    fn file_fraction() {
        let s = SessionState::new();
        assert_eq!(s.current_file_fraction(), 0.0);
        s.record_file_progress(25, Some(100));
        assert!((s.current_file_fraction() - 0.25).abs() < 1e-9);
        s.record_file_progress(500, None);
        assert_eq!(s.current_file_fraction(), 0.0);
        s.record_file_progress(10, Some(100));
        s.begin_file();
        assert_eq!(s.current_file_fraction(), 0.0);
    }

    #[test]
    fn finish_clears_active_and_keeps_error() {
        let s = SessionState::new();
        s.set_active(true);
        s.record_error(&FetchError::TransferFailed("HTTP 500".into()));
        s.finish(RunPhase::Failed);
        let snap = s.snapshot();
        assert_eq!(snap.phase, RunPhase::Failed);
        assert!(!snap.control.active);
        assert_eq!(snap.error.unwrap().kind, ErrorKind::TransferFailed);
    }

    #[test]
    fn phase_roundtrip() {
        let s = SessionState::new();
        for phase in [
            RunPhase::Idle,
            RunPhase::Resolving,
            RunPhase::Enumerating,
            RunPhase::Transferring,
            RunPhase::Completed,
            RunPhase::Aborted,
            RunPhase::Failed,
        ] {
            s.set_phase(phase);
            assert_eq!(s.phase(), phase);
        }
        assert!(!RunPhase::Transferring.is_terminal());
        assert!(RunPhase::Aborted.is_terminal());
    }

    #[test]
    fn snapshot_serializes() {
        let s = SessionState::new();
        s.set_show("Show");
        s.set_season("Season 1");
        let json = serde_json::to_string(&s.snapshot()).unwrap();
        let back: StatusSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_target.show_name, "Show");
        assert_eq!(back.phase, RunPhase::Idle);
    }
}
