//! Background timing enforcement: pauses the session outside the download window
//! and resumes it inside, until the session ends.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use super::window::{is_within_window, Clock, TimeWindow};
use crate::session::SessionState;

/// Applies the window to `session` once. Returns the resulting paused flag.
pub fn enforce_window(session: &SessionState, window: &TimeWindow, clock: &dyn Clock) -> bool {
    if is_within_window(window, &clock.now()) {
        if session.is_paused() {
            tracing::info!("resuming download inside allowed time window");
            session.resume();
        }
    } else if !session.is_paused() {
        tracing::info!("pausing download outside allowed time window");
        session.pause();
    }
    session.is_paused()
}

/// Owns the timing thread; stops and joins it on drop.
pub struct TimingEnforcer {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TimingEnforcer {
    /// Starts the loop. It wakes every `interval`, exits when the session is no
    /// longer active or when the enforcer is dropped.
    pub fn spawn(
        session: Arc<SessionState>,
        window: TimeWindow,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = std::thread::Builder::new()
            .name("jfd-timing".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !session.is_active() {
                            break;
                        }
                        enforce_window(&session, &window, clock.as_ref());
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        tracing::debug!(?interval, "timing loop started");
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// True once the timing thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for TimingEnforcer {
    fn drop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("timing loop panicked");
            }
        }
        tracing::debug!("timing loop stopped");
    }
}
