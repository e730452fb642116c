#![allow(dead_code)]

pub mod catalog_server;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveTime;
use jfd_core::config::JfdConfig;
use jfd_core::schedule::{Clock, TimeWindow};
use jfd_core::session::{RunPhase, StatusSnapshot};

/// Hour inside the 23-5 test window.
pub const OPEN_HOUR: u32 = 1;
/// Hour outside the 23-5 test window.
pub const CLOSED_HOUR: u32 = 12;

/// Config pointing at a test server, with fast polling.
pub fn test_config(server_url: &str, media_root: &Path) -> JfdConfig {
    let mut cfg = JfdConfig::default();
    cfg.server_url = server_url.to_string();
    cfg.api_token = catalog_server::TOKEN.to_string();
    cfg.media_root = media_root.to_path_buf();
    cfg.window = TimeWindow::new(23, 5);
    cfg.transfer.pause_poll_secs = 0.01;
    cfg.transfer.window_check_secs = 0.02;
    cfg.transfer.connect_timeout_secs = 5;
    cfg
}

pub fn fixed_clock(hour: u32) -> Arc<dyn Clock> {
    Arc::new(move || NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
}

/// Web-client link to a series.
pub fn series_link(server_url: &str, series_id: &str) -> String {
    format!("{}/web/index.html#!/details?id={}&serverId=abc", server_url, series_id)
}

/// Deterministic body of `len` bytes.
pub fn body(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// Polls `status` until `pred` holds or 10 s pass.
pub fn wait_for(
    status: impl Fn() -> StatusSnapshot,
    pred: impl Fn(&StatusSnapshot) -> bool,
) -> StatusSnapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let snap = status();
        if pred(&snap) || Instant::now() > deadline {
            return snap;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

pub fn is_transferring(s: &StatusSnapshot) -> bool {
    s.phase == RunPhase::Transferring
}
