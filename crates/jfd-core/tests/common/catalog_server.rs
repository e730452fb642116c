//! Minimal Jellyfin-style HTTP/1.1 server for integration tests.
//!
//! Serves `/Users`, `/Users/{user}/Items?ParentId=`, `/Items/{id}` and
//! `/Items/{id}/Download` from an in-memory library. Requests without the
//! expected `X-Emby-Token` get 401. Every request target is recorded.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";
pub const USER: &str = "user-1";

/// Bytes written per body chunk; `Library::chunk_delay` is slept between chunks.
const BODY_CHUNK: usize = 16 * 1024;

#[derive(Debug, Clone, Default)]
pub struct Library {
    /// Children listed under each parent id, in order.
    children: HashMap<String, Vec<Value>>,
    /// Media path reported by `/Items/{id}`; `None` means no media sources.
    paths: HashMap<String, Option<String>>,
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    pub chunk_delay: Option<Duration>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a season under `series_id`.
    pub fn season(&mut self, series_id: &str, id: &str, show: &str, index: i64) -> &mut Self {
        self.children.entry(series_id.to_string()).or_default().push(json!({
            "Id": id,
            "Type": "Season",
            "Name": format!("Season {}", index),
            "SeriesName": show,
            "IndexNumber": index,
        }));
        self
    }

    /// Adds an episode under `season_id`, served from `body`, with media path `path`.
    pub fn episode(
        &mut self,
        season_id: &str,
        id: &str,
        name: &str,
        path: Option<&str>,
        body: Vec<u8>,
    ) -> &mut Self {
        self.children.entry(season_id.to_string()).or_default().push(json!({
            "Id": id,
            "Type": "Episode",
            "Name": name,
        }));
        self.paths.insert(id.to_string(), path.map(str::to_string));
        self.files.insert(id.to_string(), body);
        self
    }

    /// Adds a non-episode child (e.g. an extra) under `parent_id`.
    pub fn other(&mut self, parent_id: &str, id: &str, kind: &str) -> &mut Self {
        self.children.entry(parent_id.to_string()).or_default().push(json!({
            "Id": id,
            "Type": kind,
            "Name": id,
        }));
        self
    }

    /// Download of `id` answers 500.
    pub fn fail_download(&mut self, id: &str) -> &mut Self {
        self.failing.insert(id.to_string());
        self
    }
}

pub struct CatalogServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CatalogServer {
    /// Request targets seen so far (path and query), in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn was_requested(&self, path: &str) -> bool {
        self.requests().iter().any(|r| r == path || r.starts_with(&format!("{}?", path)))
    }
}

/// Starts the server in a background thread. It runs until the process exits.
pub fn start(library: Library) -> CatalogServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let library = Arc::new(library);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let library = Arc::clone(&library);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &library, &log));
        }
    });
    CatalogServer {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

/// Reads the request head. Returns (target, token header).
fn read_head(stream: &mut TcpStream) -> Option<(String, Option<String>)> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let head = String::from_utf8_lossy(&buf).into_owned();
    let mut lines = head.lines();
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let token = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("x-emby-token"))
        .map(|(_, value)| value.trim().to_string());
    Some((target, token))
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn respond_json(stream: &mut TcpStream, value: &Value) {
    respond(stream, "200 OK", "application/json", value.to_string().as_bytes());
}

fn handle(mut stream: TcpStream, library: &Library, log: &Mutex<Vec<String>>) {
    let Some((target, token)) = read_head(&mut stream) else {
        return;
    };
    log.lock().unwrap().push(target.clone());

    if token.as_deref() != Some(TOKEN) {
        respond(&mut stream, "401 Unauthorized", "text/plain", b"unauthorized");
        return;
    }

    let parsed = url::Url::parse(&format!("http://test{}", target)).unwrap();
    let segments: Vec<String> = parsed
        .path_segments()
        .map(|s| s.map(str::to_string).collect())
        .unwrap_or_default();
    let query: HashMap<String, String> = parsed.query_pairs().into_owned().collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    match segments.as_slice() {
        ["Users"] => respond_json(&mut stream, &json!([{ "Id": USER, "Name": "tester" }])),
        ["Users", _, "Items"] => {
            let parent = query.get("ParentId").cloned().unwrap_or_default();
            let items = library.children.get(&parent).cloned().unwrap_or_default();
            let count = items.len();
            respond_json(&mut stream, &json!({ "Items": items, "TotalRecordCount": count }));
        }
        ["Items", id] => match library.paths.get(*id) {
            Some(Some(path)) => respond_json(
                &mut stream,
                &json!({ "Id": id, "MediaSources": [{ "Path": path }] }),
            ),
            Some(None) => respond_json(&mut stream, &json!({ "Id": id, "MediaSources": [] })),
            None => respond(&mut stream, "404 Not Found", "text/plain", b"no such item"),
        },
        ["Items", id, "Download"] => {
            if library.failing.contains(*id) {
                respond(&mut stream, "500 Internal Server Error", "text/plain", b"boom");
                return;
            }
            let Some(body) = library.files.get(*id) else {
                respond(&mut stream, "404 Not Found", "text/plain", b"no such file");
                return;
            };
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            if stream.write_all(head.as_bytes()).is_err() {
                return;
            }
            for chunk in body.chunks(BODY_CHUNK) {
                if stream.write_all(chunk).is_err() {
                    return;
                }
                if let Some(delay) = library.chunk_delay {
                    thread::sleep(delay);
                }
            }
        }
        _ => respond(&mut stream, "404 Not Found", "text/plain", b"unknown route"),
    }
}
