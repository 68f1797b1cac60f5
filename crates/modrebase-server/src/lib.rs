//! Reference checksum database server.
//!
//! Serves the lines of a local `go.sum` file through the lookup side of the Go
//! checksum database protocol: `GET /lookup/<path>@<version>` answers with a
//! record id, the record's checksum lines, and a tree note. The note is
//! unsigned in any meaningful sense; it exists so clients see well-formed
//! responses. Useful as a local mirror and as the backend for end-to-end
//! tests.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use modrebase_sumdb::escape::{unescape_path, unescape_version};
use modrebase_sumdb::record::{format_record, format_tree_note};
use modrebase_sumdb::GO_MOD_SUFFIX;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

/// Checksum records grouped per module version, in first-seen order.
///
/// Record `n` holds every line for one `(path, version)`, covering both the
/// content hash and the `/go.mod` hash. The tree is the sequence of records.
#[derive(Debug)]
pub struct LogStore {
    name: String,
    records: Vec<String>,
    index: HashMap<(String, String), usize>,
}

impl LogStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_sum_file(name: &str, path: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_sum_lines(name, &content)
    }

    pub fn from_sum_lines(name: &str, content: &str) -> io::Result<Self> {
        let mut store = Self::new(name);
        for (n, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            store.add_line(line).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {e}", n + 1))
            })?;
        }
        Ok(store)
    }

    /// Append one `<path> <version>[/go.mod] <hash>` line.
    pub fn add_line(&mut self, line: &str) -> io::Result<()> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [path, version, _hash] = fields.as_slice() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed checksum line {line:?}"),
            ));
        };
        let version = version.strip_suffix(GO_MOD_SUFFIX).unwrap_or(version);
        let key = ((*path).to_owned(), version.to_owned());

        let id = match self.index.get(&key) {
            Some(&id) => id,
            None => {
                self.records.push(String::new());
                let id = self.records.len() - 1;
                self.index.insert(key, id);
                id
            }
        };
        let record = &mut self.records[id];
        record.push_str(&fields.join(" "));
        record.push('\n');
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trust anchor clients can be configured with to reach this store.
    pub fn key(&self) -> String {
        let id = blake3::hash(self.name.as_bytes()).to_hex();
        format!("{}+{}+unverified", self.name, &id[..8])
    }

    fn tree_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            hasher.update(&(record.len() as u64).to_le_bytes());
            hasher.update(record.as_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    /// Note describing the whole log.
    pub fn tree_note(&self) -> String {
        let hash = self.tree_hash();
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.name.as_bytes());
        hasher.update(&hash);
        let signature = hasher.finalize();
        format_tree_note(
            self.records.len() as u64,
            &hash,
            &self.name,
            signature.as_bytes(),
        )
    }

    /// Full lookup response body for `path` at `version`.
    pub fn lookup(&self, path: &str, version: &str) -> Option<String> {
        let id = *self.index.get(&(path.to_owned(), version.to_owned()))?;
        Some(format_record(id as u64, &self.records[id], &self.tree_note()))
    }
}

/// Split `/lookup/<escaped path>@<escaped version>` into its unescaped parts.
pub fn parse_lookup_route(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("/lookup/")?;
    let (epath, evers) = rest.rsplit_once('@')?;
    let path = unescape_path(epath).ok()?;
    let version = unescape_version(evers).ok()?;
    Some((path, version))
}

fn respond_err(req: Request, code: u16, msg: &str) {
    let _ = req.respond(Response::from_string(msg).with_status_code(StatusCode(code)));
}

fn respond_text(req: Request, body: String) {
    let response = Response::from_string(body);
    let response = match Header::from_bytes("Content-Type", "text/plain; charset=utf-8") {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    };
    let _ = req.respond(response);
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(store: &LogStore, req: Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    if method != Method::Get {
        respond_err(req, 405, "method not allowed");
        return;
    }

    if url.starts_with("/lookup/") {
        let Some((path, version)) = parse_lookup_route(&url) else {
            warn!("bad lookup request {url}");
            respond_err(req, 400, "bad request");
            return;
        };
        match store.lookup(&path, &version) {
            Some(body) => respond_text(req, body),
            None => {
                info!("lookup {path}@{version}: not found");
                respond_err(req, 404, &format!("not found: {path}@{version}"));
            }
        }
    } else if url == "/latest" {
        respond_text(req, store.tree_note());
    } else if url == "/health" {
        let _ = req.respond(Response::from_string(r#"{"status":"ok"}"#));
    } else {
        respond_err(req, 404, "not found");
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(store: &Arc<LogStore>, addr: &str) -> io::Result<()> {
    let server = Server::http(addr).map_err(io::Error::other)?;
    for request in server.incoming_requests() {
        handle_request(store, request);
    }
    Ok(())
}

/// A test helper that serves a [`LogStore`] on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}` and records every request path.
/// Drop the `TestServer` to stop the server (via `Server::unblock`).
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub key: String,
    requests: Arc<Mutex<Vec<String>>>,
    server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server. Binds to `127.0.0.1:0` (random port).
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub fn start(store: LogStore) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");
        let key = store.key();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let srv = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                if let Ok(mut seen) = seen.lock() {
                    seen.push(request.url().to_owned());
                }
                handle_request(&store, request);
            }
        });

        Self {
            url,
            port,
            key,
            requests,
            server,
            _handle: handle,
        }
    }

    /// Request paths received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
    }
}
