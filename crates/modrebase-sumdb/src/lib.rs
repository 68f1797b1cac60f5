//! Checksum database client for rebuilding `go.sum` files.
//!
//! This crate implements the lookup side of the Go checksum database protocol:
//! module path escaping, lookup response parsing, and a [`Client`] driven by a
//! [`LogOps`] capability set. The shipped [`TrustServerOps`] is a deliberately
//! non-verifying transport: it never persists log state, has no cache, and
//! trusts whatever the server returns (see [`Verification`]).

pub mod client;
pub mod config;
pub mod escape;
pub mod http;
pub mod record;

pub use client::{server_name, Client, GO_MOD_SUFFIX};
pub use config::{LogConfig, Verification, DEFAULT_KEY, DEFAULT_TIMEOUT_SECS, MAX_RESPONSE_BYTES};
pub use http::TrustServerOps;
pub use record::TreeHead;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SumdbError {
    #[error("sumdb I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sumdb config error: {0}")]
    Config(String),
    #[error("GET {url}: {status}")]
    Http { url: String, status: String },
    #[error("GET {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("malformed checksum database response: {0}")]
    Malformed(String),
    #[error("invalid lookup: {0}")]
    InvalidPath(String),
    #[error("no cache")]
    NoCache,
    #[error("security error: {0}")]
    Security(String),
}

/// Capabilities a [`Client`] needs from its environment.
///
/// Config entries hold the trust anchor (`key`) and the last known tree per
/// database (`<name>/latest`). Cache entries hold lookup answers keyed by
/// `<name>/lookup/<path>@<version>`. Remote paths are relative to the
/// database host.
pub trait LogOps {
    fn read_config(&self, file: &str) -> Result<Vec<u8>, SumdbError>;

    /// Replace a config entry. `old` is the value the caller last read.
    fn write_config(&self, file: &str, old: &[u8], new: &[u8]) -> Result<(), SumdbError>;

    fn read_cache(&self, file: &str) -> Result<Vec<u8>, SumdbError>;

    fn write_cache(&self, file: &str, data: &[u8]);

    /// Fetch `path` from the database server.
    fn read_remote(&self, path: &str) -> Result<Vec<u8>, SumdbError>;

    fn log(&self, msg: &str);

    /// Report evidence that the database misbehaved.
    fn security_error(&self, msg: &str);
}
