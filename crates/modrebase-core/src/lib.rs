//! Rebase engine and checksum synchronization for modrebase.
//!
//! This crate merges a downstream fork's `go.mod` onto its upstream
//! ([`rebase_manifests`]), regenerates checksum lines for a manifest from a
//! checksum database ([`synchronize_checksums`]), and exposes both through the
//! per-ecosystem [`Strategy`] type used by the CLI.

pub mod checksums;
pub mod concurrency;
pub mod rebase;
pub mod strategy;

pub use checksums::{synchronize_checksums, update_checksum_file, SyncReport};
pub use concurrency::{install_signal_handler, shutdown_requested};
pub use rebase::{rebase_files, rebase_manifests, rebase_with_report, RebaseReport, Upgrade};
pub use strategy::Strategy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] modrebase_modfile::ModfileError),
    #[error("manifest error: loading {role} manifest: {source}")]
    Load {
        role: &'static str,
        #[source]
        source: modrebase_modfile::ModfileError,
    },
    #[error("lookup error: {module}@{version}: {source}")]
    Lookup {
        module: String,
        version: String,
        #[source]
        source: modrebase_sumdb::SumdbError,
    },
    #[error("sumdb error: {0}")]
    Sumdb(#[from] modrebase_sumdb::SumdbError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("interrupted before all checksums were fetched")]
    Interrupted,
    #[error("unsupported project: {0}")]
    Unsupported(String),
}
