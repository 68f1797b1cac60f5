use crate::checksums::{update_checksum_file, SyncReport};
use crate::rebase::{rebase_files, RebaseReport};
use crate::CoreError;
use modrebase_sumdb::LogConfig;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Dependency ecosystem a project is managed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Go modules: `go.mod` and `go.sum`.
    Go,
}

impl Strategy {
    pub const ALL: &'static [Strategy] = &[Strategy::Go];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Go => "go",
        }
    }

    /// Whether `dir` is managed by this ecosystem.
    pub fn probe(self, dir: &Path) -> bool {
        dir.join(self.lock_file_name()).is_file()
    }

    /// First strategy whose probe accepts `dir`.
    pub fn detect(dir: &Path) -> Option<Strategy> {
        let found = Self::ALL.iter().copied().find(|s| s.probe(dir));
        debug!(
            "probed {}: {}",
            dir.display(),
            found.map_or("no known ecosystem", Strategy::name)
        );
        found
    }

    /// Like [`Strategy::detect`] but an error when nothing matches.
    pub fn require(dir: &Path) -> Result<Strategy, CoreError> {
        Self::detect(dir).ok_or_else(|| {
            CoreError::Unsupported(format!("no supported manifest in {}", dir.display()))
        })
    }

    pub fn lock_file_name(self) -> &'static str {
        match self {
            Strategy::Go => "go.mod",
        }
    }

    pub fn local_lock_file_name(self) -> &'static str {
        match self {
            Strategy::Go => "go.mod.local",
        }
    }

    pub fn checksum_file_name(self) -> &'static str {
        match self {
            Strategy::Go => "go.sum",
        }
    }

    pub fn local_checksum_file_name(self) -> &'static str {
        match self {
            Strategy::Go => "go.sum.local",
        }
    }

    /// Rebase `downstream` onto `upstream`, writing the merged manifest to `output`.
    pub fn rebase(
        self,
        upstream: &Path,
        downstream: &Path,
        output: &Path,
    ) -> Result<RebaseReport, CoreError> {
        match self {
            Strategy::Go => rebase_files(upstream, downstream, output),
        }
    }

    /// Regenerate the checksum file for `lock_file` at `output`.
    pub fn update_checksums(
        self,
        lock_file: &Path,
        output: &Path,
        config: &LogConfig,
    ) -> Result<SyncReport, CoreError> {
        match self {
            Strategy::Go => update_checksum_file(lock_file, output, config),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
