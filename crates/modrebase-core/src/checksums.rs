use crate::concurrency::shutdown_requested;
use crate::CoreError;
use modrebase_modfile::{parse_manifest_file, Manifest};
use modrebase_sumdb::{Client, LogConfig, LogOps, TrustServerOps, GO_MOD_SUFFIX};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Counts from a completed checksum run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub requirements: usize,
    pub lookups: usize,
    pub lines: usize,
}

/// Write the checksum lines for every requirement of `manifest` to `out`.
///
/// Each requirement is looked up twice, once for the module content and once
/// for its `go.mod`, in manifest order. The first failed lookup aborts the run
/// and nothing past it is written.
pub fn synchronize_checksums<O: LogOps, W: Write>(
    manifest: &Manifest,
    client: &mut Client<O>,
    out: &mut W,
) -> Result<SyncReport, CoreError> {
    let mut report = SyncReport {
        requirements: manifest.requirements.len(),
        ..SyncReport::default()
    };

    for req in &manifest.requirements {
        for version in [req.version.clone(), format!("{}{GO_MOD_SUFFIX}", req.version)] {
            if shutdown_requested() {
                return Err(CoreError::Interrupted);
            }
            let lines = client
                .lookup(&req.path, &version)
                .map_err(|source| CoreError::Lookup {
                    module: req.path.clone(),
                    version: version.clone(),
                    source,
                })?;
            debug!("{}@{version}: {} line(s)", req.path, lines.len());
            report.lookups += 1;
            for line in lines {
                writeln!(out, "{line}")?;
                report.lines += 1;
            }
        }
    }

    out.flush()?;
    Ok(report)
}

/// Regenerate the checksum file for `lock_file` at `output_file`.
///
/// Output goes to a temporary file beside `output_file` and is only renamed
/// into place after every lookup succeeded.
pub fn update_checksum_file(
    lock_file: &Path,
    output_file: &Path,
    config: &LogConfig,
) -> Result<SyncReport, CoreError> {
    let manifest = parse_manifest_file(lock_file)?;
    let ops = TrustServerOps::new(config.clone())?;
    let mut client = Client::new(ops)?;

    let dir = match output_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    let mut writer = BufWriter::new(tmp);
    let report = synchronize_checksums(&manifest, &mut client, &mut writer)?;

    let tmp = writer.into_inner().map_err(|e| CoreError::Io(e.into_error()))?;
    tmp.as_file().sync_all()?;
    tmp.persist(output_file).map_err(|e| CoreError::Io(e.error))?;
    if let Ok(f) = std::fs::File::open(dir) {
        let _ = f.sync_all();
    }

    info!(
        "wrote {} checksum line(s) for {} requirement(s) to {}",
        report.lines,
        report.requirements,
        output_file.display()
    );
    Ok(report)
}
