use crate::CoreError;
use modrebase_modfile::{parse_manifest_file, version, Manifest, Requirement};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// A shared dependency whose downstream version won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upgrade {
    pub path: String,
    pub upstream: String,
    pub downstream: String,
}

/// What a rebase kept, raised, and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebaseReport {
    pub kept: usize,
    pub upgraded: Vec<Upgrade>,
    pub dropped_upstream_only: Vec<String>,
    pub dropped_downstream_only: Vec<String>,
}

/// Merge a downstream fork's manifest onto its upstream.
///
/// Identity, `go` version, toolchain, excludes, replacements, and retractions
/// come from upstream. Only dependencies required by both sides survive, at
/// the higher of the two versions (ties keep upstream) and with upstream's
/// `indirect` flag. The result is cleaned up before it is returned.
pub fn rebase_manifests(upstream: &Manifest, downstream: &Manifest) -> Manifest {
    rebase_with_report(upstream, downstream).0
}

pub fn rebase_with_report(upstream: &Manifest, downstream: &Manifest) -> (Manifest, RebaseReport) {
    let mut merged = Manifest::new(&upstream.module_path, &upstream.go_version);
    merged.toolchain = upstream.toolchain.clone().filter(|t| !t.is_empty());

    let by_path: HashMap<&str, &Requirement> = upstream
        .requirements
        .iter()
        .map(|r| (r.path.as_str(), r))
        .collect();

    let mut report = RebaseReport::default();
    for theirs in &downstream.requirements {
        let Some(ours) = by_path.get(theirs.path.as_str()) else {
            debug!("dropping downstream-only requirement {}", theirs.path);
            report.dropped_downstream_only.push(theirs.path.clone());
            continue;
        };
        let selected = version::max(&ours.version, &theirs.version);
        if selected != ours.version {
            debug!(
                "raising {} from {} to {}",
                ours.path, ours.version, theirs.version
            );
            report.upgraded.push(Upgrade {
                path: ours.path.clone(),
                upstream: ours.version.clone(),
                downstream: theirs.version.clone(),
            });
        }
        merged
            .requirements
            .push(Requirement::new(&ours.path, selected, ours.indirect));
    }

    for ours in &upstream.requirements {
        if downstream.requirement(&ours.path).is_none() {
            debug!("dropping upstream-only requirement {}", ours.path);
            report.dropped_upstream_only.push(ours.path.clone());
        }
    }

    merged.excludes.clone_from(&upstream.excludes);
    merged.replacements.clone_from(&upstream.replacements);
    merged.retractions.clone_from(&upstream.retractions);

    let merged = merged.cleanup();
    report.kept = merged.requirements.len();
    (merged, report)
}

/// Load both manifests, rebase, and write the result atomically to `output`.
pub fn rebase_files(
    upstream: &Path,
    downstream: &Path,
    output: &Path,
) -> Result<RebaseReport, CoreError> {
    let upstream_manifest = parse_manifest_file(upstream).map_err(|source| CoreError::Load {
        role: "upstream",
        source,
    })?;
    let downstream_manifest =
        parse_manifest_file(downstream).map_err(|source| CoreError::Load {
            role: "downstream",
            source,
        })?;

    let (merged, report) = rebase_with_report(&upstream_manifest, &downstream_manifest);
    merged.write_to_file(output)?;

    info!(
        "rebased {} onto {}: {} kept, {} raised, {} upstream-only and {} downstream-only dropped",
        downstream.display(),
        upstream.display(),
        report.kept,
        report.upgraded.len(),
        report.dropped_upstream_only.len(),
        report.dropped_downstream_only.len()
    );
    Ok(report)
}
