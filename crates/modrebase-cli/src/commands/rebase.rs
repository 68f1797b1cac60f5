use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use modrebase_core::Strategy;
use std::path::{Path, PathBuf};

/// Merged manifest path used when none is given: next to `upstream`.
pub fn default_output(strategy: Strategy, upstream: &Path) -> PathBuf {
    upstream.with_file_name(strategy.local_lock_file_name())
}

pub fn run(
    upstream: &Path,
    downstream: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let strategy = Strategy::Go;
    let output = output.map_or_else(|| default_output(strategy, upstream), Path::to_path_buf);

    let pb = if json {
        None
    } else {
        Some(spinner("rebasing manifest..."))
    };
    let report = match strategy.rebase(upstream, downstream, &output) {
        Ok(report) => report,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "rebase failed");
            }
            return Err(e.to_string());
        }
    };
    if let Some(pb) = &pb {
        spin_ok(pb, &format!("wrote {}", output.display()));
    }

    if json {
        let payload = serde_json::json!({
            "output": output.display().to_string(),
            "kept": report.kept,
            "upgraded": report.upgraded,
            "dropped_upstream_only": report.dropped_upstream_only,
            "dropped_downstream_only": report.dropped_downstream_only,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "kept {} shared requirement(s), {} raised to the downstream version",
            report.kept,
            report.upgraded.len()
        );
        for up in &report.upgraded {
            println!("  {} {} -> {}", up.path, up.upstream, up.downstream);
        }
        if !report.dropped_upstream_only.is_empty() {
            println!(
                "dropped {} upstream-only requirement(s)",
                report.dropped_upstream_only.len()
            );
        }
        if !report.dropped_downstream_only.is_empty() {
            println!(
                "dropped {} downstream-only requirement(s)",
                report.dropped_downstream_only.len()
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
