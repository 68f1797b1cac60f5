use super::{json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use modrebase_core::Strategy;
use modrebase_sumdb::config::default_config_path;
use modrebase_sumdb::LogConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line settings that take precedence over the config file.
#[derive(Debug, Default)]
pub struct LogOverrides {
    pub key: Option<String>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
}

pub fn resolve_config(overrides: &LogOverrides) -> Result<LogConfig, String> {
    let mut config = match &overrides.config {
        Some(path) => LogConfig::load(path).map_err(|e| format!("{}: {e}", path.display()))?,
        None => match default_config_path() {
            Ok(path) if path.is_file() => {
                debug!("using sumdb config {}", path.display());
                LogConfig::load(&path).map_err(|e| format!("{}: {e}", path.display()))?
            }
            _ => LogConfig::default(),
        },
    };

    if let Some(key) = &overrides.key {
        key.trim().clone_into(&mut config.key);
    }
    if let Some(url) = &overrides.url {
        config = config.with_url(url);
    }
    if let Some(secs) = overrides.timeout_secs {
        config = config.with_timeout_secs(secs);
    }
    Ok(config)
}

pub fn run(
    lockfile: &Path,
    output: &Path,
    overrides: &LogOverrides,
    json: bool,
) -> Result<u8, String> {
    let config = resolve_config(overrides)?;
    let strategy = Strategy::Go;

    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "fetching checksums from {}...",
            config.server_name()
        )))
    };
    let report = match strategy.update_checksums(lockfile, output, &config) {
        Ok(report) => report,
        Err(e) => {
            if let Some(pb) = &pb {
                spin_fail(pb, "checksum update failed");
            }
            return Err(e.to_string());
        }
    };
    if let Some(pb) = &pb {
        spin_ok(pb, &format!("wrote {}", output.display()));
    }

    if json {
        let payload = serde_json::json!({
            "lockfile": lockfile.display().to_string(),
            "output": output.display().to_string(),
            "database": config.server_name(),
            "verification": config.verification,
            "requirements": report.requirements,
            "lookups": report.lookups,
            "lines": report.lines,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} checksum line(s) for {} requirement(s) written to {}",
            report.lines,
            report.requirements,
            output.display()
        );
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sumdb.json");
        LogConfig::trust_server("sum.file.test+1+2")
            .with_url("http://file.test")
            .with_timeout_secs(7)
            .save(&path)
            .unwrap();

        let config = resolve_config(&LogOverrides {
            key: None,
            url: Some("http://flag.test/".to_owned()),
            timeout_secs: None,
            config: Some(path.clone()),
        })
        .unwrap();
        assert_eq!(config.server_name(), "sum.file.test");
        assert_eq!(config.url.as_deref(), Some("http://flag.test"));
        assert_eq!(config.timeout_secs, 7);

        let config = resolve_config(&LogOverrides {
            key: Some("sum.flag.test+3+4".to_owned()),
            timeout_secs: Some(2),
            config: Some(path),
            ..LogOverrides::default()
        })
        .unwrap();
        assert_eq!(config.server_name(), "sum.flag.test");
        assert_eq!(config.timeout_secs, 2);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = resolve_config(&LogOverrides {
            config: Some(PathBuf::from("/nonexistent/sumdb.json")),
            ..LogOverrides::default()
        })
        .unwrap_err();
        assert!(err.contains("/nonexistent/sumdb.json"));
    }
}
