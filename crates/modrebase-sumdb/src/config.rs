use crate::client::server_name;
use crate::SumdbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Verifier key of the public Go checksum database.
pub const DEFAULT_KEY: &str =
    "sum.golang.org+033de0ae+Ac4zctda0e5eza+HJyk9SxEdh+s3Ux18htTTAD8OuAn8";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Response bodies are truncated to this many bytes.
pub const MAX_RESPONSE_BYTES: u64 = 1 << 20;

/// How much the client checks what the database returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verification {
    /// No signature or inclusion-proof checks. Answers are taken as served.
    #[default]
    TrustServer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Trust anchor `name+hash+key`. The part before the first `+` is the
    /// database host.
    #[serde(default = "default_key")]
    pub key: String,
    /// Base URL used instead of `https://<name>`.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
    #[serde(default)]
    pub verification: Verification,
}

fn default_key() -> String {
    DEFAULT_KEY.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_response_bytes() -> u64 {
    MAX_RESPONSE_BYTES
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::trust_server(DEFAULT_KEY)
    }
}

impl LogConfig {
    /// A non-verifying configuration for the database named by `key`.
    pub fn trust_server(key: &str) -> Self {
        Self {
            key: key.trim().to_owned(),
            url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_response_bytes: MAX_RESPONSE_BYTES,
            verification: Verification::TrustServer,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.trim_end_matches('/').to_owned());
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn server_name(&self) -> &str {
        server_name(&self.key)
    }

    /// URL that remote paths are appended to.
    pub fn base_url(&self) -> Result<String, SumdbError> {
        if let Some(url) = &self.url {
            return Ok(url.trim_end_matches('/').to_owned());
        }
        let name = self.server_name();
        if name.is_empty() || name.contains(['/', ' ']) {
            return Err(SumdbError::Config(format!("invalid trust anchor {:?}", self.key)));
        }
        Ok(format!("https://{name}"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from `~/.config/modrebase/sumdb.json`.
    pub fn load_default() -> Result<Self, SumdbError> {
        let path = default_config_path()?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, SumdbError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SumdbError::Config(format!("invalid sumdb config: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<(), SumdbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SumdbError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn default_config_path() -> Result<PathBuf, SumdbError> {
    let home = std::env::var("HOME").map_err(|_| SumdbError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/modrebase/sumdb.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_public_database() {
        let config = LogConfig::default();
        assert_eq!(config.server_name(), "sum.golang.org");
        assert_eq!(config.base_url().unwrap(), "https://sum.golang.org");
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.max_response_bytes, 1024 * 1024);
        assert_eq!(config.verification, Verification::TrustServer);
    }

    #[test]
    fn url_override_strips_trailing_slash() {
        let config = LogConfig::default().with_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url().unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn rejects_unusable_anchor() {
        assert!(LogConfig::trust_server("+abc").base_url().is_err());
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sumdb.json");

        let config = LogConfig::trust_server("sum.example.org+1+2")
            .with_url("http://mirror.example.org")
            .with_timeout_secs(5);
        config.save(&path).unwrap();

        let loaded = LogConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sumdb.json");
        std::fs::write(&path, r#"{"url": "http://localhost:9000"}"#).unwrap();

        let loaded = LogConfig::load(&path).unwrap();
        assert_eq!(loaded.key, DEFAULT_KEY);
        assert_eq!(loaded.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(loaded.verification, Verification::TrustServer);
    }

    #[test]
    fn verification_mode_is_labelled_in_json() {
        let json = serde_json::to_string(&LogConfig::default()).unwrap();
        assert!(json.contains(r#""verification":"trust-server""#));
    }
}
