use crate::{LogConfig, LogOps, SumdbError};
use std::io::Read;
use tracing::{debug, error, info};

/// Non-persistent, non-verifying [`LogOps`] over HTTP.
///
/// - `read_config("key")` returns the configured trust anchor and
///   `read_config("<name>/latest")` is always empty, so log rollback across
///   runs cannot be detected;
/// - config and cache writes are discarded and every cache read misses;
/// - remote reads are `GET <base><path>` with the configured timeout, and
///   bodies are truncated to `max_response_bytes`.
pub struct TrustServerOps {
    config: LogConfig,
    base_url: String,
    agent: ureq::Agent,
}

impl TrustServerOps {
    pub fn new(config: LogConfig) -> Result<Self, SumdbError> {
        let base_url = config.base_url()?;
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build();
        let agent = ureq::Agent::new_with_config(agent_config);
        Ok(Self {
            config,
            base_url,
            agent,
        })
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl LogOps for TrustServerOps {
    fn read_config(&self, file: &str) -> Result<Vec<u8>, SumdbError> {
        if file == "key" {
            return Ok(self.config.key.as_bytes().to_vec());
        }
        if file.ends_with("/latest") {
            // Empty result means empty tree.
            return Ok(Vec::new());
        }
        Err(SumdbError::Config(format!("unknown config {file}")))
    }

    fn write_config(&self, _file: &str, _old: &[u8], _new: &[u8]) -> Result<(), SumdbError> {
        Ok(())
    }

    fn read_cache(&self, _file: &str) -> Result<Vec<u8>, SumdbError> {
        Err(SumdbError::NoCache)
    }

    fn write_cache(&self, _file: &str, _data: &[u8]) {}

    fn read_remote(&self, path: &str) -> Result<Vec<u8>, SumdbError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");

        let resp = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| SumdbError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.as_u16() != 200 {
            let status = match status.canonical_reason() {
                Some(reason) => format!("{} {reason}", status.as_u16()),
                None => status.as_u16().to_string(),
            };
            return Err(SumdbError::Http { url, status });
        }

        let mut body = Vec::new();
        resp.into_body()
            .into_reader()
            .take(self.config.max_response_bytes)
            .read_to_end(&mut body)
            .map_err(|e| SumdbError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        debug!("GET {url}: {} bytes", body.len());
        Ok(body)
    }

    fn log(&self, msg: &str) {
        info!("{msg}");
    }

    fn security_error(&self, msg: &str) {
        error!("SECURITY ERROR: {msg}");
        eprintln!("SECURITY ERROR: {msg}");
        std::process::exit(1);
    }
}
