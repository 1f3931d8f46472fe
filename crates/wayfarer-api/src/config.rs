//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_NARRATIVE_TIMEOUT_MS: u64 = 8000;

/// Everything the binary needs before it can serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Postgres connection string (`DATABASE_URL`, required).
    pub database_url: String,
    /// Bind host (`HOST`).
    pub host: String,
    /// Bind port (`PORT`).
    pub port: u16,
    /// Optional YAML balance block (`BALANCE_CONFIG_PATH`).
    pub balance_config_path: Option<PathBuf>,
    /// Enables LLM narration when set (`ANTHROPIC_API_KEY`).
    pub anthropic_api_key: Option<String>,
    /// Overrides the narration model (`NARRATIVE_MODEL`).
    pub narrative_model: Option<String>,
    /// Upper bound on one narration call (`NARRATIVE_TIMEOUT_MS`).
    pub narrative_timeout: Duration,
    /// OTLP collector endpoint (`OTEL_EXPORTER_OTLP_ENDPOINT`).
    pub otlp_endpoint: Option<String>,
}

impl ApiConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// numeric one does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`ApiConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let timeout_ms = match get("NARRATIVE_TIMEOUT_MS") {
            Some(raw) => raw.parse().map_err(|e| {
                AppError::Config(format!("NARRATIVE_TIMEOUT_MS must be milliseconds: {e}"))
            })?,
            None => DEFAULT_NARRATIVE_TIMEOUT_MS,
        };

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port,
            balance_config_path: get("BALANCE_CONFIG_PATH").map(PathBuf::from),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            narrative_model: get("NARRATIVE_MODEL"),
            narrative_timeout: Duration::from_millis(timeout_ms),
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST:PORT` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ApiConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/wayfarer")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.narrative_timeout, Duration::from_millis(8000));
        assert!(config.anthropic_api_key.is_none());
        assert!(config.balance_config_path.is_none());
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_missing_database_url_is_rejected() {
        let result = config_from(&[("PORT", "8080")]);

        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = config_from(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")]);

        assert!(matches!(result, Err(AppError::Config(msg)) if msg.contains("PORT")));
    }

    #[test]
    fn test_blank_api_key_counts_as_unset() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ANTHROPIC_API_KEY", "  "),
            ("NARRATIVE_TIMEOUT_MS", "2500"),
        ])
        .unwrap();

        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.narrative_timeout, Duration::from_millis(2500));
    }
}
