//! Probe configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults ([`Config::default`])
//! 2. `fhir-probe.toml` in the working directory (optional)
//! 3. `.env` (loaded into the process environment)
//! 4. environment variables prefixed `FHIR_PROBE__`, nested with `__`
//!    (e.g. `FHIR_PROBE__BASE_URL`, `FHIR_PROBE__LOGGING__LEVEL`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "fhir-probe.toml";
pub const ENV_PREFIX: &str = "FHIR_PROBE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// FHIR base URL, e.g. `https://playground.dhp.uz/fhir`
    pub base_url: String,
    pub request_timeout_seconds: u64,
    /// Print every request and response
    pub verbose: bool,
    /// Prepended to identifiers and names of created resources
    pub test_identifier_prefix: String,
    /// Delete created resources at the end of each scenario
    pub cleanup_after_tests: bool,
    /// Pause after seeding search data so the server can index it
    pub indexing_delay_seconds: u64,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/fhir".to_string(),
            request_timeout_seconds: 30,
            verbose: true,
            test_identifier_prefix: "TEST-".to_string(),
            cleanup_after_tests: true,
            indexing_delay_seconds: 5,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load with `path` as the (optional) configuration file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        // Missing .env is fine
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "base_url must use http or https, got `{}`",
                url.scheme()
            )));
        }
        if self.request_timeout_seconds == 0 {
            return Err(Error::InvalidConfig(
                "request_timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn indexing_delay(&self) -> Duration {
        Duration::from_secs(self.indexing_delay_seconds)
    }

    /// `value` with the configured test prefix.
    pub fn prefixed(&self, value: &str) -> String {
        format!("{}{}", self.test_identifier_prefix, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.indexing_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = Config {
            base_url: "ftp://example.org/fhir".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = Config {
            base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Url(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = Config {
            request_timeout_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_prefixed() {
        let config = Config::default();
        assert_eq!(config.prefixed("Karimov"), "TEST-Karimov");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("fhir-probe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fhir-probe.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "base_url = \"https://playground.dhp.uz/fhir\"\nindexing_delay_seconds = 1\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "https://playground.dhp.uz/fhir");
        assert_eq!(config.indexing_delay_seconds, 1);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.request_timeout_seconds, 30);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
