//! JSON configuration document.
//!
//! The file is read once at start-up. Every section is optional and falls back
//! to the defaults in [`super::constants`]; secrets may be supplied through the
//! environment instead of the file.

use std::path::Path;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use super::constants::{
    DEFAULT_LISTEN_PORT, DEFAULT_LOOKUP_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TENCENT_REGION,
};
use crate::enrichment::EnrichmentOptions;
use crate::error_handling::ConfigError;
use crate::models::{AnalysisThresholds, TrafficQuery};
use crate::ocr::TencentCredentials;

/// Tencent Cloud secret id override. Environment secrets win over the file.
pub const ENV_TENCENT_SECRET_ID: &str = "TENCENTCLOUD_SECRET_ID";
/// Tencent Cloud secret key override.
pub const ENV_TENCENT_SECRET_KEY: &str = "TENCENTCLOUD_SECRET_KEY";
/// SimilarWeb API key override.
pub const ENV_SIMILARWEB_API_KEY: &str = "SIMILARWEB_API_KEY";

/// Root of the configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tencent Cloud OCR credentials
    pub tencent_cloud: TencentCloudConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Assessment thresholds; no assessment is produced when absent
    pub analysis: Option<AnalysisThresholds>,
    /// Wayback Machine client settings
    pub web_archive: WebArchiveConfig,
    /// SimilarWeb client settings
    pub similarweb: SimilarWebConfig,
    /// Default traffic query, overridable per invocation
    pub traffic_query: TrafficQuery,
    /// Lookup concurrency, timeouts and retries
    pub enrichment: EnrichmentConfig,
}

/// The `tencent_cloud` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TencentCloudConfig {
    /// Overridden by `TENCENTCLOUD_SECRET_ID`
    pub secret_id: String,
    /// Overridden by `TENCENTCLOUD_SECRET_KEY`
    pub secret_key: String,
    /// Region sent in the `X-TC-Region` header
    pub region: String,
    /// Endpoint override, e.g. a regional host
    pub endpoint: Option<String>,
}

impl Default for TencentCloudConfig {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            secret_key: String::new(),
            region: DEFAULT_TENCENT_REGION.to_string(),
            endpoint: None,
        }
    }
}

/// The `server` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port; accepts `8080` or `"8080"`
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_LISTEN_PORT,
        }
    }
}

/// The `web_archive` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WebArchiveConfig {
    /// HTTP(S) proxy for archive requests
    pub proxy_url: Option<String>,
    /// CDX host override
    pub base_url: Option<String>,
}

/// The `similarweb` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimilarWebConfig {
    /// Overridden by `SIMILARWEB_API_KEY`; lookups fail as unavailable when empty
    pub api_key: String,
    /// API host override
    pub base_url: Option<String>,
}

/// The `enrichment` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Lookups in flight across all requests
    pub max_concurrency: usize,
    /// Budget per lookup, retries included
    pub lookup_timeout_secs: u64,
    /// Timeout of a single provider HTTP request
    pub request_timeout_secs: u64,
    /// Retries after the first attempt for transient provider errors
    pub max_retries: usize,
    /// Requests per second per provider; 0 disables rate limiting
    pub rate_limit_rps: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_rps: 0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text
            .trim()
            .trim_start_matches(':')
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid port '{text}'"))),
    }
}

impl AppConfig {
    /// Reads, parses and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the file cannot be read, is not valid JSON
    /// for this schema, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates a configuration document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the limits and the default traffic query.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enrichment.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.max_concurrency must be at least 1".into(),
            ));
        }
        if self.enrichment.lookup_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.lookup_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.enrichment.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "enrichment.request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        self.traffic_query.validate()?;
        Ok(())
    }

    /// Replaces secrets with values from the process environment, when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Replaces secrets with values from `lookup`; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(value) = get(ENV_TENCENT_SECRET_ID) {
            self.tencent_cloud.secret_id = value;
        }
        if let Some(value) = get(ENV_TENCENT_SECRET_KEY) {
            self.tencent_cloud.secret_key = value;
        }
        if let Some(value) = get(ENV_SIMILARWEB_API_KEY) {
            self.similarweb.api_key = value;
        }
    }

    /// Orchestrator options derived from the `enrichment` section.
    pub fn enrichment_options(&self) -> EnrichmentOptions {
        EnrichmentOptions {
            max_concurrency: self.enrichment.max_concurrency,
            lookup_timeout: Duration::from_secs(self.enrichment.lookup_timeout_secs),
        }
    }

    /// Timeout applied to each provider HTTP request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.enrichment.request_timeout_secs)
    }

    /// OCR credentials, or `None` when either secret is missing.
    pub fn tencent_credentials(&self) -> Option<TencentCredentials> {
        let cloud = &self.tencent_cloud;
        if cloud.secret_id.trim().is_empty() || cloud.secret_key.trim().is_empty() {
            return None;
        }
        Some(TencentCredentials {
            secret_id: cloud.secret_id.clone(),
            secret_key: cloud.secret_key.clone(),
            region: cloud.region.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Country, Granularity};
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.server.port, DEFAULT_LISTEN_PORT);
        assert_eq!(config.tencent_cloud.region, DEFAULT_TENCENT_REGION);
        assert_eq!(config.enrichment.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(config.analysis.is_none());
        assert_eq!(config.traffic_query, TrafficQuery::default());
        assert!(config.tencent_credentials().is_none());
    }

    #[test]
    fn test_port_accepts_string_and_number() {
        let config = AppConfig::from_json(r#"{"server": {"port": "9000"}}"#).unwrap();
        assert_eq!(config.server.port, 9000);
        let config = AppConfig::from_json(r#"{"server": {"port": 9001}}"#).unwrap();
        assert_eq!(config.server.port, 9001);
        assert!(AppConfig::from_json(r#"{"server": {"port": "http"}}"#).is_err());
    }

    #[test]
    fn test_full_document() {
        let config = AppConfig::from_json(
            r#"{
                "tencent_cloud": {"secret_id": "id", "secret_key": "key", "region": "ap-shanghai"},
                "server": {"port": "8081"},
                "analysis": {"traffic_threshold": 5000, "days_threshold": 365},
                "web_archive": {"proxy_url": "http://127.0.0.1:7890"},
                "similarweb": {"api_key": "sw"},
                "traffic_query": {"granularity": "daily", "start_date": "2023-01",
                                  "end_date": "2023-06", "country": "GB", "mtd": true},
                "enrichment": {"max_concurrency": 4, "rate_limit_rps": 2}
            }"#,
        )
        .unwrap();
        let credentials = config.tencent_credentials().unwrap();
        assert_eq!(credentials.region, "ap-shanghai");
        assert_eq!(
            config.analysis,
            Some(AnalysisThresholds {
                traffic_threshold: Some(5000.0),
                days_threshold: Some(365)
            })
        );
        assert_eq!(
            config.web_archive.proxy_url.as_deref(),
            Some("http://127.0.0.1:7890")
        );
        assert_eq!(config.traffic_query.granularity, Granularity::Daily);
        assert_eq!(config.traffic_query.country, Country::Code("gb".into()));
        assert!(config.traffic_query.month_to_date);
        assert_eq!(config.enrichment_options().max_concurrency, 4);
        assert_eq!(config.enrichment.rate_limit_rps, 2);
        assert_eq!(
            config.enrichment.lookup_timeout_secs,
            DEFAULT_LOOKUP_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_validation_failures() {
        for doc in [
            r#"{"enrichment": {"max_concurrency": 0}}"#,
            r#"{"enrichment": {"lookup_timeout_secs": 0}}"#,
            r#"{"enrichment": {"request_timeout_secs": 0}}"#,
            r#"{"traffic_query": {"start_date": "2023-06", "end_date": "2023-01"}}"#,
            r#"{"traffic_query": {"format": "xml"}}"#,
        ] {
            assert!(AppConfig::from_json(doc).is_err(), "{doc} should be rejected");
        }
        assert!(matches!(
            AppConfig::from_json(r#"{"traffic_query": {"start_date": "2023-06", "end_date": "2023-01"}}"#),
            Err(ConfigError::Query(_))
        ));
    }

    #[test]
    fn test_env_overrides_replace_secrets() {
        let env: HashMap<&str, &str> = [
            (ENV_TENCENT_SECRET_ID, "env-id"),
            (ENV_TENCENT_SECRET_KEY, "env-key"),
            (ENV_SIMILARWEB_API_KEY, "   "),
        ]
        .into_iter()
        .collect();
        let mut config =
            AppConfig::from_json(r#"{"similarweb": {"api_key": "from-file"}}"#).unwrap();
        config.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.tencent_cloud.secret_id, "env-id");
        assert_eq!(config.tencent_cloud.secret_key, "env-key");
        assert_eq!(config.similarweb.api_key, "from-file");
    }
}
