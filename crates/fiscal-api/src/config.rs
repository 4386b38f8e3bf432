//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::enrichment::DEFAULT_GEMINI_MODEL;
use crate::news::DEFAULT_FEEDS;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_NEWS_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_AI_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub seed: Option<u64>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub news_feeds: Vec<String>,
    pub news_interval: Duration,
    pub ai_interval: Duration,
    pub enrichment_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            seed: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            news_feeds: DEFAULT_FEEDS.iter().map(|feed| feed.to_string()).collect(),
            news_interval: Duration::from_secs(DEFAULT_NEWS_INTERVAL_SECS),
            ai_interval: Duration::from_secs(DEFAULT_AI_INTERVAL_SECS),
            enrichment_timeout: Duration::from_millis(DEFAULT_ENRICHMENT_TIMEOUT_MS),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(bind) = get("FISCAL_BIND") {
            config.bind = parse_value("FISCAL_BIND", &bind)?;
        } else if let Some(port) = get("PORT") {
            let port: u16 = parse_value("PORT", &port)?;
            config.bind = SocketAddr::from(([0, 0, 0, 0], port));
        }

        if let Some(seed) = get("FISCAL_SEED") {
            config.seed = Some(parse_value("FISCAL_SEED", &seed)?);
        }

        config.gemini_api_key = get("GEMINI_API_KEY");
        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model;
        }

        if let Some(feeds) = get("FISCAL_NEWS_FEEDS") {
            config.news_feeds = feeds
                .split(',')
                .map(str::trim)
                .filter(|feed| !feed.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(secs) = get("FISCAL_NEWS_INTERVAL_SECS") {
            config.news_interval =
                Duration::from_secs(parse_positive("FISCAL_NEWS_INTERVAL_SECS", &secs)?);
        }
        if let Some(secs) = get("FISCAL_AI_INTERVAL_SECS") {
            config.ai_interval =
                Duration::from_secs(parse_positive("FISCAL_AI_INTERVAL_SECS", &secs)?);
        }
        if let Some(ms) = get("FISCAL_ENRICHMENT_TIMEOUT_MS") {
            config.enrichment_timeout =
                Duration::from_millis(parse_positive("FISCAL_ENRICHMENT_TIMEOUT_MS", &ms)?);
        }

        Ok(config)
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err: T::Err| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed: u64 = parse_value(key, value)?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(lookup(&[])).expect("defaults parse");
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.news_feeds.len(), 4);
        assert!(!config.enrichment_enabled());
    }

    #[test]
    fn bind_takes_precedence_over_port() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("FISCAL_BIND", "127.0.0.1:8080"),
            ("PORT", "9000"),
        ]))
        .expect("valid");
        assert_eq!(config.bind.to_string(), "127.0.0.1:8080");

        let config = ServerConfig::from_lookup(lookup(&[("PORT", "9000")])).expect("valid");
        assert_eq!(config.bind.to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn reads_every_override() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("FISCAL_SEED", "42"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("FISCAL_NEWS_FEEDS", "https://a.example/rss, ,https://b.example/rss"),
            ("FISCAL_NEWS_INTERVAL_SECS", "60"),
            ("FISCAL_AI_INTERVAL_SECS", "30"),
            ("FISCAL_ENRICHMENT_TIMEOUT_MS", "250"),
        ]))
        .expect("valid");

        assert_eq!(config.seed, Some(42));
        assert!(config.enrichment_enabled());
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(
            config.news_feeds,
            vec!["https://a.example/rss", "https://b.example/rss"]
        );
        assert_eq!(config.news_interval, Duration::from_secs(60));
        assert_eq!(config.ai_interval, Duration::from_secs(30));
        assert_eq!(config.enrichment_timeout, Duration::from_millis(250));
    }

    #[test]
    fn blank_key_disables_enrichment() {
        let config =
            ServerConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "  ")])).expect("valid");
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn rejects_garbage_and_zero_intervals() {
        let err = ServerConfig::from_lookup(lookup(&[("FISCAL_SEED", "abc")]))
            .expect_err("seed must be numeric");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "FISCAL_SEED",
                ..
            }
        ));

        let err = ServerConfig::from_lookup(lookup(&[("FISCAL_AI_INTERVAL_SECS", "0")]))
            .expect_err("zero interval");
        assert!(err.to_string().contains("greater than zero"));

        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "70000")])).is_err());
    }
}
