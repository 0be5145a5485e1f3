use anyhow::Context;
use serde::Deserialize;

use crate::order::model::ExtrasPayload;

#[derive(Debug, Clone, Deserialize)]
pub struct DataApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceFormatConfig {
    pub currency_symbol: String,
    pub decimal_separator: String,
    pub thousands_separator: String,
}

impl Default for PriceFormatConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "R$".into(),
            decimal_separator: ",".into(),
            thousands_separator: ".".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub idle_ttl_secs: u64,
    pub prune_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: 30 * 60,
            prune_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_api: DataApiConfig,
    pub price_format: PriceFormatConfig,
    pub extras_payload: ExtrasPayload,
    pub sessions: SessionConfig,
}

fn parse_secs(var: Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    match var {
        Some(v) => v.parse::<u64>().with_context(|| format!("{key}={v}")),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_api = DataApiConfig {
            base_url: var("DATA_API_URL").unwrap_or_else(|| "http://localhost:3333".into()),
            timeout_secs: parse_secs(var("DATA_API_TIMEOUT_SECS"), "DATA_API_TIMEOUT_SECS", 10)?,
        };

        let defaults = PriceFormatConfig::default();
        let price_format = PriceFormatConfig {
            currency_symbol: var("PRICE_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
            decimal_separator: var("PRICE_DECIMAL_SEPARATOR").unwrap_or(defaults.decimal_separator),
            thousands_separator: var("PRICE_THOUSANDS_SEPARATOR")
                .unwrap_or(defaults.thousands_separator),
        };

        let extras_payload = match var("ORDER_EXTRAS_PAYLOAD") {
            Some(v) => v.parse::<ExtrasPayload>().map_err(anyhow::Error::msg)?,
            None => ExtrasPayload::default(),
        };

        let session_defaults = SessionConfig::default();
        let sessions = SessionConfig {
            idle_ttl_secs: parse_secs(
                var("SESSION_IDLE_TTL_SECS"),
                "SESSION_IDLE_TTL_SECS",
                session_defaults.idle_ttl_secs,
            )?,
            prune_interval_secs: parse_secs(
                var("SESSION_PRUNE_INTERVAL_SECS"),
                "SESSION_PRUNE_INTERVAL_SECS",
                session_defaults.prune_interval_secs,
            )?,
        };

        Ok(Self {
            data_api,
            price_format,
            extras_payload,
            sessions,
        })
    }
}
