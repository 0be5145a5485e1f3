use std::sync::Arc;
use std::time::Duration;

use crate::api::{DataApi, HttpDataApi, InMemoryDataApi};
use crate::config::{AppConfig, DataApiConfig, PriceFormatConfig, SessionConfig};
use crate::order::engine::{EngineOptions, OrderSelectionEngine};
use crate::order::format::PriceFormatter;
use crate::order::model::ExtrasPayload;
use crate::order::registry::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: Arc<dyn DataApi>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let api = Arc::new(HttpDataApi::new(
            &config.data_api.base_url,
            Duration::from_secs(config.data_api.timeout_secs),
        )?) as Arc<dyn DataApi>;

        Ok(Self::from_parts(config, api))
    }

    pub fn from_parts(config: Arc<AppConfig>, api: Arc<dyn DataApi>) -> Self {
        let idle_ttl = time::Duration::seconds(i64::try_from(config.sessions.idle_ttl_secs).unwrap_or(i64::MAX));
        Self {
            config,
            api,
            sessions: SessionRegistry::new(idle_ttl),
        }
    }

    /// State backed by an in-memory data API and default settings.
    pub fn fake(api: InMemoryDataApi) -> Self {
        let config = Arc::new(AppConfig {
            data_api: DataApiConfig {
                base_url: "memory://".into(),
                timeout_secs: 1,
            },
            price_format: PriceFormatConfig::default(),
            extras_payload: ExtrasPayload::Definition,
            sessions: SessionConfig::default(),
        });
        Self::from_parts(config, Arc::new(api) as Arc<dyn DataApi>)
    }

    pub fn new_engine(&self) -> OrderSelectionEngine {
        OrderSelectionEngine::new(
            self.api.clone(),
            EngineOptions {
                formatter: PriceFormatter::from(&self.config.price_format),
                extras_payload: self.config.extras_payload,
            },
        )
    }
}
