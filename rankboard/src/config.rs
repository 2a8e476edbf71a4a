//! Configuration loaded with figment
//!
//! Sources are merged in precedence order, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional configuration file (`.toml`, `.yaml`/`.yml`, or `.json`)
//! 3. Environment variables prefixed with `RANKBOARD_`

use crate::error::Result;
use chrono::Duration;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "RANKBOARD_";

/// Runtime settings for a board client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankBoardConfig {
    /// Events buffered per notification subscriber before it starts lagging
    pub notification_capacity: usize,
    /// How long a notification stays active before `dismiss_expired` clears it
    pub notification_ttl_ms: u64,
}

impl Default for RankBoardConfig {
    fn default() -> Self {
        Self {
            notification_capacity: 64,
            notification_ttl_ms: 3000,
        }
    }
}

impl RankBoardConfig {
    /// Load from defaults and environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from defaults, an optional file, and environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract()?;
        config.validate()?;
        debug!(?config, "loaded configuration");
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => {
                    return Err(figment::Error::from(format!(
                        "unsupported configuration format: {}",
                        path.display()
                    ))
                    .into())
                }
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    fn validate(&self) -> Result<()> {
        if self.notification_capacity == 0 {
            return Err(figment::Error::from(
                "notification_capacity must be greater than zero".to_string(),
            )
            .into());
        }
        Ok(())
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.notification_ttl_ms).unwrap_or(i64::MAX))
    }
}
