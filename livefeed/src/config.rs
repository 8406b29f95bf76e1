// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! TOML configuration.
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! [broker]
//! host = "localhost"
//! port = 1883
//! keep_alive_secs = 30
//!
//! [feed]
//! max_samples = 50
//! seed_top = 50
//! client_prefix = "dashboard"
//!
//! [reconnect]
//! strategy = "fixed"
//! interval_ms = 5000
//!
//! [server]
//! base_url = "http://localhost:8080/v1.0"
//! ```

use livefeed_core::{FeedError, Result, MAX_SAMPLES};
use livefeed_exec::{FeedOptions, ReconnectPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete livefeed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveFeedConfig {
    pub broker: BrokerConfig,
    pub feed: FeedConfig,
    pub reconnect: ReconnectPolicy,
    pub server: ServerConfig,
}

/// Push-messaging broker endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            keep_alive_secs: 30,
        }
    }
}

/// Rolling window and seeding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub max_samples: usize,
    /// Observations requested when seeding from history.
    pub seed_top: usize,
    pub client_prefix: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_samples: MAX_SAMPLES,
            seed_top: MAX_SAMPLES,
            client_prefix: None,
        }
    }
}

/// SensorThings REST endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1.0".to_string(),
        }
    }
}

impl LiveFeedConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Config` if the document does not parse or fails
    /// [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| FeedError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Config` if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| FeedError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// # Errors
    ///
    /// Returns `FeedError::Config` for a zero window, an empty broker host, a zero
    /// port, or an invalid reconnect policy.
    pub fn validate(&self) -> Result<()> {
        if self.feed.max_samples == 0 {
            return Err(FeedError::config("feed.max_samples must be at least 1"));
        }
        if self.broker.host.trim().is_empty() {
            return Err(FeedError::config("broker.host must not be empty"));
        }
        if self.broker.port == 0 {
            return Err(FeedError::config("broker.port must not be 0"));
        }
        self.reconnect.validate()
    }

    /// Session options derived from the `feed` and `reconnect` sections.
    #[must_use]
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            capacity: self.feed.max_samples,
            reconnect: self.reconnect.clone(),
            client_prefix: self.feed.client_prefix.clone(),
        }
    }

    #[cfg(feature = "mqtt")]
    #[must_use]
    pub fn mqtt_settings(&self) -> livefeed_broker::MqttSettings {
        let mut settings =
            livefeed_broker::MqttSettings::new(self.broker.host.clone(), self.broker.port);
        settings.keep_alive = std::time::Duration::from_secs(self.broker.keep_alive_secs);
        settings
    }

    #[cfg(feature = "http")]
    #[must_use]
    pub fn history_source(&self) -> livefeed_exec::HttpHistorySource {
        livefeed_exec::HttpHistorySource::new(self.server.base_url.clone())
    }
}
