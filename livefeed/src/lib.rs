// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # livefeed
//!
//! Live observation feeds for SensorThings dashboards.
//!
//! A [`FeedSession`] subscribes to `Datastreams(<id>)/Observations`, decodes each
//! observation into a [`Sample`], keeps the most recent [`MAX_SAMPLES`] in a
//! [`RollingBuffer`] and redraws a [`DisplaySink`] with the whole window after every
//! accepted sample.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use livefeed::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> livefeed::Result<()> {
//!     let broker = MemoryBroker::new();
//!     let chart = |labels: &[String], values: &[SampleValue]| {
//!         println!("{labels:?} {values:?}");
//!     };
//!
//!     let mut session = FeedSession::start("12", Arc::new(broker.transport()), chart).await?;
//!     let cancel = CancellationToken::new();
//!     session.run(&cancel).await;
//!     session.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;

pub use config::{BrokerConfig, FeedConfig, LiveFeedConfig, ServerConfig};

pub use livefeed_broker::{MemoryBroker, MemoryTransport};
#[cfg(feature = "mqtt")]
pub use livefeed_broker::{MqttSettings, MqttTransport};

pub use livefeed_core::{
    ClientId, DisplaySink, EventStream, FeedError, Result, ResultExt, RollingBuffer, Sample,
    SampleValue, SessionState, StreamId, Topic, Transport, TransportEvent, MAX_SAMPLES,
};

pub use livefeed_exec::history;
#[cfg(feature = "http")]
pub use livefeed_exec::HttpHistorySource;
pub use livefeed_exec::{
    BrokerMonitor, BrokerStats, CancellationToken, FeedOptions, FeedSession, FeedStats,
    HistorySource, Ingest, ReconnectPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::LiveFeedConfig;
    pub use livefeed_broker::MemoryBroker;
    pub use livefeed_core::{DisplaySink, Sample, SampleValue, SessionState, Transport};
    pub use livefeed_exec::{CancellationToken, FeedOptions, FeedSession, ReconnectPolicy};
}
