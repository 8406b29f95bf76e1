// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Live feed execution.
//!
//! - [`FeedSession`]: subscribe, ingest, redraw, reconnect, stop
//! - [`ReconnectPolicy`]: what a disconnected session does next
//! - [`history`]: seeding from the observations REST endpoint
//! - [`BrokerMonitor`]: broker statistics from `$SYS/broker/#`

#[macro_use]
mod logging;

pub mod broker_stats;
pub mod feed_session;
pub mod history;
pub mod reconnect;

pub use self::broker_stats::{BrokerMonitor, BrokerStats, BROKER_STATS_FILTER};
pub use self::feed_session::{FeedOptions, FeedSession, FeedStats, Ingest};
pub use self::history::{observations_url, parse_observation_page, HistorySource};
#[cfg(feature = "http")]
pub use self::history::HttpHistorySource;
pub use self::reconnect::{ReconnectPolicy, DEFAULT_RETRY_INTERVAL};
pub use tokio_util::sync::CancellationToken;
