// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Core types shared by every livefeed crate.
//!
//! - [`Sample`] / [`SampleValue`]: one observation, parsed at the JSON boundary
//! - [`RollingBuffer`]: FIFO window of the most recent samples
//! - [`StreamId`] / [`Topic`]: what a session subscribes to
//! - [`SessionState`]: lifecycle of a live session
//! - [`DisplaySink`] and [`Transport`]: the two external collaborators

pub mod client_id;
pub mod display_sink;
pub mod rolling_buffer;
pub mod sample;
pub mod session_state;
pub mod topic;
pub mod transport;

pub use self::client_id::ClientId;
pub use self::display_sink::DisplaySink;
pub use self::rolling_buffer::{RollingBuffer, MAX_SAMPLES};
pub use self::sample::{Sample, SampleValue};
pub use self::session_state::SessionState;
pub use self::topic::{StreamId, Topic};
pub use self::transport::{EventStream, Subscription, SubscriptionId, Transport, TransportEvent};
pub use livefeed_error::{FeedError, Result, ResultExt};
