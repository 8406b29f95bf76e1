// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Messaging transports for livefeed.
//!
//! - [`MemoryBroker`] / [`MemoryTransport`]: in-process broker, used by tests and the
//!   demo, with connection-loss fault injection
//! - `MqttTransport` (feature `mqtt`): a real broker connection through `rumqttc`

#[macro_use]
mod logging;

pub mod memory_broker;
#[cfg(feature = "mqtt")]
pub mod mqtt;

pub use self::memory_broker::{MemoryBroker, MemoryTransport};
#[cfg(feature = "mqtt")]
pub use self::mqtt::{MqttSettings, MqttTransport};
