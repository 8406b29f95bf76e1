// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for livefeed.
//!
//! For development and testing only, not for production code.
//!
//! - [`RecordingSink`]: a display sink that records redraws and state changes
//! - [`CountingTransport`]: counts transport calls and injects connect or
//!   subscribe failures
//! - [`fixtures`]: observation payloads and sample series
//! - stream helpers with timeouts: [`unwrap_event`], [`assert_no_event_emitted`],
//!   [`assert_stream_ended`]

pub mod counting_transport;
pub mod fixtures;
pub mod helpers;
pub mod recording_sink;

pub use counting_transport::{CallCounts, CountingTransport};
pub use helpers::{assert_no_event_emitted, assert_stream_ended, unwrap_event};
pub use recording_sink::{Frame, RecordingSink};
