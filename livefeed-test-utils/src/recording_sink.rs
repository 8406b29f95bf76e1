// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use livefeed_core::{DisplaySink, SampleValue, SessionState};
use parking_lot::Mutex;
use std::sync::Arc;

/// One `redraw` call as seen by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub labels: Vec<String>,
    pub values: Vec<SampleValue>,
}

#[derive(Default)]
struct Log {
    frames: Vec<Frame>,
    states: Vec<SessionState>,
}

/// A display sink that records every call.
///
/// Clones share the same log, so a test can hand one clone to a session and
/// inspect the other.
///
/// ```rust
/// use livefeed_core::{DisplaySink, SampleValue, SessionState};
/// use livefeed_test_utils::RecordingSink;
///
/// let sink = RecordingSink::new();
/// let mut handle = sink.clone();
/// handle.redraw(&["t0".to_string()], &[SampleValue::Number(1.0)]);
/// handle.connection_changed(SessionState::Subscribed);
///
/// assert_eq!(sink.redraw_count(), 1);
/// assert_eq!(sink.states(), vec![SessionState::Subscribed]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Log>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redraw_count(&self) -> usize {
        self.log.lock().frames.len()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.log.lock().frames.clone()
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.log.lock().frames.last().cloned()
    }

    /// Every state reported through `connection_changed`, in order.
    pub fn states(&self) -> Vec<SessionState> {
        self.log.lock().states.clone()
    }

    pub fn last_state(&self) -> Option<SessionState> {
        self.log.lock().states.last().copied()
    }
}

impl DisplaySink for RecordingSink {
    fn redraw(&mut self, labels: &[String], values: &[SampleValue]) {
        self.log.lock().frames.push(Frame {
            labels: labels.to_vec(),
            values: values.to_vec(),
        });
    }

    fn connection_changed(&mut self, state: SessionState) {
        self.log.lock().states.push(state);
    }
}
