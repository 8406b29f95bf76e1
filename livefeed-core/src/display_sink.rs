// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::sample::SampleValue;
use crate::session_state::SessionState;

/// Receiver of rolling buffer contents, typically a chart.
///
/// Decouples the live feed from the concrete UI so it can be tested with a
/// recording sink and rendered by any charting front-end. Closures taking
/// `(&[String], &[SampleValue])` implement this trait directly.
pub trait DisplaySink: Send {
    /// Redraw with the full current window. Both slices have the same length and
    /// are ordered oldest to newest.
    fn redraw(&mut self, labels: &[String], values: &[SampleValue]);

    /// Called whenever the owning session changes state, e.g. to show a
    /// "disconnected" indicator instead of silently freezing.
    fn connection_changed(&mut self, _state: SessionState) {}
}

impl<F> DisplaySink for F
where
    F: FnMut(&[String], &[SampleValue]) + Send,
{
    fn redraw(&mut self, labels: &[String], values: &[SampleValue]) {
        self(labels, values);
    }
}
