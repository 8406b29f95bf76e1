// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed-capacity FIFO window over the most recent samples.
//!
//! The buffer keeps labels and values in two parallel sequences so a display sink
//! can hand them straight to a chart (`labels` on the x axis, `values` as the data
//! set). `labels[i]` always belongs to `values[i]`.
//!
//! ```
//! use livefeed_core::{RollingBuffer, Sample};
//!
//! let mut buffer = RollingBuffer::with_capacity(2);
//! buffer.push(Sample::new("t0", 0));
//! buffer.push(Sample::new("t1", 1));
//! let evicted = buffer.push(Sample::new("t2", 2));
//!
//! assert_eq!(evicted, Some(Sample::new("t0", 0)));
//! assert_eq!(buffer.labels(), ["t1", "t2"]);
//! ```

use crate::sample::{Sample, SampleValue};

/// Default window size of a live feed.
pub const MAX_SAMPLES: usize = 50;

/// Bounded, append-only window of `(label, value)` pairs.
///
/// Invariant after every mutation: `labels().len() == values().len() <= capacity()`.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer {
    labels: Vec<String>,
    values: Vec<SampleValue>,
    capacity: usize,
}

impl RollingBuffer {
    /// Creates an empty buffer holding at most [`MAX_SAMPLES`] samples.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }

    /// Creates an empty buffer holding at most `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "rolling buffer capacity must be at least 1");
        Self {
            labels: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample at the tail, evicting the oldest one if the window is full.
    ///
    /// Returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        let (label, value) = sample.into_parts();
        self.labels.push(label);
        self.values.push(value);

        if self.labels.len() > self.capacity {
            let label = self.labels.remove(0);
            let value = self.values.remove(0);
            return Some(Sample::new(label, value));
        }
        None
    }

    /// Appends every sample in order. Returns how many samples were evicted.
    pub fn extend<I>(&mut self, samples: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        samples
            .into_iter()
            .filter_map(|sample| self.push(sample))
            .count()
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn values(&self) -> &[SampleValue] {
        &self.values
    }

    /// Iterates `(label, value)` pairs from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SampleValue)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Most recently appended sample.
    #[must_use]
    pub fn latest(&self) -> Option<(&str, &SampleValue)> {
        self.labels
            .last()
            .map(String::as_str)
            .zip(self.values.last())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.values.clear();
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
