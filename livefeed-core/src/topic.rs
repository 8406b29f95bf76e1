// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Stream identifiers and the publish/subscribe topics derived from them.
//!
//! A SensorThings server publishes new observations of Datastream `12` on
//! `Datastreams(12)/Observations`. Topics double as MQTT-style filters: `+` matches
//! exactly one level and a trailing `#` matches any remaining levels.
//!
//! ```
//! use livefeed_core::{StreamId, Topic};
//!
//! let id = StreamId::parse("12").unwrap();
//! assert_eq!(Topic::for_stream(&id).as_str(), "Datastreams(12)/Observations");
//!
//! assert!(Topic::new("$SYS/broker/#").matches("$SYS/broker/clients/connected"));
//! assert!(Topic::new("+/Observations").matches("Datastreams(7)/Observations"));
//! assert!(!Topic::for_stream(&id).is_filter());
//! ```

use core::fmt;
use livefeed_error::{FeedError, Result};

const FORBIDDEN: [char; 5] = ['/', '#', '+', '(', ')'];

/// Validated reference to a Datastream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    /// Validates a raw stream reference.
    ///
    /// Surrounding whitespace is trimmed. SensorThings ids may be numeric (`12`) or
    /// quoted strings (`'abc'`); both are accepted as long as they can be embedded
    /// in a topic level.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidStreamId`] if the id is empty or contains `/`,
    /// `#`, `+`, parentheses or control characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(FeedError::invalid_stream_id(raw, "stream id is empty"));
        }
        if let Some(c) = id
            .chars()
            .find(|c| FORBIDDEN.contains(c) || c.is_control())
        {
            return Err(FeedError::invalid_stream_id(
                raw,
                format!("character {c:?} cannot appear in a topic"),
            ));
        }
        Ok(Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A publish/subscribe channel name or filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(topic: impl Into<String>) -> Self {
        Self(topic.into())
    }

    /// Observation topic of a Datastream.
    #[must_use]
    pub fn for_stream(id: &StreamId) -> Self {
        Self(format!("Datastreams({id})/Observations"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if the topic contains wildcard levels.
    #[must_use]
    pub fn is_filter(&self) -> bool {
        self.0.split('/').any(|level| level == "+" || level == "#")
    }

    /// Matches a concrete topic name against this topic used as a filter.
    ///
    /// Without wildcards this is plain equality.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let mut filter = self.0.split('/');
        let mut levels = name.split('/');

        loop {
            match (filter.next(), levels.next()) {
                (Some("#"), _) => return filter.next().is_none(),
                (Some("+"), Some(_)) => {}
                (Some(f), Some(l)) if f == l => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
