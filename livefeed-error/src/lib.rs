// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Error types for the livefeed live-data client
//!
//! Every fallible livefeed operation reports a [`FeedError`]. The live session itself
//! contains most of these failures (a dashboard tile must not take the page down over
//! one bad sample), but transports, configuration and history seeding surface them to
//! their callers.
//!
//! # Examples
//!
//! ```
//! use livefeed_error::{FeedError, Result};
//!
//! fn parse_port(raw: &str) -> Result<u16> {
//!     raw.parse()
//!         .map_err(|_| FeedError::config(format!("invalid port '{raw}'")))
//! }
//!
//! assert!(parse_port("1883").is_ok());
//! assert!(parse_port("mqtt").is_err());
//! ```

/// Root error type for all livefeed operations
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The messaging transport could not establish a connection
    ///
    /// A session that hits this stays `Disconnected`; no buffer updates occur
    /// until a reconnection succeeds.
    #[error("Transport connection failed: {reason}")]
    TransportConnection {
        /// Why the connection attempt failed
        reason: String,
    },

    /// Subscribing to or unsubscribing from a topic failed
    #[error("Subscription to '{topic}' failed: {reason}")]
    Subscription {
        /// Topic the request was issued for
        topic: String,
        /// Why the request failed
        reason: String,
    },

    /// A message payload could not be decoded into a sample
    ///
    /// Either the payload is not JSON or it lacks the timestamp/result fields.
    /// Sessions drop the offending sample and carry on.
    #[error("Malformed payload: {reason}")]
    MalformedPayload {
        /// What was wrong with the payload
        reason: String,
    },

    /// The stream identifier is empty or cannot be embedded in a topic
    #[error("Invalid stream id '{id}': {reason}")]
    InvalidStreamId {
        /// The rejected identifier
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// Operation attempted in a state that does not allow it
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state
        message: String,
    },

    /// Configuration could not be read, parsed or validated
    #[error("Configuration error: {context}")]
    Config {
        /// What was wrong with the configuration
        context: String,
    },

    /// Fetching historical observations from the REST API failed
    #[error("History request failed: {context}")]
    History {
        /// Details about the failed request
        context: String,
    },

    /// Custom error from user code or an underlying library
    #[error("User error: {0}")]
    UserError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FeedError {
    /// Create a transport connection error
    pub fn transport_connection(reason: impl Into<String>) -> Self {
        Self::TransportConnection {
            reason: reason.into(),
        }
    }

    /// Create a subscription error for the given topic
    pub fn subscription(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Subscription {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed payload error
    pub fn malformed_payload(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    /// Create an invalid stream id error
    pub fn invalid_stream_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStreamId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error with the given message
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(context: impl Into<String>) -> Self {
        Self::Config {
            context: context.into(),
        }
    }

    /// Create a history request error
    pub fn history(context: impl Into<String>) -> Self {
        Self::History {
            context: context.into(),
        }
    }

    /// Wrap a user error
    pub fn user_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::UserError(Box::new(error))
    }

    /// Check if this is a recoverable error
    ///
    /// Connection, subscription and history failures are transient: retrying
    /// the same request later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportConnection { .. } | Self::Subscription { .. } | Self::History { .. }
        )
    }

    /// Check if this error is confined to a single sample
    ///
    /// Such errors never end a session.
    #[must_use]
    pub const fn is_sample_local(&self) -> bool {
        matches!(self, Self::MalformedPayload { .. })
    }
}

/// Specialized Result type for livefeed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Helper trait for adding context to `Result`s
///
/// Wrapped user errors are folded into a [`FeedError::InvalidState`] carrying
/// the context; other variants pass through untouched.
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// # Errors
    /// Returns `Err(FeedError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure (lazy evaluation)
    ///
    /// # Errors
    /// Returns `Err(FeedError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FeedError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| attach(e.into(), context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| attach(e.into(), f()))
    }
}

fn attach(error: FeedError, context: String) -> FeedError {
    match error {
        FeedError::UserError(inner) => FeedError::InvalidState {
            message: format!("{context}: {inner}"),
        },
        other => other,
    }
}
