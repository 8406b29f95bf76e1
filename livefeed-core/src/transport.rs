// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The messaging transport seam.
//!
//! A [`Transport`] is one client connection to a publish/subscribe broker. It can be
//! shared between sessions (`Arc<T>`); each session owns its own logical
//! [`Subscription`], identified by a [`SubscriptionId`], and receives that
//! subscription's events as a stream. Removing one subscription never affects
//! another, even on the same topic.

use crate::client_id::ClientId;
use crate::topic::Topic;
use async_trait::async_trait;
use core::pin::Pin;
use futures::Stream;
use livefeed_error::Result;

/// Events delivered to a subscriber, one at a time, in transport delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A message published on a topic matching the subscription.
    Message { topic: String, payload: Vec<u8> },
    /// The underlying connection dropped. No further messages follow on this stream.
    ConnectionLost { reason: String },
}

impl TransportEvent {
    pub fn message(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self::Message {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    pub fn connection_lost(reason: impl Into<String>) -> Self {
        Self::ConnectionLost {
            reason: reason.into(),
        }
    }
}

/// Stream of events for one subscription. Ends when the subscription is removed.
pub type EventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send + 'static>>;

/// Identity of one logical subscription on a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A live subscription: its identity and its event stream.
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: EventStream,
}

impl Subscription {
    pub fn new(id: SubscriptionId, events: EventStream) -> Self {
        Self { id, events }
    }
}

/// Client side of a push-messaging broker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the connection, or reuses it if already connected.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::TransportConnection` if the broker cannot be reached.
    async fn connect(&self, client_id: &ClientId) -> Result<()>;

    /// Adds a subscription to `topic`. Every call yields a distinct subscription,
    /// even for a topic that is already subscribed.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Subscription` if the transport is not connected or the
    /// broker rejects the request.
    async fn subscribe(&self, topic: &Topic) -> Result<Subscription>;

    /// Removes one subscription, ending its event stream. Other subscriptions to
    /// the same topic keep receiving. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Subscription` if the broker rejects the request.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// `true` while the connection is up.
    fn is_connected(&self) -> bool;
}
