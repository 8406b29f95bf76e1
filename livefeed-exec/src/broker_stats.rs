// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Broker health from the `$SYS/broker/#` topic tree.
//!
//! Each known `$SYS` topic updates one field of [`BrokerStats`] with the payload
//! text as published. Unknown topics are ignored.

use futures::StreamExt;
use livefeed_core::{
    ClientId, EventStream, Result, SubscriptionId, Topic, Transport, TransportEvent,
};
use serde::Serialize;
use std::sync::Arc;

/// Filter covering every broker statistic.
pub const BROKER_STATS_FILTER: &str = "$SYS/broker/#";

const PREFIX: &str = "$SYS/broker/";

/// Last reported value of each broker statistic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub uptime: Option<String>,
    pub subscriptions: Option<String>,
    pub clients_connected: Option<String>,
    pub clients_disconnected: Option<String>,
    pub clients_expired: Option<String>,
    pub messages_sent: Option<String>,
    pub messages_received: Option<String>,
    pub messages_stored: Option<String>,
    pub bytes_sent: Option<String>,
    pub bytes_received: Option<String>,
}

impl BrokerStats {
    /// Records `payload` under the field for `topic`. Returns `false` for topics
    /// that carry no tracked statistic.
    pub fn apply(&mut self, topic: &str, payload: &[u8]) -> bool {
        match self.field_mut(topic) {
            Some(field) => {
                *field = Some(String::from_utf8_lossy(payload).trim().to_string());
                true
            }
            None => false,
        }
    }

    fn field_mut(&mut self, topic: &str) -> Option<&mut Option<String>> {
        let field = match topic.strip_prefix(PREFIX)? {
            "version" => &mut self.version,
            "timestamp" => &mut self.timestamp,
            "uptime" => &mut self.uptime,
            "subscriptions/count" => &mut self.subscriptions,
            "clients/connected" => &mut self.clients_connected,
            "clients/disconnected" => &mut self.clients_disconnected,
            "clients/expired" => &mut self.clients_expired,
            "messages/sent" => &mut self.messages_sent,
            "messages/received" => &mut self.messages_received,
            "messages/stored" => &mut self.messages_stored,
            "bytes/sent" => &mut self.bytes_sent,
            "bytes/received" => &mut self.bytes_received,
            _ => return None,
        };
        Some(field)
    }
}

/// A subscription to the broker's `$SYS` tree.
pub struct BrokerMonitor<T: ?Sized> {
    transport: Arc<T>,
    filter: Topic,
    subscription: SubscriptionId,
    events: Option<EventStream>,
    stats: BrokerStats,
    stopped: bool,
}

impl<T: Transport + ?Sized> BrokerMonitor<T> {
    /// Connects and subscribes to [`BROKER_STATS_FILTER`].
    ///
    /// # Errors
    ///
    /// Returns the transport's connection or subscription error.
    pub async fn start(transport: Arc<T>) -> Result<Self> {
        let filter = Topic::new(BROKER_STATS_FILTER);
        transport.connect(&ClientId::generate()).await?;
        let subscription = transport.subscribe(&filter).await?;
        info!("monitoring broker statistics on {filter}");
        Ok(Self {
            transport,
            filter,
            subscription: subscription.id,
            events: Some(subscription.events),
            stats: BrokerStats::default(),
            stopped: false,
        })
    }

    /// Applies one event. Returns `true` if a statistic changed.
    pub fn handle_event(&mut self, event: TransportEvent) -> bool {
        if self.stopped {
            return false;
        }
        match event {
            TransportEvent::Message { topic, payload } => self.stats.apply(&topic, &payload),
            TransportEvent::ConnectionLost { reason } => {
                warn!("broker monitor lost its connection: {reason}");
                self.events = None;
                false
            }
        }
    }

    /// Waits until a tracked statistic changes.
    ///
    /// Returns `None` once stopped or when the subscription ends.
    pub async fn next_update(&mut self) -> Option<&BrokerStats> {
        loop {
            let event = self.events.as_mut()?.next().await?;
            if self.handle_event(event) {
                return Some(&self.stats);
            }
        }
    }

    #[must_use]
    pub fn stats(&self) -> &BrokerStats {
        &self.stats
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Unsubscribes once; later calls do nothing.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.events = None;
        if let Err(e) = self.transport.unsubscribe(self.subscription).await {
            warn!("unsubscribe from {} failed: {e}", self.filter);
        }
    }
}
