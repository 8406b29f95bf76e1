// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! In-process, hot, topic-routed broker.
//!
//! A [`MemoryBroker`] routes each published message to every subscription whose
//! filter matches the topic name. Clients talk to it through [`MemoryTransport`],
//! which implements the [`Transport`] seam, so a live feed can run against it exactly
//! as it would against a network broker.
//!
//! ## Characteristics
//!
//! - **Hot**: Late subscribers only see messages published after they subscribed.
//! - **Unbounded**: Routes use unbounded channels (no backpressure).
//! - **Shared**: Cheap to clone; all clones share the same routing table.
//! - **Fault injection**: [`MemoryBroker::set_online`] drops every connection with a
//!   `ConnectionLost` event and refuses new connects until the broker is back.
//!
//! ## Example
//!
//! ```
//! use livefeed_broker::MemoryBroker;
//! use livefeed_core::{ClientId, Topic, Transport, TransportEvent};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let broker = MemoryBroker::new();
//! let transport = broker.transport();
//! transport.connect(&ClientId::generate()).await.unwrap();
//!
//! let mut subscription = transport
//!     .subscribe(&Topic::new("Datastreams(1)/Observations"))
//!     .await
//!     .unwrap();
//!
//! broker.publish("Datastreams(1)/Observations", r#"{"phenomenonTime":"t0","result":1}"#);
//! broker.publish("Datastreams(2)/Observations", "ignored");
//!
//! assert_eq!(
//!     subscription.events.next().await,
//!     Some(TransportEvent::message(
//!         "Datastreams(1)/Observations",
//!         r#"{"phenomenonTime":"t0","result":1}"#
//!     ))
//! );
//! # }
//! ```

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use livefeed_core::{
    ClientId, FeedError, Result, Subscription, SubscriptionId, Topic, Transport,
    TransportEvent,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

type ClientKey = u64;

struct Route {
    id: SubscriptionId,
    client: ClientKey,
    filter: Topic,
    sender: UnboundedSender<TransportEvent>,
}

struct BrokerState {
    online: bool,
    next_client: ClientKey,
    next_subscription: u64,
    connected: HashMap<ClientKey, ClientId>,
    routes: Vec<Route>,
    published: u64,
}

/// A hot, in-process publish/subscribe broker.
///
/// See the [module documentation](self) for examples and more details.
#[derive(Clone)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    /// Creates an online broker with no clients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrokerState {
                online: true,
                next_client: 0,
                next_subscription: 0,
                connected: HashMap::new(),
                routes: Vec::new(),
                published: 0,
            })),
        }
    }

    /// Creates a new client handle. The client starts disconnected.
    #[must_use]
    pub fn transport(&self) -> MemoryTransport {
        let mut state = self.state.lock();
        let key = state.next_client;
        state.next_client += 1;
        MemoryTransport {
            broker: self.clone(),
            key,
        }
    }

    /// Publishes a raw payload. Returns the number of subscriptions it was delivered to.
    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) -> usize {
        let payload = payload.into();
        let mut state = self.state.lock();
        state.published += 1;

        let mut delivered = 0;
        state.routes.retain(|route| {
            if !route.filter.matches(topic) {
                return true;
            }
            let event = TransportEvent::message(topic, payload.clone());
            if route.sender.unbounded_send(event).is_ok() {
                delivered += 1;
                true
            } else {
                // Receiver dropped without unsubscribing.
                false
            }
        });
        delivered
    }

    /// Serializes `message` as JSON and publishes it.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::UserError` if `message` cannot be serialized.
    pub fn publish_json<M: Serialize>(&self, topic: &str, message: &M) -> Result<usize> {
        let payload = serde_json::to_vec(message).map_err(FeedError::user_error)?;
        Ok(self.publish(topic, payload))
    }

    /// Brings the broker up or down.
    ///
    /// Going offline sends `ConnectionLost` to every subscription, removes all routes
    /// and disconnects every client. While offline, `connect` fails.
    pub fn set_online(&self, online: bool) {
        let mut state = self.state.lock();
        if state.online == online {
            return;
        }
        state.online = online;
        if online {
            return;
        }

        warn!("memory broker going offline, dropping {} subscriptions", state.routes.len());
        for route in state.routes.drain(..) {
            let _ = route
                .sender
                .unbounded_send(TransportEvent::connection_lost("broker went offline"));
        }
        state.connected.clear();
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state.lock().online
    }

    /// Number of live subscriptions across all clients.
    ///
    /// Subscriptions whose receiver was dropped are pruned lazily on the next
    /// matching publish.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.state.lock().routes.len()
    }

    /// Number of currently connected clients.
    #[must_use]
    pub fn connected_clients(&self) -> usize {
        self.state.lock().connected.len()
    }

    /// Total number of `publish` calls since creation.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.state.lock().published
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// One client connection to a [`MemoryBroker`].
///
/// Share it between sessions with `Arc` to reuse the connection.
pub struct MemoryTransport {
    broker: MemoryBroker,
    key: ClientKey,
}

impl MemoryTransport {
    /// The broker this client talks to.
    #[must_use]
    pub fn broker(&self) -> &MemoryBroker {
        &self.broker
    }

    /// Client id of the current connection, if connected.
    #[must_use]
    pub fn client_id(&self) -> Option<ClientId> {
        self.broker.state.lock().connected.get(&self.key).cloned()
    }

    /// Closes the connection, ending every subscription of this client.
    pub fn disconnect(&self) {
        let mut state = self.broker.state.lock();
        state.connected.remove(&self.key);
        let key = self.key;
        state.routes.retain(|route| route.client != key);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, client_id: &ClientId) -> Result<()> {
        let mut state = self.broker.state.lock();
        if !state.online {
            return Err(FeedError::transport_connection("memory broker is offline"));
        }
        if let Some(existing) = state.connected.get(&self.key) {
            debug!("reusing connection {existing} for client {client_id}");
            return Ok(());
        }
        state.connected.insert(self.key, client_id.clone());
        debug!("client {client_id} connected");
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        let mut state = self.broker.state.lock();
        if !state.connected.contains_key(&self.key) {
            return Err(FeedError::subscription(topic.as_str(), "not connected"));
        }

        let id = SubscriptionId::new(state.next_subscription);
        state.next_subscription += 1;
        let (tx, rx) = mpsc::unbounded();
        state.routes.push(Route {
            id,
            client: self.key,
            filter: topic.clone(),
            sender: tx,
        });
        Ok(Subscription::new(id, Box::pin(rx)))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let mut state = self.broker.state.lock();
        let key = self.key;
        state
            .routes
            .retain(|route| !(route.client == key && route.id == id));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.broker.state.lock().connected.contains_key(&self.key)
    }
}
