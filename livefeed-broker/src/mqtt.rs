// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! MQTT transport backed by `rumqttc`.
//!
//! `connect` waits for the broker's CONNACK, then a background task pumps the
//! event loop and routes incoming publishes to the subscriptions whose filter
//! matches. An event-loop error ends the connection: every subscription receives
//! `ConnectionLost` and its stream closes.
//!
//! Several subscriptions may share one filter. The broker is only told to
//! unsubscribe once the last of them is removed.

use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use livefeed_core::{
    ClientId, FeedError, Result, Subscription, SubscriptionId, Topic, Transport,
    TransportEvent,
};
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Where and how to reach the MQTT broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    /// Capacity of the request channel between the client handle and the event loop.
    pub request_capacity: usize,
}

impl MqttSettings {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            keep_alive: Duration::from_secs(30),
            request_capacity: 64,
        }
    }
}

struct Route {
    id: SubscriptionId,
    filter: Topic,
    sender: UnboundedSender<TransportEvent>,
}

#[derive(Default)]
struct RouteTable {
    next_id: u64,
    routes: Vec<Route>,
}

impl RouteTable {
    fn insert(
        &mut self,
        filter: Topic,
        sender: UnboundedSender<TransportEvent>,
    ) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id);
        self.next_id += 1;
        self.routes.push(Route { id, filter, sender });
        id
    }

    /// Removes the route and returns its filter if no other route still uses it.
    fn remove(&mut self, id: SubscriptionId) -> Option<Topic> {
        let index = self.routes.iter().position(|route| route.id == id)?;
        let removed = self.routes.remove(index);
        let shared = self.routes.iter().any(|route| route.filter == removed.filter);
        (!shared).then_some(removed.filter)
    }
}

type Routes = Arc<Mutex<RouteTable>>;

struct Connection {
    client: AsyncClient,
    pump: JoinHandle<()>,
}

/// A shared MQTT client connection.
pub struct MqttTransport {
    settings: MqttSettings,
    routes: Routes,
    connection: Mutex<Option<Connection>>,
}

impl MqttTransport {
    #[must_use]
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            routes: Arc::new(Mutex::new(RouteTable::default())),
            connection: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    fn client(&self) -> Option<AsyncClient> {
        self.connection
            .lock()
            .as_ref()
            .filter(|c| !c.pump.is_finished())
            .map(|c| c.client.clone())
    }

    /// Disconnects from the broker. Subscriptions receive `ConnectionLost`.
    pub async fn disconnect(&self) {
        let connection = self.connection.lock().take();
        if let Some(connection) = connection {
            let _ = connection.client.disconnect().await;
            connection.pump.abort();
            fail_routes(&self.routes, "client disconnected");
        }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&self, client_id: &ClientId) -> Result<()> {
        if self.client().is_some() {
            debug!("reusing MQTT connection for client {client_id}");
            return Ok(());
        }

        let mut options = MqttOptions::new(
            client_id.as_str(),
            self.settings.host.clone(),
            self.settings.port,
        );
        options.set_keep_alive(self.settings.keep_alive);
        options.set_clean_session(true);

        let (client, mut event_loop) = AsyncClient::new(options, self.settings.request_capacity);
        wait_for_connack(&mut event_loop).await?;
        info!(
            "MQTT client {client_id} connected to {}:{}",
            self.settings.host, self.settings.port
        );

        let pump = tokio::spawn(pump_events(event_loop, self.routes.clone()));
        let previous = self.connection.lock().replace(Connection { client, pump });
        if let Some(previous) = previous {
            previous.pump.abort();
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        let client = self
            .client()
            .ok_or_else(|| FeedError::subscription(topic.as_str(), "not connected"))?;

        let (tx, rx) = mpsc::unbounded();
        let id = self.routes.lock().insert(topic.clone(), tx);

        if let Err(e) = client.subscribe(topic.as_str(), QoS::AtMostOnce).await {
            self.routes.lock().remove(id);
            return Err(FeedError::subscription(topic.as_str(), e.to_string()));
        }
        Ok(Subscription::new(id, Box::pin(rx)))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let Some(filter) = self.routes.lock().remove(id) else {
            return Ok(());
        };
        match self.client() {
            Some(client) => client
                .unsubscribe(filter.as_str())
                .await
                .map_err(|e| FeedError::subscription(filter.as_str(), e.to_string())),
            // Nothing to tell a broker we are no longer connected to.
            None => Ok(()),
        }
    }

    fn is_connected(&self) -> bool {
        self.client().is_some()
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<()> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(FeedError::transport_connection(e.to_string())),
        }
    }
}

async fn pump_events(mut event_loop: EventLoop, routes: Routes) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                dispatch(&routes, &publish.topic, &publish.payload);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT connection lost: {e}");
                fail_routes(&routes, &e.to_string());
                return;
            }
        }
    }
}

fn dispatch(routes: &Routes, topic: &str, payload: &[u8]) {
    routes.lock().routes.retain(|route| {
        !route.filter.matches(topic)
            || route
                .sender
                .unbounded_send(TransportEvent::message(topic, payload.to_vec()))
                .is_ok()
    });
}

fn fail_routes(routes: &Routes, reason: &str) {
    let drained: Vec<Route> = routes.lock().routes.drain(..).collect();
    for route in drained {
        let _ = route
            .sender
            .unbounded_send(TransportEvent::connection_lost(reason));
    }
}
