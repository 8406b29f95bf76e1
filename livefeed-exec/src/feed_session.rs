// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A live subscription to one datastream's observations.
//!
//! A [`FeedSession`] subscribes to `Datastreams(<id>)/Observations`, parses each
//! incoming observation into a [`Sample`], appends it to a bounded
//! [`RollingBuffer`] and hands the whole window to its [`DisplaySink`].
//!
//! Messages are handled one at a time, in transport delivery order, and a message
//! that does not parse is dropped without touching the buffer or the sink.
//! Connection loss moves the session to `Disconnected`; what happens next is up to
//! its [`ReconnectPolicy`]. After [`FeedSession::stop`] every event is ignored.
//!
//! ## Example
//!
//! ```
//! use livefeed_broker::MemoryBroker;
//! use livefeed_core::{SampleValue, SessionState};
//! use livefeed_exec::FeedSession;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> livefeed_core::Result<()> {
//! let broker = MemoryBroker::new();
//! let sink = |labels: &[String], values: &[SampleValue]| {
//!     println!("{} samples, latest {:?}", values.len(), labels.last());
//! };
//!
//! let mut session = FeedSession::start("12", Arc::new(broker.transport()), sink).await?;
//! assert_eq!(session.state(), SessionState::Subscribed);
//!
//! broker.publish(
//!     "Datastreams(12)/Observations",
//!     r#"{"phenomenonTime":"2024-01-01T00:00:00Z","result":21.5}"#,
//! );
//! if let Some(event) = session.next_event().await {
//!     session.handle_event(event);
//! }
//! assert_eq!(session.buffer().values(), &[SampleValue::Number(21.5)]);
//!
//! session.stop().await;
//! # Ok(())
//! # }
//! ```

use crate::history::HistorySource;
use crate::reconnect::ReconnectPolicy;
use futures::StreamExt;
use livefeed_core::{
    ClientId, DisplaySink, EventStream, FeedError, Result, RollingBuffer, Sample, SessionState,
    StreamId, SubscriptionId, Topic, Transport, TransportEvent, MAX_SAMPLES,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Settings for a [`FeedSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// Rolling window size. Must be at least 1.
    pub capacity: usize,
    pub reconnect: ReconnectPolicy,
    /// Prefix for generated client ids. `None` uses a bare UUID.
    pub client_prefix: Option<String>,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            capacity: MAX_SAMPLES,
            reconnect: ReconnectPolicy::Manual,
            client_prefix: None,
        }
    }
}

/// What [`FeedSession::on_message`] did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// Appended to the buffer; `evicted` is true if the oldest sample was dropped.
    Appended { evicted: bool },
    /// The payload did not parse.
    Dropped,
    /// The session is not subscribed, or the message is for another topic.
    Ignored,
}

/// Counters since the session started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub ingested: u64,
    pub dropped: u64,
    pub evicted: u64,
    pub seeded: u64,
    pub reconnects: u64,
}

/// A live subscription feeding a rolling window into a display sink.
///
/// See the [module documentation](self) for examples and more details.
pub struct FeedSession<T: ?Sized, S> {
    stream_id: StreamId,
    topic: Topic,
    client_id: ClientId,
    transport: Arc<T>,
    sink: S,
    buffer: RollingBuffer,
    state: SessionState,
    subscription: Option<SubscriptionId>,
    events: Option<EventStream>,
    options: FeedOptions,
    stats: FeedStats,
    failed_attempts: u32,
}

impl<T, S> FeedSession<T, S>
where
    T: Transport + ?Sized,
    S: DisplaySink,
{
    /// Starts a session with default options.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::InvalidStreamId` if `stream_id` cannot form a topic. A
    /// broker that cannot be reached is not an error: the session starts
    /// `Disconnected`.
    pub async fn start(stream_id: &str, transport: Arc<T>, sink: S) -> Result<Self> {
        Self::start_with(stream_id, transport, sink, FeedOptions::default()).await
    }

    /// Starts a session with explicit options.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::InvalidStreamId` for an unusable id and
    /// `FeedError::Config` for a zero capacity or an invalid reconnect policy.
    pub async fn start_with(
        stream_id: &str,
        transport: Arc<T>,
        sink: S,
        options: FeedOptions,
    ) -> Result<Self> {
        let stream_id = StreamId::parse(stream_id)?;
        if options.capacity == 0 {
            return Err(FeedError::config("feed capacity must be at least 1"));
        }
        options.reconnect.validate()?;

        let topic = Topic::for_stream(&stream_id);
        let client_id = fresh_client_id(&options);
        let mut session = Self {
            buffer: RollingBuffer::with_capacity(options.capacity),
            stream_id,
            topic,
            client_id,
            transport,
            sink,
            state: SessionState::Connecting,
            subscription: None,
            events: None,
            options,
            stats: FeedStats::default(),
            failed_attempts: 0,
        };
        session.sink.connection_changed(SessionState::Connecting);
        session.open().await;
        Ok(session)
    }

    /// Parses `payload` and, if valid, appends it and redraws the sink.
    ///
    /// Ignored unless the session is `Subscribed`.
    pub fn on_message(&mut self, payload: &[u8]) -> Ingest {
        if !self.state.accepts_messages() {
            return Ingest::Ignored;
        }

        let sample = match Sample::from_payload(payload) {
            Ok(sample) => sample,
            Err(e) => {
                self.stats.dropped += 1;
                debug!("dropping message on {}: {e}", self.topic);
                return Ingest::Dropped;
            }
        };

        let evicted = self.buffer.push(sample).is_some();
        self.stats.ingested += 1;
        if evicted {
            self.stats.evicted += 1;
        }
        self.redraw();
        Ingest::Appended { evicted }
    }

    /// Applies one transport event.
    pub fn handle_event(&mut self, event: TransportEvent) -> Ingest {
        match event {
            TransportEvent::Message { topic, payload } => {
                if self.topic.matches(&topic) {
                    self.on_message(&payload)
                } else {
                    Ingest::Ignored
                }
            }
            TransportEvent::ConnectionLost { reason } => {
                self.connection_lost(&reason);
                Ingest::Ignored
            }
        }
    }

    /// Waits for the next event of the current subscription.
    ///
    /// Returns `None` when there is no subscription or it has ended.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.events.as_mut() {
            Some(events) => events.next().await,
            None => None,
        }
    }

    /// Appends historical samples, oldest first, with a single redraw.
    ///
    /// Returns the number of samples appended; zero once stopped.
    pub fn seed<I>(&mut self, samples: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        if self.state.is_terminal() {
            return 0;
        }

        let before = self.buffer.len();
        let mut added = 0usize;
        let evicted = self.buffer.extend(samples.into_iter().inspect(|_| added += 1));
        self.stats.seeded += added as u64;
        self.stats.evicted += evicted as u64;
        debug!(
            "seeded {added} samples on {} ({before} -> {})",
            self.topic,
            self.buffer.len()
        );
        if added > 0 {
            self.redraw();
        }
        added
    }

    /// Fetches the most recent `top` observations from `source` and seeds them.
    ///
    /// # Errors
    ///
    /// Propagates the source's error; the buffer is left unchanged.
    pub async fn seed_from<H>(&mut self, source: &H, top: usize) -> Result<usize>
    where
        H: HistorySource + ?Sized,
    {
        let samples = source.recent_samples(&self.stream_id, top).await?;
        Ok(self.seed(samples))
    }

    /// Tries to re-establish the subscription with a fresh client id.
    ///
    /// Only acts when `Disconnected`. Returns `true` if the session is subscribed
    /// afterwards.
    pub async fn reconnect(&mut self) -> bool {
        if self.state != SessionState::Disconnected {
            return self.state == SessionState::Subscribed;
        }
        self.stats.reconnects += 1;
        self.client_id = fresh_client_id(&self.options);
        self.transition(SessionState::Connecting);
        self.open().await
    }

    /// Drives the session until it is stopped, `cancel` fires, or the reconnect
    /// policy gives up. Returns the state it ended in.
    pub async fn run(&mut self, cancel: &CancellationToken) -> SessionState {
        loop {
            match self.state {
                SessionState::Subscribed => {
                    let event = tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        event = self.next_event() => event,
                    };
                    match event {
                        Some(event) => {
                            self.handle_event(event);
                        }
                        None => self.connection_lost("subscription ended"),
                    }
                }
                SessionState::Disconnected => {
                    let Some(delay) = self.options.reconnect.delay_for(self.failed_attempts)
                    else {
                        debug!("not reconnecting {} after {} attempts", self.topic, self.failed_attempts);
                        break;
                    };
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                    if self.reconnect().await {
                        self.failed_attempts = 0;
                    } else {
                        self.failed_attempts += 1;
                    }
                }
                SessionState::Connecting | SessionState::Stopped => break,
            }
        }
        self.state
    }

    /// Removes this session's subscription, clears the buffer and makes the
    /// session terminal. Other sessions sharing the transport, even on the same
    /// topic, keep their subscriptions.
    ///
    /// Idempotent: later calls do nothing and never reach the transport.
    pub async fn stop(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        self.events = None;
        self.release_subscription().await;
        self.buffer.clear();
        self.transition(SessionState::Stopped);
        info!("stopped feed on {}", self.topic);
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Client id of the latest connection attempt.
    #[must_use]
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    #[must_use]
    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    #[must_use]
    pub fn options(&self) -> &FeedOptions {
        &self.options
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    async fn open(&mut self) -> bool {
        self.release_subscription().await;
        let subscribed = match self.transport.connect(&self.client_id).await {
            Ok(()) => self.transport.subscribe(&self.topic).await,
            Err(e) => Err(e),
        };

        match subscribed {
            Ok(subscription) => {
                self.subscription = Some(subscription.id);
                self.events = Some(subscription.events);
                self.transition(SessionState::Subscribed);
                info!("client {} subscribed to {}", self.client_id, self.topic);
                true
            }
            Err(e) => {
                warn!("could not subscribe to {}: {e}", self.topic);
                self.transition(SessionState::Disconnected);
                false
            }
        }
    }

    /// Drops the id held from the previous subscription, if any. Transports ignore
    /// ids whose routes are already gone.
    async fn release_subscription(&mut self) {
        if let Some(id) = self.subscription.take() {
            if let Err(e) = self.transport.unsubscribe(id).await {
                warn!("unsubscribe from {} failed: {e}", self.topic);
            }
        }
    }

    fn connection_lost(&mut self, reason: &str) {
        if self.state != SessionState::Subscribed {
            return;
        }
        warn!("connection lost on {}: {reason}", self.topic);
        self.events = None;
        self.transition(SessionState::Disconnected);
    }

    fn transition(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        self.state = next;
        self.sink.connection_changed(next);
    }

    fn redraw(&mut self) {
        self.sink.redraw(self.buffer.labels(), self.buffer.values());
    }
}

impl<T: ?Sized, S> Drop for FeedSession<T, S> {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            debug!("feed on {} dropped without stop", self.topic);
        }
    }
}

fn fresh_client_id(options: &FeedOptions) -> ClientId {
    options
        .client_prefix
        .as_deref()
        .map_or_else(ClientId::generate, ClientId::with_prefix)
}
