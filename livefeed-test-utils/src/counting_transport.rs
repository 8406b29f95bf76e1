// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Transport wrapper that counts calls and injects failures.

use async_trait::async_trait;
use livefeed_core::{
    ClientId, FeedError, Result, Subscription, SubscriptionId, Topic, Transport,
};
use parking_lot::Mutex;

/// Number of calls made through a [`CountingTransport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub connect: usize,
    pub subscribe: usize,
    pub unsubscribe: usize,
}

#[derive(Default)]
struct Faults {
    connects: usize,
    subscribes: usize,
}

/// Wraps a transport, counting every call and failing the next N connects or
/// subscribes on request.
///
/// Counts include injected failures.
pub struct CountingTransport<T> {
    inner: T,
    counts: Mutex<CallCounts>,
    faults: Mutex<Faults>,
    client_ids: Mutex<Vec<ClientId>>,
}

impl<T> CountingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            counts: Mutex::new(CallCounts::default()),
            faults: Mutex::new(Faults::default()),
            client_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn counts(&self) -> CallCounts {
        *self.counts.lock()
    }

    /// Client ids passed to `connect`, in call order.
    pub fn client_ids(&self) -> Vec<ClientId> {
        self.client_ids.lock().clone()
    }

    /// The next `n` connects fail with `TransportConnection`.
    pub fn fail_next_connects(&self, n: usize) {
        self.faults.lock().connects = n;
    }

    /// The next `n` subscribes fail with `Subscription`.
    pub fn fail_next_subscribes(&self, n: usize) {
        self.faults.lock().subscribes = n;
    }
}

fn take_fault(remaining: &mut usize) -> bool {
    if *remaining == 0 {
        return false;
    }
    *remaining -= 1;
    true
}

#[async_trait]
impl<T: Transport> Transport for CountingTransport<T> {
    async fn connect(&self, client_id: &ClientId) -> Result<()> {
        self.counts.lock().connect += 1;
        self.client_ids.lock().push(client_id.clone());
        let fail = take_fault(&mut self.faults.lock().connects);
        if fail {
            return Err(FeedError::transport_connection("injected connect failure"));
        }
        self.inner.connect(client_id).await
    }

    async fn subscribe(&self, topic: &Topic) -> Result<Subscription> {
        self.counts.lock().subscribe += 1;
        let fail = take_fault(&mut self.faults.lock().subscribes);
        if fail {
            return Err(FeedError::subscription(
                topic.as_str(),
                "injected subscribe failure",
            ));
        }
        self.inner.subscribe(topic).await
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.counts.lock().unsubscribe += 1;
        self.inner.unsubscribe(id).await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }
}
