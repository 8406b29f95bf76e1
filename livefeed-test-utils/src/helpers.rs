// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::StreamExt;
use futures::Stream;
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub async fn assert_no_event_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
    T: std::fmt::Debug,
{
    tokio::select! {
        event = stream.next() => {
            if let Some(event) = event {
                panic!("Unexpected event emitted, expected no output: {event:?}");
            }
        }
        () = sleep(Duration::from_millis(timeout_ms)) => {
        }
    }
}

/// Waits for the next item, panicking on timeout or on the end of the stream.
pub async fn unwrap_event<S, T>(stream: &mut S, timeout_ms: u64) -> T
where
    S: Stream<Item = T> + Unpin,
{
    match timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        Ok(Some(event)) => event,
        Ok(None) => panic!("Expected an event but stream ended"),
        Err(_) => panic!("Timeout: No event received within {timeout_ms} ms"),
    }
}

pub async fn assert_stream_ended<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
    T: std::fmt::Debug,
{
    match timeout(Duration::from_millis(timeout_ms), stream.next()).await {
        Ok(None) => {}
        Ok(Some(event)) => panic!("Expected stream to end, got {event:?}"),
        Err(_) => panic!("Timeout: stream did not end within {timeout_ms} ms"),
    }
}
