// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use livefeed_broker::MemoryBroker;
use livefeed_core::{FeedError, Sample, SampleValue, StreamId};
use livefeed_exec::{
    observations_url, parse_observation_page, FeedSession, FeedStats, HistorySource,
};
use livefeed_test_utils::fixtures::{
    label_at, numbered_samples, observation, observation_json, observation_page, STREAM_ID,
};
use livefeed_test_utils::RecordingSink;
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_observations_url_includes_stream_and_top() -> anyhow::Result<()> {
    let id = StreamId::parse("7")?;

    assert_eq!(
        observations_url("http://gost:8080/v1.0", &id, 20),
        "http://gost:8080/v1.0/Datastreams(7)/Observations?$top=20"
    );
    Ok(())
}

#[test]
fn test_page_keeps_order_and_skips_bad_items() -> anyhow::Result<()> {
    // Arrange
    let body = observation_page(vec![
        observation_json("t0", 1.5),
        json!({ "result": 2 }),
        observation_json("t1", "high"),
        json!("not an object"),
        json!({ "resultTime": "t2", "result": 3 }),
    ]);

    // Act
    let samples = parse_observation_page(&body)?;

    // Assert
    assert_eq!(
        samples,
        vec![
            Sample::new("t0", 1.5),
            Sample::new("t1", "high"),
            Sample::new("t2", SampleValue::Number(3.0)),
        ]
    );
    Ok(())
}

#[test]
fn test_page_without_value_array_is_malformed() {
    let bodies: [&[u8]; 3] = [b"not json", br#"{"items": []}"#, b"[1, 2]"];
    for body in bodies {
        let result = parse_observation_page(body);

        assert!(matches!(result, Err(FeedError::MalformedPayload { .. })));
    }
}

#[test]
fn test_empty_page_has_no_samples() -> anyhow::Result<()> {
    let samples = parse_observation_page(&observation_page(Vec::new()))?;

    assert!(samples.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_slice_source_returns_most_recent() -> anyhow::Result<()> {
    let history = numbered_samples(10);
    let id = StreamId::parse(STREAM_ID)?;

    let recent = history.as_slice().recent_samples(&id, 3).await?;

    assert_eq!(recent, history[7..].to_vec());
    Ok(())
}

#[tokio::test]
async fn test_seed_fills_buffer_with_one_redraw() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let sink = RecordingSink::new();
    let mut session = FeedSession::start(STREAM_ID, Arc::new(broker.transport()), sink.clone()).await?;

    // Act
    let added = session.seed(numbered_samples(60));

    // Assert
    assert_eq!(added, 60);
    assert_eq!(session.buffer().len(), 50);
    assert_eq!(session.buffer().labels()[0], label_at(10));
    assert_eq!(sink.redraw_count(), 1);
    assert_eq!(
        session.stats(),
        FeedStats {
            seeded: 60,
            evicted: 10,
            ..FeedStats::default()
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_seed_from_source_then_live() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let sink = RecordingSink::new();
    let mut session = FeedSession::start(STREAM_ID, Arc::new(broker.transport()), sink.clone()).await?;
    let history = numbered_samples(5);

    // Act
    let added = session.seed_from(history.as_slice(), 2).await?;
    session.on_message(&observation("live", 99));

    // Assert
    assert_eq!(added, 2);
    assert_eq!(
        session.buffer().labels(),
        &[label_at(3), label_at(4), "live".to_string()]
    );
    assert_eq!(sink.redraw_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_seed_after_stop_is_ignored() -> anyhow::Result<()> {
    let broker = MemoryBroker::new();
    let sink = RecordingSink::new();
    let mut session = FeedSession::start(STREAM_ID, Arc::new(broker.transport()), sink.clone()).await?;
    session.stop().await;

    let added = session.seed(numbered_samples(3));

    assert_eq!(added, 0);
    assert!(session.buffer().is_empty());
    assert_eq!(sink.redraw_count(), 0);
    Ok(())
}
