// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use livefeed_broker::{MemoryBroker, MemoryTransport};
use livefeed_core::{
    FeedError, SampleValue, SessionState, Transport as _, TransportEvent, MAX_SAMPLES,
};
use livefeed_exec::{FeedOptions, FeedSession, FeedStats, Ingest};
use livefeed_test_utils::fixtures::{
    label_at, malformed_payloads, observation, status_reading, temperature_reading, STREAM_ID,
    STREAM_TOPIC,
};
use livefeed_test_utils::{CountingTransport, RecordingSink};
use std::sync::Arc;

type Counted = CountingTransport<MemoryTransport>;

async fn started(
    broker: &MemoryBroker,
) -> anyhow::Result<(FeedSession<Counted, RecordingSink>, Arc<Counted>, RecordingSink)> {
    let transport = Arc::new(CountingTransport::new(broker.transport()));
    let sink = RecordingSink::new();
    let session = FeedSession::start(STREAM_ID, transport.clone(), sink.clone()).await?;
    Ok((session, transport, sink))
}

async fn deliver_next(session: &mut FeedSession<Counted, RecordingSink>) -> Ingest {
    let event = session.next_event().await.expect("expected a transport event");
    session.handle_event(event)
}

#[tokio::test]
async fn test_start_subscribes_to_stream_topic() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();

    // Act
    let (session, transport, sink) = started(&broker).await?;

    // Assert
    assert_eq!(session.state(), SessionState::Subscribed);
    assert_eq!(session.topic().as_str(), STREAM_TOPIC);
    assert_eq!(session.stream_id().as_str(), STREAM_ID);
    assert!(session.buffer().is_empty());
    assert_eq!(session.buffer().capacity(), MAX_SAMPLES);
    assert_eq!(broker.subscription_count(), 1);
    assert_eq!(transport.client_ids(), vec![session.client_id().clone()]);
    assert_eq!(
        sink.states(),
        vec![SessionState::Connecting, SessionState::Subscribed]
    );
    assert_eq!(sink.redraw_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_valid_observation_is_appended_and_drawn() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;

    // Act
    broker.publish(STREAM_TOPIC, temperature_reading());
    let ingest = deliver_next(&mut session).await;

    // Assert
    assert_eq!(ingest, Ingest::Appended { evicted: false });
    assert_eq!(session.buffer().labels(), &["2024-01-01T00:00:00Z".to_string()]);
    assert_eq!(session.buffer().values(), &[SampleValue::Number(21.5)]);
    assert_eq!(sink.redraw_count(), 1);
    let frame = sink.last_frame().expect("a frame");
    assert_eq!(frame.labels, session.buffer().labels());
    assert_eq!(frame.values, session.buffer().values());
    Ok(())
}

#[tokio::test]
async fn test_text_results_are_kept_as_text() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, _sink) = started(&broker).await?;

    // Act
    broker.publish(STREAM_TOPIC, temperature_reading());
    broker.publish(STREAM_TOPIC, status_reading());
    deliver_next(&mut session).await;
    deliver_next(&mut session).await;

    // Assert
    assert_eq!(
        session.buffer().values(),
        &[SampleValue::Number(21.5), SampleValue::Text("ok".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn test_fifty_first_sample_evicts_the_oldest() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;

    // Act
    for i in 0..=MAX_SAMPLES {
        session.on_message(&observation(&label_at(i), i as f64));
    }

    // Assert
    assert_eq!(session.buffer().len(), MAX_SAMPLES);
    assert_eq!(session.buffer().labels()[0], label_at(1));
    assert_eq!(session.buffer().values()[0], SampleValue::Number(1.0));
    assert_eq!(
        session.buffer().latest(),
        Some((label_at(MAX_SAMPLES).as_str(), &SampleValue::Number(MAX_SAMPLES as f64)))
    );
    assert_eq!(sink.redraw_count(), MAX_SAMPLES + 1);
    assert_eq!(
        session.stats(),
        FeedStats {
            ingested: 51,
            evicted: 1,
            ..FeedStats::default()
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_eviction_is_reported() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let transport = Arc::new(broker.transport());
    let options = FeedOptions {
        capacity: 2,
        ..FeedOptions::default()
    };
    let mut session =
        FeedSession::start_with(STREAM_ID, transport, RecordingSink::new(), options).await?;

    // Act
    let first = session.on_message(&observation("t0", 0));
    let second = session.on_message(&observation("t1", 1));
    let third = session.on_message(&observation("t2", 2));

    // Assert
    assert_eq!(first, Ingest::Appended { evicted: false });
    assert_eq!(second, Ingest::Appended { evicted: false });
    assert_eq!(third, Ingest::Appended { evicted: true });
    assert_eq!(session.buffer().labels(), &["t1".to_string(), "t2".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_malformed_payloads_are_dropped() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;
    session.on_message(&temperature_reading());
    let before = session.buffer().clone();

    // Act
    let results: Vec<Ingest> = malformed_payloads()
        .iter()
        .map(|payload| session.on_message(payload))
        .collect();

    // Assert
    assert!(results.iter().all(|r| *r == Ingest::Dropped));
    assert_eq!(session.buffer(), &before);
    assert_eq!(sink.redraw_count(), 1);
    assert_eq!(session.stats().dropped, malformed_payloads().len() as u64);
    assert_eq!(session.state(), SessionState::Subscribed);
    Ok(())
}

#[tokio::test]
async fn test_not_json_message_changes_nothing() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;

    // Act
    broker.publish(STREAM_TOPIC, "not json");
    let ingest = deliver_next(&mut session).await;

    // Assert
    assert_eq!(ingest, Ingest::Dropped);
    assert!(session.buffer().is_empty());
    assert_eq!(sink.redraw_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_message_for_another_topic_is_ignored() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;

    // Act
    let ingest = session.handle_event(TransportEvent::message(
        "Datastreams(13)/Observations",
        temperature_reading(),
    ));

    // Assert
    assert_eq!(ingest, Ingest::Ignored);
    assert!(session.buffer().is_empty());
    assert_eq!(sink.redraw_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_stream_id_is_rejected() {
    // Arrange
    let broker = MemoryBroker::new();

    // Act
    let result =
        FeedSession::start("1/2", Arc::new(broker.transport()), RecordingSink::new()).await;

    // Assert
    assert!(matches!(result, Err(FeedError::InvalidStreamId { .. })));
    assert_eq!(broker.subscription_count(), 0);
}

#[tokio::test]
async fn test_stop_unsubscribes_and_clears() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, transport, sink) = started(&broker).await?;
    session.on_message(&temperature_reading());

    // Act
    session.stop().await;

    // Assert
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.buffer().is_empty());
    assert_eq!(transport.counts().unsubscribe, 1);
    assert_eq!(broker.subscription_count(), 0);
    assert_eq!(sink.last_state(), Some(SessionState::Stopped));
    Ok(())
}

#[tokio::test]
async fn test_second_stop_is_a_no_op() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, transport, sink) = started(&broker).await?;
    session.stop().await;
    let states_after_first_stop = sink.states();

    // Act
    session.stop().await;

    // Assert
    assert_eq!(transport.counts().unsubscribe, 1);
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(sink.states(), states_after_first_stop);
    Ok(())
}

#[tokio::test]
async fn test_messages_after_stop_are_ignored() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;
    session.stop().await;

    // Act
    let direct = session.on_message(&temperature_reading());
    let routed = session.handle_event(TransportEvent::message(STREAM_TOPIC, temperature_reading()));
    let delivered = broker.publish(STREAM_TOPIC, temperature_reading());

    // Assert
    assert_eq!(direct, Ingest::Ignored);
    assert_eq!(routed, Ingest::Ignored);
    assert_eq!(delivered, 0);
    assert!(session.next_event().await.is_none());
    assert!(session.buffer().is_empty());
    assert_eq!(sink.redraw_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_connection_loss_marks_session_disconnected() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;
    session.on_message(&temperature_reading());

    // Act
    broker.set_online(false);
    deliver_next(&mut session).await;

    // Assert
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        sink.states(),
        vec![
            SessionState::Connecting,
            SessionState::Subscribed,
            SessionState::Disconnected
        ]
    );
    assert_eq!(session.buffer().len(), 1);
    assert_eq!(session.on_message(&status_reading()), Ingest::Ignored);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_broker_starts_disconnected() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    broker.set_online(false);

    // Act
    let (mut session, transport, sink) = started(&broker).await?;

    // Assert
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        sink.states(),
        vec![SessionState::Connecting, SessionState::Disconnected]
    );
    assert!(session.next_event().await.is_none());

    session.stop().await;
    assert_eq!(transport.counts().unsubscribe, 0);
    assert_eq!(session.state(), SessionState::Stopped);
    Ok(())
}

#[tokio::test]
async fn test_rejected_subscription_starts_disconnected() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let transport = Arc::new(CountingTransport::new(broker.transport()));
    transport.fail_next_subscribes(1);

    // Act
    let session = FeedSession::start(STREAM_ID, transport.clone(), RecordingSink::new()).await?;

    // Assert
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(transport.is_connected());
    Ok(())
}

#[tokio::test]
async fn test_reconnect_resubscribes_with_fresh_client_id() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, transport, sink) = started(&broker).await?;
    broker.set_online(false);
    deliver_next(&mut session).await;
    broker.set_online(true);

    // Act
    let reconnected = session.reconnect().await;
    broker.publish(STREAM_TOPIC, temperature_reading());
    let ingest = deliver_next(&mut session).await;

    // Assert
    assert!(reconnected);
    assert_eq!(ingest, Ingest::Appended { evicted: false });
    assert_eq!(session.stats().reconnects, 1);
    let ids = transport.client_ids();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(
        sink.states(),
        vec![
            SessionState::Connecting,
            SessionState::Subscribed,
            SessionState::Disconnected,
            SessionState::Connecting,
            SessionState::Subscribed
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_reconnect_is_ignored_unless_disconnected() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, transport, _sink) = started(&broker).await?;

    // Act
    let while_subscribed = session.reconnect().await;
    session.stop().await;
    let after_stop = session.reconnect().await;

    // Assert
    assert!(while_subscribed);
    assert!(!after_stop);
    assert_eq!(transport.counts().connect, 1);
    assert_eq!(session.stats().reconnects, 0);
    Ok(())
}

#[tokio::test]
async fn test_client_prefix_is_used() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let options = FeedOptions {
        client_prefix: Some("dashboard".to_string()),
        ..FeedOptions::default()
    };

    // Act
    let session = FeedSession::start_with(
        STREAM_ID,
        Arc::new(broker.transport()),
        RecordingSink::new(),
        options,
    )
    .await?;

    // Assert
    assert!(session.client_id().as_str().starts_with("dashboard-"));
    Ok(())
}

#[tokio::test]
async fn test_sessions_share_one_transport() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let transport = Arc::new(broker.transport());
    let mut first = FeedSession::start("1", transport.clone(), RecordingSink::new()).await?;
    let mut second = FeedSession::start("2", transport.clone(), RecordingSink::new()).await?;

    // Act
    broker.publish("Datastreams(1)/Observations", observation("t0", 1));
    broker.publish("Datastreams(2)/Observations", observation("t0", 2));
    let event = first.next_event().await.expect("event for stream 1");
    first.handle_event(event);
    let event = second.next_event().await.expect("event for stream 2");
    second.handle_event(event);

    // Assert
    assert_eq!(broker.connected_clients(), 1);
    assert_eq!(first.buffer().values(), &[SampleValue::Number(1.0)]);
    assert_eq!(second.buffer().values(), &[SampleValue::Number(2.0)]);

    first.stop().await;
    assert_eq!(broker.subscription_count(), 1);
    second.stop().await;
    assert_eq!(broker.subscription_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_stopping_one_view_keeps_the_other_on_the_same_stream() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let transport = Arc::new(CountingTransport::new(broker.transport()));
    let mut tile = FeedSession::start(STREAM_ID, transport.clone(), RecordingSink::new()).await?;
    let detail_sink = RecordingSink::new();
    let mut detail =
        FeedSession::start(STREAM_ID, transport.clone(), detail_sink.clone()).await?;

    // Act
    tile.stop().await;
    let delivered = broker.publish(STREAM_TOPIC, temperature_reading());
    let ingest = deliver_next(&mut detail).await;

    // Assert
    assert_eq!(transport.counts().unsubscribe, 1);
    assert_eq!(delivered, 1);
    assert_eq!(broker.subscription_count(), 1);
    assert_eq!(detail.state(), SessionState::Subscribed);
    assert_eq!(ingest, Ingest::Appended { evicted: false });
    assert_eq!(detail.buffer().values(), &[SampleValue::Number(21.5)]);
    assert_eq!(detail_sink.redraw_count(), 1);
    assert!(tile.next_event().await.is_none());

    detail.stop().await;
    assert_eq!(broker.subscription_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_zero_capacity_is_rejected() {
    // Arrange
    let broker = MemoryBroker::new();
    let options = FeedOptions {
        capacity: 0,
        ..FeedOptions::default()
    };

    // Act
    let result = FeedSession::start_with(
        STREAM_ID,
        Arc::new(broker.transport()),
        RecordingSink::new(),
        options,
    )
    .await;

    // Assert
    assert!(matches!(result, Err(FeedError::Config { .. })));
    assert_eq!(broker.subscription_count(), 0);
    assert_eq!(broker.connected_clients(), 0);
}

#[tokio::test]
async fn test_positional_array_payload_is_dropped() -> anyhow::Result<()> {
    // Arrange
    let broker = MemoryBroker::new();
    let (mut session, _transport, sink) = started(&broker).await?;

    // Act
    broker.publish(STREAM_TOPIC, r#"["2020-01-01T00:00:00Z", null, 5]"#);
    let ingest = deliver_next(&mut session).await;

    // Assert
    assert_eq!(ingest, Ingest::Dropped);
    assert!(session.buffer().is_empty());
    assert_eq!(sink.redraw_count(), 0);
    assert_eq!(session.stats().dropped, 1);
    Ok(())
}
