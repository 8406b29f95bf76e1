// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Live Feed Demo
//!
//! Runs a simulated Datastream on the in-process broker and prints every redraw:
//! - a publisher task emits one observation every 500 ms, plus the occasional
//!   malformed payload that the session drops
//! - the session is seeded with a short simulated history first
//!
//! Usage: `livefeed-demo [config.toml] [stream-id]`. Set `RUST_LOG` to adjust logging.

use anyhow::Result;
use livefeed::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct ConsoleChart {
    redraws: usize,
}

impl DisplaySink for ConsoleChart {
    fn redraw(&mut self, labels: &[String], values: &[SampleValue]) {
        self.redraws += 1;
        if let (Some(label), Some(value)) = (labels.last(), values.last()) {
            println!(
                "[{:>4}] {:>2} samples | latest {label} = {value}",
                self.redraws,
                values.len()
            );
        }
    }

    fn connection_changed(&mut self, state: SessionState) {
        println!("--- feed {state} ---");
    }
}

fn simulated_label(i: u64) -> String {
    format!("2024-01-01T{:02}:{:02}:{:02}Z", (i / 3600) % 24, (i / 60) % 60, i % 60)
}

fn simulated_value(i: u64) -> f64 {
    let t = i as f64 / 5.0;
    ((20.0 + 3.0 * t.sin()) * 100.0).round() / 100.0
}

fn publish_observations(broker: MemoryBroker, topic: String, start: u64, cancel: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        let mut i = start;
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if i % 7 == 0 {
                broker.publish(&topic, "not json");
            }
            let observation = serde_json::json!({
                "phenomenonTime": simulated_label(i),
                "result": simulated_value(i),
            });
            if let Err(e) = broker.publish_json(&topic, &observation) {
                tracing::warn!("publish failed: {e}");
            }
            i += 1;
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => LiveFeedConfig::load(path)?,
        None => LiveFeedConfig::default(),
    };
    let stream_id = args.next().unwrap_or_else(|| "1".to_string());

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCtrl+C received, shutting down...");
        }
        cancel_ctrlc.cancel();
    });

    let broker = MemoryBroker::new();
    let mut session = FeedSession::start_with(
        &stream_id,
        Arc::new(broker.transport()),
        ConsoleChart { redraws: 0 },
        config.feed_options(),
    )
    .await?;

    let history_len = 10u64.min(config.feed.seed_top as u64);
    let history: Vec<Sample> = (0..history_len)
        .map(|i| Sample::new(simulated_label(i), simulated_value(i)))
        .collect();
    session.seed(history);

    publish_observations(
        broker.clone(),
        session.topic().to_string(),
        history_len,
        cancel.clone(),
    );

    let state = session.run(&cancel).await;
    info!("feed loop ended in state {state}");
    session.stop().await;

    let stats = session.stats();
    info!(
        ingested = stats.ingested,
        dropped = stats.dropped,
        evicted = stats.evicted,
        seeded = stats.seeded,
        "feed stopped"
    );
    Ok(())
}
