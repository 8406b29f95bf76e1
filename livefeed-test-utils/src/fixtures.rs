// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Observation payloads used across the test suites.

use livefeed_core::{Sample, SampleValue};
use serde_json::{json, Value};

pub const STREAM_ID: &str = "12";
pub const STREAM_TOPIC: &str = "Datastreams(12)/Observations";

/// `{"phenomenonTime": label, "result": value}`.
pub fn observation_json(label: &str, value: impl Into<Value>) -> Value {
    json!({ "phenomenonTime": label, "result": value.into() })
}

/// Serialized [`observation_json`].
pub fn observation(label: &str, value: impl Into<Value>) -> Vec<u8> {
    observation_json(label, value).to_string().into_bytes()
}

/// Timestamp label for the `i`-th sample of a minute-spaced series.
pub fn label_at(i: usize) -> String {
    format!("2024-01-01T{:02}:{:02}:00Z", (i / 60) % 24, i % 60)
}

/// `count` numeric samples labelled with [`label_at`], values `0.0, 1.0, ...`.
pub fn numbered_samples(count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| Sample::new(label_at(i), SampleValue::Number(i as f64)))
        .collect()
}

/// An observation page wrapping `items`.
pub fn observation_page(items: Vec<Value>) -> Vec<u8> {
    json!({ "value": items }).to_string().into_bytes()
}

pub fn temperature_reading() -> Vec<u8> {
    observation("2024-01-01T00:00:00Z", 21.5)
}

pub fn status_reading() -> Vec<u8> {
    observation("2024-01-01T00:01:00Z", "ok")
}

/// Payloads that must never reach a buffer.
pub fn malformed_payloads() -> Vec<Vec<u8>> {
    vec![
        b"not json".to_vec(),
        b"[]".to_vec(),
        br#"["2020-01-01T00:00:00Z", null, 5]"#.to_vec(),
        br#"{"result": 1}"#.to_vec(),
        br#"{"phenomenonTime": "", "result": 1}"#.to_vec(),
        br#"{"phenomenonTime": "t0"}"#.to_vec(),
        br#"{"phenomenonTime": "t0", "result": {"nested": true}}"#.to_vec(),
    ]
}
