// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Samples and the JSON boundary they are parsed at.
//!
//! A [`Sample`] is one `(label, value)` observation emitted by a Datastream. Payloads
//! arrive as SensorThings observation documents:
//!
//! ```json
//! {"phenomenonTime": "2020-01-01T00:00:00Z", "result": 5}
//! ```
//!
//! The label is taken from `phenomenonTime`, falling back to `resultTime`. The value
//! comes from `result` and must be a number or a string. Anything else is classified
//! as [`FeedError::MalformedPayload`].
//!
//! ```
//! use livefeed_core::{Sample, SampleValue};
//!
//! let sample = Sample::from_payload(br#"{"phenomenonTime":"2020-01-01T00:00:00Z","result":5}"#).unwrap();
//! assert_eq!(sample.label(), "2020-01-01T00:00:00Z");
//! assert_eq!(sample.value(), &SampleValue::Number(5.0));
//!
//! assert!(Sample::from_payload(b"not json").is_err());
//! ```

use core::fmt;
use livefeed_error::{FeedError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A measurement result: numeric or textual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Text(String),
}

impl SampleValue {
    /// Numeric view of the value, if it is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| FeedError::malformed_payload(format!("result {n} is not representable"))),
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(FeedError::malformed_payload(format!(
                "result must be a number or a string, got {}",
                json_kind(other)
            ))),
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for SampleValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for SampleValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One `(label, value)` observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    label: String,
    value: SampleValue,
}

impl Sample {
    pub fn new(label: impl Into<String>, value: impl Into<SampleValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn value(&self) -> &SampleValue {
        &self.value
    }

    /// Splits the sample into its label and value.
    #[must_use]
    pub fn into_parts(self) -> (String, SampleValue) {
        (self.label, self.value)
    }

    /// Decodes a raw message payload.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MalformedPayload`] if the payload is not a JSON object or
    /// lacks a usable timestamp or result.
    pub fn from_payload(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| FeedError::malformed_payload(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Decodes an already parsed observation document (a history page item).
    ///
    /// # Errors
    ///
    /// Same rules as [`Sample::from_payload`].
    pub fn from_json(value: &Value) -> Result<Self> {
        // Arrays would otherwise bind to the fields by position.
        if !value.is_object() {
            return Err(FeedError::malformed_payload(format!(
                "observation must be a JSON object, got {}",
                json_kind(value)
            )));
        }
        let payload = ObservationPayload::deserialize(value)
            .map_err(|e| FeedError::malformed_payload(e.to_string()))?;
        payload.try_into()
    }
}

#[derive(Deserialize)]
struct ObservationPayload {
    #[serde(rename = "phenomenonTime", default)]
    phenomenon_time: Option<Value>,
    #[serde(rename = "resultTime", default)]
    result_time: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
}

impl TryFrom<ObservationPayload> for Sample {
    type Error = FeedError;

    fn try_from(payload: ObservationPayload) -> Result<Self> {
        let label = payload
            .phenomenon_time
            .or(payload.result_time)
            .ok_or_else(|| FeedError::malformed_payload("missing phenomenonTime"))?;
        let label = match label {
            Value::String(s) if !s.trim().is_empty() => s,
            other => {
                return Err(FeedError::malformed_payload(format!(
                    "timestamp must be a non-empty string, got {}",
                    json_kind(&other)
                )))
            }
        };

        let result = payload
            .result
            .ok_or_else(|| FeedError::malformed_payload("missing result"))?;

        Ok(Self {
            label,
            value: SampleValue::from_json(&result)?,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
