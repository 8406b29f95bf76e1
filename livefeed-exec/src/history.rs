// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Seeding a session with recent observations.
//!
//! The REST API returns a page shaped like `{"value": [observation, ...]}` for
//! `GET {base}/Datastreams(<id>)/Observations?$top=<n>`. Items that do not parse as
//! a sample are skipped; the order of the page is kept.

use async_trait::async_trait;
use livefeed_core::{FeedError, Result, Sample, StreamId};
use serde::Deserialize;
use serde_json::Value;

/// Builds the observations URL for `stream`, limited to `top` items.
///
/// ```
/// use livefeed_core::StreamId;
/// use livefeed_exec::history::observations_url;
///
/// let id = StreamId::parse("12").unwrap();
/// assert_eq!(
///     observations_url("http://localhost:8080/v1.0/", &id, 50),
///     "http://localhost:8080/v1.0/Datastreams(12)/Observations?$top=50"
/// );
/// ```
#[must_use]
pub fn observations_url(base_url: &str, stream: &StreamId, top: usize) -> String {
    format!(
        "{}/Datastreams({stream})/Observations?$top={top}",
        base_url.trim_end_matches('/')
    )
}

#[derive(Deserialize)]
struct ObservationPage {
    value: Vec<Value>,
}

/// Parses an observation page into samples.
///
/// # Errors
///
/// Returns `FeedError::MalformedPayload` if the body is not a page object.
pub fn parse_observation_page(body: &[u8]) -> Result<Vec<Sample>> {
    let page: ObservationPage = serde_json::from_slice(body)
        .map_err(|e| FeedError::malformed_payload(format!("observation page: {e}")))?;

    Ok(page
        .value
        .iter()
        .filter_map(|item| match Sample::from_json(item) {
            Ok(sample) => Some(sample),
            Err(e) => {
                debug!("skipping history item: {e}");
                None
            }
        })
        .collect())
}

/// Where past observations come from.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Up to `top` recent samples of `stream`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::History` if the source cannot be read and
    /// `FeedError::MalformedPayload` if its answer cannot be parsed.
    async fn recent_samples(&self, stream: &StreamId, top: usize) -> Result<Vec<Sample>>;
}

#[async_trait]
impl HistorySource for [Sample] {
    async fn recent_samples(&self, _stream: &StreamId, top: usize) -> Result<Vec<Sample>> {
        let skip = self.len().saturating_sub(top);
        Ok(self[skip..].to_vec())
    }
}

#[cfg(feature = "http")]
pub use self::http::HttpHistorySource;

#[cfg(feature = "http")]
mod http {
    use super::{observations_url, parse_observation_page, HistorySource};
    use async_trait::async_trait;
    use livefeed_core::{FeedError, Result, Sample, StreamId};

    /// Reads history from the REST endpoint with `reqwest`.
    #[derive(Debug, Clone)]
    pub struct HttpHistorySource {
        client: reqwest::Client,
        base_url: String,
    }

    impl HttpHistorySource {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self::with_client(reqwest::Client::new(), base_url)
        }

        pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
            Self {
                client,
                base_url: base_url.into(),
            }
        }

        #[must_use]
        pub fn base_url(&self) -> &str {
            &self.base_url
        }
    }

    #[async_trait]
    impl HistorySource for HttpHistorySource {
        async fn recent_samples(&self, stream: &StreamId, top: usize) -> Result<Vec<Sample>> {
            let url = observations_url(&self.base_url, stream, top);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| FeedError::history(format!("GET {url}: {e}")))?;
            let body = response
                .bytes()
                .await
                .map_err(|e| FeedError::history(format!("reading {url}: {e}")))?;
            debug!("fetched {} bytes of history from {url}", body.len());
            parse_observation_page(&body)
        }
    }
}
