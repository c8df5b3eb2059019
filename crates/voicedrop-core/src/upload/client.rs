use crate::{CoreError, CoreResult, UploadOutcome};

use std::{error::Error as StdError, panic::Location};

use async_trait::async_trait;
use error_location::ErrorLocation;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use tracing::{debug, info, instrument, warn};

/// Field name the ingestion endpoint expects the audio under.
pub const DEFAULT_FIELD_NAME: &str = "audio_file";

/// Where and under which field artifacts are uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Absolute http(s) URL receiving the POST.
    pub endpoint: String,
    /// Multipart field name for the file part.
    pub field_name: String,
}

impl UploadTarget {
    /// Target using [`DEFAULT_FIELD_NAME`].
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
        }
    }
}

/// Submits an encoded body, once, and classifies the result.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// POSTs `body` to `endpoint` with the given `Content-Type` header.
    async fn upload(&self, body: Vec<u8>, content_type: &str, endpoint: &str) -> UploadOutcome;
}

/// Parses `endpoint`, accepting only absolute http(s) URLs with a host.
pub fn parse_endpoint(endpoint: &str) -> Option<Url> {
    let url = Url::parse(endpoint.trim()).ok()?;
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    let host_ok = url.host_str().is_some_and(|host| !host.is_empty());

    (scheme_ok && host_ok).then_some(url)
}

/// HTTP [`Uploader`] using the transport's default timeouts.
pub struct UploadClient {
    http: Client,
}

impl UploadClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::HttpClientError`] if the TLS backend cannot be
    /// initialized.
    #[track_caller]
    pub fn new() -> CoreResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| CoreError::HttpClientError {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self { http })
    }

    /// Wraps a preconfigured client (proxy or TLS settings).
    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }
}

/// Flattens an error and its sources into one line.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl Uploader for UploadClient {
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    async fn upload(&self, body: Vec<u8>, content_type: &str, endpoint: &str) -> UploadOutcome {
        let Some(url) = parse_endpoint(endpoint) else {
            warn!(endpoint, "Refusing upload to invalid endpoint");
            return UploadOutcome::InvalidEndpoint {
                endpoint: endpoint.to_string(),
            };
        };

        let start = std::time::Instant::now();

        let response = match self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let cause = error_chain(&e);
                warn!(cause = %cause, "Upload request failed");
                return UploadOutcome::TransportError { cause };
            }
        };

        let status = response.status();

        // A body cut off mid-read is a transport failure regardless of status.
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let cause = error_chain(&e);
                warn!(
                    status_code = status.as_u16(),
                    cause = %cause,
                    "Upload response unreadable"
                );
                return UploadOutcome::TransportError { cause };
            }
        };

        info!(
            status_code = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Upload responded"
        );

        if status.is_success() {
            debug!(response = %text, "Server response");
            return UploadOutcome::Success;
        }

        let body = (!text.is_empty()).then_some(text);
        warn!(status_code = status.as_u16(), body = ?body, "Server rejected upload");

        UploadOutcome::ServerError {
            status_code: status.as_u16(),
            body,
        }
    }
}
