use std::fmt;

/// Longest server response excerpt carried into user-facing messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The endpoint answered with a 2xx status.
    Success,
    /// The endpoint answered with a non-2xx status.
    ServerError {
        /// HTTP status code.
        status_code: u16,
        /// Response body, if any was returned.
        body: Option<String>,
    },
    /// No response: DNS, TLS, connection or read failure.
    TransportError {
        /// Description of the failure and its causes.
        cause: String,
    },
    /// The request body could not be built.
    EncodingError {
        /// Description of the failure.
        cause: String,
    },
    /// The endpoint is missing or malformed; nothing was sent.
    InvalidEndpoint {
        /// The rejected endpoint as configured.
        endpoint: String,
    },
}

impl UploadOutcome {
    /// Whether the artifact was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadOutcome::Success => write!(f, "Upload succeeded."),
            UploadOutcome::ServerError { status_code, body } => {
                write!(f, "Server returned an error with status code: {}.", status_code)?;
                if let Some(body) = body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
                    let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
                    write!(f, " {}", excerpt)?;
                }
                Ok(())
            }
            UploadOutcome::TransportError { cause } => {
                write!(f, "Network request failed: {}", cause)
            }
            UploadOutcome::EncodingError { cause } => {
                write!(f, "Failed to encode audio upload: {}", cause)
            }
            UploadOutcome::InvalidEndpoint { endpoint } => {
                write!(f, "The upload endpoint is invalid: {:?}", endpoint)
            }
        }
    }
}
