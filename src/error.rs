use crate::transport::BoxError;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CompanyCamError {
    /// Client could not be configured (missing token, bad environment value).
    #[error("configuration error: {0}")]
    Config(String),
    /// Arguments rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No HTTP response was received, after all retries.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// Every attempt was answered with HTTP 429.
    #[error("rate limit exceeded for {path} after {attempts} attempt(s)")]
    RateLimited {
        /// Path of the failing request, relative to the base URL.
        path: String,
        /// Number of requests sent.
        attempts: usize,
        /// Raw body of the last 429 response.
        body: String,
    },
    /// Non-success HTTP status other than 429. Never retried.
    #[error("api error {status} for {path}: {body}")]
    Api {
        status: u16,
        body: String,
        path: String,
    },
    /// The request deadline passed before a response was received.
    #[error("deadline exceeded for {path} after {attempts} attempt(s)")]
    DeadlineExceeded { path: String, attempts: usize },
    /// A success response whose body is not valid JSON.
    #[error("decode error: {0}")]
    Decode(String),
}

impl CompanyCamError {
    /// HTTP status observed from the server, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the failure came from the server throttling this client.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
