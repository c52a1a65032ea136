//! API error taxonomy.

use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors from the remote DNS API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API key was rejected.
    #[error("authentication failed: API key rejected")]
    Unauthorized,

    /// The requested zone or resource does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// The resource already exists (zone creation race).
    ///
    /// Zone creation treats this as success; it is surfaced as an error
    /// only from operations where a conflict is genuinely unexpected.
    #[error("conflict: {message}")]
    Conflict {
        /// Server-reported message.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The request never produced an HTTP response (connect failure,
    /// timeout, TLS error).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured base URL is unusable.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Returns true if retrying the same request later could succeed:
    /// transport failures and server-side (5xx) errors.
    ///
    /// 4xx-class failures are permanent: the request itself is wrong and
    /// will not improve on retry.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true for the "already exists" conflict class.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
