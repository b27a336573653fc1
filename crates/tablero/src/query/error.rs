//! Error taxonomy for remote reads.

use tablero_net::NetworkError;
use thiserror::Error;

/// Why a query could not produce data.
///
/// Cloneable so that every caller sharing one in-flight request observes the
/// same failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Network failure, timeout, `429` or 5xx. Retried per policy.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The server refused the request (4xx). Never retried.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Body or reason returned by the server.
        message: String,
    },

    /// The request could not be built (bad URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response did not have the expected shape.
    #[error("response contract violation: {0}")]
    Contract(String),

    /// One key was resolved with two different payload types.
    #[error("cached value for {key} has a different type than requested")]
    TypeMismatch {
        /// Display form of the key.
        key: String,
    },

    /// The query client was disposed before the request settled.
    #[error("query client disposed")]
    Disposed,
}

impl QueryError {
    /// Whether the fetch policy may retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether the operation may succeed later without code changes, so the
    /// last good data should stay on screen.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this failure indicates a bug rather than a runtime condition.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::Contract(_) | Self::TypeMismatch { .. })
    }
}

impl From<NetworkError> for QueryError {
    fn from(err: NetworkError) -> Self {
        if err.is_transient() {
            return Self::Transient(err.to_string());
        }
        match err {
            NetworkError::HttpStatus { status, message } => Self::Rejected {
                status,
                message: message.unwrap_or_default(),
            },
            NetworkError::Json(msg) | NetworkError::InvalidBody(msg) => Self::Contract(msg),
            NetworkError::InvalidUrl(msg) | NetworkError::InvalidHeader(msg) => {
                Self::InvalidRequest(msg)
            }
            NetworkError::TooManyRedirects => Self::InvalidRequest("too many redirects".into()),
            other => Self::Transient(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Contract(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_classification() {
        assert!(QueryError::from(NetworkError::Timeout).is_retryable());
        assert!(
            QueryError::from(NetworkError::HttpStatus {
                status: 503,
                message: None
            })
            .is_retryable()
        );

        let rejected = QueryError::from(NetworkError::HttpStatus {
            status: 403,
            message: Some("forbidden".into()),
        });
        assert_eq!(
            rejected,
            QueryError::Rejected {
                status: 403,
                message: "forbidden".into()
            }
        );
        assert!(!rejected.is_retryable());
        assert!(!rejected.is_recoverable());

        let contract = QueryError::from(NetworkError::Json("missing field `rows`".into()));
        assert!(contract.is_programming_error());
        assert!(!contract.is_retryable());
    }

    #[test]
    fn test_serde_error_is_contract() {
        let err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert!(matches!(QueryError::from(err), QueryError::Contract(_)));
    }
}
