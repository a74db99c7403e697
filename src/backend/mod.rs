//! Backend abstraction for the alert and margin-check agent services.

use crate::domain::{AlertCard, AlertCardDetail, RequestKind, ThreadId};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

/// Transport-agnostic backend the engine consumes.
///
/// Implementations own the HTTP client, JSON decoding, and endpoint layout;
/// the engine only sees typed cards and raw check-response values.
#[async_trait]
pub trait MarginBackend: Send + Sync + fmt::Debug {
    /// Fetch the full alert-card snapshot.
    async fn fetch_cards(&self) -> Result<Vec<AlertCard>, BackendError>;

    /// Fetch one card's full detail.
    async fn fetch_card_detail(&self, id: &str) -> Result<AlertCardDetail, BackendError>;

    /// Issue a margin-check request for the given correlation thread.
    ///
    /// Returns the raw response value: the agent answers with one of three
    /// shapes (interrupt / complete / error) and occasionally with garbage,
    /// and shape discrimination belongs to the correlation engine so that
    /// it can stay total over all of them.
    async fn margin_check(
        &self,
        kind: RequestKind,
        thread_id: &ThreadId,
    ) -> Result<serde_json::Value, BackendError>;
}

/// Transport failure taxonomy.
///
/// The category drives the operator-facing failure text, so classification
/// matters more than the raw error chain.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// The request exceeded its deadline.
    Timeout,
    /// TCP connection refused or reset.
    ConnectionRefused,
    /// Hostname resolution failed.
    Dns(String),
    /// Non-success HTTP status.
    Http { status: u16, message: String },
    /// Invalid JSON or malformed response body.
    Parse(String),
    /// Anything else.
    Other(String),
}

impl BackendError {
    /// Short human-readable cause, embedded into failure reports.
    pub fn operator_message(&self) -> String {
        match self {
            BackendError::Timeout => "Request timed out waiting for the backend".to_string(),
            BackendError::ConnectionRefused => {
                "Cannot connect to the backend (connection refused)".to_string()
            }
            BackendError::Dns(host) => format!("DNS resolution failed for {}", host),
            BackendError::Http { status, message } => {
                format!("Backend returned HTTP {}: {}", status, message)
            }
            BackendError::Parse(msg) => format!("Malformed backend response: {}", msg),
            BackendError::Other(msg) => format!("Backend request failed: {}", msg),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Timeout => write!(f, "Timeout"),
            BackendError::ConnectionRefused => write!(f, "Connection refused"),
            BackendError::Dns(host) => write!(f, "DNS failure: {}", host),
            BackendError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            BackendError::Parse(msg) => write!(f, "Parse error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        assert_eq!(BackendError::Timeout.to_string(), "Timeout");
        assert_eq!(
            BackendError::ConnectionRefused.to_string(),
            "Connection refused"
        );
        assert_eq!(
            BackendError::Dns("agent.internal".to_string()).to_string(),
            "DNS failure: agent.internal"
        );
        assert_eq!(
            BackendError::Http {
                status: 503,
                message: "unavailable".to_string()
            }
            .to_string(),
            "HTTP error 503: unavailable"
        );
    }

    #[test]
    fn test_operator_message_names_the_category() {
        assert!(BackendError::Timeout.operator_message().contains("timed out"));
        assert!(BackendError::ConnectionRefused
            .operator_message()
            .contains("connection refused"));
        assert!(BackendError::Dns("x".to_string())
            .operator_message()
            .contains("DNS"));
        assert!(BackendError::Parse("bad json".to_string())
            .operator_message()
            .contains("bad json"));
    }
}
