//! Domain primitives: ThreadId, Severity, RequestKind.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation key linking a client-issued check to its backend response.
///
/// Opaque to the engine; quick checks and free-text lookups mint a fresh
/// UUID, follow-up actions carry the id of the report they follow up on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    /// Wrap an existing identifier (e.g. one echoed back by the backend).
    pub fn new(id: String) -> Self {
        ThreadId(id)
    }

    /// Mint a fresh collision-resistant identifier.
    pub fn generate() -> Self {
        ThreadId(Uuid::new_v4().to_string())
    }

    /// Get the identifier as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a report or alert: ok, warn, or critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ok,
    Warn,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "ok"),
            Severity::Warn => write!(f, "warn"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The four user-triggered report actions.
///
/// `QuickCheck` starts a new correlation thread; the other three reuse the
/// thread of the currently-displayed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    QuickCheck,
    Recheck,
    Simulate,
    Execute,
}

impl RequestKind {
    /// Whether this kind must reuse an existing correlation thread.
    pub fn is_follow_up(&self) -> bool {
        !matches!(self, RequestKind::QuickCheck)
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::QuickCheck => write!(f, "quick_check"),
            RequestKind::Recheck => write!(f, "recheck"),
            RequestKind::Simulate => write!(f, "simulate"),
            RequestKind::Execute => write!(f, "execute"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_generate_is_unique() {
        let a = ThreadId::generate();
        let b = ThreadId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Ok).unwrap(), "\"ok\"");
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_request_kind_follow_up() {
        assert!(!RequestKind::QuickCheck.is_follow_up());
        assert!(RequestKind::Recheck.is_follow_up());
        assert!(RequestKind::Simulate.is_follow_up());
        assert!(RequestKind::Execute.is_follow_up());
    }

    #[test]
    fn test_request_kind_display() {
        assert_eq!(RequestKind::QuickCheck.to_string(), "quick_check");
        assert_eq!(RequestKind::Execute.to_string(), "execute");
    }
}
