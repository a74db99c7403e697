//! Normalized margin-check report surfaced to the UI.

use crate::domain::primitives::{RequestKind, Severity, ThreadId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One user-triggered check action, tagged with its correlation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub kind: RequestKind,
    pub thread_id: ThreadId,
    pub issued_at: DateTime<Utc>,
}

impl ReportRequest {
    pub fn new(kind: RequestKind, thread_id: ThreadId) -> Self {
        Self {
            kind,
            thread_id,
            issued_at: Utc::now(),
        }
    }
}

/// Content block category within a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Summary,
    Analysis,
    Recommendation,
}

/// A free-form content block inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: SectionKind,
}

/// The single normalized result every check operation resolves to.
///
/// Exactly one report is current at a time; each request resolution
/// replaces it wholesale, whether the request succeeded or failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Equal to the correlation thread id of the request that produced it.
    pub card_id: ThreadId,
    pub status: Severity,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub sections: Vec<ReportSection>,
    /// Follow-up actions the UI may offer on this report.
    pub actions: Vec<RequestKind>,
    /// Optional per-account breakdown carried by interrupt responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts_detail: Option<HashMap<String, serde_json::Value>>,
}

impl Report {
    /// Build a single-section report from backend-provided text, deriving
    /// severity from failure/warning markers in the content.
    pub fn from_text(thread_id: ThreadId, text: &str) -> Self {
        Report {
            card_id: thread_id,
            status: classify_text(text),
            title: "Margin Check Report".to_string(),
            timestamp: Utc::now(),
            sections: vec![ReportSection {
                id: "report_content".to_string(),
                title: "Report".to_string(),
                content: text.to_string(),
                kind: SectionKind::Analysis,
            }],
            actions: vec![
                RequestKind::Recheck,
                RequestKind::Simulate,
                RequestKind::Execute,
            ],
            accounts_detail: None,
        }
    }

    /// Attach the per-account detail map from an interrupt response.
    pub fn with_accounts_detail(
        mut self,
        detail: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.accounts_detail = Some(detail);
        self
    }

    /// Force a specific severity, overriding text classification.
    pub fn with_status(mut self, status: Severity) -> Self {
        self.status = status;
        self
    }
}

/// Keyword classification of backend report text.
fn classify_text(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if lower.contains("cannot connect")
        || lower.contains("auth failed")
        || lower.contains("critical")
    {
        Severity::Critical
    } else if lower.contains("warn") {
        Severity::Warn
    } else {
        Severity::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_defaults_to_ok() {
        let report = Report::from_text(ThreadId::new("t1".to_string()), "all healthy");
        assert_eq!(report.status, Severity::Ok);
        assert_eq!(report.card_id.as_str(), "t1");
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].content, "all healthy");
    }

    #[test]
    fn test_from_text_flags_warnings() {
        let report = Report::from_text(
            ThreadId::new("t1".to_string()),
            "WARN: LP_B approaching threshold",
        );
        assert_eq!(report.status, Severity::Warn);
    }

    #[test]
    fn test_from_text_flags_failures_as_critical() {
        for text in ["cannot connect to bridge", "auth failed for LP_A", "CRITICAL breach"] {
            let report = Report::from_text(ThreadId::new("t1".to_string()), text);
            assert_eq!(report.status, Severity::Critical, "text: {}", text);
        }
    }

    #[test]
    fn test_follow_up_actions_offered() {
        let report = Report::from_text(ThreadId::new("t1".to_string()), "ok");
        assert!(report.actions.contains(&RequestKind::Recheck));
        assert!(report.actions.contains(&RequestKind::Simulate));
        assert!(report.actions.contains(&RequestKind::Execute));
        assert!(!report.actions.contains(&RequestKind::QuickCheck));
    }

    #[test]
    fn test_report_request_tags_kind_and_thread() {
        let req = ReportRequest::new(RequestKind::Recheck, ThreadId::new("t1".to_string()));
        assert_eq!(req.kind, RequestKind::Recheck);
        assert_eq!(req.thread_id.as_str(), "t1");
    }

    #[test]
    fn test_with_accounts_detail() {
        let mut detail = HashMap::new();
        detail.insert("LP_A".to_string(), serde_json::json!({"margin_level": 92}));
        let report =
            Report::from_text(ThreadId::new("t1".to_string()), "ok").with_accounts_detail(detail);
        assert!(report.accounts_detail.unwrap().contains_key("LP_A"));
    }
}
