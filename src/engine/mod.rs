//! Report correlation engine: issues check requests tagged with a thread id,
//! classifies the response shape, and maps everything into a normalized
//! Report.
//!
//! The mapping is deliberately total. Every reachable response value,
//! including transport failures and garbage, becomes *some* valid report, so
//! the UI never has to special-case transport versus domain failures and a
//! settled request always resolves its busy flag.

use crate::backend::{BackendError, MarginBackend};
use crate::domain::{
    Report, ReportRequest, ReportSection, RequestKind, SectionKind, Severity, ThreadId,
};
use crate::store::ReportStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    /// A follow-up action was requested with no current report to follow up
    /// on. Caller bug; no network call is made.
    #[error("no report is currently displayed; run a quick check first")]
    NoCurrentReport,
    /// A free-text lookup exceeded its hard deadline.
    #[error("lookup timed out after {0:?}")]
    LookupTimeout(Duration),
}

/// Drives the quick-check / recheck / simulate / execute flows.
#[derive(Debug)]
pub struct ReportEngine {
    backend: Arc<dyn MarginBackend>,
    store: Arc<ReportStore>,
    lookup_timeout: Duration,
}

impl ReportEngine {
    pub fn new(
        backend: Arc<dyn MarginBackend>,
        store: Arc<ReportStore>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            lookup_timeout,
        }
    }

    /// Start a fresh correlation thread and run a check on it.
    pub async fn quick_check(&self) -> Report {
        let thread_id = ThreadId::generate();
        debug!("Quick check on thread {}", thread_id);

        self.store.set_checking(true);
        let report = self.run_check(RequestKind::QuickCheck, thread_id).await;
        self.store.set_checking(false);
        report
    }

    /// Re-run the check on the current report's thread.
    pub async fn recheck(&self) -> Result<Report, EngineError> {
        self.follow_up(RequestKind::Recheck).await
    }

    /// Simulate the recommended actions on the current report's thread.
    pub async fn simulate(&self) -> Result<Report, EngineError> {
        self.follow_up(RequestKind::Simulate).await
    }

    /// Execute the recommended actions on the current report's thread.
    pub async fn execute(&self) -> Result<Report, EngineError> {
        self.follow_up(RequestKind::Execute).await
    }

    async fn follow_up(&self, kind: RequestKind) -> Result<Report, EngineError> {
        let thread_id = self
            .store
            .current_thread()
            .ok_or(EngineError::NoCurrentReport)?;
        debug!("{} on thread {}", kind, thread_id);

        self.store.set_rechecking(true);
        let report = self.run_check(kind, thread_id).await;
        self.store.set_rechecking(false);
        Ok(report)
    }

    async fn run_check(&self, kind: RequestKind, thread_id: ThreadId) -> Report {
        let request = ReportRequest::new(kind, thread_id);
        let report = match self
            .backend
            .margin_check(request.kind, &request.thread_id)
            .await
        {
            Ok(value) => normalize_response(value, &request.thread_id),
            Err(e) => {
                warn!(
                    "{} issued at {} failed on thread {}: {}",
                    request.kind, request.issued_at, request.thread_id, e
                );
                failure_report(&request.thread_id, &e)
            }
        };
        self.store.set_current(report.clone());
        report
    }

    /// Handle a free-text operator message.
    ///
    /// A "check <ACCOUNT>" intent runs a check under a hard deadline; on
    /// timeout the flow fails instead of hanging, and the current report is
    /// left untouched. Messages without a recognizable intent resolve to
    /// `Ok(None)`.
    pub async fn lookup(&self, message: &str) -> Result<Option<Report>, EngineError> {
        let Some(account) = parse_check_intent(message) else {
            debug!("No check intent in message");
            return Ok(None);
        };

        let thread_id = ThreadId::generate();
        debug!("Lookup for account {} on thread {}", account, thread_id);

        self.store.set_checking(true);
        let result = tokio::time::timeout(
            self.lookup_timeout,
            self.backend.margin_check(RequestKind::QuickCheck, &thread_id),
        )
        .await;
        self.store.set_checking(false);

        let mut report = match result {
            Err(_) => {
                warn!("Lookup for {} timed out", account);
                return Err(EngineError::LookupTimeout(self.lookup_timeout));
            }
            Ok(Ok(value)) => normalize_response(value, &thread_id),
            Ok(Err(e)) => failure_report(&thread_id, &e),
        };
        report.title = format!("Margin Report: {}", account);

        self.store.set_current(report.clone());
        Ok(Some(report))
    }
}

/// Map a raw backend response into a report. Total over all JSON values.
pub fn normalize_response(value: serde_json::Value, fallback_thread: &ThreadId) -> Report {
    let thread_id = value
        .get("thread_id")
        .and_then(|v| v.as_str())
        .map(|s| ThreadId::new(s.to_string()))
        .unwrap_or_else(|| fallback_thread.clone());

    match value.get("type").and_then(|v| v.as_str()) {
        Some("interrupt") => {
            let Some(text) = value
                .pointer("/interrupt_data/report")
                .and_then(|v| v.as_str())
            else {
                return unknown_report(thread_id, &value);
            };
            let mut report = Report::from_text(thread_id, text);
            if let Some(map) = value
                .pointer("/interrupt_data/accounts_detail")
                .and_then(|v| v.as_object())
            {
                report = report.with_accounts_detail(
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                );
            }
            report
        }
        Some("complete") => match value.get("content").and_then(|v| v.as_str()) {
            Some(content) => Report::from_text(thread_id, content),
            None => unknown_report(thread_id, &value),
        },
        Some("error") => {
            let message = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Backend reported an unspecified error");
            Report::from_text(thread_id, message).with_status(Severity::Critical)
        }
        _ => unknown_report(thread_id, &value),
    }
}

/// A transport failure as a renderable critical report.
pub fn failure_report(thread_id: &ThreadId, error: &BackendError) -> Report {
    Report::from_text(thread_id.clone(), &error.operator_message())
        .with_status(Severity::Critical)
}

/// Degrade an unrecognized response shape to a warn report instead of
/// failing: availability over strict validation.
fn unknown_report(thread_id: ThreadId, value: &serde_json::Value) -> Report {
    let mut raw = value.to_string();
    if raw.chars().count() > 200 {
        // Cut on a char boundary; report text is not always ASCII.
        raw = raw.chars().take(200).collect();
        raw.push('…');
    }
    Report {
        card_id: thread_id,
        status: Severity::Warn,
        title: "Margin Check Report".to_string(),
        timestamp: Utc::now(),
        sections: vec![ReportSection {
            id: "unknown_response".to_string(),
            title: "Unknown Response".to_string(),
            content: format!("Unrecognized backend response shape: {}", raw),
            kind: SectionKind::Summary,
        }],
        actions: vec![RequestKind::Recheck],
        accounts_detail: None,
    }
}

/// Parse a "check <ACCOUNT>" intent out of a free-text message.
fn parse_check_intent(message: &str) -> Option<String> {
    let mut tokens = message.split_whitespace();
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("check") {
            let target: String = tokens
                .next()?
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect();
            if target.is_empty() {
                return None;
            }
            return Some(target);
        }
    }
    None
}
