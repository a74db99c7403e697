//! Holds the single currently-displayed report and per-kind busy flags.

use crate::domain::{Report, ThreadId};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct ReportState {
    current: Option<Report>,
    checking: bool,
    rechecking: bool,
}

/// Exactly one report is current at a time; every request resolution
/// replaces it wholesale. The `checking` and `rechecking` flags are
/// independent so the UI can disable one action class without the other.
#[derive(Debug, Default)]
pub struct ReportStore {
    state: RwLock<ReportState>,
}

impl ReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Report> {
        self.state.read().unwrap().current.clone()
    }

    /// Correlation thread of the current report, if any.
    pub fn current_thread(&self) -> Option<ThreadId> {
        self.state
            .read()
            .unwrap()
            .current
            .as_ref()
            .map(|r| r.card_id.clone())
    }

    pub fn set_current(&self, report: Report) {
        self.state.write().unwrap().current = Some(report);
    }

    pub fn clear(&self) {
        self.state.write().unwrap().current = None;
    }

    pub fn is_checking(&self) -> bool {
        self.state.read().unwrap().checking
    }

    pub fn set_checking(&self, value: bool) {
        self.state.write().unwrap().checking = value;
    }

    pub fn is_rechecking(&self) -> bool {
        self.state.read().unwrap().rechecking
    }

    pub fn set_rechecking(&self, value: bool) {
        self.state.write().unwrap().rechecking = value;
    }
}
