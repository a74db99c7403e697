//! Threshold monitoring and the notification sink seam.

use crate::domain::{AlertCard, AlertCardDetail};
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub mod threshold;

pub use threshold::{PassOutcome, ThresholdMonitor};

/// Dismiss handle returned by a sink. The monitor keeps no reference to it;
/// once `notify` returns, tracking read/click/dismiss is the sink's problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandle(String);

impl NotificationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        NotificationHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Renders one persistent, dismissible notification per newly-detected
/// threshold breach. The UI implementation lives outside this crate; the
/// contract only requires "view details" and "dismiss" to be possible.
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    async fn notify(&self, card: &AlertCard, detail: &AlertCardDetail) -> NotificationHandle;
}

/// Sink that logs breaches; the daemon default when no UI is attached.
#[derive(Debug, Default)]
pub struct TracingSink {
    seq: AtomicU64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, card: &AlertCard, detail: &AlertCardDetail) -> NotificationHandle {
        warn!(
            "Margin alert: account {} at {:.2}% (threshold {:.2}%), free margin {:.2}",
            card.account,
            card.margin_level,
            detail.threshold,
            detail.margin_snapshot.free_margin
        );
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        NotificationHandle::new(format!("{}#{}", card.id, n))
    }
}
