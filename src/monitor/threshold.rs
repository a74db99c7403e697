//! Threshold scan with a sliding-window notification dedup.

use super::NotificationSink;
use crate::backend::MarginBackend;
use crate::domain::{AlertCard, CardStatus};
use crate::store::AlertCardStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Summary of one monitor pass, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOutcome {
    /// Cards above the threshold in this snapshot.
    pub breaching: usize,
    /// Notifications actually raised (breaching minus deduped minus failed).
    pub notified: usize,
    /// Detail fetches that failed; those cards retry on the next pass.
    pub failed: usize,
}

/// Decides which cards require a new notification right now.
///
/// A card id that already triggered a notification in the current window is
/// suppressed until `clear_window` discards the whole set. The clear is
/// unconditional and cadence-driven: a card still breaching after the clear
/// is notified exactly once more per window ("remind every minute"), by
/// design rather than per-card expiry.
#[derive(Debug)]
pub struct ThresholdMonitor {
    backend: Arc<dyn MarginBackend>,
    cards: Arc<AlertCardStore>,
    sink: Arc<dyn NotificationSink>,
    threshold: f64,
    notified: Mutex<HashSet<String>>,
}

impl ThresholdMonitor {
    pub fn new(
        backend: Arc<dyn MarginBackend>,
        cards: Arc<AlertCardStore>,
        sink: Arc<dyn NotificationSink>,
        threshold: f64,
    ) -> Self {
        Self {
            backend,
            cards,
            sink,
            threshold,
            notified: Mutex::new(HashSet::new()),
        }
    }

    /// Scan the current snapshot and notify newly-qualifying cards.
    ///
    /// Critical-status cards are handled first; within each class snapshot
    /// order is kept. Detail fetches run one at a time, and a failed fetch
    /// leaves its card unmarked so the very next pass retries it.
    pub async fn run_pass(&self) -> PassOutcome {
        let mut breaching: Vec<AlertCard> = self
            .cards
            .cards()
            .into_iter()
            .filter(|c| c.breaches(self.threshold))
            .collect();
        breaching.sort_by_key(|c| c.status != CardStatus::Critical);

        let mut outcome = PassOutcome {
            breaching: breaching.len(),
            notified: 0,
            failed: 0,
        };

        for card in breaching {
            if self.notified.lock().unwrap().contains(&card.id) {
                continue;
            }

            match self.backend.fetch_card_detail(&card.id).await {
                Ok(detail) => {
                    self.notified.lock().unwrap().insert(card.id.clone());
                    let handle = self.sink.notify(&card, &detail).await;
                    debug!(
                        "Notified breach for card {} (handle {})",
                        card.id,
                        handle.id()
                    );
                    outcome.notified += 1;
                }
                Err(e) => {
                    // Card stays unmarked: retried next pass, not next window.
                    warn!("Detail fetch failed for card {}: {}", card.id, e);
                    outcome.failed += 1;
                }
            }
        }

        if outcome.breaching > 0 {
            info!(
                "Monitor pass: {} breaching, {} notified, {} failed",
                outcome.breaching, outcome.notified, outcome.failed
            );
        }
        outcome
    }

    /// Discard the dedup set, re-arming every still-breaching card for
    /// exactly one more notification.
    pub fn clear_window(&self) {
        let mut notified = self.notified.lock().unwrap();
        if !notified.is_empty() {
            debug!("Clearing dedup window ({} entries)", notified.len());
        }
        notified.clear();
    }

    /// Number of card ids currently suppressed.
    pub fn suppressed_count(&self) -> usize {
        self.notified.lock().unwrap().len()
    }
}
