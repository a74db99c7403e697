//! Single source of truth for the latest alert-card snapshot.

use crate::backend::{BackendError, MarginBackend};
use crate::domain::AlertCard;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CardsState {
    cards: Vec<AlertCard>,
    is_loading: bool,
    error: Option<String>,
    last_fetched: Option<DateTime<Utc>>,
    /// Sequence number of the newest fetch whose result has been applied.
    applied_seq: u64,
}

/// Holds the latest alert-card snapshot with loading/error state.
///
/// A successful fetch replaces the entire collection; a failed fetch records
/// the error and leaves the previous collection intact, so a transient
/// network blip never flashes an empty "no alerts" state. Each outbound
/// fetch carries a sequence number and a completion older than the newest
/// applied one is discarded, so a slow stale response cannot overwrite a
/// newer snapshot.
#[derive(Debug)]
pub struct AlertCardStore {
    backend: Arc<dyn MarginBackend>,
    state: RwLock<CardsState>,
    fetch_seq: AtomicU64,
    manual_refresh_debounce: Duration,
    last_manual_refresh: Mutex<Option<Instant>>,
}

impl AlertCardStore {
    pub fn new(backend: Arc<dyn MarginBackend>, manual_refresh_debounce: Duration) -> Self {
        Self {
            backend,
            state: RwLock::new(CardsState::default()),
            fetch_seq: AtomicU64::new(0),
            manual_refresh_debounce,
            last_manual_refresh: Mutex::new(None),
        }
    }

    /// Fetch the snapshot and replace the collection.
    ///
    /// Not internally serialized: overlapping calls resolve in completion
    /// order and stale completions are dropped by sequence number.
    pub async fn refresh(&self) {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.write().unwrap();
            state.is_loading = true;
        }

        let result = self.backend.fetch_cards().await;
        self.apply_fetch_result(seq, result);
    }

    /// Operator-triggered refresh with a minimum spacing between calls.
    ///
    /// Returns whether a refresh was actually issued.
    pub async fn manual_refresh(&self) -> bool {
        {
            let mut last = self.last_manual_refresh.lock().unwrap();
            let now = Instant::now();
            if let Some(prev) = *last {
                if now.duration_since(prev) < self.manual_refresh_debounce {
                    debug!("Manual refresh debounced");
                    return false;
                }
            }
            *last = Some(now);
        }

        self.refresh().await;
        true
    }

    pub(crate) fn apply_fetch_result(
        &self,
        seq: u64,
        result: Result<Vec<AlertCard>, BackendError>,
    ) {
        let mut state = self.state.write().unwrap();
        state.is_loading = false;

        if seq <= state.applied_seq {
            debug!(
                "Discarding stale fetch result (seq {} <= applied {})",
                seq, state.applied_seq
            );
            return;
        }
        state.applied_seq = seq;

        match result {
            Ok(cards) => {
                debug!("Alert cards updated, count: {}", cards.len());
                state.cards = cards;
                state.error = None;
                state.last_fetched = Some(Utc::now());
            }
            Err(e) => {
                warn!("Failed to fetch alert cards: {}", e);
                // Keep the previous collection; the next tick retries.
                state.error = Some(e.operator_message());
            }
        }
    }

    /// Clone of the current snapshot.
    pub fn cards(&self) -> Vec<AlertCard> {
        self.state.read().unwrap().cards.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().unwrap().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().unwrap().error.clone()
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.state.read().unwrap().last_fetched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::domain::CardStatus;

    fn make_card(id: &str, margin_level: f64) -> AlertCard {
        AlertCard {
            id: id.to_string(),
            account: format!("LP_{}", id),
            status: CardStatus::Active,
            margin_level,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ignore_until: None,
        }
    }

    fn store_with(backend: Arc<MockBackend>) -> AlertCardStore {
        AlertCardStore::new(backend, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection_wholesale() {
        let backend = Arc::new(MockBackend::new().with_card(make_card("a", 15.0)));
        let store = store_with(backend.clone());

        store.refresh().await;
        assert_eq!(store.cards().len(), 1);
        assert!(store.error().is_none());
        assert!(store.last_fetched().is_some());

        backend.set_cards(vec![make_card("b", 20.0), make_card("c", 5.0)]);
        store.refresh().await;

        let cards = store.cards();
        assert_eq!(cards.len(), 2);
        assert!(cards.iter().all(|c| c.id != "a"));
    }

    #[tokio::test]
    async fn test_failed_refresh_preserves_stale_cards() {
        let backend = Arc::new(MockBackend::new().with_card(make_card("a", 15.0)));
        let store = store_with(backend.clone());

        store.refresh().await;
        let before = store.cards();

        backend.set_cards_error(Some(BackendError::ConnectionRefused));
        store.refresh().await;

        assert_eq!(store.cards(), before, "stale snapshot must be preserved");
        assert!(store.error().is_some());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_error_cleared_on_next_success() {
        let backend = Arc::new(MockBackend::new().with_card(make_card("a", 15.0)));
        let store = store_with(backend.clone());

        backend.set_cards_error(Some(BackendError::Timeout));
        store.refresh().await;
        assert!(store.error().is_some());

        backend.set_cards_error(None);
        store.refresh().await;
        assert!(store.error().is_none());
        assert_eq!(store.cards().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_completion_discarded_by_sequence() {
        let backend = Arc::new(MockBackend::new());
        let store = store_with(backend);

        // Fetch 2 completes first with the newer snapshot, then the slow
        // fetch 1 arrives with the older one.
        store.apply_fetch_result(2, Ok(vec![make_card("new", 20.0)]));
        store.apply_fetch_result(1, Ok(vec![make_card("old", 15.0)]));

        let cards = store.cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "new");
    }

    #[tokio::test]
    async fn test_stale_error_cannot_clobber_newer_snapshot() {
        let backend = Arc::new(MockBackend::new());
        let store = store_with(backend);

        store.apply_fetch_result(2, Ok(vec![make_card("new", 20.0)]));
        store.apply_fetch_result(1, Err(BackendError::Timeout));

        assert!(store.error().is_none());
        assert_eq!(store.cards().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_debounced() {
        let backend = Arc::new(MockBackend::new());
        let store = store_with(backend.clone());

        assert!(store.manual_refresh().await);
        assert!(!store.manual_refresh().await, "second call inside 1s window");
        assert_eq!(backend.fetch_cards_calls(), 1);

        tokio::time::advance(Duration::from_millis(1100)).await;
        assert!(store.manual_refresh().await);
        assert_eq!(backend.fetch_cards_calls(), 2);
    }
}
