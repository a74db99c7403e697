//! Mock backend for testing without network calls.

use super::{BackendError, MarginBackend};
use crate::domain::{AlertCard, AlertCardDetail, RequestKind, ThreadId};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock backend with scripted data and call counters.
///
/// Builder methods configure behavior up front; `set_*` methods mutate it
/// mid-test (e.g. to fail the next poll). Counters let tests assert that an
/// operation made no network call at all.
#[derive(Debug, Default)]
pub struct MockBackend {
    cards: Mutex<Vec<AlertCard>>,
    cards_error: Mutex<Option<BackendError>>,
    details: Mutex<HashMap<String, AlertCardDetail>>,
    detail_failures: Mutex<HashMap<String, usize>>,
    check_responses: Mutex<VecDeque<Result<serde_json::Value, BackendError>>>,
    check_delay: Option<Duration>,
    fetch_cards_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    check_calls: Mutex<Vec<(RequestKind, ThreadId)>>,
}

impl MockBackend {
    /// Create a mock backend with no cards and no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one alert card to the snapshot.
    pub fn with_card(self, card: AlertCard) -> Self {
        self.cards.lock().unwrap().push(card);
        self
    }

    /// Replace the snapshot with the given cards.
    pub fn with_cards(self, cards: Vec<AlertCard>) -> Self {
        *self.cards.lock().unwrap() = cards;
        self
    }

    /// Add a card detail, keyed by card id.
    pub fn with_detail(self, detail: AlertCardDetail) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(detail.card.id.clone(), detail);
        self
    }

    /// Make the next `times` detail fetches for `id` fail.
    pub fn with_detail_error(self, id: &str, times: usize) -> Self {
        self.detail_failures
            .lock()
            .unwrap()
            .insert(id.to_string(), times);
        self
    }

    /// Script the next check response (responses are consumed in order).
    pub fn with_check_response(self, response: serde_json::Value) -> Self {
        self.check_responses.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Script the next check call to fail with a transport error.
    pub fn with_check_error(self, error: BackendError) -> Self {
        self.check_responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Delay every check response, for timeout tests.
    pub fn with_check_delay(mut self, delay: Duration) -> Self {
        self.check_delay = Some(delay);
        self
    }

    /// Replace the snapshot mid-test.
    pub fn set_cards(&self, cards: Vec<AlertCard>) {
        *self.cards.lock().unwrap() = cards;
    }

    /// Make card-list fetches fail (or succeed again with `None`).
    pub fn set_cards_error(&self, error: Option<BackendError>) {
        *self.cards_error.lock().unwrap() = error;
    }

    /// Number of card-list fetches made so far.
    pub fn fetch_cards_calls(&self) -> usize {
        self.fetch_cards_calls.load(Ordering::SeqCst)
    }

    /// Number of detail fetches made so far.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    /// Every check call made so far, in order.
    pub fn check_calls(&self) -> Vec<(RequestKind, ThreadId)> {
        self.check_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarginBackend for MockBackend {
    async fn fetch_cards(&self) -> Result<Vec<AlertCard>, BackendError> {
        self.fetch_cards_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.cards_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.cards.lock().unwrap().clone())
    }

    async fn fetch_card_detail(&self, id: &str) -> Result<AlertCardDetail, BackendError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        {
            let mut failures = self.detail_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(BackendError::Other(format!(
                        "scripted detail failure for {}",
                        id
                    )));
                }
            }
        }

        self.details
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::Http {
                status: 404,
                message: format!("no detail for card {}", id),
            })
    }

    async fn margin_check(
        &self,
        kind: RequestKind,
        thread_id: &ThreadId,
    ) -> Result<serde_json::Value, BackendError> {
        self.check_calls
            .lock()
            .unwrap()
            .push((kind, thread_id.clone()));

        if let Some(delay) = self.check_delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.check_responses.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            // Unscripted calls echo a successful completion.
            None => Ok(serde_json::json!({
                "type": "complete",
                "thread_id": thread_id.as_str(),
                "content": "ok"
            })),
        }
    }
}
