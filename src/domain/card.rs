//! Alert card types as served by the alert backend.

use crate::domain::primitives::ThreadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an alert card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum CardStatus {
    /// Waiting on a human operator decision.
    AwaitingHumanReview,
    Active,
    Critical,
    Ignored,
    /// Catch-all so one unrecognized status never fails a whole snapshot.
    Unknown,
}

impl From<String> for CardStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            // Older backends send `awaiting_hitl` for the same state.
            "awaiting_human_review" | "awaiting_hitl" => CardStatus::AwaitingHumanReview,
            "active" => CardStatus::Active,
            "critical" => CardStatus::Critical,
            "ignored" => CardStatus::Ignored,
            _ => CardStatus::Unknown,
        }
    }
}

/// One per monitored account; refreshed wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCard {
    pub id: String,
    /// Liquidity-provider account label.
    #[serde(rename = "lp")]
    pub account: String,
    pub status: CardStatus,
    /// Margin usage as a percentage (0-100+).
    pub margin_level: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ignore_until: Option<DateTime<Utc>>,
}

impl AlertCard {
    /// Whether this card's margin level crosses the given threshold.
    pub fn breaches(&self, threshold: f64) -> bool {
        self.margin_level > threshold
    }
}

/// Wire envelope for `GET /alert/cards`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertCardsResponse {
    pub cards: Vec<AlertCard>,
}

/// Point-in-time margin figures attached to a card detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSnapshot {
    pub equity: f64,
    pub balance: f64,
    pub margin_used: f64,
    pub free_margin: f64,
    pub unrealized_pnl: f64,
    pub utilization_percent: f64,
    pub snapshot_timestamp: DateTime<Utc>,
}

/// Full per-card detail, fetched lazily when a notification fires.
///
/// Owned by the notifying component for one notification's lifetime; the
/// core never caches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCardDetail {
    #[serde(flatten)]
    pub card: AlertCard,
    pub threshold: f64,
    pub hysteresis_threshold: f64,
    pub notifications_sent: u64,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub correlation_thread_id: Option<ThreadId>,
    pub margin_snapshot: MarginSnapshot,
}
