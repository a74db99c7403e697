//! Domain types for the margin-risk monitoring engine.
//!
//! This module provides:
//! - Domain primitives: ThreadId, Severity, RequestKind
//! - Alert card types with wire-faithful serialization
//! - The normalized Report every check operation resolves to

pub mod card;
pub mod primitives;
pub mod report;

pub use card::{AlertCard, AlertCardDetail, AlertCardsResponse, CardStatus, MarginSnapshot};
pub use primitives::{RequestKind, Severity, ThreadId};
pub use report::{Report, ReportRequest, ReportSection, SectionKind};
