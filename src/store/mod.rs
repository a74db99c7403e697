//! In-memory stores: the alert-card snapshot and the current report.

pub mod cards;
pub mod report;

pub use cards::AlertCardStore;
pub use report::ReportStore;
