pub mod backend;
pub mod config;
pub mod domain;
pub mod engine;
pub mod monitor;
pub mod scheduler;
pub mod store;

pub use backend::{BackendError, HttpBackend, MarginBackend, MockBackend};
pub use config::{Config, ConfigError};
pub use domain::{
    AlertCard, AlertCardDetail, CardStatus, MarginSnapshot, Report, ReportRequest, ReportSection,
    RequestKind, SectionKind, Severity, ThreadId,
};
pub use engine::{EngineError, ReportEngine};
pub use monitor::{NotificationHandle, NotificationSink, ThresholdMonitor, TracingSink};
pub use scheduler::Scheduler;
pub use store::{AlertCardStore, ReportStore};
