//! Structured logging with request-scoped enrichment.
//!
//! # Data Flow
//! ```text
//! tracing::info!(...) anywhere inside a request scope
//!     → format.rs (EnrichedFormat, runs on the emitting task)
//!         → enrich.rs (current_enrichment: fields of the active scope)
//!         → severity.rs (level → Cloud Logging severity)
//!     → one JSON line (or a pretty line in development)
//! ```
//!
//! # Design Decisions
//! - Uses the tracing crate; enrichment is applied at format time
//! - Per-event fields win over enrichment; message and severity are owned by the sink
//! - JSON format for production, pretty format for development

pub mod enrich;
pub mod format;
pub mod init;
pub mod severity;

pub use enrich::{current_enrichment, decorate};
pub use format::{EnrichedFormat, Output};
pub use init::{init_logging, LoggerBuilder};
pub use severity::{severity_for_label, severity_for_level};
