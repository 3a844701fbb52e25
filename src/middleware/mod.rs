//! Scope entry points.
//!
//! # Data Flow
//! ```text
//! inbound request / traced function call
//!     → entry.rs (resolve project id, pick or synthesize traceparent,
//!                 build the enrichment record)
//!     → layer.rs  (tower layer: one fresh scope per HTTP request)
//!     → attach.rs (Traced<F>: one fresh scope per invocation)
//!     → context::run_in_scope around the downstream work
//! ```
//!
//! # Design Decisions
//! - A malformed or missing header never fails a request; a trace is synthesized
//! - The project resolver is shared and injected, not held in module state
//! - Errors from downstream work pass through untouched

pub mod attach;
pub mod entry;
pub mod layer;

pub use attach::Traced;
pub use entry::{
    log_fields_from_trace, TraceScopes, GCP_SPAN_ID_FIELD, GCP_TRACE_FIELD,
    GCP_TRACE_SAMPLED_FIELD, SPAN_ID_FIELD, TRACE_ID_FIELD,
};
pub use layer::{TraceContextLayer, TraceContextService};
