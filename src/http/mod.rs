//! HTTP integration.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → server.rs (axum router, TraceContextLayer, timeout, access trace)
//!     → handler logs / decorates / fans out inside the request scope
//!     → propagation.rs (traceparent header for downstream calls)
//! ```

pub mod propagation;
pub mod server;

pub use propagation::{http_trace_header, trace_id, traceparent, TracePropagationExt};
pub use server::HttpServer;
