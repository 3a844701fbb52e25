//! Request-scoped trace context and log enrichment.
//!
//! Each inbound request gets a W3C `traceparent` (taken from the request or
//! freshly generated). Its ids, and Cloud Logging trace fields when the
//! project id is known, are made available to all code running for that
//! request and merged into every log line it emits.

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod project;
pub mod trace;

pub use config::AppConfig;
pub use context::{run_in_scope, LogFields, RequestScope};
pub use error::{ContextError, LoggingError};
pub use http::{http_trace_header, trace_id, traceparent, HttpServer, TracePropagationExt};
pub use logging::{current_enrichment, decorate, init_logging, LoggerBuilder};
pub use middleware::{TraceContextLayer, TraceScopes, Traced};
pub use project::ProjectResolver;
pub use trace::{decode, encode, Trace};
