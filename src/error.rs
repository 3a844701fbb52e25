//! Error types surfaced to callers.
//!
//! Malformed trace headers and metadata-server outages are not errors here;
//! they degrade to "no trace data" and never reach the caller.

use thiserror::Error;

/// Misuse of the request context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// A context accessor that needs a scope was called outside of one.
    #[error("trace context has not been initialized; run the caller inside the trace middleware or a traced function")]
    NoActiveScope,
}

/// Failure installing the global log subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global subscriber is already installed: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}
