//! Outbound trace propagation.
//!
//! Downstream HTTP calls made while handling a request should carry the
//! request's `traceparent` so the callee joins the same trace.

use axum::http::{HeaderMap, HeaderValue};

use crate::context::current_traceparent;
use crate::trace::{decode, TRACEPARENT};

/// Headers to attach to downstream requests: `traceparent` inside a scope,
/// empty outside or when the scope's value cannot be sent as a header.
pub fn http_trace_header() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(tp) = current_traceparent() else {
        return headers;
    };
    match HeaderValue::from_str(&tp) {
        Ok(value) => {
            headers.insert(TRACEPARENT, value);
        }
        Err(_) => {
            tracing::debug!(
                traceparent = %tp.escape_debug(),
                "traceparent is not a valid header value, not propagating"
            );
        }
    }
    headers
}

/// The active scope's `traceparent`.
pub fn traceparent() -> Option<String> {
    current_traceparent()
}

/// The active scope's trace id.
pub fn trace_id() -> Option<String> {
    current_traceparent()
        .and_then(|tp| decode(&tp))
        .map(|trace| trace.trace_id)
}

/// Attach the active trace to an outgoing `reqwest` request.
pub trait TracePropagationExt {
    fn with_trace_context(self) -> Self;
}

impl TracePropagationExt for reqwest::RequestBuilder {
    fn with_trace_context(self) -> Self {
        self.headers(http_trace_header())
    }
}
