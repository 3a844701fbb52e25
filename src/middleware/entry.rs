//! Building a request scope from an optional inbound `traceparent`.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::context::{run_in_scope, LogFields, RequestScope};
use crate::middleware::attach::Traced;
use crate::project::ProjectResolver;
use crate::trace::{decode, Trace};

pub const TRACE_ID_FIELD: &str = "traceId";
pub const SPAN_ID_FIELD: &str = "spanId";
pub const GCP_TRACE_FIELD: &str = "logging.googleapis.com/trace";
pub const GCP_SPAN_ID_FIELD: &str = "logging.googleapis.com/spanId";
pub const GCP_TRACE_SAMPLED_FIELD: &str = "logging.googleapis.com/trace_sampled";

/// Enrichment record for a trace.
///
/// `traceId`/`spanId` are always set for a trace; the Cloud Logging fields
/// only when a non-empty project id is known.
pub fn log_fields_from_trace(trace: Option<&Trace>, project_id: Option<&str>) -> LogFields {
    let mut fields = LogFields::new();
    let Some(trace) = trace else {
        return fields;
    };

    fields.insert(TRACE_ID_FIELD.into(), Value::from(trace.trace_id.as_str()));
    fields.insert(SPAN_ID_FIELD.into(), Value::from(trace.parent_id.as_str()));

    if let Some(project_id) = project_id.filter(|id| !id.is_empty()) {
        fields.insert(
            GCP_TRACE_FIELD.into(),
            Value::from(format!("projects/{project_id}/traces/{}", trace.trace_id)),
        );
        fields.insert(GCP_SPAN_ID_FIELD.into(), Value::from(trace.parent_id.as_str()));
        fields.insert(GCP_TRACE_SAMPLED_FIELD.into(), Value::from(trace.is_sampled));
    }
    fields
}

/// Shared entry point that turns an inbound `traceparent` into a scope.
///
/// Built once at startup around a single [`ProjectResolver`] and cloned
/// into every middleware instance and traced function.
#[derive(Clone, Debug)]
pub struct TraceScopes {
    resolver: Arc<ProjectResolver>,
}

impl TraceScopes {
    pub fn new(resolver: Arc<ProjectResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<ProjectResolver> {
        &self.resolver
    }

    /// Build the scope for one unit of work.
    pub async fn enter(&self, inbound: Option<&str>) -> RequestScope {
        self.enter_with(inbound, LogFields::new()).await
    }

    /// Like [`enter`](Self::enter), seeding the record with `extra` fields.
    /// Trace-derived fields win over `extra` on collision.
    pub async fn enter_with(&self, inbound: Option<&str>, extra: LogFields) -> RequestScope {
        let project_id = self.resolver.resolve().await;
        let (traceparent, trace) = select_traceparent(inbound);

        let mut fields = extra;
        fields.extend(log_fields_from_trace(Some(&trace), project_id.as_deref()));
        RequestScope::new(Some(traceparent), fields)
    }

    /// Run `future` in a fresh scope for `inbound`.
    pub async fn run<F>(&self, inbound: Option<&str>, future: F) -> F::Output
    where
        F: Future,
    {
        let scope = self.enter(inbound).await;
        run_in_scope(scope, future).await
    }

    /// Resolve the trace once and return `f` wrapped so that every call
    /// runs in its own scope carrying that trace.
    pub async fn attach<F>(&self, f: F, traceparent: Option<&str>) -> Traced<F> {
        Traced::new(f, self.enter(traceparent).await)
    }
}

/// Use the inbound value when it decodes, otherwise synthesize an unsampled trace.
fn select_traceparent(inbound: Option<&str>) -> (String, Trace) {
    if let Some(value) = inbound.filter(|v| !v.is_empty()) {
        if let Some(trace) = decode(value) {
            return (value.to_string(), trace);
        }
        tracing::debug!(traceparent = %value, "Ignoring malformed traceparent");
    }

    let trace = Trace::generate(false);
    (trace.to_traceparent(), trace)
}
