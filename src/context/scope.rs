//! Per-request scope state.

use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Structured fields merged into every log line emitted inside a scope.
pub type LogFields = serde_json::Map<String, Value>;

/// State owned by one unit of work (one request, one traced invocation).
///
/// The enrichment record is behind a mutex so code holding only a shared
/// reference (the task-local slot) can decorate it in place.
#[derive(Debug, Default)]
pub struct RequestScope {
    traceparent: Option<String>,
    fields: Mutex<LogFields>,
}

impl RequestScope {
    /// Create a scope for the given wire trace string and initial record.
    pub fn new(traceparent: Option<String>, fields: LogFields) -> Self {
        Self {
            traceparent,
            fields: Mutex::new(fields),
        }
    }

    /// The literal `traceparent` that produced this scope, if any.
    pub fn traceparent(&self) -> Option<&str> {
        self.traceparent.as_deref()
    }

    /// Snapshot of the enrichment record.
    pub fn fields(&self) -> LogFields {
        self.lock().clone()
    }

    /// Read a single field.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Set a single field, replacing any previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Merge fields into the record; incoming values win.
    pub fn extend(&self, fields: LogFields) {
        self.lock().extend(fields);
    }

    fn lock(&self) -> MutexGuard<'_, LogFields> {
        // A panic while holding the guard cannot leave the map half-written.
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for RequestScope {
    /// Independent copy: decorating the clone leaves the original untouched.
    fn clone(&self) -> Self {
        Self::new(self.traceparent.clone(), self.fields())
    }
}
