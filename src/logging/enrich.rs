//! Reading and extending the active scope's log fields.

use serde_json::Value;

use crate::context::{self, LogFields};
use crate::error::ContextError;

/// Enrichment fields of the active scope, or an empty map outside any scope.
pub fn current_enrichment() -> LogFields {
    context::current_fields().unwrap_or_default()
}

/// Add fields to the active scope so every later log line in that scope,
/// and only that scope, carries them.
///
/// Fails with [`ContextError::NoActiveScope`] outside of a scope.
pub fn decorate<I, K, V>(fields: I) -> Result<(), ContextError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    context::with_current(|scope| {
        scope.extend(
            fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
    })
    .ok_or(ContextError::NoActiveScope)
}

/// Merge layers of fields; later layers win on key collision.
pub(crate) fn merge_layers<const N: usize>(layers: [LogFields; N]) -> LogFields {
    let mut merged = LogFields::new();
    for layer in layers {
        merged.extend(layer);
    }
    merged
}
