//! Event formatter that merges request-scoped fields into each log line.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::context::LogFields;
use crate::logging::enrich::{current_enrichment, merge_layers};
use crate::logging::severity::{label_for_level, severity_for_label, severity_for_level};

/// Fields contributed to every line by the application (service name, version, ...).
pub type Mixin = Arc<dyn Fn() -> LogFields + Send + Sync>;

/// Concrete line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// `{"time":…,"severity":"INFO",…fields,"message":…}`
    Json,
    /// `2024-01-01T00:00:00.000Z  INFO message key=value`
    Pretty,
}

/// `FormatEvent` that merges, lowest precedence first: scope enrichment,
/// mixin fields, then the event's own fields. `message`, `severity` and
/// `time` are always written by the formatter.
///
/// An event field `fatal = true` reports as `CRITICAL`.
#[derive(Clone)]
pub struct EnrichedFormat {
    output: Output,
    mixin: Option<Mixin>,
}

impl EnrichedFormat {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            mixin: None,
        }
    }

    pub fn with_mixin(mut self, mixin: Mixin) -> Self {
        self.mixin = Some(mixin);
        self
    }

    /// Split the event into sink-owned parts and the merged field record.
    fn record(&self, event: &Event<'_>) -> (EventFields, LogFields) {
        let mut visitor = EventFields::default();
        event.record(&mut visitor);

        let mixin = self.mixin.as_ref().map(|f| f()).unwrap_or_default();
        let fields = merge_layers([current_enrichment(), mixin, std::mem::take(&mut visitor.fields)]);
        (visitor, fields)
    }

    fn write_json(&self, writer: &mut Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let (visitor, mut record) = self.record(event);

        let severity = if visitor.fatal {
            severity_for_label("fatal")
        } else {
            severity_for_level(event.metadata().level())
        };
        record.insert("time".into(), Value::from(timestamp()));
        record.insert("severity".into(), Value::from(severity));
        record.insert("message".into(), Value::from(visitor.message.unwrap_or_default()));

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }

    fn write_pretty(&self, writer: &mut Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let (visitor, record) = self.record(event);

        let label = if visitor.fatal {
            "fatal"
        } else {
            label_for_level(event.metadata().level())
        };
        write!(
            writer,
            "{} {:>5} {}",
            timestamp(),
            label.to_uppercase(),
            visitor.message.unwrap_or_default()
        )?;
        for (key, value) in &record {
            match value {
                Value::String(s) => write!(writer, " {key}={s}")?,
                other => write!(writer, " {key}={other}")?,
            }
        }
        writeln!(writer)
    }
}

impl fmt::Debug for EnrichedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichedFormat")
            .field("output", &self.output)
            .field("mixin", &self.mixin.is_some())
            .finish()
    }
}

impl<S, N> FormatEvent<S, N> for EnrichedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        match self.output {
            Output::Json => self.write_json(&mut writer, event),
            Output::Pretty => self.write_pretty(&mut writer, event),
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Collects an event's fields as JSON values.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    fatal: bool,
    fields: LogFields,
}

impl EventFields {
    fn insert(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => {
                self.message = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
            }
            "fatal" => self.fatal = value.as_bool().unwrap_or(false),
            name => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(value.to_string()));
        self.insert(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}
