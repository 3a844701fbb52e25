//! Cloud Logging severity names.

use tracing::Level;

/// Map a log level label to a Cloud Logging severity.
pub fn severity_for_label(label: &str) -> &'static str {
    match label {
        "trace" | "debug" => "DEBUG",
        "info" => "INFO",
        "warn" => "WARNING",
        "error" => "ERROR",
        "fatal" => "CRITICAL",
        _ => "DEFAULT",
    }
}

/// Map a `tracing` level to a Cloud Logging severity.
pub fn severity_for_level(level: &Level) -> &'static str {
    severity_for_label(label_for_level(level))
}

/// Lowercase label for a `tracing` level.
pub fn label_for_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}
