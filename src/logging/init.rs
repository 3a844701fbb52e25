//! Subscriber construction.

use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::context::LogFields;
use crate::error::LoggingError;
use crate::logging::format::{EnrichedFormat, Mixin, Output};

/// Builds a `tracing` subscriber whose events carry request-scoped fields.
///
/// ```rust,ignore
/// LoggerBuilder::new(config.logging.clone())
///     .mixin(|| service_fields())
///     .init()?;
/// ```
pub struct LoggerBuilder {
    config: LoggingConfig,
    mixin: Option<Mixin>,
}

impl LoggerBuilder {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            mixin: None,
        }
    }

    /// Fields added to every line. They override scope enrichment and are
    /// overridden by per-event fields.
    pub fn mixin<F>(mut self, mixin: F) -> Self
    where
        F: Fn() -> LogFields + Send + Sync + 'static,
    {
        self.mixin = Some(Arc::new(mixin));
        self
    }

    /// Build a subscriber over `make_writer` without installing it.
    ///
    /// `LogFormat::Auto` resolves to JSON here: an explicit writer is a
    /// machine consumer.
    pub fn build_with_writer<W>(
        self,
        make_writer: W,
    ) -> Result<impl Subscriber + Send + Sync + 'static, LoggingError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(&self.config.level)?;
        let format = self.event_format(self.output(true));

        Ok(tracing_subscriber::registry().with(filter).with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(make_writer),
        ))
    }

    /// Install a stdout subscriber as the global default.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(self) -> Result<(), LoggingError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.config.level))?;
        let format = self.event_format(self.output(false));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(format)
                    .with_writer(std::io::stdout),
            )
            .try_init()?;
        Ok(())
    }

    fn output(&self, explicit_writer: bool) -> Output {
        match self.config.format {
            LogFormat::Json => Output::Json,
            LogFormat::Pretty => Output::Pretty,
            LogFormat::Auto if self.config.is_development() && !explicit_writer => Output::Pretty,
            LogFormat::Auto => Output::Json,
        }
    }

    fn event_format(&self, output: Output) -> EnrichedFormat {
        let format = EnrichedFormat::new(output);
        match &self.mixin {
            Some(mixin) => format.with_mixin(mixin.clone()),
            None => format,
        }
    }
}

/// Install the global subscriber from config.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    LoggerBuilder::new(config.clone()).init()
}
