//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Metadata endpoint returning the Google Cloud project id as plain text.
pub const GCP_METADATA_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/project/project-id";

/// Environment variable naming the project id directly.
pub const DEFAULT_PROJECT_ENV_VAR: &str = "GCP_PROJECT";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Demo server settings.
    pub server: ServerConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Project id resolution settings.
    pub project: ProjectConfig,
}

impl AppConfig {
    /// Apply `APP_ENV` and `LOG_LEVEL` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(env) = lookup("APP_ENV").filter(|v| !v.is_empty()) {
            self.logging.environment = env;
        }
        if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
            self.logging.level = level;
        }
    }
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty in development-like environments, JSON elsewhere.
    #[default]
    Auto,
    /// One JSON object per line with a Cloud Logging `severity`.
    Json,
    /// Human-readable single line.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Deployment environment; drives `LogFormat::Auto`.
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Auto,
            environment: "development".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Whether `Auto` resolves to pretty output for this environment.
    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev" | "test")
    }
}

/// Project id resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Environment variable that overrides every other source.
    pub env_var: String,

    /// Statically configured project id, used when the variable is unset.
    pub project_id: Option<String>,

    /// Query the metadata server when no id is configured.
    pub metadata_enabled: bool,

    /// Metadata endpoint.
    pub metadata_url: String,

    /// Metadata request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            env_var: DEFAULT_PROJECT_ENV_VAR.to_string(),
            project_id: None,
            metadata_enabled: true,
            metadata_url: GCP_METADATA_URL.to_string(),
            timeout_ms: 50,
        }
    }
}
