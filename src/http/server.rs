//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the Axum router with the demo handlers
//! - Wire up middleware (trace context, access tracing, timeout)
//! - Bind server to listener and shut down gracefully

use axum::{
    extract::Query,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::context::{self, LogFields};
use crate::http::propagation::{trace_id, traceparent};
use crate::logging::{current_enrichment, decorate};
use crate::middleware::{TraceContextLayer, TraceScopes};

/// Identity-Aware Proxy header naming the calling service account.
pub const IAP_USER_EMAIL: &str = "x-goog-authenticated-user-email";

/// HTTP server for the demo application.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, scopes: TraceScopes) -> Self {
        let router = Self::build_router(&config, scopes);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The trace context layer is outermost so access logs from
    /// `TraceLayer` carry the request's trace fields too.
    fn build_router(config: &AppConfig, scopes: TraceScopes) -> Router {
        Router::new()
            .route("/", get(hello_handler))
            .route("/decorated", get(decorated_handler))
            .route("/fanout", get(fanout_handler))
            .route("/trace", get(trace_handler))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.server.request_timeout_secs),
            ))
            .layer(TraceLayer::new_for_http())
            .layer(TraceContextLayer::new(scopes).with_request_data(iap_request_data))
    }

    /// The configured router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Log the calling service account when the request came through IAP.
fn iap_request_data(parts: &Parts) -> LogFields {
    let mut fields = LogFields::new();
    if let Some(email) = parts
        .headers
        .get(IAP_USER_EMAIL)
        .and_then(|v| v.to_str().ok())
    {
        fields.insert("clientServiceAccount".into(), Value::from(email));
    }
    fields
}

async fn hello_handler() -> &'static str {
    tracing::info!("Hello, world!");
    "Hello, world!"
}

#[derive(Debug, Deserialize)]
struct DecorateQuery {
    user: Option<String>,
}

async fn decorated_handler(Query(query): Query<DecorateQuery>) -> Response {
    if let Some(user) = query.user {
        if let Err(e) = decorate([("user", user)]) {
            tracing::error!(error = %e, "Failed to decorate logs");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    }

    tracing::info!("Decorated request");
    Json(current_enrichment()).into_response()
}

/// Spawn workers that log from their own tasks; they stay in the request scope.
async fn fanout_handler() -> Json<Vec<Option<String>>> {
    let handles: Vec<_> = (0..3u64)
        .map(|worker| {
            context::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5 * (3 - worker))).await;
                tracing::info!(worker, "Worker finished");
                trace_id()
            })
        })
        .collect();

    let mut seen = Vec::with_capacity(handles.len());
    for handle in handles {
        seen.push(handle.await.ok().flatten());
    }
    Json(seen)
}

async fn trace_handler() -> Json<Value> {
    tokio::task::yield_now().await;
    Json(json!({
        "traceparent": traceparent(),
        "traceId": trace_id(),
        "fields": current_enrichment(),
    }))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
