//! Tower middleware establishing one trace scope per HTTP request.

use axum::http::request::Parts;
use axum::http::Request;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::context::{run_in_scope, LogFields};
use crate::middleware::entry::TraceScopes;
use crate::trace::TRACEPARENT;

type RequestDataFn = Arc<dyn Fn(&Parts) -> LogFields + Send + Sync>;

/// Layer that reads the `traceparent` header and runs the inner service
/// inside a fresh request scope.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(TraceContextLayer::new(scopes));
/// ```
#[derive(Clone)]
pub struct TraceContextLayer {
    scopes: TraceScopes,
    request_data: Option<RequestDataFn>,
}

impl TraceContextLayer {
    pub fn new(scopes: TraceScopes) -> Self {
        Self {
            scopes,
            request_data: None,
        }
    }

    /// Seed every scope with fields taken from the request (headers, path, ...).
    /// Trace fields win on collision.
    pub fn with_request_data<F>(mut self, extract: F) -> Self
    where
        F: Fn(&Parts) -> LogFields + Send + Sync + 'static,
    {
        self.request_data = Some(Arc::new(extract));
        self
    }
}

impl<S> Layer<S> for TraceContextLayer {
    type Service = TraceContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceContextService {
            inner,
            scopes: self.scopes.clone(),
            request_data: self.request_data.clone(),
        }
    }
}

/// Service produced by [`TraceContextLayer`].
#[derive(Clone)]
pub struct TraceContextService<S> {
    inner: S,
    scopes: TraceScopes,
    request_data: Option<RequestDataFn>,
}

impl<S, B> Service<Request<B>> for TraceContextService<S>
where
    S: Service<Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // `self.inner` was driven to readiness; hand that instance to this call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let scopes = self.scopes.clone();

        let (parts, body) = req.into_parts();
        let inbound = parts
            .headers
            .get(TRACEPARENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let extra = self
            .request_data
            .as_ref()
            .map(|extract| extract(&parts))
            .unwrap_or_default();
        let req = Request::from_parts(parts, body);

        Box::pin(async move {
            let scope = scopes.enter_with(inbound.as_deref(), extra).await;
            run_in_scope(scope, async move { inner.call(req).await }).await
        })
    }
}
