//! Running arbitrary functions inside a trace scope.

use std::fmt;
use std::future::Future;

use crate::context::{run_in_scope, sync_scope, LogFields, RequestScope};

/// A function bound to a precomputed trace.
///
/// Every call gets its own scope cloned from the same record, so concurrent
/// calls never see each other's decorations. Built by
/// [`TraceScopes::attach`](crate::middleware::TraceScopes::attach).
#[derive(Clone)]
pub struct Traced<F> {
    f: F,
    template: RequestScope,
}

impl<F> Traced<F> {
    pub(crate) fn new(f: F, template: RequestScope) -> Self {
        Self { f, template }
    }

    /// The `traceparent` every call runs under.
    pub fn traceparent(&self) -> Option<&str> {
        self.template.traceparent()
    }

    /// The record each call starts from.
    pub fn fields(&self) -> LogFields {
        self.template.fields()
    }

    /// Call an async function. `f` is invoked inside the scope, and its
    /// output (including an `Err`) is returned unchanged.
    pub async fn call<A, Fut>(&self, args: A) -> Fut::Output
    where
        F: Fn(A) -> Fut,
        Fut: Future,
    {
        let f = &self.f;
        run_in_scope(self.template.clone(), async move { f(args).await }).await
    }

    /// Call a synchronous function.
    pub fn call_sync<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        sync_scope(self.template.clone(), || (self.f)(args))
    }
}

impl<F> fmt::Debug for Traced<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traced")
            .field("traceparent", &self.template.traceparent())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::context::{current_fields, current_traceparent, is_active};
    use crate::logging::decorate;
    use crate::middleware::TraceScopes;
    use crate::project::ProjectResolver;
    use serde_json::json;
    use std::sync::Arc;

    const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    fn scopes() -> TraceScopes {
        TraceScopes::new(Arc::new(ProjectResolver::fixed(Some("test-project".into()))))
    }

    #[tokio::test]
    async fn test_call_runs_in_scope_each_time() {
        let traced = scopes()
            .attach(
                |n: u32| async move {
                    tokio::task::yield_now().await;
                    (n, current_traceparent())
                },
                Some(TRACEPARENT),
            )
            .await;

        for n in 1..=3 {
            let (seen, tp) = traced.call(n).await;
            assert_eq!(seen, n);
            assert_eq!(tp.as_deref(), Some(TRACEPARENT));
        }
        assert!(!is_active());
    }

    #[tokio::test]
    async fn test_calls_get_independent_scopes() {
        let traced = scopes()
            .attach(
                |key: &'static str| async move {
                    decorate([(key, true)]).unwrap();
                    tokio::task::yield_now().await;
                    current_fields().unwrap()
                },
                Some(TRACEPARENT),
            )
            .await;

        let (first, second) = tokio::join!(traced.call("first"), traced.call("second"));
        assert!(first.contains_key("first") && !first.contains_key("second"));
        assert!(second.contains_key("second") && !second.contains_key("first"));
        assert!(!traced.fields().contains_key("first"));
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let traced = scopes()
            .attach(
                |_: ()| async {
                    tokio::task::yield_now().await;
                    Err::<(), _>("Something went wrong!")
                },
                None,
            )
            .await;

        assert_eq!(traced.call(()).await, Err("Something went wrong!"));
    }

    #[tokio::test]
    async fn test_attach_without_traceparent_synthesizes() {
        let traced = scopes().attach(|_: ()| async {}, None).await;
        let tp = traced.traceparent().unwrap();
        assert!(tp.ends_with("-00"));
        assert_eq!(
            traced.fields()["logging.googleapis.com/trace_sampled"],
            json!(false)
        );
    }

    #[tokio::test]
    async fn test_call_sync() {
        let traced = scopes()
            .attach(|x: i32| (x * 2, current_traceparent()), Some(TRACEPARENT))
            .await;
        assert_eq!(traced.call_sync(21), (42, Some(TRACEPARENT.to_string())));
    }
}
