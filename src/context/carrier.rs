//! Task-local carrier for the active [`RequestScope`].
//!
//! The scope is installed with `tokio::task_local!`, so it is visible from
//! every poll of the scoped future, across every `.await` inside it, and
//! inside any library future it awaits. Concurrent requests polled on the
//! same thread each see their own scope because the slot is swapped in and
//! out around each poll.

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::context::scope::{LogFields, RequestScope};

tokio::task_local! {
    static CURRENT: Arc<RequestScope>;
}

/// Run `future` with `scope` as the current scope.
///
/// Nested calls shadow the outer scope for their own extent only. The
/// future's output, including any `Err`, is returned unchanged.
pub async fn run_in_scope<F>(scope: RequestScope, future: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(Arc::new(scope), future).await
}

/// Run a synchronous closure with `scope` as the current scope.
pub fn sync_scope<F, R>(scope: RequestScope, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT.sync_scope(Arc::new(scope), f)
}

/// The innermost active scope, or `None` outside of any scope.
pub fn current() -> Option<Arc<RequestScope>> {
    CURRENT.try_with(Arc::clone).ok()
}

/// Borrow the active scope without cloning the handle.
pub fn with_current<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&RequestScope) -> R,
{
    CURRENT.try_with(|scope| f(scope)).ok()
}

/// Whether the caller runs inside a scope.
pub fn is_active() -> bool {
    CURRENT.try_with(|_| ()).is_ok()
}

/// Snapshot of the active scope's enrichment record.
pub fn current_fields() -> Option<LogFields> {
    with_current(RequestScope::fields)
}

/// The active scope's `traceparent`.
pub fn current_traceparent() -> Option<String> {
    with_current(|scope| scope.traceparent().map(str::to_string)).flatten()
}

/// Bind `future` to the caller's scope so it keeps that scope wherever it
/// is polled (another task, a join set, a channel consumer).
///
/// Outside of any scope the future is returned as-is.
pub fn in_current_scope<F>(future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    let scope = current();
    async move {
        match scope {
            Some(scope) => CURRENT.scope(scope, future).await,
            None => future.await,
        }
    }
}

/// `tokio::spawn` that carries the caller's scope into the new task.
///
/// The task keeps the scope after the spawning frame returns, and
/// decorations made by either side are shared because both hold the same
/// scope.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(in_current_scope(future))
}

/// `tokio::task::spawn_blocking` that carries the caller's scope onto the
/// blocking thread.
pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let scope = current();
    tokio::task::spawn_blocking(move || match scope {
        Some(scope) => CURRENT.sync_scope(scope, f),
        None => f(),
    })
}
