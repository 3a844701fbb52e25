//! Request context propagation.
//!
//! # Data Flow
//! ```text
//! entry point (middleware / traced fn)
//!     → scope.rs (RequestScope: traceparent + enrichment record)
//!     → carrier.rs (task-local slot, scoped around the downstream future)
//!     → any code awaited by that future reads the scope without a handle
//!
//! hand-off to another task or thread
//!     → carrier::spawn / carrier::spawn_blocking / carrier::in_current_scope
//! ```
//!
//! # Design Decisions
//! - Scope association follows the future being polled, not a global
//! - Each scope owns its record; siblings never share state
//! - Tokio does not inherit task-locals into spawned tasks, so hand-off is explicit

pub mod carrier;
pub mod scope;

pub use carrier::{
    current, current_fields, current_traceparent, in_current_scope, is_active, run_in_scope,
    spawn, spawn_blocking, sync_scope, with_current,
};
pub use scope::{LogFields, RequestScope};
