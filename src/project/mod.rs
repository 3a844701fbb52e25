//! Google Cloud project id resolution.
//!
//! # Data Flow
//! ```text
//! resolve()
//!     → env override (GCP_PROJECT)      → id, no caching needed
//!     → static config (project_id)      → id
//!     → metadata server (50 ms timeout) → cached once per process
//! ```
//!
//! # Design Decisions
//! - One shared resolver built at startup, injected into the entry points
//! - Lookup failures mean "not on GCP", never an error
//! - Concurrent first callers share a single in-flight lookup

pub mod resolver;

pub use resolver::{ProjectResolver, ProjectState};
