//! Trace identifier wire codec.
//!
//! # Data Flow
//! ```text
//! inbound `traceparent` header
//!     → traceparent.rs (decode: version-traceId-parentId-flags)
//!     → Trace (traceId, parentId, isSampled)
//!
//! no header / malformed header
//!     → traceparent.rs (encode: fresh random ids, unsampled)
//! ```
//!
//! # Design Decisions
//! - Decoding only checks the segment count; segment contents pass through
//! - The sampled flag is bit 0 of the flags byte, not "flags != 00"
//! - Fresh ids come from the OS random source

pub mod traceparent;

pub use traceparent::{decode, encode, Trace, TRACEPARENT};
