//! W3C `traceparent` parsing and generation.
//!
//! ```text
//! 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//! ^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^ ^^
//! version        trace-id              parent-id      flags
//! ```

use rand::rngs::OsRng;
use rand::Rng;
use serde::Serialize;

/// Header name carrying the wire trace string.
pub const TRACEPARENT: &str = "traceparent";

/// The only version we emit.
const VERSION: &str = "00";

/// Parsed representation of a `traceparent` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Global correlation key (32 hex chars when well formed).
    pub trace_id: String,

    /// Id of the immediate caller span (16 hex chars when well formed).
    pub parent_id: String,

    /// Bit 0 of the flags byte.
    pub is_sampled: bool,
}

impl Trace {
    /// Same as [`decode`].
    pub fn from_traceparent(value: &str) -> Option<Self> {
        decode(value)
    }

    /// A new trace with random ids from the OS random source.
    pub fn generate(sampled: bool) -> Self {
        let mut rng = OsRng;
        // All-zero ids are invalid on the wire.
        let trace_id: u128 = loop {
            let id = rng.gen::<u128>();
            if id != 0 {
                break id;
            }
        };
        let parent_id: u64 = loop {
            let id = rng.gen::<u64>();
            if id != 0 {
                break id;
            }
        };

        Self {
            trace_id: format!("{trace_id:032x}"),
            parent_id: format!("{parent_id:016x}"),
            is_sampled: sampled,
        }
    }

    /// Wire form as version `00`. Flags other than the sampled bit are dropped.
    pub fn to_traceparent(&self) -> String {
        let flags = if self.is_sampled { "01" } else { "00" };
        format!("{VERSION}-{}-{}-{flags}", self.trace_id, self.parent_id)
    }
}

/// Decode a `traceparent` string.
///
/// Returns `None` unless the value splits into exactly four dash-separated
/// segments. Segment lengths and alphabets are not checked.
pub fn decode(value: &str) -> Option<Trace> {
    let parts: Vec<&str> = value.split('-').collect();
    let [_version, trace_id, parent_id, flags] = parts.as_slice() else {
        return None;
    };

    Some(Trace {
        trace_id: (*trace_id).to_string(),
        parent_id: (*parent_id).to_string(),
        is_sampled: flags_sampled(flags),
    })
}

/// Generate a fresh `traceparent` with random trace and parent ids.
pub fn encode(sampled: bool) -> String {
    Trace::generate(sampled).to_traceparent()
}

/// Bit 0 of the flags segment read as hex.
///
/// Leading whitespace, a `+` sign and a `0x`/`0X` prefix are skipped, and
/// parsing stops at the first non-hex character, so `"bar"` reads as `0xba`
/// and `" 0x01"` as `1`. A segment with no leading hex digit is unsampled.
fn flags_sampled(flags: &str) -> bool {
    let digits = flags.trim_start();
    let digits = digits.strip_prefix('+').unwrap_or(digits);
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    digits
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .last()
        .and_then(|c| c.to_digit(16))
        .map(|digit| digit & 0x01 == 0x01)
        .unwrap_or(false)
}
