//! Shared types for tokenring.
//!
//! This crate defines the token space ([`Token`], [`MIN_TOKEN`], [`MAX_TOKEN`]),
//! the [`TokenRange`] interval that describes what a virtual node owns, and the
//! ring configuration ([`RingConfig`]).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token space
// ---------------------------------------------------------------------------

/// A position on the ring: the signed 32-bit hash of a key or vnode string.
///
/// The token space is circular. Walking clockwise past [`MAX_TOKEN`] wraps
/// around to [`MIN_TOKEN`].
pub type Token = i32;

/// Smallest token on the ring.
pub const MIN_TOKEN: Token = i32::MIN;

/// Largest token on the ring.
pub const MAX_TOKEN: Token = i32::MAX;

/// Closed interval `[start, end]` of tokens owned by one virtual node.
///
/// A vnode owns every token strictly greater than its predecessor's token,
/// up to and including its own. The vnode holding the smallest token also
/// owns the wraparound tail above the largest token, which is reported as a
/// second range ending at [`MAX_TOKEN`].
///
/// Deserializing rejects a range whose `start` exceeds its `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTokenRange")]
pub struct TokenRange {
    /// First token in the range (inclusive).
    pub start: Token,
    /// Last token in the range (inclusive).
    pub end: Token,
}

impl TokenRange {
    /// Create a range. `start` must not exceed `end`.
    pub fn new(start: Token, end: Token) -> Self {
        debug_assert!(start <= end, "token range start {start} > end {end}");
        Self { start, end }
    }

    /// The range covering the whole token space.
    pub fn full() -> Self {
        Self::new(MIN_TOKEN, MAX_TOKEN)
    }

    /// Whether `token` falls inside this range.
    pub fn contains(&self, token: Token) -> bool {
        self.start <= token && token <= self.end
    }

    /// Number of tokens in the range.
    ///
    /// Returned as `u64` because the full range holds 2^32 tokens.
    pub fn len(&self) -> u64 {
        (i64::from(self.end) - i64::from(self.start) + 1) as u64
    }

    /// Always false: a closed range holds at least one token.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Unchecked wire form of [`TokenRange`].
#[derive(Deserialize)]
struct RawTokenRange {
    start: Token,
    end: Token,
}

impl TryFrom<RawTokenRange> for TokenRange {
    type Error = String;

    fn try_from(raw: RawTokenRange) -> Result<Self, Self::Error> {
        let RawTokenRange { start, end } = raw;
        if start > end {
            return Err(format!("token range start {start} > end {end}"));
        }
        Ok(Self::new(start, end))
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default number of virtual nodes per physical node.
pub const DEFAULT_VNODES_PER_NODE: usize = 4;

/// Ring construction parameters.
///
/// Deserializes from a `[ring]` TOML table; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Number of vnodes each physical node places on the ring.
    pub vnodes_per_node: usize,
    /// Node addresses added at construction, in order.
    pub nodes: Vec<String>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnodes_per_node: DEFAULT_VNODES_PER_NODE,
            nodes: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
