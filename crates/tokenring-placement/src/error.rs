//! Error types for ring operations.

/// Errors produced by the hash ring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A lookup was attempted on a ring that holds no vnodes.
    #[error("ring is empty: no node can own the key")]
    EmptyRing,

    /// The ring was configured with an unusable vnode count.
    #[error("invalid vnodes per node: {0} (must be at least 1)")]
    InvalidVnodeCount(usize),
}
