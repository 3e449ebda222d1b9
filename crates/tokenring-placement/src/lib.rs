//! Consistent hashing ring mapping string keys to node addresses.
//!
//! Every node is placed on a circular `i32` token space at several virtual
//! node (vnode) positions, `murmur3(node ++ index)` for `index` in
//! `1..=vnodes_per_node`. A key belongs to the first vnode at or after its
//! own token, wrapping around past the largest token. More vnodes per node
//! gives a more uniform distribution.
//!
//! The ring also reports which token ranges each node owns, and which ranges
//! change owner between two ring states ([`Transfer`]), so that a data store
//! built on top of it knows exactly which keys to move when membership
//! changes. Moving the data is the caller's job.

mod error;
pub mod hash;
mod ring;
mod shared;
mod transfer;

pub use error::RingError;
pub use hash::{murmur3_32, token_for};
pub use ring::Ring;
pub use shared::SharedRing;
pub use tokenring_types::{MAX_TOKEN, MIN_TOKEN, RingConfig, Token, TokenRange};
pub use transfer::Transfer;
