//! Thread-safe handle around a [`Ring`].
//!
//! [`Ring`] itself does no locking. [`SharedRing`] is the synchronization
//! boundary for callers that share one ring across threads: membership
//! changes take the write lock, lookups and range queries take the read lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokenring_types::TokenRange;
use tracing::info;

use crate::error::RingError;
use crate::ring::Ring;
use crate::transfer::Transfer;

/// Shared, cloneable handle to one ring.
///
/// Clones refer to the same ring.
#[derive(Debug, Clone)]
pub struct SharedRing {
    ring: Arc<RwLock<Ring>>,
}

impl SharedRing {
    /// Wrap `ring` for shared use.
    pub fn new(ring: Ring) -> Self {
        Self {
            ring: Arc::new(RwLock::new(ring)),
        }
    }

    /// Return the node that owns `key`.
    pub fn lookup(&self, key: &str) -> Result<String, RingError> {
        self.ring.read().lookup(key).map(str::to_owned)
    }

    /// Add a node and return the ranges it takes over.
    ///
    /// The diff is computed under the same write lock as the change, so the
    /// returned transfers describe exactly this step.
    pub fn add_node(&self, node: impl Into<String>) -> Vec<Transfer> {
        let node = node.into();
        let mut ring = self.ring.write();
        let before = ring.clone();
        ring.add_node(node.clone());

        let transfers = Ring::diff(&before, &ring);
        info!(%node, transfers = transfers.len(), "node joined ring");
        transfers
    }

    /// Remove a node and return the ranges its neighbours absorb.
    pub fn remove_node(&self, node: &str) -> Vec<Transfer> {
        let mut ring = self.ring.write();
        if !ring.contains_node(node) {
            return Vec::new();
        }
        let before = ring.clone();
        ring.remove_node(node);

        let transfers = Ring::diff(&before, &ring);
        info!(%node, transfers = transfers.len(), "node left ring");
        transfers
    }

    /// Return the token ranges owned by `node`.
    pub fn token_ranges_for_node(&self, node: &str) -> Vec<TokenRange> {
        self.ring.read().token_ranges_for_node(node)
    }

    /// Return the token ranges of every node, from one consistent state.
    pub fn token_ranges_for_all_nodes(&self) -> BTreeMap<String, Vec<TokenRange>> {
        self.ring.read().token_ranges_for_all_nodes()
    }

    /// Return a copy of the current ring.
    pub fn snapshot(&self) -> Ring {
        self.ring.read().clone()
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.ring.read().node_count()
    }

    /// Whether `node` is registered.
    pub fn contains_node(&self, node: &str) -> bool {
        self.ring.read().contains_node(node)
    }
}

impl From<Ring> for SharedRing {
    fn from(ring: Ring) -> Self {
        Self::new(ring)
    }
}
