//! Shared test harness for tokenring integration tests.
//!
//! Provides [`KeyValueCluster`]: an in-memory key-value store sharded over a
//! [`SharedRing`]. It plays the data store that sits on top of the ring and
//! moves keys itself when membership changes:
//!
//! - on join, it asks the ring for the new node's token ranges and pulls
//!   every matching key from the existing nodes;
//! - on leave, it hands the departing node's keys to the receivers named by
//!   the ring's transfers.

use std::collections::{BTreeMap, HashMap};

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenring_placement::{Ring, SharedRing, token_for};
use tracing::debug;

/// Key-value store sharded across the nodes of a ring.
pub struct KeyValueCluster {
    ring: SharedRing,
    /// Per-node storage: node -> key -> value.
    stores: BTreeMap<String, HashMap<String, String>>,
}

impl KeyValueCluster {
    /// Create a cluster of `nodes`, each with `vnodes` vnodes.
    pub fn new(vnodes: usize, nodes: &[&str]) -> Self {
        let ring = Ring::new(vnodes, nodes.iter().copied()).expect("vnodes > 0");
        let stores = nodes
            .iter()
            .map(|n| (n.to_string(), HashMap::new()))
            .collect();
        Self {
            ring: ring.into(),
            stores,
        }
    }

    /// The ring that places keys.
    pub fn ring(&self) -> &SharedRing {
        &self.ring
    }

    /// Store `value` under `key` on the key's owner.
    pub fn put(&mut self, key: &str, value: &str) {
        let owner = self.ring.lookup(key).expect("cluster has nodes");
        self.stores
            .entry(owner)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    /// Read `key` from its owner only.
    pub fn get(&self, key: &str) -> Option<&str> {
        let owner = self.ring.lookup(key).ok()?;
        self.stores.get(&owner)?.get(key).map(String::as_str)
    }

    /// Add `node` and migrate into it every key that falls in its ranges.
    ///
    /// Returns the number of keys moved.
    pub fn add_node(&mut self, node: &str) -> usize {
        self.ring.add_node(node);
        let ranges = self.ring.token_ranges_for_node(node);

        let mut incoming = HashMap::new();
        for (holder, store) in self.stores.iter_mut() {
            if holder == node {
                continue;
            }
            let moving: Vec<String> = store
                .keys()
                .filter(|k| ranges.iter().any(|r| r.contains(token_for(k))))
                .cloned()
                .collect();
            for key in moving {
                if let Some(value) = store.remove(&key) {
                    incoming.insert(key, value);
                }
            }
        }

        let moved = incoming.len();
        self.stores
            .entry(node.to_string())
            .or_default()
            .extend(incoming);
        debug!(%node, moved, "node joined, keys migrated in");
        moved
    }

    /// Remove `node` and hand each of its keys to the node taking over its
    /// token. Returns the number of keys moved.
    ///
    /// Panics if `node` is the last node and still holds keys.
    pub fn remove_node(&mut self, node: &str) -> usize {
        let transfers = self.ring.remove_node(node);
        let Some(store) = self.stores.remove(node) else {
            return 0;
        };

        let moved = store.len();
        for (key, value) in store {
            let token = token_for(&key);
            let receiver = transfers
                .iter()
                .find(|t| t.range.contains(token))
                .map(|t| t.to.clone())
                .expect("every key of a departing node falls in a transfer");
            self.stores.entry(receiver).or_default().insert(key, value);
        }
        debug!(%node, moved, "node left, keys handed off");
        moved
    }

    /// Number of keys stored on `node`.
    pub fn keys_on(&self, node: &str) -> usize {
        self.stores.get(node).map_or(0, HashMap::len)
    }

    /// Total number of stored keys.
    pub fn total_keys(&self) -> usize {
        self.stores.values().map(HashMap::len).sum()
    }

    /// Nodes currently holding a store.
    pub fn store_nodes(&self) -> Vec<String> {
        self.stores.keys().cloned().collect()
    }

    /// Keys stored on a node that does not own them.
    pub fn misplaced_keys(&self) -> Vec<String> {
        let mut misplaced = Vec::new();
        for (node, store) in &self.stores {
            for key in store.keys() {
                if self.ring.lookup(key).ok().as_deref() != Some(node.as_str()) {
                    misplaced.push(key.clone());
                }
            }
        }
        misplaced
    }
}

/// Generate `count` random alphanumeric keys of length 1..=50.
pub fn random_keys(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(1..=50);
            (&mut rng)
                .sample_iter(Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        })
        .collect()
}

/// Node addresses `10.0.0.0` .. `10.0.0.{count - 1}`.
pub fn node_addresses(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("10.0.0.{i}")).collect()
}
