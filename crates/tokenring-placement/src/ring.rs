//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, BTreeSet};

use tokenring_types::{MAX_TOKEN, MIN_TOKEN, RingConfig, Token, TokenRange};
use tracing::debug;

use crate::error::RingError;
use crate::hash::{token_for, vnode_token};

/// Consistent hashing ring mapping string keys to node addresses.
///
/// Each node is placed on an `i32` token ring at `vnodes_per_node` positions,
/// one per replica index `1..=vnodes_per_node`. A key belongs to the first
/// vnode found walking clockwise from the key's token, wrapping from
/// [`MAX_TOKEN`] back to [`MIN_TOKEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    /// Virtual node positions: token -> physical node.
    vnodes: BTreeMap<Token, String>,
    /// Registered physical nodes.
    nodes: BTreeSet<String>,
    /// Number of vnodes placed for every node.
    vnodes_per_node: usize,
}

impl Ring {
    /// Create a ring and add `initial_nodes` in order.
    ///
    /// Fails if `vnodes_per_node` is zero.
    pub fn new<I, S>(vnodes_per_node: usize, initial_nodes: I) -> Result<Self, RingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if vnodes_per_node == 0 {
            return Err(RingError::InvalidVnodeCount(vnodes_per_node));
        }

        let mut ring = Self {
            vnodes: BTreeMap::new(),
            nodes: BTreeSet::new(),
            vnodes_per_node,
        };
        for node in initial_nodes {
            ring.add_node(node);
        }
        Ok(ring)
    }

    /// Create a ring from a [`RingConfig`].
    pub fn from_config(config: &RingConfig) -> Result<Self, RingError> {
        Self::new(config.vnodes_per_node, config.nodes.iter().cloned())
    }

    /// Add a node, placing all of its vnodes on the ring.
    ///
    /// Adding a node that is already present re-inserts the same tokens and
    /// changes nothing. If a vnode token is already held by another node, the
    /// newer vnode takes it over.
    pub fn add_node(&mut self, node: impl Into<String>) {
        let node = node.into();

        for index in 1..=self.vnodes_per_node {
            let token = vnode_token(&node, index);
            if let Some(previous) = self.vnodes.insert(token, node.clone())
                && previous != node
            {
                debug!(token, %previous, %node, "vnode token collision, later node wins");
            }
        }

        debug!(%node, vnodes = self.vnodes_per_node, "added node to ring");
        self.nodes.insert(node);
    }

    /// Remove a node and all of its vnodes.
    ///
    /// Removing an unknown node is a no-op. A vnode token that was taken over
    /// by another node's colliding vnode stays with that node.
    pub fn remove_node(&mut self, node: &str) {
        if !self.nodes.remove(node) {
            debug!(%node, "ignoring removal of unknown node");
            return;
        }

        for index in 1..=self.vnodes_per_node {
            let token = vnode_token(node, index);
            if self.vnodes.get(&token).is_some_and(|owner| owner == node) {
                self.vnodes.remove(&token);
            }
        }

        debug!(%node, "removed node from ring");
    }

    /// Return the node that owns `key`.
    pub fn lookup(&self, key: &str) -> Result<&str, RingError> {
        self.owner_of_token(token_for(key))
    }

    /// Return the node that owns `token`: the first vnode at or after it,
    /// wrapping to the smallest vnode when none follows.
    pub fn owner_of_token(&self, token: Token) -> Result<&str, RingError> {
        self.vnodes
            .range(token..)
            .next()
            .or_else(|| self.vnodes.first_key_value())
            .map(|(_, node)| node.as_str())
            .ok_or(RingError::EmptyRing)
    }

    /// Return every token range owned by `node`, in replica-index order.
    ///
    /// Each vnode owns `[predecessor + 1, token]`. The vnode with the
    /// smallest token on the ring has no predecessor and owns two ranges:
    /// `[last + 1, MAX_TOKEN]` and `[MIN_TOKEN, token]`. The first is omitted
    /// when the last vnode sits exactly on `MAX_TOKEN`.
    ///
    /// The ranges are generally not contiguous. An unknown node owns nothing.
    pub fn token_ranges_for_node(&self, node: &str) -> Vec<TokenRange> {
        let mut ranges = Vec::with_capacity(self.vnodes_per_node + 1);
        if !self.nodes.contains(node) {
            return ranges;
        }

        let mut seen = BTreeSet::new();
        for index in 1..=self.vnodes_per_node {
            let token = vnode_token(node, index);

            // Skip tokens lost to a collision, and a node's own duplicates.
            match self.vnodes.get(&token) {
                Some(owner) if owner == node => {}
                _ => continue,
            }
            if !seen.insert(token) {
                continue;
            }

            match self.vnodes.range(..token).next_back() {
                Some((&previous, _)) => ranges.push(TokenRange::new(previous + 1, token)),
                None => {
                    if let Some((&last, _)) = self.vnodes.last_key_value()
                        && last < MAX_TOKEN
                    {
                        ranges.push(TokenRange::new(last + 1, MAX_TOKEN));
                    }
                    ranges.push(TokenRange::new(MIN_TOKEN, token));
                }
            }
        }

        ranges
    }

    /// Return the token ranges of every registered node.
    pub fn token_ranges_for_all_nodes(&self) -> BTreeMap<String, Vec<TokenRange>> {
        self.nodes
            .iter()
            .map(|node| (node.clone(), self.token_ranges_for_node(node)))
            .collect()
    }

    /// Return the configured number of vnodes per node.
    pub fn vnodes_per_node(&self) -> usize {
        self.vnodes_per_node
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the total number of vnodes in the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Whether the ring holds no vnodes.
    pub fn is_empty(&self) -> bool {
        self.vnodes.is_empty()
    }

    /// Whether `node` is registered.
    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    /// Return the registered nodes in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(String::as_str)
    }

    /// Return every vnode as `(token, node)`, ordered by token.
    pub fn tokens(&self) -> impl Iterator<Item = (Token, &str)> + '_ {
        self.vnodes
            .iter()
            .map(|(&token, node)| (token, node.as_str()))
    }

    /// Return the smallest vnode token and its owner.
    pub fn first_token(&self) -> Option<(Token, &str)> {
        self.vnodes
            .first_key_value()
            .map(|(&token, node)| (token, node.as_str()))
    }

    /// Return the largest vnode token and its owner.
    pub fn last_token(&self) -> Option<(Token, &str)> {
        self.vnodes
            .last_key_value()
            .map(|(&token, node)| (token, node.as_str()))
    }
}
