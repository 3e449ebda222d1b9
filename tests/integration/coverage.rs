//! Integration test: ring-wide ownership properties.
//!
//! Across many ring shapes, the token ranges reported for all nodes tile the
//! token space exactly once and agree with key lookup.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenring_integration_tests::{node_addresses, random_keys};
use tokenring_placement::{MAX_TOKEN, MIN_TOKEN, Ring, TokenRange, token_for};

fn assert_tiles_token_space(ring: &Ring) {
    let mut all: Vec<TokenRange> = ring
        .token_ranges_for_all_nodes()
        .into_values()
        .flatten()
        .collect();
    all.sort();

    let mut next = i64::from(MIN_TOKEN);
    for range in &all {
        assert_eq!(i64::from(range.start), next, "gap or overlap at {range}");
        next = i64::from(range.end) + 1;
    }
    assert_eq!(
        next,
        i64::from(MAX_TOKEN) + 1,
        "token space not fully covered"
    );
}

#[test]
#[ntest::timeout(60000)]
fn test_random_rings_tile_token_space() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let nodes = rng.random_range(1..=12);
        let vnodes = rng.random_range(1..=64);
        let ring = Ring::new(vnodes, node_addresses(nodes)).unwrap();

        assert_eq!(ring.node_count(), nodes);
        assert_tiles_token_space(&ring);
    }
}

#[test]
#[ntest::timeout(60000)]
fn test_lookup_lands_in_exactly_one_owned_range() {
    let ring = Ring::new(4, node_addresses(3)).unwrap();
    let all = ring.token_ranges_for_all_nodes();

    for key in random_keys(20_000, 9) {
        let token = token_for(&key);
        let owner = ring.lookup(&key).unwrap();

        for (node, ranges) in &all {
            let hits = ranges.iter().filter(|r| r.contains(token)).count();
            let expected = usize::from(node == owner);
            assert_eq!(
                hits, expected,
                "{key} (token {token}) vs {node}, owner {owner}"
            );
        }
    }
}

#[test]
fn test_each_node_reports_its_vnode_count_of_ranges() {
    let ring = Ring::new(8, node_addresses(4)).unwrap();
    let (_, wrap_owner) = ring.first_token().unwrap();

    for (node, ranges) in ring.token_ranges_for_all_nodes() {
        // The wraparound vnode contributes a second range.
        let expected = if node == wrap_owner { 9 } else { 8 };
        assert_eq!(ranges.len(), expected, "{node}");
    }
}

#[test]
fn test_coverage_survives_membership_changes() {
    let mut ring = Ring::new(16, node_addresses(5)).unwrap();
    assert_tiles_token_space(&ring);

    ring.remove_node("10.0.0.2");
    assert_tiles_token_space(&ring);

    ring.add_node("10.0.0.9");
    assert_tiles_token_space(&ring);

    ring.remove_node("10.0.0.0");
    ring.remove_node("10.0.0.1");
    assert_tiles_token_space(&ring);
}
