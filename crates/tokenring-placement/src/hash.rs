//! MurmurHash3 (x86, 32-bit) and the token derivations built on it.
//!
//! Tokens must be stable across processes and platforms, so the hash is
//! fixed here rather than delegated to `std::hash`, whose output is allowed
//! to change between releases.

use tokenring_types::Token;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// MurmurHash3 x86 32-bit over `data` with the given `seed`.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;

    let mut blocks = data.chunks_exact(4);
    for block in blocks.by_ref() {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_k(k);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k |= u32::from(*byte) << (8 * i);
        }
        h ^= mix_k(k);
    }

    // Only the low 32 bits of the length take part, as in the reference.
    h ^= data.len() as u32;
    fmix32(h)
}

#[inline]
fn mix_k(k: u32) -> u32 {
    k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2)
}

#[inline]
fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

/// Token for a lookup key: `murmur3_32(utf8(key), 0)` as a signed value.
pub fn token_for(key: &str) -> Token {
    murmur3_32(key.as_bytes(), 0) as Token
}

/// Token for replica `index` (1-based) of `node`: the hash of the node
/// address with the decimal index appended.
pub fn vnode_token(node: &str, index: usize) -> Token {
    token_for(&format!("{node}{index}"))
}
