//! BIP340 tagged hashing and the Schnorr challenge scalar.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::curve::curve_order;

/// Tag for the signature challenge.
pub const CHALLENGE_TAG: &str = "BIP0340/challenge";

/// `SHA256("BIP0340/challenge")`.
pub const CHALLENGE_TAG_HASH: [u8; 32] = [
    0x7b, 0xb5, 0x2d, 0x7a, 0x9f, 0xef, 0x58, 0x32, 0x3e, 0xb1, 0xbf, 0x7a, 0x40, 0x7d, 0xb3, 0x82,
    0xd2, 0xf3, 0xf2, 0xd8, 0x1b, 0xb1, 0x22, 0x4f, 0x49, 0xfe, 0x51, 0x8f, 0x6d, 0x48, 0xd3, 0x7c,
];

/// `SHA256(SHA256(tag) || SHA256(tag) || data)`.
pub fn tagged_hash(tag: &str, data: &[u8]) -> [u8; 32] {
    let tag_hash: [u8; 32] = Sha256::digest(tag.as_bytes()).into();
    tagged_hash_with_prefix(&tag_hash, &[data])
}

fn tagged_hash_with_prefix(tag_hash: &[u8; 32], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Raw challenge hash `SHA256(tag || tag || rx || px || m)`, before reduction.
pub fn challenge_hash(rx: &[u8; 32], px: &[u8; 32], m: &[u8; 32]) -> [u8; 32] {
    tagged_hash_with_prefix(&CHALLENGE_TAG_HASH, &[rx, px, m])
}

/// Challenge scalar `e = int(challenge_hash(rx, px, m)) mod n`.
pub fn challenge(rx: &[u8; 32], px: &[u8; 32], m: &[u8; 32]) -> BigUint {
    BigUint::from_bytes_be(&challenge_hash(rx, px, m)) % curve_order()
}
