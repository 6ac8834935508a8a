//! Canonical encoding of the account authentication event.
//!
//! The signed message is the SHA-256 of a Nostr-style event serialization
//! `[version, pubkey, created_at, kind, tags, content]` with fixed version,
//! timestamp, kind and tags, and with `content` carrying the operation digest:
//!
//! ```text
//! [0,"<owner hex64>",0,96024,[],"<digest hex64>"]
//! ```
//!
//! Hex is lowercase, zero padded, without `0x`. There is no whitespace. The
//! same (owner, digest) always yields the same bytes.

use bytes::Bytes;

use crate::types::{OperationDigest, PublicKeyX, Sha256Hash};

/// Event kind for account authentication.
pub const AUTH_EVENT_KIND: u32 = 96024;

/// Event kind the relay transport uses for the signed operation envelope.
///
/// Distinct from [`AUTH_EVENT_KIND`]; never used for the signed message.
pub const ENVELOPE_EVENT_KIND: u32 = 96124;

/// Fixed `created_at` of the authentication event.
pub const AUTH_EVENT_CREATED_AT: u64 = 0;

/// Leading version field of the serialization.
pub const EVENT_VERSION: u8 = 0;

/// Encode the authentication event for (owner, digest).
pub fn canonical_event_bytes(owner: &PublicKeyX, digest: &OperationDigest) -> Vec<u8> {
    // 2 quoted hex64 strings plus the fixed fields.
    let mut buf = Vec::with_capacity(160);

    buf.push(b'[');
    push_decimal(&mut buf, u64::from(EVENT_VERSION));
    buf.push(b',');
    push_hex_string(&mut buf, owner.as_bytes());
    buf.push(b',');
    push_decimal(&mut buf, AUTH_EVENT_CREATED_AT);
    buf.push(b',');
    push_decimal(&mut buf, u64::from(AUTH_EVENT_KIND));
    buf.extend_from_slice(b",[],");
    push_hex_string(&mut buf, digest.as_bytes());
    buf.push(b']');

    buf
}

/// `SHA256(canonical_event_bytes(owner, digest))`, the message that gets signed.
pub fn event_hash(owner: &PublicKeyX, digest: &OperationDigest) -> Sha256Hash {
    Sha256Hash::hash(&canonical_event_bytes(owner, digest))
}

fn push_decimal(buf: &mut Vec<u8>, n: u64) {
    buf.extend_from_slice(n.to_string().as_bytes());
}

fn push_hex_string(buf: &mut Vec<u8>, bytes: &[u8; 32]) {
    buf.push(b'"');
    buf.extend_from_slice(hex::encode(bytes).as_bytes());
    buf.push(b'"');
}

/// An authentication event with its canonical bytes and hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedEvent {
    owner: PublicKeyX,
    digest: OperationDigest,
    bytes: Bytes,
    id: Sha256Hash,
}

impl AuthenticatedEvent {
    pub fn new(owner: PublicKeyX, digest: OperationDigest) -> Self {
        let bytes = Bytes::from(canonical_event_bytes(&owner, &digest));
        let id = Sha256Hash::hash(&bytes);
        Self {
            owner,
            digest,
            bytes,
            id,
        }
    }

    pub fn owner(&self) -> &PublicKeyX {
        &self.owner
    }

    pub fn digest(&self) -> &OperationDigest {
        &self.digest
    }

    pub fn kind(&self) -> u32 {
        AUTH_EVENT_KIND
    }

    /// The canonical serialization.
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// The event hash, i.e. the 32-byte message to verify.
    pub fn id(&self) -> &Sha256Hash {
        &self.id
    }

    /// The canonical serialization as text. Always ASCII.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}
