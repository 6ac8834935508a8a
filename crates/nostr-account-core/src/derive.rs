//! Content-addressed account identifiers.
//!
//! An account's address depends only on (implementation descriptor, salt,
//! owner), so it can be computed before the account exists and never changes
//! afterwards:
//!
//! ```text
//! SHA256("nostr-account/address/v1" || 0xff || descriptor || salt || owner)[12..32]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::{Address, PublicKeyX, Salt};

/// Domain prefix for address derivation.
pub const ADDRESS_DOMAIN: &[u8] = b"nostr-account/address/v1";

/// Separator between the domain and the derivation inputs.
const DOMAIN_SEPARATOR: u8 = 0xff;

/// Preimage of [`ImplementationDescriptor::DEFAULT`].
pub const DEFAULT_HANDLE_CODE: &[u8] = b"nostr-account/handle/v1";

/// Hash identifying the stable handle code every account is bound to.
///
/// Part of the identity; upgrading an account's behavior never changes it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplementationDescriptor(pub [u8; 32]);

impl ImplementationDescriptor {
    /// `SHA256("nostr-account/handle/v1")`.
    pub const DEFAULT: Self = Self([
        0xec, 0xbf, 0x4c, 0x2f, 0x96, 0x21, 0x27, 0xfc, 0xc3, 0x3a, 0x4c, 0x55, 0x3d, 0x72, 0xd2,
        0x38, 0xbb, 0xf3, 0x05, 0x52, 0x8b, 0xf0, 0x41, 0xba, 0xf7, 0x90, 0xe2, 0xbe, 0x45, 0x46,
        0xbb, 0xf5,
    ]);

    /// Describe a handle by the hash of its code.
    pub fn from_code(code: &[u8]) -> Self {
        Self(Sha256::digest(code).into())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ImplementationDescriptor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for ImplementationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImplementationDescriptor({})", &self.to_hex()[..16])
    }
}

/// Derives addresses for a fixed implementation descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountDeriver {
    descriptor: ImplementationDescriptor,
}

impl AccountDeriver {
    pub const fn new(descriptor: ImplementationDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn descriptor(&self) -> &ImplementationDescriptor {
        &self.descriptor
    }

    /// The address of the account for (owner, salt). Pure.
    pub fn derive(&self, owner: &PublicKeyX, salt: &Salt) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(ADDRESS_DOMAIN);
        hasher.update([DOMAIN_SEPARATOR]);
        hasher.update(self.descriptor.as_bytes());
        hasher.update(salt.as_bytes());
        hasher.update(owner.as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();

        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Address(out)
    }
}

/// Derive with the default descriptor.
pub fn derive_identifier(owner: &PublicKeyX, salt: &Salt) -> Address {
    AccountDeriver::default().derive(owner, salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const PK3: &str = "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9";

    #[test]
    fn test_default_descriptor_is_hash_of_handle_code() {
        assert_eq!(
            ImplementationDescriptor::from_code(DEFAULT_HANDLE_CODE),
            ImplementationDescriptor::DEFAULT
        );
    }

    #[test]
    fn test_golden_addresses() {
        let g = PublicKeyX::from_hex(G_X).unwrap();
        let pk3 = PublicKeyX::from_hex(PK3).unwrap();

        assert_eq!(
            derive_identifier(&g, &Salt::from_u64(0)).to_hex(),
            "04eebaaa3daecccb76e4c311df9a1fddac4b4608"
        );
        assert_eq!(
            derive_identifier(&g, &Salt::from_u64(1)).to_hex(),
            "cc749f59cadc8945bdd0bd98fd9894a21821b1b3"
        );
        assert_eq!(
            derive_identifier(&pk3, &Salt::from_u64(0)).to_hex(),
            "915d2c5b73066372f2767a2cf4c0b653874c73f4"
        );
    }

    #[test]
    fn test_deterministic() {
        let owner = PublicKeyX::from_bytes([0x42; 32]);
        let salt = Salt::from_u64(7);
        assert_eq!(derive_identifier(&owner, &salt), derive_identifier(&owner, &salt));
    }

    #[test]
    fn test_inputs_separate() {
        let owner = PublicKeyX::from_bytes([0x42; 32]);
        let other = PublicKeyX::from_bytes([0x43; 32]);
        let salt = Salt::from_u64(1);

        let base = derive_identifier(&owner, &salt);
        assert_ne!(base, derive_identifier(&other, &salt));
        assert_ne!(base, derive_identifier(&owner, &Salt::from_u64(2)));

        let custom = AccountDeriver::new(ImplementationDescriptor::from_code(b"other handle"));
        assert_ne!(base, custom.derive(&owner, &salt));
    }

    #[test]
    fn test_owner_and_salt_not_interchangeable() {
        let a = [0x01; 32];
        let b = [0x02; 32];
        assert_ne!(
            derive_identifier(&PublicKeyX::from_bytes(a), &Salt::from_bytes(b)),
            derive_identifier(&PublicKeyX::from_bytes(b), &Salt::from_bytes(a))
        );
    }
}
