//! Deterministic BIP340 signer for tests.
//!
//! Produces genuine signatures so verification can be exercised end to end.
//! Nothing here is constant time; it is test support, not key management.

use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;

use nostr_account_core::challenge::{challenge, tagged_hash};
use nostr_account_core::curve::{curve_order, mul_generator, to_biguint, to_bytes32};
use nostr_account_core::{
    event_hash, AuthorizationRequest, OperationDigest, PublicKeyX, Salt, Signature,
};

/// A secp256k1 secret key with its x-only public key.
#[derive(Clone)]
pub struct TestSigner {
    /// Secret scalar, already negated if needed so that `d·G` has even y.
    secret: BigUint,
    public_key: PublicKeyX,
}

impl TestSigner {
    /// Build from a 32-byte secret. `None` unless `0 < secret < n`.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Option<Self> {
        let d = to_biguint(&bytes);
        let n = curve_order();
        if d.is_zero() || &d >= n {
            return None;
        }

        let point = mul_generator(&d);
        let affine = point.affine()?;
        let secret = if affine.has_even_y() { d } else { n - d };

        Some(Self {
            secret,
            public_key: PublicKeyX::from_bytes(affine.x_bytes()),
        })
    }

    /// Build from a small secret. Panics on zero.
    pub fn from_u64(secret: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&secret.to_be_bytes());
        match Self::from_secret_bytes(bytes) {
            Some(signer) => signer,
            None => panic!("secret must be nonzero"),
        }
    }

    /// A signer with a random secret.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            if let Some(signer) = Self::from_secret_bytes(bytes) {
                return signer;
            }
        }
    }

    pub fn public_key(&self) -> PublicKeyX {
        self.public_key
    }

    /// Sign a 32-byte message with all-zero auxiliary randomness.
    pub fn sign(&self, message: &[u8; 32]) -> Signature {
        self.sign_with_aux(message, &[0u8; 32])
    }

    /// BIP340 signing with the given auxiliary randomness.
    pub fn sign_with_aux(&self, message: &[u8; 32], aux: &[u8; 32]) -> Signature {
        let n = curve_order();
        let px = self.public_key.as_bytes();

        // t = bytes(d) xor hash_aux(a)
        let d_bytes = to_bytes32(&self.secret);
        let aux_hash = tagged_hash("BIP0340/aux", aux);
        let mut t = [0u8; 32];
        for i in 0..32 {
            t[i] = d_bytes[i] ^ aux_hash[i];
        }

        // k' = int(hash_nonce(t || px || m)) mod n
        let mut nonce_input = Vec::with_capacity(96);
        nonce_input.extend_from_slice(&t);
        nonce_input.extend_from_slice(px);
        nonce_input.extend_from_slice(message);
        let k_prime = to_biguint(&tagged_hash("BIP0340/nonce", &nonce_input)) % n;
        assert!(!k_prime.is_zero(), "nonce reduced to zero");

        let r_point = mul_generator(&k_prime);
        let r = match r_point.affine() {
            Some(r) => r.clone(),
            None => panic!("nonce point at infinity"),
        };
        let k = if r.has_even_y() { k_prime } else { n - k_prime };

        let rx = r.x_bytes();
        let e = challenge(&rx, px, message);
        let s = (k + e * &self.secret) % n;

        Signature::new(rx, to_bytes32(&s))
    }

    /// Sign the authentication event for an operation digest.
    pub fn sign_operation(&self, digest: &OperationDigest) -> Signature {
        self.sign(&event_hash(&self.public_key, digest).0)
    }

    /// A signed authorization request for (salt, digest).
    pub fn authorize(&self, salt: Salt, digest: OperationDigest) -> AuthorizationRequest {
        AuthorizationRequest::new(self.public_key, salt, self.sign_operation(&digest), digest)
    }
}

impl std::fmt::Debug for TestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
