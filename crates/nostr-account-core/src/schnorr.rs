//! BIP340-style Schnorr signature verification over secp256k1.
//!
//! Verification uses the direct form `R' = s·G - e·P` and checks that `R'`
//! is finite, has even y, and has x-coordinate `rx`. Range checks run before
//! any hashing or curve arithmetic.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::challenge::challenge;
use crate::curve::{
    curve_order, field_prime, lift_x_with, mul_sub, to_biguint, LiftPolicy, Point,
};
use crate::error::{Field, VerifyError};
use crate::types::PublicKeyX;

/// Length of an encoded signature: `rx || s`.
pub const SIGNATURE_LENGTH: usize = 64;

/// A 64-byte Schnorr signature `(rx, s)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// x-coordinate of the nonce point `R`. Must be `< p`.
    pub rx: [u8; 32],
    /// Response scalar. Must be `< n`.
    pub s: [u8; 32],
}

impl Signature {
    pub const fn new(rx: [u8; 32], s: [u8; 32]) -> Self {
        Self { rx, s }
    }

    /// Split 64 bytes into `rx || s`.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        let mut rx = [0u8; 32];
        let mut s = [0u8; 32];
        rx.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { rx, s }
    }

    /// Parse from a slice, rejecting anything that is not exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, VerifyError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| VerifyError::MalformedSignatureLength(bytes.len()))?;
        Ok(Self::from_bytes(arr))
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.rx);
        out[32..].copy_from_slice(&self.s);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from 128 hex characters (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self, crate::error::CoreError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Ok(Self::from_slice(&bytes)?)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Input checks that run before any hashing or curve arithmetic.
///
/// Rejects a zero owner, `px >= p`, `rx >= p`, and `s >= n`, in that order.
pub fn check_ranges(owner: &PublicKeyX, sig: &Signature) -> Result<(), VerifyError> {
    parse_inputs(owner, sig).map(|_| ())
}

fn parse_inputs(
    owner: &PublicKeyX,
    sig: &Signature,
) -> Result<(BigUint, BigUint, BigUint), VerifyError> {
    if owner.is_zero() {
        return Err(VerifyError::InvalidOwner);
    }

    let p = field_prime();
    let px = to_biguint(owner.as_bytes());
    if &px >= p {
        return Err(VerifyError::FieldOutOfRange { field: Field::Px });
    }
    let rx = to_biguint(&sig.rx);
    if &rx >= p {
        return Err(VerifyError::FieldOutOfRange { field: Field::Rx });
    }
    let s = to_biguint(&sig.s);
    if &s >= curve_order() {
        return Err(VerifyError::ScalarOutOfRange);
    }
    Ok((px, rx, s))
}

/// Verifies x-only Schnorr signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchnorrVerifier {
    lift_policy: LiftPolicy,
}

impl SchnorrVerifier {
    pub const fn new(lift_policy: LiftPolicy) -> Self {
        Self { lift_policy }
    }

    /// A verifier that rejects owners which are not on the curve.
    pub const fn strict() -> Self {
        Self::new(LiftPolicy::Strict)
    }

    /// A verifier that lifts owners without a residue check.
    pub const fn permissive() -> Self {
        Self::new(LiftPolicy::Permissive)
    }

    pub fn lift_policy(&self) -> LiftPolicy {
        self.lift_policy
    }

    /// Verify `sig` over the 32-byte message `m`, naming the failed check.
    pub fn verify_strict(
        &self,
        owner: &PublicKeyX,
        sig: &Signature,
        m: &[u8; 32],
    ) -> Result<(), VerifyError> {
        let (px, rx, s) = parse_inputs(owner, sig)?;

        let owner_point =
            lift_x_with(&px, self.lift_policy).ok_or(VerifyError::PointLiftFailure)?;

        let e = challenge(&sig.rx, owner.as_bytes(), m);

        // R' = s·G - e·P
        let r = mul_sub(&s, &Point::generator(), &e, &Point::Affine(owner_point));
        match r.affine() {
            Some(point) if point.has_even_y() && point.x == rx => Ok(()),
            _ => Err(VerifyError::VerificationMismatch),
        }
    }

    /// Tolerant form of [`verify_strict`](Self::verify_strict).
    pub fn verify(&self, owner: &PublicKeyX, sig: &Signature, m: &[u8; 32]) -> bool {
        self.verify_strict(owner, sig, m).is_ok()
    }
}

/// Verify a raw `(px, rx, s, m)` tuple with the default (strict) verifier.
pub fn verify(px: &[u8; 32], rx: &[u8; 32], s: &[u8; 32], m: &[u8; 32]) -> bool {
    SchnorrVerifier::default().verify(&PublicKeyX::from_bytes(*px), &Signature::new(*rx, *s), m)
}
