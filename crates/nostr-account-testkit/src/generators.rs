//! Proptest generators for property-based testing.

use proptest::prelude::*;

use num_traits::Zero;

use nostr_account_core::curve::{curve_order, to_biguint};
use nostr_account_core::{AuthorizationRequest, OperationDigest, PublicKeyX, Salt};

use crate::signer::TestSigner;

/// Generate a valid secret scalar in `[1, n)`.
///
/// Random 32-byte strings land at or above `n` with negligible probability;
/// those are filtered out.
pub fn secret_bytes() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>().prop_filter("secret out of range", |bytes| {
        let d = to_biguint(bytes);
        !d.is_zero() && &d < curve_order()
    })
}

/// Generate a signer with a random secret.
pub fn signer() -> impl Strategy<Value = TestSigner> {
    secret_bytes().prop_filter_map("secret out of range", TestSigner::from_secret_bytes)
}

/// Generate a signer from a small secret. Much cheaper than [`signer`].
pub fn small_signer() -> impl Strategy<Value = TestSigner> {
    (1u64..=10_000).prop_map(TestSigner::from_u64)
}

/// Generate an arbitrary 32-byte x-coordinate, not necessarily on the curve.
pub fn public_key_x() -> impl Strategy<Value = PublicKeyX> {
    any::<[u8; 32]>().prop_map(PublicKeyX::from_bytes)
}

/// Generate a salt, biased toward small values.
pub fn salt() -> impl Strategy<Value = Salt> {
    prop_oneof![
        (0u64..16).prop_map(Salt::from_u64),
        any::<[u8; 32]>().prop_map(Salt::from_bytes),
    ]
}

/// Generate an operation digest.
pub fn operation_digest() -> impl Strategy<Value = OperationDigest> {
    any::<[u8; 32]>().prop_map(OperationDigest::from_bytes)
}

/// Parameters for generating a signed authorization request.
#[derive(Debug, Clone)]
pub struct AuthParams {
    pub secret: u64,
    pub salt: Salt,
    pub digest: OperationDigest,
}

impl Arbitrary for AuthParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (1u64..=10_000, salt(), operation_digest())
            .prop_map(|(secret, salt, digest)| AuthParams {
                secret,
                salt,
                digest,
            })
            .boxed()
    }
}

/// Build a signed request from parameters.
pub fn request_from_params(params: &AuthParams) -> AuthorizationRequest {
    TestSigner::from_u64(params.secret).authorize(params.salt, params.digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nostr_account_core::{
        canonical_event_bytes, derive_identifier, validate_authorization, SchnorrVerifier,
        VerifyError,
    };

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_signed_requests_validate(params: AuthParams) {
            let request = request_from_params(&params);
            let event = validate_authorization(&request, &SchnorrVerifier::strict());
            prop_assert!(event.is_ok());
        }

        #[test]
        fn test_wrong_digest_rejected(params: AuthParams, other in operation_digest()) {
            prop_assume!(other != params.digest);
            let mut request = request_from_params(&params);
            request.operation_digest = other;
            prop_assert_eq!(
                validate_authorization(&request, &SchnorrVerifier::strict()),
                Err(VerifyError::VerificationMismatch)
            );
        }

        #[test]
        fn test_random_signer_round_trip(signer in signer(), message in any::<[u8; 32]>()) {
            let sig = signer.sign(&message);
            prop_assert!(SchnorrVerifier::strict().verify(&signer.public_key(), &sig, &message));
        }
    }

    proptest! {
        #[test]
        fn test_identifier_deterministic(owner in public_key_x(), s in salt()) {
            prop_assert_eq!(derive_identifier(&owner, &s), derive_identifier(&owner, &s));
        }

        #[test]
        fn test_identifier_depends_on_salt(owner in public_key_x(), a in salt(), b in salt()) {
            prop_assume!(a != b);
            prop_assert_ne!(derive_identifier(&owner, &a), derive_identifier(&owner, &b));
        }

        #[test]
        fn test_event_bytes_fixed_length(owner in public_key_x(), digest in operation_digest()) {
            // 2 x 64 hex chars plus the fixed JSON skeleton
            let bytes = canonical_event_bytes(&owner, &digest);
            prop_assert_eq!(bytes.len(), 128 + r#"[0,"",0,96024,[],""]"#.len());
        }
    }
}
