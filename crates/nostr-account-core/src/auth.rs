//! Authorization requests: structural checks and signature validation.

use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::event::AuthenticatedEvent;
use crate::schnorr::{check_ranges, SchnorrVerifier, Signature};
use crate::types::{OperationDigest, PublicKeyX, Salt};

/// The tuple a transport delivers to authorize one operation on an account.
///
/// Serializes as JSON with hex strings, so a relay envelope's content can be
/// decoded directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub owner: PublicKeyX,
    pub salt: Salt,
    pub signature: Signature,
    pub operation_digest: OperationDigest,
}

impl AuthorizationRequest {
    pub fn new(
        owner: PublicKeyX,
        salt: Salt,
        signature: Signature,
        operation_digest: OperationDigest,
    ) -> Self {
        Self {
            owner,
            salt,
            signature,
            operation_digest,
        }
    }

    /// The authentication event the signature must cover.
    pub fn event(&self) -> AuthenticatedEvent {
        AuthenticatedEvent::new(self.owner, self.operation_digest)
    }
}

/// Validate a request fully: structure, then the signature over its event.
///
/// Returns the authenticated event on success.
pub fn validate_authorization(
    request: &AuthorizationRequest,
    verifier: &SchnorrVerifier,
) -> Result<AuthenticatedEvent, VerifyError> {
    // 1. Owner and signature ranges (no hashing)
    validate_authorization_structure(request)?;

    // 2. Canonical event and its hash
    let event = request.event();

    // 3. Signature
    verifier.verify_strict(&request.owner, &request.signature, &event.id().0)?;

    Ok(event)
}

/// Validate a request's structure without signature verification.
pub fn validate_authorization_structure(request: &AuthorizationRequest) -> Result<(), VerifyError> {
    check_ranges(&request.owner, &request.signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;

    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_SIG: &str = "ad6d72a47fac27e915ce212beea2af0d8007b31599da6df7586a6dd78fb372fefca4953cad67497c0aad33099e674fecc6d48616cadc94f94f94044c9c7b2369";

    fn make_test_request() -> AuthorizationRequest {
        AuthorizationRequest::new(
            PublicKeyX::from_hex(G_X).unwrap(),
            Salt::from_u64(0),
            Signature::from_hex(G_SIG).unwrap(),
            OperationDigest::ZERO,
        )
    }

    #[test]
    fn test_valid_request() {
        let request = make_test_request();
        let event = validate_authorization(&request, &SchnorrVerifier::strict()).unwrap();
        assert_eq!(event.owner(), &request.owner);
        assert_eq!(event.digest(), &request.operation_digest);
    }

    #[test]
    fn test_digest_mismatch() {
        let mut request = make_test_request();
        request.operation_digest = OperationDigest::from_bytes([0x01; 32]);
        assert_eq!(
            validate_authorization(&request, &SchnorrVerifier::strict()),
            Err(VerifyError::VerificationMismatch)
        );
    }

    #[test]
    fn test_salt_not_signed() {
        // The salt selects the account; it is not part of the signed event.
        let mut request = make_test_request();
        request.salt = Salt::from_u64(99);
        assert!(validate_authorization(&request, &SchnorrVerifier::strict()).is_ok());
    }

    #[test]
    fn test_structure_rejects_zero_owner() {
        let mut request = make_test_request();
        request.owner = PublicKeyX::ZERO;
        assert_eq!(
            validate_authorization_structure(&request),
            Err(VerifyError::InvalidOwner)
        );
    }

    #[test]
    fn test_structure_rejects_rx_out_of_range() {
        let mut request = make_test_request();
        request.signature.rx = [0xff; 32];
        assert_eq!(
            validate_authorization_structure(&request),
            Err(VerifyError::FieldOutOfRange { field: Field::Rx })
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let request = make_test_request();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["owner"], G_X);
        assert_eq!(json["signature"], G_SIG);
        assert_eq!(json["operation_digest"], "0".repeat(64));

        let back: AuthorizationRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_json_rejects_short_signature() {
        let json = format!(
            r#"{{"owner":"{G_X}","salt":"{zero}","signature":"abcd","operation_digest":"{zero}"}}"#,
            zero = "0".repeat(64)
        );
        assert!(serde_json::from_str::<AuthorizationRequest>(&json).is_err());
    }
}
