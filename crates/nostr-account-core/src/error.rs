//! Error types for the core primitives.

use std::fmt;

use thiserror::Error;

/// Which 256-bit input fell outside the secp256k1 base field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The owner's x-only public key.
    Px,
    /// The x-coordinate of the signature nonce point.
    Rx,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Px => write!(f, "px"),
            Field::Rx => write!(f, "rx"),
        }
    }
}

/// Why a signature was rejected.
///
/// Every variant is terminal for the call that produced it. Input checks
/// (`MalformedSignatureLength`, `InvalidOwner`, `FieldOutOfRange`,
/// `ScalarOutOfRange`) are raised before any hashing or curve arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("signature must be 64 bytes, got {0}")]
    MalformedSignatureLength(usize),

    #[error("{field} is not below the field prime")]
    FieldOutOfRange { field: Field },

    #[error("s is not below the curve order")]
    ScalarOutOfRange,

    #[error("owner key is zero")]
    InvalidOwner,

    #[error("x-coordinate does not lift to a curve point")]
    PointLiftFailure,

    #[error("signature verification failed")]
    VerificationMismatch,
}

/// Errors from parsing and encoding core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] VerifyError),

    #[error("decoding error: {0}")]
    DecodingError(String),
}
