//! # Nostr Account Core
//!
//! Pure primitives for accounts controlled by a Nostr secp256k1 key: curve
//! arithmetic, BIP340-style Schnorr verification, the canonical
//! authentication event, and content-addressed account identifiers.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`PublicKeyX`] - x-only public key, the account owner
//! - [`Signature`] - 64-byte `(rx, s)` Schnorr signature
//! - [`AuthenticatedEvent`] - canonical event whose hash gets signed
//! - [`Address`] - 20-byte account identifier
//! - [`AuthorizationRequest`] - (owner, salt, signature, operation digest)
//!
//! ## Usage
//!
//! ```
//! use nostr_account_core::{derive_identifier, event_hash, verify, OperationDigest, PublicKeyX, Salt};
//!
//! let owner = PublicKeyX::from_hex(
//!     "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
//! ).unwrap();
//! let message = event_hash(&owner, &OperationDigest::ZERO);
//! let sig = hex::decode(
//!     "ad6d72a47fac27e915ce212beea2af0d8007b31599da6df7586a6dd78fb372fe\
//!      fca4953cad67497c0aad33099e674fecc6d48616cadc94f94f94044c9c7b2369",
//! ).unwrap();
//! let (rx, s) = sig.split_at(32);
//!
//! assert!(verify(owner.as_bytes(), rx.try_into().unwrap(), s.try_into().unwrap(), &message.0));
//!
//! let address = derive_identifier(&owner, &Salt::from_u64(0));
//! assert_eq!(address.to_hex(), "04eebaaa3daecccb76e4c311df9a1fddac4b4608");
//! ```

pub mod auth;
pub mod challenge;
pub mod curve;
pub mod derive;
pub mod error;
pub mod event;
pub mod schnorr;
pub mod types;

pub use auth::{validate_authorization, validate_authorization_structure, AuthorizationRequest};
pub use challenge::{challenge, tagged_hash, CHALLENGE_TAG_HASH};
pub use curve::{lift_x, lift_x_unchecked, LiftPolicy};
pub use derive::{derive_identifier, AccountDeriver, ImplementationDescriptor};
pub use error::{CoreError, Field, VerifyError};
pub use event::{
    canonical_event_bytes, event_hash, AuthenticatedEvent, AUTH_EVENT_CREATED_AT,
    AUTH_EVENT_KIND, ENVELOPE_EVENT_KIND, EVENT_VERSION,
};
pub use schnorr::{check_ranges, verify, SchnorrVerifier, Signature};
pub use types::{Address, OperationDigest, PublicKeyX, Salt, Sha256Hash};
