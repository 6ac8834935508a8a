//! # Nostr Account Testkit
//!
//! Testing utilities for Nostr-keyed accounts.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Signer**: A deterministic BIP340 signer so tests can produce real signatures
//! - **Golden vectors**: Known events, signatures and identifiers for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use nostr_account_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, detail) in verify_all_vectors() {
//!     assert!(passed, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use nostr_account_testkit::generators::{request_from_params, AuthParams};
//!
//! proptest! {
//!     #[test]
//!     fn signed_requests_validate(params: AuthParams) {
//!         let request = request_from_params(&params);
//!         prop_assert!(validate_authorization(&request, &SchnorrVerifier::strict()).is_ok());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use nostr_account_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_secret(3);
//! let request = fixture.request(0, b"transfer:100");
//! assert_eq!(request.owner, fixture.owner());
//! ```

pub mod fixtures;
pub mod generators;
pub mod signer;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, FailingMaterializer, RecordingMaterializer, TestFixture};
pub use generators::{request_from_params, AuthParams};
pub use signer::TestSigner;
pub use vectors::{
    address_vectors, signature_vectors, verify_all_vectors, AddressVector, SignatureVector,
};
