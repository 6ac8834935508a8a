//! Golden test vectors for deterministic verification.
//!
//! Every signature here uses all-zero auxiliary randomness, so any BIP340
//! signer given the same secret reproduces it byte for byte.

use serde::Serialize;

use nostr_account_core::{
    canonical_event_bytes, derive_identifier, event_hash, OperationDigest, PublicKeyX, Salt,
    SchnorrVerifier, Signature,
};

use crate::signer::TestSigner;

/// A signed authentication event with known outputs.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Secret scalar.
    pub secret: u64,
    /// Operation digest (hex).
    pub digest: &'static str,
    /// Expected x-only public key (hex).
    pub expected_owner: &'static str,
    /// Expected event hash (hex).
    pub expected_event_hash: &'static str,
    /// Expected signature `rx || s` (hex).
    pub expected_signature: &'static str,
}

/// A derived identifier with a known output under the default descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct AddressVector {
    pub name: &'static str,
    pub owner: &'static str,
    pub salt: u64,
    pub expected_identifier: &'static str,
}

/// BIP340 test vector 0: secret 3, zero message, zero aux.
pub const BIP340_VECTOR_0_SIGNATURE: &str = "e907831f80848d1069a5371b402410364bdf1c5f8307b0084c55f1ce2dca821525f66a4a85ea8b71e482a74f382d2ce5ebeee8fdb2172f477df4900d310536c0";

/// Canonical event for the generator owner and a zero digest.
pub const GENERATOR_EVENT: &str = "[0,\"79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\",0,96024,[],\"0000000000000000000000000000000000000000000000000000000000000000\"]";

/// Get all signature vectors.
pub fn signature_vectors() -> Vec<SignatureVector> {
    vec![
        SignatureVector {
            name: "generator owner, zero digest",
            secret: 1,
            digest: "0000000000000000000000000000000000000000000000000000000000000000",
            expected_owner: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            expected_event_hash: "26f334dcad4ed11b00b7d12d336e6596c2422a7d39ebb966dd7955d353dde63a",
            expected_signature: "ad6d72a47fac27e915ce212beea2af0d8007b31599da6df7586a6dd78fb372fefca4953cad67497c0aad33099e674fecc6d48616cadc94f94f94044c9c7b2369",
        },
        SignatureVector {
            name: "sha256(transfer:100)",
            secret: 3,
            digest: "0c33895706bc8e0640f24e942e42e3cd516733bb350763ed50828fada2c14dff",
            expected_owner: "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
            expected_event_hash: "9990887d063d49685e0a9917df612d91d68c3a2680f3f9aaafe59d973d5a36c8",
            expected_signature: "b46b2b31726ac34333d3dad88e5681e3e430a44ed4b9e751458df99b86083277591579847eab2e9015796688fb9a5344898cfb3876b387086a76c5e1b589702e",
        },
        SignatureVector {
            name: "repeated 0x11 digest",
            secret: 2,
            digest: "1111111111111111111111111111111111111111111111111111111111111111",
            expected_owner: "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
            expected_event_hash: "28f450c62d95c7a2ee8a8cb338ca3d15fa7afdb2f430c751d27c151a32495154",
            expected_signature: "4a991b3a66ecdf02569eb193ee3b27e849ba673847f2592fa26fc6d4809a729651fe2b334a648a2cd3c0138cef1e78f3e8a7326a81d9b9822b155d8f04bee2aa",
        },
        SignatureVector {
            // 6G has odd y, so the signer negates the secret
            name: "odd-y secret",
            secret: 6,
            digest: "2222222222222222222222222222222222222222222222222222222222222222",
            expected_owner: "fff97bd5755eeea420453a14355235d382f6472f8568a18b2f057a1460297556",
            expected_event_hash: "e8b9e035537353f184d31ed47b3576e9bfdb12d572e4c82c157ef5005dfa2d08",
            expected_signature: "9da4303f76584057ac5fd63ead31671c2d72371e93c01a45834cc61865c5c656e3c1593ad04b87e89c4eac834d4e6e8f203397a2bc2ef2a5d79b5ae5fce761f0",
        },
    ]
}

/// Get all address vectors.
pub fn address_vectors() -> Vec<AddressVector> {
    vec![
        AddressVector {
            name: "generator owner, salt 0",
            owner: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            salt: 0,
            expected_identifier: "04eebaaa3daecccb76e4c311df9a1fddac4b4608",
        },
        AddressVector {
            name: "generator owner, salt 1",
            owner: "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
            salt: 1,
            expected_identifier: "cc749f59cadc8945bdd0bd98fd9894a21821b1b3",
        },
        AddressVector {
            name: "3G owner, salt 0",
            owner: "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9",
            salt: 0,
            expected_identifier: "915d2c5b73066372f2767a2cf4c0b653874c73f4",
        },
    ]
}

fn check_signature_vector(vector: &SignatureVector) -> Result<String, String> {
    let signer = TestSigner::from_u64(vector.secret);
    let owner = signer.public_key();
    if owner.to_hex() != vector.expected_owner {
        return Err(format!("owner {} != {}", owner.to_hex(), vector.expected_owner));
    }

    let digest = OperationDigest::from_hex(vector.digest).map_err(|e| e.to_string())?;
    let hash = event_hash(&owner, &digest);
    if hash.to_hex() != vector.expected_event_hash {
        return Err(format!("event hash {} != {}", hash.to_hex(), vector.expected_event_hash));
    }

    let sig = signer.sign_operation(&digest);
    if sig.to_hex() != vector.expected_signature {
        return Err(format!("signature {} != {}", sig.to_hex(), vector.expected_signature));
    }

    let expected = Signature::from_hex(vector.expected_signature).map_err(|e| e.to_string())?;
    SchnorrVerifier::strict()
        .verify_strict(&owner, &expected, &hash.0)
        .map_err(|e| e.to_string())?;

    Ok(sig.to_hex())
}

fn check_address_vector(vector: &AddressVector) -> Result<String, String> {
    let owner = PublicKeyX::from_hex(vector.owner).map_err(|e| e.to_string())?;
    let identifier = derive_identifier(&owner, &Salt::from_u64(vector.salt));
    let got = hex::encode(identifier.0);
    if got != vector.expected_identifier {
        return Err(format!("identifier {} != {}", got, vector.expected_identifier));
    }
    Ok(got)
}

/// Verify all golden vectors and return results.
///
/// Each entry is `(name, passed, detail)`. Call this to check another
/// build against the reference values.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    let bip340 = TestSigner::from_u64(3).sign(&[0u8; 32]).to_hex();
    results.push((
        "BIP340 vector 0".to_string(),
        bip340 == BIP340_VECTOR_0_SIGNATURE,
        bip340,
    ));

    let generator = PublicKeyX::from_bytes(nostr_account_core::curve::GENERATOR_X);
    let event = canonical_event_bytes(&generator, &OperationDigest::ZERO);
    results.push((
        "generator event bytes".to_string(),
        event == GENERATOR_EVENT.as_bytes(),
        String::from_utf8_lossy(&event).into_owned(),
    ));

    for vector in signature_vectors() {
        let (passed, detail) = match check_signature_vector(&vector) {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        results.push((vector.name.to_string(), passed, detail));
    }

    for vector in address_vectors() {
        let (passed, detail) = match check_address_vector(&vector) {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        results.push((vector.name.to_string(), passed, detail));
    }

    results
}

/// All vectors as a JSON document, for cross-implementation checks.
pub fn vectors_json() -> serde_json::Value {
    serde_json::json!({
        "bip340_vector_0": BIP340_VECTOR_0_SIGNATURE,
        "generator_event": GENERATOR_EVENT,
        "signatures": signature_vectors(),
        "addresses": address_vectors(),
    })
}
