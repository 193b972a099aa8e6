//! # Claim Hash Vectors
//!
//! Pins the exact bytes and Keccak-256 digests produced for credential
//! payloads. Hashes already accredited on chain depend on these bytes; a
//! change here orphans every existing accreditation.

use evp_core::{CanonicalBytes, ClaimHash};
use proptest::prelude::*;
use serde_json::{json, Value};

const ISSUER: &str = "did:ev:bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU";

fn credential() -> Value {
    json!({
        "issuer": ISSUER,
        "issuanceDate": "2023-01-11T18:19:19.026Z",
        "credentialSubject": { "name": "Jerson Miranda", "@id": ISSUER }
    })
}

#[test]
fn credential_canonical_bytes() {
    let cb = CanonicalBytes::new(&credential()).unwrap();
    assert_eq!(
        std::str::from_utf8(cb.as_bytes()).unwrap(),
        r#"{"credentialSubject":{"@id":"did:ev:bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU","name":"Jerson Miranda"},"issuanceDate":"2023-01-11T18:19:19.026Z","issuer":"did:ev:bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU"}"#
    );
}

#[test]
fn credential_hash_vector() {
    assert_eq!(
        ClaimHash::of(&credential()).unwrap().to_hex(),
        "0x7998fff8a1ba6981e5a0de2f7a76a72b98250bcda5718220c12f8939c0f9a7a8"
    );
}

#[test]
fn intermediate_status_record_hash_vector() {
    let record = json!({
        "status": "Valid",
        "hash": "0x7998fff8a1ba6981e5a0de2f7a76a72b98250bcda5718220c12f8939c0f9a7a8"
    });
    assert_eq!(
        ClaimHash::of(&record).unwrap().to_hex(),
        "0x55a1b7a9046cf1116642bdf10a5dd9e087559fed2a3022c401382ac76ea3589e"
    );
}

#[test]
fn serialized_claim_hashes_like_its_object() {
    let text = CanonicalBytes::to_json_string(&credential()).unwrap();
    assert_eq!(
        ClaimHash::of(&text).unwrap(),
        ClaimHash::of(&credential()).unwrap()
    );
}

#[test]
fn simple_dict_vector() {
    let data = json!({"b": 2, "a": 1, "c": "hello"});
    assert_eq!(
        ClaimHash::of(&data).unwrap().to_hex(),
        "0xbfd9ebfbb8655a2e299156a11d8bec69ec602026f20865472e55a71171232237"
    );
}

proptest! {
    #[test]
    fn hash_ignores_insertion_order(entries in proptest::collection::btree_map("[a-z@]{1,8}", any::<i64>(), 0..12)) {
        let forward: serde_json::Map<String, Value> =
            entries.iter().map(|(k, v)| (k.clone(), json!(v))).collect();
        let reverse: serde_json::Map<String, Value> =
            entries.iter().rev().map(|(k, v)| (k.clone(), json!(v))).collect();
        prop_assert_eq!(
            ClaimHash::of(&Value::Object(forward)).unwrap(),
            ClaimHash::of(&Value::Object(reverse)).unwrap()
        );
    }

    #[test]
    fn hash_is_stable_across_calls(name in ".{0,32}", n in any::<u32>()) {
        let payload = json!({"credentialSubject": {"name": name, "n": n}});
        prop_assert_eq!(ClaimHash::of(&payload).unwrap(), ClaimHash::of(&payload).unwrap());
    }
}
