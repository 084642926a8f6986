use orch_core::hashing::{hash_str, hash_value, to_canonical_json};
use serde_json::json;

#[test]
fn hash_value_produces_hex_64() {
    let v = json!({"b":2, "a":1});
    let h = hash_value(&v);
    // blake3 hex length is 64
    assert_eq!(h.len(), 64);
    // deterministic: same value with different key order yields same hash
    let v2 = json!({"a":1, "b":2});
    let h2 = hash_value(&v2);
    assert_eq!(h, h2);
}

#[test]
fn canonical_json_sorts_keys_and_strips_whitespace() {
    let v = json!({"z": [1, 2], "a": {"y": null, "b": "txt"}});
    assert_eq!(to_canonical_json(&v), r#"{"a":{"b":"txt","y":null},"z":[1,2]}"#);
}

#[test]
fn hash_str_differs_on_content() {
    assert_ne!(hash_str("abc"), hash_str("abd"));
}
