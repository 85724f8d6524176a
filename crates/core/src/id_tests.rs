use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test ID type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_new_has_prefix_and_length() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_new_generates_unique_ids() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn define_id_hash_map_lookup_by_str() {
    let id = TestId::from_string("tst-fixed00000000000");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get("tst-fixed00000000000"), Some(&42));
}

#[test]
fn define_id_suffix_strips_prefix() {
    let id = TestId::from_string("tst-abcdefghijklmnopqr");
    assert_eq!(id.suffix(), "abcdefghijklmnopqr");
}

#[test]
fn define_id_short_truncates_suffix() {
    let id = TestId::from_string("tst-abcdefghijklmnopqr");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn define_id_short_returns_full_suffix_when_shorter_than_n() {
    let id = TestId::from_string("tst-ab");
    assert_eq!(id.short(8), "ab");
}

#[test]
fn define_id_display_roundtrips_through_from_string() {
    let id = TestId::from_string("tst-roundtrip00000000");
    assert_eq!(TestId::from_string(id.to_string()), id);
}

#[test]
fn define_id_default_is_new() {
    let id = TestId::default();
    assert!(id.as_str().starts_with("tst-"));
}

#[test]
fn define_id_partial_eq_str() {
    let id = TestId::from_string("tst-x");
    assert_eq!(id, "tst-x");
    assert_eq!(id, *&"tst-x");
}

// --- IdBuf tests ---

#[test]
fn id_buf_empty_is_empty() {
    assert!(IdBuf::empty().is_empty());
}

#[test]
fn id_buf_new_roundtrips_as_str() {
    let buf = IdBuf::new("hello");
    assert_eq!(buf.as_str(), "hello");
}

#[test]
fn id_buf_equal_strings_hash_equal() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let a = IdBuf::new("same");
    let b = IdBuf::new("same");
    let mut ha = DefaultHasher::new();
    let mut hb = DefaultHasher::new();
    a.hash(&mut ha);
    b.hash(&mut hb);
    assert_eq!(ha.finish(), hb.finish());
}

#[test]
fn id_buf_deserialize_rejects_oversized_string() {
    let long = "x".repeat(ID_MAX_LEN + 1);
    let json = serde_json::to_string(&long).unwrap_or_default();
    let result: Result<IdBuf, _> = serde_json::from_str(&json);
    assert!(result.is_err());
}

#[test]
fn short_fn_truncates() {
    let s = "abcdefghijklmnop";
    assert_eq!(short(s, 8), "abcdefgh");
    assert_eq!(short(s, 100), s);
    assert_eq!(short("abc", 8), "abc");
}
