#![cfg(feature = "binary-cache")]

use ruletree::serial::DeserializeError;
use ruletree::{BoolOp, Branch, Record, RuleStore};

fn sample_store() -> RuleStore {
    let store = RuleStore::new();
    let a = store.create_rule("age > 30 AND department == 'IT'").unwrap();
    let b = store.create_rule("salary > 50000.5").unwrap();
    let c = store.combine_rules(&[a, b], BoolOp::Or).unwrap();
    store.modify_operator(c, &[Branch::Left], BoolOp::Or).unwrap();
    store
}

#[test]
fn round_trip() {
    let store = sample_store();
    let bytes = store.to_bytes().unwrap();
    let restored = RuleStore::from_bytes(&bytes).unwrap();

    assert_eq!(restored.rules(), store.rules());
    for summary in store.rules() {
        let (before, after) = (store.get(summary.id).unwrap(), restored.get(summary.id).unwrap());
        assert_eq!(after.ast, before.ast);
        assert_eq!(
            after.created_at.timestamp_millis(),
            before.created_at.timestamp_millis()
        );
    }

    let record = Record::new()
        .set("age", 20_i64)
        .set("department", "HR")
        .set("salary", 60_000_i64);
    assert_eq!(
        restored.evaluate_rule(3, &record).unwrap(),
        store.evaluate_rule(3, &record).unwrap()
    );
}

#[test]
fn ids_continue_after_restore() {
    let restored = RuleStore::from_bytes(&sample_store().to_bytes().unwrap()).unwrap();
    assert_eq!(restored.create_rule("experience > 5").unwrap(), 4);
}

#[test]
fn empty_store_round_trip() {
    let bytes = RuleStore::new().to_bytes().unwrap();
    let restored = RuleStore::from_bytes(&bytes).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.create_rule("age > 1").unwrap(), 1);
}

#[test]
fn corrupted_payload() {
    let mut bytes = sample_store().to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        RuleStore::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn truncated_payload() {
    let bytes = sample_store().to_bytes().unwrap();
    assert!(matches!(
        RuleStore::from_bytes(&bytes[..33]),
        Err(DeserializeError::LengthMismatch { actual: 1, .. })
    ));
    assert!(matches!(
        RuleStore::from_bytes(&bytes[..8]),
        Err(DeserializeError::LengthMismatch { expected: 32, actual: 8 })
    ));
}

#[test]
fn bad_magic() {
    let mut bytes = sample_store().to_bytes().unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");
    assert!(matches!(
        RuleStore::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn incompatible_version() {
    let mut bytes = sample_store().to_bytes().unwrap();
    bytes[4..6].copy_from_slice(&99_u16.to_le_bytes());
    assert!(matches!(
        RuleStore::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion {
            blob: 99,
            supported: 1
        })
    ));
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("ruletree-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("rules.bin");

    let store = sample_store();
    store.to_binary_file(&path).unwrap();
    let restored = RuleStore::from_binary_file(&path).unwrap();
    assert_eq!(restored.rules(), store.rules());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file() {
    assert!(matches!(
        RuleStore::from_binary_file("/nonexistent/ruletree/rules.bin"),
        Err(DeserializeError::Io(_))
    ));
}
