use super::*;
use crate::config::Config;
use crate::value::Value;
use std::collections::BTreeMap;

fn strmap(pairs: Vec<(&str, &str)>) -> Value {
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::Str(v.to_string())))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("joedb_decode_test_{}_{}.bin", std::process::id(), name))
}

#[test]
fn round_trips_plain_records() {
    let path = temp_path("plain");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("level", "INFO"), ("msg", "started")]))
        .unwrap();
    db.insert(strmap(vec![("level", "WARN"), ("msg", "disk low")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (restored, records) = Database::decode(&path).unwrap();
    assert_eq!(restored.record_count(), 2);
    assert_eq!(records.len(), 2);

    let has_started = records.iter().any(|r| match r {
        Value::Map(m) => m.get("msg") == Some(&Value::Str("started".to_string())),
        _ => false,
    });
    assert!(has_started);

    std::fs::remove_file(&path).ok();
}

#[test]
fn round_trips_pattern_extracted_variables() {
    let path = temp_path("pattern");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("message", "Process 123 from 10.0.0.1")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    assert_eq!(records.len(), 1);
    match &records[0] {
        Value::Map(m) => assert_eq!(
            m.get("message"),
            Some(&Value::Str("Process 123 from 10.0.0.1".to_string()))
        ),
        _ => panic!("expected a map"),
    }

    std::fs::remove_file(&path).ok();
}

#[test]
fn round_trips_absent_fields() {
    let path = temp_path("absent");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("a", "1")])).unwrap();
    db.insert(strmap(vec![("a", "1"), ("b", "2")])).unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    match &records[0] {
        Value::Map(m) => assert!(!m.contains_key("b")),
        _ => panic!("expected a map"),
    }
    match &records[1] {
        Value::Map(m) => assert_eq!(m.get("b"), Some(&Value::Str("2".to_string()))),
        _ => panic!("expected a map"),
    }

    std::fs::remove_file(&path).ok();
}

#[test]
fn round_trips_leading_zero_numbers() {
    let path = temp_path("leading_zero");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("code", "id 007")])).unwrap();
    db.insert(strmap(vec![("code", "id 042")])).unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    let texts: Vec<String> = records
        .iter()
        .map(|r| match r {
            Value::Map(m) => match m.get("code") {
                Some(Value::Str(s)) => s.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        })
        .collect();
    assert!(texts.contains(&"id 007".to_string()));
    assert!(texts.contains(&"id 042".to_string()));

    std::fs::remove_file(&path).ok();
}

#[test]
fn rejects_bad_magic() {
    let path = temp_path("bad_magic");
    std::fs::write(&path, b"not a joedb file at all!!!!").unwrap();
    let err = Database::decode(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidMagic(_, _)));
    std::fs::remove_file(&path).ok();
}

#[test]
fn rejects_truncated_file() {
    let path = temp_path("truncated");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("level", "INFO")])).unwrap();
    db.encode(&path).unwrap();

    let full = std::fs::read(&path).unwrap();
    let truncated_path = temp_path("truncated_short");
    std::fs::write(&truncated_path, &full[..full.len() / 2]).unwrap();

    let err = Database::decode(&truncated_path).unwrap_err();
    assert!(matches!(err, Error::TruncatedFile(_, _) | Error::IOError(_, _)));

    std::fs::remove_file(&path).ok();
    std::fs::remove_file(&truncated_path).ok();
}

#[test]
fn empty_database_round_trips() {
    let path = temp_path("empty");
    let mut db = Database::new(Config::default());
    db.encode(&path).unwrap();

    let (restored, records) = Database::decode(&path).unwrap();
    assert_eq!(restored.record_count(), 0);
    assert!(records.is_empty());

    std::fs::remove_file(&path).ok();
}
