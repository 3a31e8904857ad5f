//! End-to-end round-trip scenarios against the public API, exercised
//! through a file on disk rather than an in-process reader/writer.

use joedb::{Config, Database, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn strmap(pairs: Vec<(&str, &str)>) -> Value {
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::Str(v.to_string())))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("joedb_roundtrip_{}_{}.bin", std::process::id(), name))
}

fn field<'a>(record: &'a Value, key: &str) -> Option<&'a str> {
    match record {
        Value::Map(m) => match m.get(key) {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        },
        _ => None,
    }
}

#[test]
fn three_records_of_level_and_message_round_trip_in_original_order() {
    let path = temp_path("level_msg");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("level", "INFO"), ("msg", "server started")]))
        .unwrap();
    db.insert(strmap(vec![("level", "WARN"), ("msg", "disk usage high")]))
        .unwrap();
    db.insert(strmap(vec![("level", "INFO"), ("msg", "request handled")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (restored, records) = Database::decode(&path).unwrap();
    assert_eq!(restored.record_count(), 3);
    assert_eq!(records.len(), 3);

    // `level` ties INFO/WARN/INFO under cardinality-ascending column
    // order, so the row sort would otherwise put WARN before INFO
    // lexicographically; insertion order must still come back out.
    let messages: Vec<&str> = records.iter().filter_map(|r| field(r, "msg")).collect();
    assert_eq!(
        messages,
        vec!["server started", "disk usage high", "request handled"]
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn row_sort_ties_do_not_disturb_insertion_order() {
    let path = temp_path("row_sort_ties");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("level", "WARN"), ("msg", "A")]))
        .unwrap();
    db.insert(strmap(vec![("level", "INFO"), ("msg", "B")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    let messages: Vec<&str> = records.iter().filter_map(|r| field(r, "msg")).collect();
    assert_eq!(messages, vec!["A", "B"]);

    std::fs::remove_file(&path).ok();
}

#[test]
fn numeric_looking_strings_share_trie_prefixes_without_colliding() {
    let path = temp_path("numeric_strings");
    let mut db = Database::new(Config::new().patternize(false));
    for v in ["0", "1", "2", "10"] {
        db.insert(strmap(vec![("mykey", v)])).unwrap();
    }
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    let values: Vec<&str> = records.iter().filter_map(|r| field(r, "mykey")).collect();
    let mut sorted = values.clone();
    sorted.sort_unstable();
    let mut expected = vec!["0", "1", "2", "10"];
    expected.sort_unstable();
    assert_eq!(sorted, expected);

    std::fs::remove_file(&path).ok();
}

#[test]
fn shared_prefix_strings_round_trip_distinctly() {
    let path = temp_path("shared_prefix");
    let mut db = Database::new(Config::new().patternize(false));
    db.insert(strmap(vec![("mykey", "abc")])).unwrap();
    db.insert(strmap(vec![("mykey", "abcd")])).unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    let values: Vec<&str> = records.iter().filter_map(|r| field(r, "mykey")).collect();
    assert!(values.contains(&"abc"));
    assert!(values.contains(&"abcd"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn timestamps_and_absent_fields_round_trip() {
    let path = temp_path("timestamps_absent");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![
        ("event", "login at 2024-10-14T13:07:37Z"),
        ("user", "alice"),
    ]))
    .unwrap();
    db.insert(strmap(vec![("event", "login at 2024-10-14T14:02:00Z")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (restored, records) = Database::decode(&path).unwrap();
    assert_eq!(restored.record_count(), 2);

    assert_eq!(field(&records[0], "user"), Some("alice"));
    assert_eq!(field(&records[1], "user"), None);

    let events: Vec<&str> = records.iter().filter_map(|r| field(r, "event")).collect();
    assert!(events.contains(&"login at 2024-10-14T13:07:37Z"));
    assert!(events.contains(&"login at 2024-10-14T14:02:00Z"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn pattern_and_variable_columns_both_round_trip() {
    let path = temp_path("pattern_and_variable");
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("message", "Connection from 10.0.0.5 took 42s")]))
        .unwrap();
    db.insert(strmap(vec![("message", "Connection from 10.0.0.9 took 3s")]))
        .unwrap();
    db.encode(&path).unwrap();

    let (_restored, records) = Database::decode(&path).unwrap();
    let messages: Vec<&str> = records.iter().filter_map(|r| field(r, "message")).collect();
    assert!(messages.contains(&"Connection from 10.0.0.5 took 42s"));
    assert!(messages.contains(&"Connection from 10.0.0.9 took 3s"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn empty_database_round_trips_to_zero_records() {
    let path = temp_path("empty_db");
    let mut db = Database::new(Config::default());
    db.encode(&path).unwrap();

    let (restored, records) = Database::decode(&path).unwrap();
    assert_eq!(restored.record_count(), 0);
    assert!(records.is_empty());

    std::fs::remove_file(&path).ok();
}
