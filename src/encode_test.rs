use super::*;
use crate::config::Config;
use crate::value::Value;
use std::collections::BTreeMap;
use std::io::Read;

fn strmap(pairs: Vec<(&str, &str)>) -> Value {
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::Str(v.to_string())))
            .collect::<BTreeMap<_, _>>(),
    )
}

#[test]
fn header_starts_with_magic_and_record_count() {
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("level", "INFO")])).unwrap();
    db.insert(strmap(vec![("level", "WARN")])).unwrap();

    let dir = std::env::temp_dir();
    let path = dir.join(format!("joedb_encode_test_{}.bin", std::process::id()));
    db.encode(&path).unwrap();

    let mut f = std::fs::File::open(&path).unwrap();
    let mut header = [0u8; 20];
    f.read_exact(&mut header).unwrap();
    assert_eq!(&header[..12], &MAGIC);
    let count = u64::from_be_bytes(header[12..20].try_into().unwrap());
    assert_eq!(count, 2);

    std::fs::remove_file(&path).ok();
}

#[test]
fn encode_to_unwritable_path_is_an_error() {
    let mut db = Database::new(Config::default());
    db.insert(strmap(vec![("a", "1")])).unwrap();
    let err = db.encode("/nonexistent-dir/does/not/exist.joedb").unwrap_err();
    assert!(matches!(err, Error::IOError(_, _)));
}
