//! joedb provides columnar storage for semi-structured log records.
//!
//! Records are flattened to dotted-path fields, each string value is run
//! through a CLP-style pattern extractor that splits it into a reusable
//! template plus a handful of typed variables, and every field lands in
//! its own column. A column of strings dictionary-encodes its values
//! through a compressed trie; numeric and timestamp columns keep raw
//! integers. [`Database::encode`] lays the columns out for compression
//! (cardinality-ordered, row-sorted, delta-and-run-length-encoded,
//! Zstd-compressed) and writes a single self-describing file that
//! [`Database::decode`] reads back into an equivalent `Database` plus the
//! original records.
//!
//! ```no_run
//! use joedb::{Config, Database, Value};
//!
//! let mut db = Database::new(Config::default());
//! db.insert(serde_json::json!({"level": "INFO", "msg": "listening on 8080"}).into())?;
//! db.encode("records.joedb")?;
//!
//! let (restored, records) = Database::decode("records.joedb")?;
//! assert_eq!(restored.record_count(), 1);
//! # let _: Vec<Value> = records;
//! # Ok::<(), joedb::Error>(())
//! ```

mod codec;
mod column;
mod config;
mod db;
mod decode;
mod encode;
mod error;
mod flatten;
mod pattern;
mod timestamp;
mod trie;
mod value;

pub use column::ColumnType;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use value::Value;
