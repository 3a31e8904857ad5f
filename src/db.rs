//! The in-memory database instance: record ingestion (spec.md §4.D) and
//! the column/trie state that the encoder and decoder operate on.

use crate::column::{Column, ColumnType};
use crate::config::Config;
use crate::err_at;
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::pattern::extract_pattern;
use crate::timestamp;
use crate::value::Value;
use std::collections::HashSet;

/// A single in-memory database instance. Owns every column; each STRING
/// column owns its trie (spec.md §3 "Ownership").
pub struct Database {
    pub(crate) config: Config,
    /// Declaration order: the order columns were first seen in. The
    /// encoder may reorder columns for the on-disk layout, but this is
    /// the order `insert` built them in.
    pub(crate) column_order: Vec<String>,
    pub(crate) columns: std::collections::HashMap<String, Column>,
    pub(crate) record_count: u64,
}

impl Database {
    pub fn new(config: Config) -> Database {
        Database {
            config,
            column_order: Vec::new(),
            columns: std::collections::HashMap::new(),
            record_count: 0,
        }
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    fn get_or_create(&mut self, key: &str, col_type: ColumnType) -> &mut Column {
        if !self.columns.contains_key(key) {
            let mut col = Column::new(col_type);
            col.backfill(self.record_count as usize);
            self.columns.insert(key.to_string(), col);
            self.column_order.push(key.to_string());
        }
        self.columns.get_mut(key).unwrap()
    }

    /// Insert a record, flattening nested maps and routing each
    /// `(key, value)` through the pattern extractor and into its column
    /// and trie (spec.md §4.D).
    pub fn insert(&mut self, record: Value) -> Result<()> {
        let flat = flatten(&record);
        let mut touched: HashSet<String> = HashSet::new();

        for (key, value) in flat.iter() {
            let s = value.stringify();
            if s.is_empty() {
                return err_at!(
                    EmptyStringValue,
                    msg: "field {} has an empty string value, which is indistinguishable from absent",
                    key
                );
            }

            let (pattern, variables) = if self.config.patternize {
                let extracted = extract_pattern(&s, key);
                (extracted.pattern, extracted.variables)
            } else {
                (s, Default::default())
            };

            {
                let col = self.get_or_create(key, ColumnType::String);
                let idx = col.trie.as_mut().unwrap().insert(&pattern);
                col.cardinality.observe(&pattern);
                col.values.push(idx as i64);
            }
            touched.insert(key.clone());

            for (var_name, literal) in variables.iter() {
                let var_type = ColumnType::infer(var_name);
                let col = self.get_or_create(var_name, var_type);
                match var_type {
                    ColumnType::String => {
                        let idx = col.trie.as_mut().unwrap().insert(literal);
                        col.cardinality.observe(literal);
                        col.values.push(idx as i64);
                    }
                    ColumnType::Number => {
                        // `literal` was matched by the `number` regex
                        // (`\b\d+\b`), so it is always pure ASCII digits.
                        let value: i64 = literal.parse().unwrap_or(0);
                        col.leading_zeros
                            .push(crate::codec::leading_zero_count(literal));
                        col.cardinality.observe(&value.to_string());
                        col.values.push(value);
                    }
                    ColumnType::Timestamp => {
                        let secs = timestamp::parse_unix_seconds(literal)?;
                        col.cardinality.observe(&secs.to_string());
                        col.values.push(secs);
                    }
                }
                touched.insert(var_name.clone());
            }
        }

        for (key, col) in self.columns.iter_mut() {
            if !touched.contains(key) {
                col.push_absent();
            }
        }

        self.record_count += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod db_test;
