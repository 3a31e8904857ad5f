//! Decoder: reverse of [`crate::encode`] (spec.md §4.F, §6).

use crate::codec;
use crate::column::{Column, ColumnType};
use crate::config::Config;
use crate::db::Database;
use crate::encode::{MAGIC, ROW_ID_COLUMN};
use crate::err_at;
use crate::error::{Error, Result};
use crate::flatten::unflatten_insert;
use crate::pattern::rehydrate;
use crate::timestamp;
use crate::trie::Trie;
use crate::value::Value;
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

struct DecodedColumn {
    name: String,
    col_type: ColumnType,
    trie: Option<Trie>,
    values: Vec<i64>,
    leading_zeros: Vec<u8>,
}

impl Database {
    /// Read a binary artifact written by [`Database::encode`] from `path`,
    /// returning a fresh `Database` whose column set and row count match
    /// what was written, plus the reconstructed records (spec.md §6).
    pub fn decode<P: AsRef<Path>>(path: P) -> Result<(Database, Vec<Value>)> {
        let file = err_at!(IOError, File::open(path.as_ref()))?;
        Self::decode_from_reader(BufReader::new(file))
    }

    fn decode_from_reader<R: Read>(mut r: R) -> Result<(Database, Vec<Value>)> {
        let mut magic = [0u8; 12];
        err_at!(IOError, r.read_exact(&mut magic))?;
        if magic != MAGIC {
            return err_at!(InvalidMagic, msg: "file does not start with the joedb magic");
        }

        let mut count_buf = [0u8; 8];
        err_at!(IOError, r.read_exact(&mut count_buf))?;
        let record_count = u64::from_be_bytes(count_buf);

        let mut decl: Vec<DecodedColumn> = Vec::new();
        loop {
            let mut type_byte = [0u8; 1];
            err_at!(IOError, r.read_exact(&mut type_byte))?;
            if type_byte[0] == 0 {
                break;
            }
            let col_type = match ColumnType::from_u8(type_byte[0]) {
                Some(t) => t,
                None => {
                    return err_at!(
                        UnknownColumnType,
                        msg: "unrecognized column type byte {}",
                        type_byte[0]
                    )
                }
            };
            let name = read_cstring(&mut r)?;

            let trie = if col_type == ColumnType::String {
                let mut len_buf = [0u8; 4];
                err_at!(IOError, r.read_exact(&mut len_buf))?;
                let len = u32::from_be_bytes(len_buf) as usize;
                let mut payload = vec![0u8; len];
                err_at!(IOError, r.read_exact(&mut payload))?;
                let raw = codec::decompress(&payload)?;
                debug!("decode: column {} trie payload {} bytes", name, len);
                Some(Trie::read_depth_first(&mut raw.as_slice())?)
            } else {
                None
            };

            decl.push(DecodedColumn {
                name,
                col_type,
                trie,
                values: Vec::new(),
                leading_zeros: Vec::new(),
            });
        }

        for col in decl.iter_mut() {
            let mut vbs = [0u8; 1];
            err_at!(IOError, r.read_exact(&mut vbs))?;
            let mut lbs = [0u8; 1];
            err_at!(IOError, r.read_exact(&mut lbs))?;
            let mut len_buf = [0u8; 4];
            err_at!(IOError, r.read_exact(&mut len_buf))?;
            let len = u32::from_be_bytes(len_buf) as usize;
            let mut payload = vec![0u8; len];
            err_at!(IOError, r.read_exact(&mut payload))?;
            let raw = codec::decompress(&payload)?;
            debug!("decode: column {} data payload {} bytes", col.name, len);

            let value_byte_size = vbs[0];
            let length_byte_size = lbs[0];
            let signed = matches!(col.col_type, ColumnType::Number | ColumnType::Timestamp);

            let mut pos = 0usize;
            let mut rows_left = record_count;
            let mut pairs: Vec<(i64, u64)> = Vec::new();
            while rows_left > 0 {
                if pos + value_byte_size as usize + length_byte_size as usize > raw.len() {
                    return err_at!(
                        TruncatedFile,
                        msg: "column {} data section ended before {} rows were read",
                        col.name, record_count
                    );
                }
                let value = if signed {
                    codec::read_signed(&raw[pos..], value_byte_size)
                } else {
                    codec::read_unsigned(&raw[pos..], value_byte_size) as i64
                };
                pos += value_byte_size as usize;
                let length = codec::read_unsigned(&raw[pos..], length_byte_size);
                pos += length_byte_size as usize;
                pairs.push((value, length));
                rows_left = rows_left.saturating_sub(length);
            }

            let decoded = codec::rle_decode(&pairs);
            col.values = match col.col_type {
                ColumnType::String => decoded,
                ColumnType::Number | ColumnType::Timestamp => codec::delta_decode(&decoded),
            };

            if col.col_type == ColumnType::Number {
                let want = record_count as usize;
                if pos + want > raw.len() {
                    return err_at!(
                        TruncatedFile,
                        msg: "column {} is missing its per-row leading-zero block",
                        col.name
                    );
                }
                col.leading_zeros = raw[pos..pos + want].to_vec();
            }
        }

        // Pull the reserved row-id column (written by `encode` to record
        // each row's pre-sort position) back out before it can be mistaken
        // for a user column; its values un-permute `records` below.
        let row_id = decl
            .iter()
            .position(|c| c.name == ROW_ID_COLUMN)
            .map(|i| decl.remove(i));

        let value_maps: HashMap<String, HashMap<u32, String>> = decl
            .iter()
            .filter(|c| c.col_type == ColumnType::String)
            .map(|c| (c.name.clone(), c.trie.as_ref().unwrap().build_value_map()))
            .collect();

        let mut records: Vec<Value> = Vec::with_capacity(record_count as usize);
        let var_columns: HashMap<&str, &DecodedColumn> =
            decl.iter().map(|c| (c.name.as_str(), c)).collect();

        for row in 0..record_count as usize {
            let mut fields: BTreeMap<String, Value> = BTreeMap::new();
            for col in decl.iter().filter(|c| !c.name.starts_with("var_")) {
                let idx = col.values[row];
                if idx == 0 {
                    continue;
                }
                let pattern = match value_maps.get(&col.name).and_then(|m| m.get(&(idx as u32))) {
                    Some(p) => p.clone(),
                    None => {
                        return err_at!(
                            TrieInvariantViolation,
                            msg: "column {} row {} has index {} with no trie entry",
                            col.name, row, idx
                        )
                    }
                };
                let mut variables = BTreeMap::new();
                for name in placeholder_names(&pattern) {
                    if let Some(var_col) = var_columns.get(name.as_str()) {
                        let literal = resolve_variable(var_col, row, &value_maps);
                        variables.insert(name, literal);
                    }
                }
                let text = rehydrate(&pattern, &variables);
                unflatten_insert(&mut fields, &col.name, Value::Str(text));
            }
            records.push(Value::Map(fields));
        }

        // Undo the row sort: `row_id.values[sorted_pos]` is the row's
        // original insertion index, so scatter `records` back into it
        // (spec.md §8 property 1 does not exempt row order).
        if let Some(row_id) = &row_id {
            let mut ordered: Vec<Option<Value>> = (0..record_count as usize).map(|_| None).collect();
            for (sorted_pos, rec) in records.into_iter().enumerate() {
                let original = row_id.values[sorted_pos] as usize;
                ordered[original] = Some(rec);
            }
            records = ordered
                .into_iter()
                .map(|r| r.expect("row-id column must cover every original row exactly once"))
                .collect();
        }

        let mut database = Database::new(Config::default());
        database.record_count = record_count;
        for col in decl {
            let mut cardinality = crate::column::cardinality::CardinalityEstimator::new();
            match col.col_type {
                ColumnType::String => {
                    let map = value_maps.get(&col.name);
                    for &v in &col.values {
                        if v != 0 {
                            if let Some(s) = map.and_then(|m| m.get(&(v as u32))) {
                                cardinality.observe(s);
                            }
                        }
                    }
                }
                ColumnType::Number | ColumnType::Timestamp => {
                    for &v in &col.values {
                        cardinality.observe(&v.to_string());
                    }
                }
            }
            database.columns.insert(
                col.name.clone(),
                Column {
                    col_type: col.col_type,
                    values: col.values,
                    trie: col.trie,
                    cardinality,
                    leading_zeros: col.leading_zeros,
                },
            );
            database.column_order.push(col.name);
        }

        Ok((database, records))
    }
}

fn resolve_variable(
    col: &DecodedColumn,
    row: usize,
    value_maps: &HashMap<String, HashMap<u32, String>>,
) -> String {
    match col.col_type {
        ColumnType::String => {
            let idx = col.values[row];
            if idx == 0 {
                String::new()
            } else {
                value_maps
                    .get(&col.name)
                    .and_then(|m| m.get(&(idx as u32)))
                    .cloned()
                    .unwrap_or_default()
            }
        }
        ColumnType::Number => {
            let v = col.values[row];
            let zeros = col.leading_zeros.get(row).copied().unwrap_or(0) as usize;
            format!("{}{}", "0".repeat(zeros), v)
        }
        ColumnType::Timestamp => timestamp::format_unix_seconds(col.values[row]),
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").unwrap())
}

fn placeholder_names(pattern: &str) -> Vec<String> {
    placeholder_re()
        .captures_iter(pattern)
        .map(|c| c[1].to_string())
        .collect()
}

fn read_cstring<R: Read>(r: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match r.read(&mut byte) {
            Ok(0) => {
                return err_at!(TruncatedFile, msg: "EOF while reading a column name")
            }
            Ok(_) => {
                if byte[0] == 0 {
                    break;
                }
                buf.push(byte[0]);
            }
            Err(e) => return err_at!(IOError, Err::<String, _>(e)),
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
#[path = "decode_test.rs"]
mod decode_test;
