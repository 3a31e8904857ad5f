//! Encoder: orders columns, reorders rows to improve RLE, renumbers trie
//! indices, and serializes the binary artifact (spec.md §4.E, §6).

use crate::codec;
use crate::column::cardinality::CardinalityEstimator;
use crate::column::{Column, ColumnType};
use crate::db::Database;
use crate::err_at;
use crate::error::{Error, Result};
use log::debug;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const MAGIC: [u8; 12] = [
    0xf0, 0x9f, 0x90, 0xbf, 0xef, 0xb8, 0x8f, 0x6a, 0x6f, 0x65, 0x64, 0x62,
];

/// Reserved column name carrying each row's pre-sort position. The row
/// sort (step 4 below) permutes every column for RLE, which would
/// otherwise silently drop insertion order; spec.md §8 property 1 lists
/// only key order, empty strings, and leading-zero degeneracies as
/// exceptions to `decode(encode(R)) == R`, so row order must round-trip.
/// Written and read exactly like any other NUMBER column, so it rides
/// the ordinary delta+RLE+Zstd path; [`crate::decode`] strips it back out
/// before handing records and columns back to the caller.
pub(crate) const ROW_ID_COLUMN: &str = "__row_id";

impl Database {
    /// Write the whole database as a single binary artifact at `path`
    /// (spec.md §4.E, §6). The encoding pipeline renumbers tries and
    /// reorders rows in place, so this takes `&mut self` rather than
    /// `&self`; the decoder reconstructs an equivalent instance from
    /// what's written, so nothing observable is lost by doing so.
    pub fn encode<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = err_at!(IOError, File::create(path.as_ref()))?;
        self.encode_to_writer(BufWriter::new(file))
    }

    fn encode_to_writer<W: Write>(&mut self, mut w: W) -> Result<()> {
        // Step 1+2: per STRING column, merge single children (protected
        // by the indices actually present in that column's values), then
        // renumber depth-first and remap the value vector.
        for col in self.columns.values_mut() {
            if col.col_type != ColumnType::String {
                continue;
            }
            let protected: BTreeSet<u32> = col
                .values
                .iter()
                .filter(|&&v| v != 0)
                .map(|&v| v as u32)
                .collect();
            let trie = col.trie.as_mut().unwrap();
            trie.merge_single_children(&protected);
            let rename = trie.rename_indices();
            for v in col.values.iter_mut() {
                if *v != 0 {
                    let old = *v as u32;
                    *v = *rename.get(&old).unwrap_or(&old) as i64;
                }
            }
        }

        // Step 3: column ordering ascending by estimated cardinality.
        let mut order: Vec<String> = self.column_order.clone();
        order.sort_by_key(|k| self.columns[k].cardinality.estimate());
        debug!("encode: column order {:?}", order);

        // Step 4: stable lexicographic row sort keyed on string-formatted
        // column values in that order.
        let n = self.record_count as usize;
        let value_maps: std::collections::HashMap<String, std::collections::HashMap<u32, String>> =
            order
                .iter()
                .filter(|k| self.columns[*k].col_type == ColumnType::String)
                .map(|k| (k.clone(), self.columns[k].trie.as_ref().unwrap().build_value_map()))
                .collect();

        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by(|&a, &b| {
            for key in &order {
                let col = &self.columns[key];
                let sa = row_sort_key(col, &value_maps, key, a);
                let sb = row_sort_key(col, &value_maps, key, b);
                match sa.cmp(&sb) {
                    std::cmp::Ordering::Equal => continue,
                    other => return other,
                }
            }
            std::cmp::Ordering::Equal
        });

        for key in &order {
            let col = self.columns.get_mut(key).unwrap();
            col.values = perm.iter().map(|&i| col.values[i]).collect();
            if col.col_type == ColumnType::Number {
                col.leading_zeros = perm.iter().map(|&i| col.leading_zeros[i]).collect();
            }
        }

        // `perm[j]` is the pre-sort row index now sitting at sorted
        // position `j`; stored verbatim as a NUMBER column so decode can
        // place each row back where it was inserted.
        let row_id_col = Column {
            col_type: ColumnType::Number,
            values: perm.iter().map(|&i| i as i64).collect(),
            trie: None,
            cardinality: CardinalityEstimator::new(),
            leading_zeros: vec![0u8; n],
        };

        // Step 5: write the artifact.
        err_at!(IOError, w.write_all(&MAGIC))?;
        err_at!(IOError, w.write_all(&self.record_count.to_be_bytes()))?;

        for key in &order {
            let col = &self.columns[key];
            err_at!(IOError, w.write_all(&[col.col_type.as_u8()]))?;
            err_at!(IOError, w.write_all(key.as_bytes()))?;
            err_at!(IOError, w.write_all(&[0]))?;
            if col.col_type == ColumnType::String {
                let mut raw = Vec::new();
                col.trie.as_ref().unwrap().write_depth_first(&mut raw)?;
                let compressed = codec::compress(&raw)?;
                let len: u32 = match u32::try_from(compressed.len()) {
                    Ok(n) => n,
                    Err(_) => {
                        return err_at!(
                            Fatal,
                            msg: "trie payload for {} is {} bytes, exceeds u32",
                            key, compressed.len()
                        )
                    }
                };
                err_at!(IOError, w.write_all(&len.to_be_bytes()))?;
                err_at!(IOError, w.write_all(&compressed))?;
                debug!("encode: column {} trie payload {} bytes", key, compressed.len());
            }
        }
        err_at!(IOError, w.write_all(&[row_id_col.col_type.as_u8()]))?;
        err_at!(IOError, w.write_all(ROW_ID_COLUMN.as_bytes()))?;
        err_at!(IOError, w.write_all(&[0]))?;
        err_at!(IOError, w.write_all(&[0]))?;

        for key in &order {
            let col = &self.columns[key];
            let written = write_data_section(&mut w, col)?;
            debug!("encode: column {} data payload {} bytes", key, written);
        }
        let written = write_data_section(&mut w, &row_id_col)?;
        debug!("encode: column {} data payload {} bytes", ROW_ID_COLUMN, written);

        Ok(())
    }
}

fn row_sort_key<'a>(
    col: &Column,
    value_maps: &'a std::collections::HashMap<String, std::collections::HashMap<u32, String>>,
    key: &str,
    row: usize,
) -> String {
    let v = col.values[row];
    match col.col_type {
        ColumnType::String => {
            if v == 0 {
                String::new()
            } else {
                value_maps
                    .get(key)
                    .and_then(|m| m.get(&(v as u32)))
                    .cloned()
                    .unwrap_or_default()
            }
        }
        ColumnType::Number | ColumnType::Timestamp => v.to_string(),
    }
}

fn write_data_section<W: Write>(w: &mut W, col: &Column) -> Result<usize> {
    let encoded: Vec<i64> = match col.col_type {
        ColumnType::String => col.values.clone(),
        ColumnType::Number | ColumnType::Timestamp => codec::delta_encode(&col.values),
    };
    let signed = matches!(col.col_type, ColumnType::Number | ColumnType::Timestamp);

    let rle = codec::rle_encode(&encoded);
    let max_abs = encoded.iter().map(|&v| v.unsigned_abs()).max().unwrap_or(0);
    let max_len = rle.iter().map(|&(_, l)| l).max().unwrap_or(1);
    let value_byte_size = codec::value_byte_size(max_abs, signed);
    let length_byte_size = codec::length_byte_size(max_len);

    let mut raw = Vec::new();
    for (value, length) in &rle {
        if signed {
            codec::write_signed(&mut raw, *value, value_byte_size);
        } else {
            codec::write_unsigned(&mut raw, *value as u64, value_byte_size);
        }
        codec::write_unsigned(&mut raw, *length, length_byte_size);
    }
    if col.col_type == ColumnType::Number {
        raw.extend_from_slice(&col.leading_zeros);
    }

    let compressed = codec::compress(&raw)?;
    err_at!(IOError, w.write_all(&[value_byte_size]))?;
    err_at!(IOError, w.write_all(&[length_byte_size]))?;
    let len: u32 = compressed.len() as u32;
    err_at!(IOError, w.write_all(&len.to_be_bytes()))?;
    err_at!(IOError, w.write_all(&compressed))?;
    Ok(compressed.len())
}

#[cfg(test)]
#[path = "encode_test.rs"]
mod encode_test;
