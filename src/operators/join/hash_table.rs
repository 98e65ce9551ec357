// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The join hash table: a mapping from a 64-bit hash of the join-key tuple
//! to the set of build-side row indices that hashed to that value (spec §3,
//! "Hash-join build table"). Collisions are preserved and verified against
//! the encoded row bytes rather than trusted blindly.

use std::hash::BuildHasher;

use arrow::array::ArrayRef;
use arrow::row::{Row, RowConverter, Rows, SortField};
use hashbrown::HashMap;

use crate::error::Result;

/// Deterministic within a process -- the hash only needs to be stable for
/// the lifetime of one join, never persisted or compared across runs.
fn hasher() -> ahash::RandomState {
    ahash::RandomState::with_seed(0x4a_6f_69_6e)
}

/// Returns, per row, whether any of the given key columns is null there.
/// Null join keys never match anything (spec §4.2, "null ≠ null").
pub fn null_key_mask(columns: &[ArrayRef]) -> Vec<bool> {
    let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut mask = vec![false; num_rows];
    for column in columns {
        if column.null_count() == 0 {
            continue;
        }
        for (row, is_null) in mask.iter_mut().enumerate() {
            if column.is_null(row) {
                *is_null = true;
            }
        }
    }
    mask
}

/// A multi-key hash table built over one relation's join-key columns.
pub struct JoinHashTable {
    buckets: HashMap<u64, Vec<u32>, ahash::RandomState>,
    rows: Rows,
    null_key: Vec<bool>,
    converter: RowConverter,
}

impl JoinHashTable {
    /// Builds the table over `columns`, skipping rows whose join key
    /// contains a null (they can never be matched, build or probe side).
    pub fn build(columns: &[ArrayRef]) -> Result<Self> {
        let fields = columns
            .iter()
            .map(|c| SortField::new(c.data_type().clone()))
            .collect::<Vec<_>>();
        let converter = RowConverter::new(fields)?;
        let rows = converter.convert_columns(columns)?;
        let null_key = null_key_mask(columns);

        let random_state = hasher();
        let mut buckets: HashMap<u64, Vec<u32>, ahash::RandomState> =
            HashMap::with_hasher(random_state);
        for (idx, is_null) in null_key.iter().enumerate() {
            if *is_null {
                continue;
            }
            let row = rows.row(idx);
            let hash = buckets.hasher().hash_one(row.as_ref());
            buckets.entry(hash).or_default().push(idx as u32);
        }

        Ok(JoinHashTable {
            buckets,
            rows,
            null_key,
            converter,
        })
    }

    /// Candidate build-side row indices whose key tuple matches `probe_row`
    /// exactly (collision-verified, not hash-only).
    pub fn probe_row(&self, probe_row: Row<'_>) -> Vec<u32> {
        let hash = self.buckets.hasher().hash_one(probe_row.as_ref());
        match self.buckets.get(&hash) {
            Some(candidates) => candidates
                .iter()
                .copied()
                .filter(|&idx| self.rows.row(idx as usize) == probe_row)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Converts probe-side columns into `Rows` using the *same* converter
    /// the build side used, so row encodings are directly comparable.
    pub fn convert_probe_columns(&self, columns: &[ArrayRef]) -> Result<Rows> {
        Ok(self.converter.convert_columns(columns)?)
    }

    pub fn build_null_key_mask(&self) -> &[bool] {
        &self.null_key
    }

    pub fn num_build_rows(&self) -> usize {
        self.rows.num_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use std::sync::Arc;

    #[test]
    fn finds_exact_matches_and_skips_null_keys() {
        let left: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), Some(2), None, Some(2)]));
        let table = JoinHashTable::build(&[left]).unwrap();

        let probe: ArrayRef = Arc::new(Int32Array::from(vec![2]));
        let probe_rows = table.convert_probe_columns(&[probe]).unwrap();
        let matches = table.probe_row(probe_rows.row(0));
        let mut matches = matches;
        matches.sort_unstable();
        assert_eq!(matches, vec![1, 3]);
    }

    #[test]
    fn no_match_for_absent_key() {
        let left: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let table = JoinHashTable::build(&[left]).unwrap();
        let probe: ArrayRef = Arc::new(Int32Array::from(vec![99]));
        let probe_rows = table.convert_probe_columns(&[probe]).unwrap();
        assert!(table.probe_row(probe_rows.row(0)).is_empty());
    }
}
