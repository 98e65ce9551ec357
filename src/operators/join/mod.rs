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

//! Outer join node: one operator, five variants (left/right/full outer,
//! left semi/anti), selected by [`JoinVariant`] (spec §4.2).
//!
//! We implement our own joins rather than delegating to a library join
//! because the morsels passing through may carry struct/list columns that
//! generic off-the-shelf join kernels choke on.

pub mod align;
mod hash_table;

use std::collections::HashSet;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::record_batch::RecordBatch;

pub use hash_table::{null_key_mask, JoinHashTable};

use self::align::align_tables;
use crate::error::{QueryError, Result};
use crate::morsel::{build_schema, concat_morsels, take_morsel, ColumnId, Morsel, SchemaColumn, StreamItem};
use crate::operators::PhysicalOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinVariant {
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    LeftAnti,
}

fn extract_columns(morsel: &Morsel, ids: &[ColumnId]) -> Result<Vec<ArrayRef>> {
    ids.iter()
        .map(|id| {
            morsel
                .column_by_identity(*id)
                .cloned()
                .ok_or_else(|| QueryError::column_not_found(id.to_string()))
        })
        .collect()
}

/// Key ordering quirk (spec §4.2 / §9): if the left-side join columns
/// collide by name with any right-relation column name, swap the key
/// lists before hashing. Preserved verbatim for `left outer` even though
/// it can misfire when both sides share many names -- flagged for the
/// planner to resolve definitively, not re-derived here.
fn swap_for_name_collision(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> (Vec<ColumnId>, Vec<ColumnId>) {
    let left_key_names: Vec<&str> = left_keys
        .iter()
        .filter_map(|id| left.columns().iter().find(|c| c.identity == *id))
        .map(|c| c.name.as_str())
        .collect();
    let right_names: HashSet<&str> = right.columns().iter().map(|c| c.name.as_str()).collect();

    if left_key_names.iter().any(|name| right_names.contains(name)) {
        (right_keys.to_vec(), left_keys.to_vec())
    } else {
        (left_keys.to_vec(), right_keys.to_vec())
    }
}

const LEFT_OUTER_FLUSH_THRESHOLD: usize = 50_000;
const RIGHT_OUTER_BATCH_SIZE: usize = 1_000;
const FULL_OUTER_CHUNK_SIZE: usize = 1_000;

pub fn left_join(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    let (left_keys, right_keys) = swap_for_name_collision(left, right, left_keys, right_keys);

    let right_key_columns = extract_columns(right, &right_keys)?;
    let table = JoinHashTable::build(&right_key_columns)?;
    let left_key_columns = extract_columns(left, &left_keys)?;
    let left_rows = table.convert_probe_columns(&left_key_columns)?;
    let left_null = null_key_mask(&left_key_columns);

    let mut left_idx = Vec::new();
    let mut right_idx = Vec::new();
    let mut out = Vec::new();

    for l in 0..left.num_rows() {
        if left_null[l] {
            left_idx.push(Some(l as u32));
            right_idx.push(None);
        } else {
            let matches = table.probe_row(left_rows.row(l));
            if matches.is_empty() {
                left_idx.push(Some(l as u32));
                right_idx.push(None);
            } else {
                for r in matches {
                    left_idx.push(Some(l as u32));
                    right_idx.push(Some(r));
                }
            }
        }
        if left_idx.len() > LEFT_OUTER_FLUSH_THRESHOLD {
            out.push(align_tables(left, right, &left_idx, &right_idx)?);
            left_idx.clear();
            right_idx.clear();
        }
    }
    if !left_idx.is_empty() {
        out.push(align_tables(left, right, &left_idx, &right_idx)?);
    }
    Ok(out)
}

pub fn right_join(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    let left_key_columns = extract_columns(left, left_keys)?;
    let table = JoinHashTable::build(&left_key_columns)?;
    let right_key_columns = extract_columns(right, right_keys)?;

    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < right.num_rows() {
        let len = RIGHT_OUTER_BATCH_SIZE.min(right.num_rows() - offset);
        let chunk = crate::morsel::slice_morsel(right, offset, len);
        let chunk_keys: Vec<ArrayRef> = right_key_columns
            .iter()
            .map(|c| c.slice(offset, len))
            .collect();
        let chunk_rows = table.convert_probe_columns(&chunk_keys)?;
        let chunk_null = null_key_mask(&chunk_keys);

        let mut left_idx = Vec::new();
        let mut right_idx = Vec::new();
        for r in 0..len {
            if chunk_null[r] {
                left_idx.push(None);
                right_idx.push(Some(r as u32));
                continue;
            }
            let matches = table.probe_row(chunk_rows.row(r));
            if matches.is_empty() {
                left_idx.push(None);
                right_idx.push(Some(r as u32));
            } else {
                for l in matches {
                    left_idx.push(Some(l));
                    right_idx.push(Some(r as u32));
                }
            }
        }
        out.push(align_tables(left, &chunk, &left_idx, &right_idx)?);
        offset += len;
    }
    Ok(out)
}

pub fn full_join(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    let right_key_columns = extract_columns(right, right_keys)?;
    let table = JoinHashTable::build(&right_key_columns)?;
    let left_key_columns = extract_columns(left, left_keys)?;
    let left_rows = table.convert_probe_columns(&left_key_columns)?;
    let left_null = null_key_mask(&left_key_columns);

    // A marked bitset, not a linear scan, for the unmatched-right pass
    // (spec §9: the source's linear membership test is quadratic).
    let mut right_visited = vec![false; right.num_rows()];

    let mut left_idx = Vec::new();
    let mut right_idx = Vec::new();
    let mut out = Vec::new();

    let flush = |left_idx: &mut Vec<Option<u32>>, right_idx: &mut Vec<Option<u32>>, out: &mut Vec<Morsel>| -> Result<()> {
        if left_idx.len() >= FULL_OUTER_CHUNK_SIZE {
            out.push(align_tables(left, right, left_idx, right_idx)?);
            left_idx.clear();
            right_idx.clear();
        }
        Ok(())
    };

    for l in 0..left.num_rows() {
        if left_null[l] {
            left_idx.push(Some(l as u32));
            right_idx.push(None);
        } else {
            let matches = table.probe_row(left_rows.row(l));
            if matches.is_empty() {
                left_idx.push(Some(l as u32));
                right_idx.push(None);
            } else {
                for r in matches {
                    right_visited[r as usize] = true;
                    left_idx.push(Some(l as u32));
                    right_idx.push(Some(r));
                }
            }
        }
        flush(&mut left_idx, &mut right_idx, &mut out)?;
    }

    for (r, seen) in right_visited.into_iter().enumerate() {
        if !seen {
            left_idx.push(None);
            right_idx.push(Some(r as u32));
            flush(&mut left_idx, &mut right_idx, &mut out)?;
        }
    }

    if !left_idx.is_empty() {
        out.push(align_tables(left, right, &left_idx, &right_idx)?);
    }
    Ok(out)
}

pub fn left_semi_join(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    let right_key_columns = extract_columns(right, right_keys)?;
    let table = JoinHashTable::build(&right_key_columns)?;
    let left_key_columns = extract_columns(left, left_keys)?;
    let left_rows = table.convert_probe_columns(&left_key_columns)?;
    let left_null = null_key_mask(&left_key_columns);

    let mut indices = Vec::new();
    for l in 0..left.num_rows() {
        if !left_null[l] && !table.probe_row(left_rows.row(l)).is_empty() {
            indices.push(l as u32);
        }
    }
    Ok(vec![take_morsel(left, &UInt32Array::from(indices))?])
}

pub fn left_anti_join(
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    let right_key_columns = extract_columns(right, right_keys)?;
    let table = JoinHashTable::build(&right_key_columns)?;
    let left_key_columns = extract_columns(left, left_keys)?;
    let left_rows = table.convert_probe_columns(&left_key_columns)?;
    let left_null = null_key_mask(&left_key_columns);

    let mut indices = Vec::new();
    for l in 0..left.num_rows() {
        if left_null[l] || table.probe_row(left_rows.row(l)).is_empty() {
            indices.push(l as u32);
        }
    }
    Ok(vec![take_morsel(left, &UInt32Array::from(indices))?])
}

fn dispatch(
    variant: JoinVariant,
    left: &Morsel,
    right: &Morsel,
    left_keys: &[ColumnId],
    right_keys: &[ColumnId],
) -> Result<Vec<Morsel>> {
    match variant {
        JoinVariant::LeftOuter => left_join(left, right, left_keys, right_keys),
        JoinVariant::RightOuter => right_join(left, right, left_keys, right_keys),
        JoinVariant::FullOuter => full_join(left, right, left_keys, right_keys),
        JoinVariant::LeftSemi => left_semi_join(left, right, left_keys, right_keys),
        JoinVariant::LeftAnti => left_anti_join(left, right, left_keys, right_keys),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Left,
    Right,
}

/// Two-phase stream state: buffer the whole left side until its EOS, then
/// buffer the whole right side until its EOS, then dispatch (spec §4.2).
/// This buffers both inputs fully -- correct, but not streaming; spill is
/// a non-goal.
pub struct OuterJoinNode {
    variant: JoinVariant,
    left_keys: Vec<ColumnId>,
    right_keys: Vec<ColumnId>,
    left_schema: Vec<SchemaColumn>,
    right_schema: Vec<SchemaColumn>,
    phase: Phase,
    left_buffer: Vec<Morsel>,
    right_buffer: Vec<Morsel>,
    left_relation: Option<Morsel>,
}

impl OuterJoinNode {
    pub fn try_new(
        variant: JoinVariant,
        left_schema: Vec<SchemaColumn>,
        right_schema: Vec<SchemaColumn>,
        left_keys: Vec<ColumnId>,
        right_keys: Vec<ColumnId>,
    ) -> Result<Self> {
        if left_keys.len() != right_keys.len() {
            return Err(QueryError::internal(
                "join requires the same number of columns on both sides",
            ));
        }
        Ok(OuterJoinNode {
            variant,
            left_keys,
            right_keys,
            left_schema,
            right_schema,
            phase: Phase::Left,
            left_buffer: Vec::new(),
            right_buffer: Vec::new(),
            left_relation: None,
        })
    }

    fn concat_or_empty(buffer: &[Morsel], schema: &[SchemaColumn]) -> Result<Morsel> {
        if buffer.is_empty() {
            Ok(Morsel::from_batch(RecordBatch::new_empty(build_schema(schema))))
        } else {
            concat_morsels(buffer)
        }
    }
}

impl PhysicalOperator for OuterJoinNode {
    fn name(&self) -> &'static str {
        "OuterJoin"
    }

    fn execute(&mut self, item: StreamItem) -> Result<Vec<StreamItem>> {
        match self.phase {
            Phase::Left => match item {
                StreamItem::End => {
                    log::debug!("outer-join: left side EOS, {} buffered morsels", self.left_buffer.len());
                    let relation = Self::concat_or_empty(&self.left_buffer, &self.left_schema)?;
                    self.left_relation = Some(relation);
                    self.left_buffer.clear();
                    self.phase = Phase::Right;
                    Ok(vec![])
                }
                StreamItem::Data(morsel) => {
                    self.left_buffer.push(morsel);
                    Ok(vec![])
                }
            },
            Phase::Right => match item {
                StreamItem::End => {
                    log::debug!("outer-join: right side EOS, {} buffered morsels", self.right_buffer.len());
                    let right_relation = Self::concat_or_empty(&self.right_buffer, &self.right_schema)?;
                    self.right_buffer.clear();
                    let left_relation = self.left_relation.as_ref().ok_or_else(|| {
                        QueryError::internal("outer join reached right phase without a left relation")
                    })?;
                    let morsels = dispatch(
                        self.variant,
                        left_relation,
                        &right_relation,
                        &self.left_keys,
                        &self.right_keys,
                    )?;
                    let mut items: Vec<StreamItem> =
                        morsels.into_iter().map(StreamItem::Data).collect();
                    items.push(StreamItem::End);
                    Ok(items)
                }
                StreamItem::Data(morsel) => {
                    self.right_buffer.push(morsel);
                    Ok(vec![])
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::DataType;
    use std::sync::Arc;

    fn relation(name: &str, key: &str, keys: Vec<i32>, values: Vec<i32>) -> (Morsel, ColumnId) {
        let key_col = SchemaColumn::new(key, DataType::Int32, false);
        let value_col = SchemaColumn::new(format!("{name}_value"), DataType::Int32, false);
        let schema = build_schema(&[key_col.clone(), value_col.clone()]);
        let key_array: ArrayRef = Arc::new(Int32Array::from(keys));
        let value_array: ArrayRef = Arc::new(Int32Array::from(values));
        let batch = RecordBatch::try_new(schema, vec![key_array, value_array]).unwrap();
        let id = key_col.identity;
        (Morsel::new(batch, vec![key_col, value_col]).unwrap(), id)
    }

    #[test]
    fn left_outer_emits_row_per_left_row_with_null_padding() {
        // 5-row left, 3-row right; key `2` matches 2 rows on each side
        // (spec §8 scenario 6): 3 unmatched left rows + 2 matched left rows
        // x 2 right matches each = 7.
        let (left, lk) = relation("l", "lkey", vec![1, 2, 2, 3, 4], vec![10, 20, 21, 30, 40]);
        let (right, rk) = relation("r", "rkey", vec![2, 2, 99], vec![200, 201, 999]);

        let out = left_join(&left, &right, &[lk], &[rk]).unwrap();
        let total_rows: usize = out.iter().map(|m| m.num_rows()).sum();
        assert_eq!(total_rows, 3 + 2 * 2);
    }

    #[test]
    fn left_semi_and_anti_partition_left_input() {
        let (left, lk) = relation("l", "lkey", vec![1, 2, 3], vec![10, 20, 30]);
        let (right, rk) = relation("r", "rkey", vec![2, 3], vec![200, 300]);

        let semi = left_semi_join(&left, &right, &[lk], &[rk]).unwrap();
        let anti = left_anti_join(&left, &right, &[lk], &[rk]).unwrap();

        let semi_rows: usize = semi.iter().map(|m| m.num_rows()).sum();
        let anti_rows: usize = anti.iter().map(|m| m.num_rows()).sum();
        assert_eq!(semi_rows, 2);
        assert_eq!(anti_rows, 1);
        assert_eq!(semi_rows + anti_rows, left.num_rows());
    }

    #[test]
    fn null_keys_never_match() {
        let key_col = SchemaColumn::new("k", DataType::Int32, true);
        let schema = build_schema(&[key_col.clone()]);
        let left_array: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None]));
        let left = Morsel::new(
            RecordBatch::try_new(schema.clone(), vec![left_array]).unwrap(),
            vec![key_col.clone()],
        )
        .unwrap();
        let right_array: ArrayRef = Arc::new(Int32Array::from(vec![None::<i32>]));
        let right = Morsel::new(
            RecordBatch::try_new(schema, vec![right_array]).unwrap(),
            vec![key_col.clone()],
        )
        .unwrap();

        let out = left_join(&left, &right, &[key_col.identity], &[key_col.identity]).unwrap();
        let total_rows: usize = out.iter().map(|m| m.num_rows()).sum();
        assert_eq!(total_rows, 2); // both left rows unmatched, including the null-key one
    }

    #[test]
    fn full_outer_includes_unmatched_right_rows() {
        let (left, lk) = relation("l", "lkey", vec![1, 2], vec![10, 20]);
        let (right, rk) = relation("r", "rkey", vec![2, 3], vec![200, 300]);

        let out = full_join(&left, &right, &[lk], &[rk]).unwrap();
        let total_rows: usize = out.iter().map(|m| m.num_rows()).sum();
        // left row 1 unmatched, left row 2 matches right row 2, right row 3 unmatched.
        assert_eq!(total_rows, 3);
    }

    #[test]
    fn two_phase_protocol_buffers_then_emits_on_right_eos() {
        let (left, lk) = relation("l", "lkey", vec![1, 2], vec![10, 20]);
        let (right, rk) = relation("r", "rkey", vec![1], vec![100]);

        let mut node = OuterJoinNode::try_new(
            JoinVariant::LeftOuter,
            left.columns().to_vec(),
            right.columns().to_vec(),
            vec![lk],
            vec![rk],
        )
        .unwrap();

        assert!(node.execute(StreamItem::Data(left)).unwrap().is_empty());
        assert!(node.execute(StreamItem::End).unwrap().is_empty());
        assert!(node.execute(StreamItem::Data(right)).unwrap().is_empty());
        let out = node.execute(StreamItem::End).unwrap();
        assert!(out.last().unwrap().is_end());
        let total_rows: usize = out
            .iter()
            .filter_map(|i| match i {
                StreamItem::Data(m) => Some(m.num_rows()),
                StreamItem::End => None,
            })
            .sum();
        assert_eq!(total_rows, 2);
    }
}
