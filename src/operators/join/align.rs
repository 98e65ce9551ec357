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

//! `align_tables`: combine two relations and two same-length index vectors
//! (with `None` entries denoting unmatched rows) into one output morsel
//! with null padding where an index is `None` (spec §4.2, "Alignment").

use arrow::array::UInt32Array;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::morsel::{build_schema, Morsel, SchemaColumn};

pub fn align_tables(
    left: &Morsel,
    right: &Morsel,
    left_indices: &[Option<u32>],
    right_indices: &[Option<u32>],
) -> Result<Morsel> {
    debug_assert_eq!(left_indices.len(), right_indices.len());

    let left_has_nulls = left_indices.iter().any(Option::is_none);
    let right_has_nulls = right_indices.iter().any(Option::is_none);

    let left_take = UInt32Array::from(left_indices.to_vec());
    let right_take = UInt32Array::from(right_indices.to_vec());

    let mut arrays = Vec::with_capacity(left.columns().len() + right.columns().len());
    let mut columns: Vec<SchemaColumn> = Vec::with_capacity(arrays.capacity());

    for i in 0..left.batch().num_columns() {
        arrays.push(arrow::compute::take(
            left.batch().column(i).as_ref(),
            &left_take,
            None,
        )?);
        let col = &left.columns()[i];
        columns.push(if left_has_nulls { col.widened() } else { col.clone() });
    }
    for i in 0..right.batch().num_columns() {
        arrays.push(arrow::compute::take(
            right.batch().column(i).as_ref(),
            &right_take,
            None,
        )?);
        let col = &right.columns()[i];
        columns.push(if right_has_nulls { col.widened() } else { col.clone() });
    }

    let schema = build_schema(&columns);
    let batch = RecordBatch::try_new(schema, arrays)?;
    Morsel::new(batch, columns)
}
