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

//! Heap-sort (top-K) operator: accumulate, sort, prune to `limit` on every
//! incoming morsel, emit the final accumulator on EOS (spec §4.1).
//!
//! Despite the name this isn't the heap-sort algorithm -- it's a repeated
//! small sort of an accumulator that never grows past `limit` rows, which in
//! practice beats a true heap for the batch sizes morsels arrive in.

use arrow::compute::{lexsort_to_indices, sort_to_indices, SortColumn, SortOptions};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{QueryError, Result};
use crate::morsel::{build_schema, concat_morsels, take_morsel, ColumnId, Morsel, SchemaColumn, StreamItem};
use crate::operators::PhysicalOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn descending(self) -> bool {
        matches!(self, Direction::Descending)
    }
}

#[derive(Debug, Clone)]
pub struct OrderByKey {
    pub column: ColumnId,
    pub direction: Direction,
}

/// The sort strategy is resolved once at construction from the upstream
/// schema, not re-inspected on every morsel (REDESIGN FLAGS §9).
#[derive(Debug, Clone, Copy)]
enum SortStrategy {
    SingleStringOrBinary,
    MultiColumnWithStringOrBinary,
    SingleNumeric,
    LexicographicNumeric,
}

fn is_string_or_binary(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Binary | DataType::LargeBinary
    )
}

pub struct HeapSortNode {
    order_by: Vec<OrderByKey>,
    /// `None` disables pruning entirely -- a full sort (spec §9, "limit = -1").
    limit: Option<usize>,
    strategy: SortStrategy,
    upstream_columns: Vec<SchemaColumn>,
    accumulator: Option<Morsel>,
}

impl HeapSortNode {
    pub fn try_new(
        upstream_columns: &[SchemaColumn],
        order_by: Vec<OrderByKey>,
        limit: Option<usize>,
    ) -> Result<Self> {
        let mut types = Vec::with_capacity(order_by.len());
        for key in &order_by {
            let column = upstream_columns
                .iter()
                .find(|c| c.identity == key.column)
                .ok_or_else(|| {
                    QueryError::column_not_found(format!(
                        "ORDER BY must reference columns as they appear in the SELECT clause ({})",
                        key.column
                    ))
                })?;
            types.push(column.data_type.clone());
        }

        let strategy = if order_by.len() == 1 {
            if is_string_or_binary(&types[0]) {
                SortStrategy::SingleStringOrBinary
            } else {
                SortStrategy::SingleNumeric
            }
        } else if types.iter().any(is_string_or_binary) {
            SortStrategy::MultiColumnWithStringOrBinary
        } else {
            SortStrategy::LexicographicNumeric
        };

        Ok(HeapSortNode {
            order_by,
            limit,
            strategy,
            upstream_columns: upstream_columns.to_vec(),
            accumulator: None,
        })
    }

    fn prune(&self, morsel: Morsel) -> Result<Morsel> {
        let indices = match self.strategy {
            SortStrategy::SingleStringOrBinary | SortStrategy::SingleNumeric => {
                let key = &self.order_by[0];
                let idx = morsel.column_index(key.column).ok_or_else(|| {
                    QueryError::column_not_found(key.column.to_string())
                })?;
                let array = morsel.batch().column(idx);
                let options = Some(SortOptions {
                    descending: key.direction.descending(),
                    nulls_first: false,
                });
                sort_to_indices(array.as_ref(), options, self.limit)?
            }
            SortStrategy::MultiColumnWithStringOrBinary | SortStrategy::LexicographicNumeric => {
                let mut columns = Vec::with_capacity(self.order_by.len());
                for key in &self.order_by {
                    let idx = morsel.column_index(key.column).ok_or_else(|| {
                        QueryError::column_not_found(key.column.to_string())
                    })?;
                    columns.push(SortColumn {
                        values: morsel.batch().column(idx).clone(),
                        options: Some(SortOptions {
                            descending: key.direction.descending(),
                            nulls_first: false,
                        }),
                    });
                }
                lexsort_to_indices(&columns, self.limit)?
            }
        };
        take_morsel(&morsel, &indices)
    }

    fn empty_morsel(&self) -> Morsel {
        let schema = build_schema(&self.upstream_columns);
        Morsel::from_batch(RecordBatch::new_empty(schema))
    }
}

impl PhysicalOperator for HeapSortNode {
    fn name(&self) -> &'static str {
        "HeapSort"
    }

    fn execute(&mut self, item: StreamItem) -> Result<Vec<StreamItem>> {
        match item {
            StreamItem::End => {
                log::debug!("heap-sort: EOS, emitting accumulator");
                let result = self.accumulator.take().unwrap_or_else(|| self.empty_morsel());
                Ok(vec![StreamItem::Data(result), StreamItem::End])
            }
            StreamItem::Data(morsel) => {
                // A zero-row morsel is a no-op pass-through (spec §4.1 edge cases).
                if morsel.num_rows() == 0 {
                    return Ok(vec![]);
                }
                let combined = match self.accumulator.take() {
                    Some(existing) => concat_morsels(&[existing, morsel])?,
                    None => morsel,
                };
                self.accumulator = Some(self.prune(combined)?);
                Ok(vec![])
            }
        }
    }
}
