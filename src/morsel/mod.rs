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

//! Morsels: the columnar record batches that flow between physical
//! operators, plus the column helpers (concat, take, slice, permissive
//! schema merge) every operator needs.

mod schema;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

pub use schema::{ColumnId, SchemaColumn};

use crate::error::{QueryError, Result};

/// A finite, schema-typed, column-oriented batch of rows. Immutable after
/// construction -- operators build new morsels rather than mutating inputs.
#[derive(Debug, Clone)]
pub struct Morsel {
    batch: RecordBatch,
    columns: Vec<SchemaColumn>,
}

impl Morsel {
    pub fn new(batch: RecordBatch, columns: Vec<SchemaColumn>) -> Result<Self> {
        if batch.num_columns() != columns.len() {
            return Err(QueryError::internal(format!(
                "morsel column count mismatch: batch has {} columns, schema describes {}",
                batch.num_columns(),
                columns.len()
            )));
        }
        Ok(Morsel { batch, columns })
    }

    /// Builds a morsel from a plain `RecordBatch`, minting a fresh identity
    /// for every field. Useful for adapting an external collaborator (a
    /// scan, a storage adapter) that only deals in Arrow schemas.
    pub fn from_batch(batch: RecordBatch) -> Self {
        let columns = batch
            .schema()
            .fields()
            .iter()
            .map(|f| SchemaColumn::new(f.name().clone(), f.data_type().clone(), f.is_nullable()))
            .collect();
        Morsel { batch, columns }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Position of the column with the given identity, if present.
    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.identity == id)
    }

    pub fn column_by_identity(&self, id: ColumnId) -> Option<&ArrayRef> {
        self.column_index(id).map(|i| self.batch.column(i))
    }

    /// A zero-row morsel with the same schema.
    pub fn empty_like(&self) -> Morsel {
        Morsel {
            batch: self.batch.slice(0, 0),
            columns: self.columns.clone(),
        }
    }
}

/// The end-of-stream sentinel, distinct from any (possibly empty) morsel.
/// See spec §3 / REDESIGN FLAGS: never model EOS as a null or empty batch.
#[derive(Debug)]
pub enum StreamItem {
    Data(Morsel),
    End,
}

impl StreamItem {
    pub fn is_end(&self) -> bool {
        matches!(self, StreamItem::End)
    }

    pub fn into_morsel(self) -> Option<Morsel> {
        match self {
            StreamItem::Data(m) => Some(m),
            StreamItem::End => None,
        }
    }
}

/// Builds an Arrow schema from a column descriptor list, stamping each
/// field's identity into its metadata for debugging/display purposes. The
/// identity carried by `SchemaColumn` remains the operators' source of
/// truth -- the metadata is not read back by any operator.
pub fn build_schema(columns: &[SchemaColumn]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|c| {
            Field::new(&c.name, c.data_type.clone(), c.nullable).with_metadata(
                [("identity".to_string(), c.identity.to_string())]
                    .into_iter()
                    .collect(),
            )
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Concatenates morsels with a permissive schema merge: wider numeric types
/// are promoted, nullability is widened (if any input is nullable, the
/// merged column is nullable). Used by the heap-sort accumulator (spec §4.1)
/// and anywhere else operators must tolerate slightly divergent batch
/// schemas arriving from upstream.
pub fn concat_morsels(morsels: &[Morsel]) -> Result<Morsel> {
    match morsels.len() {
        0 => Err(QueryError::internal("concat_morsels called with no inputs")),
        1 => Ok(morsels[0].clone()),
        _ => {
            let mut merged = morsels[0].columns.clone();
            for morsel in &morsels[1..] {
                if morsel.columns.len() != merged.len() {
                    return Err(QueryError::internal(
                        "cannot concatenate morsels with differing column counts",
                    ));
                }
                for (acc, other) in merged.iter_mut().zip(morsel.columns.iter()) {
                    acc.nullable |= other.nullable;
                    if acc.data_type != other.data_type {
                        acc.data_type = promote_data_type(&acc.data_type, &other.data_type)?;
                    }
                }
            }
            let schema = build_schema(&merged);

            let mut batches = Vec::with_capacity(morsels.len());
            for morsel in morsels {
                let mut arrays = Vec::with_capacity(merged.len());
                for (i, target) in merged.iter().enumerate() {
                    let array = morsel.batch.column(i);
                    let array = if array.data_type() == &target.data_type {
                        array.clone()
                    } else {
                        arrow::compute::cast(array, &target.data_type)?
                    };
                    arrays.push(array);
                }
                batches.push(RecordBatch::try_new(schema.clone(), arrays)?);
            }
            let batch = arrow::compute::concat_batches(&schema, &batches)?;
            Ok(Morsel { batch, columns: merged })
        }
    }
}

/// Returns the smallest numeric type both `a` and `b` widen to without loss,
/// or an error if they are not both numeric and also not identical.
fn promote_data_type(a: &DataType, b: &DataType) -> Result<DataType> {
    if a == b {
        return Ok(a.clone());
    }
    let rank = |dt: &DataType| -> Option<(u8, u8)> {
        // (family, width) -- family 0 = signed int, 1 = unsigned int, 2 = float
        use DataType::*;
        match dt {
            Int8 => Some((0, 1)),
            Int16 => Some((0, 2)),
            Int32 => Some((0, 4)),
            Int64 => Some((0, 8)),
            UInt8 => Some((1, 1)),
            UInt16 => Some((1, 2)),
            UInt32 => Some((1, 4)),
            UInt64 => Some((1, 8)),
            Float32 => Some((2, 4)),
            Float64 => Some((2, 8)),
            _ => None,
        }
    };
    match (rank(a), rank(b)) {
        (Some((fa, wa)), Some((fb, wb))) => {
            if fa == fb {
                Ok(if wa >= wb { a.clone() } else { b.clone() })
            } else if fa == 2 || fb == 2 {
                // any float involved: promote to the widest float present
                Ok(DataType::Float64)
            } else {
                // mixed signed/unsigned integers: widen to a signed type that
                // can hold both, falling back to Int64
                Ok(DataType::Int64)
            }
        }
        _ => Err(QueryError::internal(format!(
            "cannot reconcile incompatible column types {a:?} and {b:?} while merging morsels"
        ))),
    }
}

/// Takes rows from every column of `morsel` by (non-null) position,
/// preserving the morsel's schema. Used where the index set is known to be
/// total (heap-sort's accumulator prune), not for join alignment, which
/// needs nullable-index padding and is handled by `operators::join::align`.
pub fn take_morsel(morsel: &Morsel, indices: &UInt32Array) -> Result<Morsel> {
    let mut arrays = Vec::with_capacity(morsel.batch.num_columns());
    for i in 0..morsel.batch.num_columns() {
        let taken = arrow::compute::take(morsel.batch.column(i).as_ref(), indices, None)?;
        arrays.push(taken);
    }
    let batch = RecordBatch::try_new(morsel.batch.schema(), arrays)?;
    Ok(Morsel {
        batch,
        columns: morsel.columns.clone(),
    })
}

pub fn slice_morsel(morsel: &Morsel, offset: usize, length: usize) -> Morsel {
    Morsel {
        batch: morsel.batch.slice(offset, length),
        columns: morsel.columns.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::DataType;

    fn int_morsel(name: &str, values: Vec<i32>) -> Morsel {
        let col = SchemaColumn::new(name, DataType::Int32, false);
        let array: ArrayRef = Arc::new(Int32Array::from(values));
        let schema = build_schema(&[col.clone()]);
        let batch = RecordBatch::try_new(schema, vec![array]).unwrap();
        Morsel::new(batch, vec![col]).unwrap()
    }

    #[test]
    fn concat_promotes_and_widens() {
        let a = int_morsel("x", vec![1, 2, 3]);
        let mut b_cols = a.columns.clone();
        b_cols[0].data_type = DataType::Int64;
        b_cols[0].identity = a.columns[0].identity;
        let schema = build_schema(&b_cols);
        let array: ArrayRef = Arc::new(arrow::array::Int64Array::from(vec![4, 5]));
        let batch = RecordBatch::try_new(schema, vec![array]).unwrap();
        let b = Morsel::new(batch, b_cols).unwrap();

        let merged = concat_morsels(&[a, b]).unwrap();
        assert_eq!(merged.num_rows(), 5);
        assert_eq!(merged.columns()[0].data_type, DataType::Int64);
    }

    #[test]
    fn empty_like_preserves_schema_zero_rows() {
        let a = int_morsel("x", vec![1, 2, 3]);
        let e = a.empty_like();
        assert_eq!(e.num_rows(), 0);
        assert_eq!(e.columns().len(), 1);
    }
}
