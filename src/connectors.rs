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

//! Document storage boundary (spec §6). `DocumentStorageAdapter` is the
//! trait a concrete backend (a document store client) implements; no such
//! client ships here. `chunk_into_morsels` is the shared batching behavior
//! any concrete adapter would reuse.

use arrow::record_batch::RecordBatch;

use crate::morsel::Morsel;

pub trait DocumentStorageAdapter {
    /// Reads `collection`, yielding morsels of up to `morsel_size` rows
    /// each.
    fn read_documents(
        &self,
        collection: &str,
        morsel_size: usize,
    ) -> Box<dyn Iterator<Item = Morsel>>;
}

/// Splits one big `RecordBatch` of document rows into a sequence of
/// `morsel_size`-row morsels, preserving row order. Shared by any concrete
/// `DocumentStorageAdapter` so the chunking policy lives in one place.
pub fn chunk_into_morsels(batch: &RecordBatch, morsel_size: usize) -> Vec<Morsel> {
    assert!(morsel_size > 0, "morsel_size must be positive");
    let mut morsels = Vec::new();
    let mut offset = 0;
    while offset < batch.num_rows() {
        let len = morsel_size.min(batch.num_rows() - offset);
        morsels.push(Morsel::from_batch(batch.slice(offset, len)));
        offset += len;
    }
    morsels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morsel::{build_schema, SchemaColumn};
    use arrow::array::{ArrayRef, Int32Array};
    use arrow::datatypes::DataType;
    use std::sync::Arc;

    #[test]
    fn chunks_preserve_row_order_and_respect_morsel_size() {
        let col = SchemaColumn::new("id", DataType::Int32, false);
        let schema = build_schema(&[col]);
        let array: ArrayRef = Arc::new(Int32Array::from((0..10).collect::<Vec<i32>>()));
        let batch = RecordBatch::try_new(schema, vec![array]).unwrap();

        let morsels = chunk_into_morsels(&batch, 4);
        assert_eq!(morsels.len(), 3);
        assert_eq!(morsels[0].num_rows(), 4);
        assert_eq!(morsels[1].num_rows(), 4);
        assert_eq!(morsels[2].num_rows(), 2);
    }
}
