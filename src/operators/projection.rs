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

//! Projection operator: evaluate-then-append, then select (spec §4.3).
//!
//! Expression evaluation itself is out of scope; a [`ProjectionItem::Expression`]
//! carries its own evaluator closure supplied by whoever builds the physical
//! plan, so this operator only owns the append/select split, not expression
//! semantics.

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

use crate::error::{QueryError, Result};
use crate::morsel::{build_schema, ColumnId, Morsel, SchemaColumn, StreamItem};
use crate::operators::PhysicalOperator;

pub enum ProjectionItem {
    /// A plain column reference, resolved by identity, with an optional rename.
    Identifier {
        column: ColumnId,
        alias: Option<String>,
    },
    /// A computed column: evaluated against the morsel and appended under
    /// `output`'s identity before the select step runs.
    Expression {
        output: SchemaColumn,
        evaluate: Box<dyn Fn(&Morsel) -> Result<ArrayRef> + Send>,
    },
}

impl ProjectionItem {
    fn output_identity(&self) -> ColumnId {
        match self {
            ProjectionItem::Identifier { column, .. } => *column,
            ProjectionItem::Expression { output, .. } => output.identity,
        }
    }
}

pub struct ProjectionNode {
    items: Vec<ProjectionItem>,
}

impl ProjectionNode {
    pub fn new(items: Vec<ProjectionItem>) -> Self {
        ProjectionNode { items }
    }

    fn append_expressions(&self, morsel: &Morsel) -> Result<(Vec<ArrayRef>, Vec<SchemaColumn>)> {
        let mut arrays: Vec<ArrayRef> = morsel.batch().columns().to_vec();
        let mut columns: Vec<SchemaColumn> = morsel.columns().to_vec();
        for item in &self.items {
            if let ProjectionItem::Expression { output, evaluate } = item {
                arrays.push(evaluate(morsel)?);
                columns.push(output.clone());
            }
        }
        Ok((arrays, columns))
    }

    fn select(&self, arrays: &[ArrayRef], columns: &[SchemaColumn]) -> Result<Morsel> {
        let mut out_arrays = Vec::with_capacity(self.items.len());
        let mut out_columns = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let id = item.output_identity();
            let idx = columns
                .iter()
                .position(|c| c.identity == id)
                .ok_or_else(|| QueryError::column_not_found(id.to_string()))?;
            let column = match item {
                ProjectionItem::Identifier { alias: Some(alias), .. } => {
                    columns[idx].renamed(alias.clone())
                }
                _ => columns[idx].clone(),
            };
            out_arrays.push(arrays[idx].clone());
            out_columns.push(column);
        }
        let schema = build_schema(&out_columns);
        let batch = RecordBatch::try_new(schema, out_arrays)?;
        Morsel::new(batch, out_columns)
    }

    fn apply(&self, morsel: &Morsel) -> Result<Morsel> {
        let (arrays, columns) = self.append_expressions(morsel)?;
        self.select(&arrays, &columns)
    }
}

impl PhysicalOperator for ProjectionNode {
    fn name(&self) -> &'static str {
        "Projection"
    }

    fn execute(&mut self, item: StreamItem) -> Result<Vec<StreamItem>> {
        match item {
            StreamItem::End => Ok(vec![StreamItem::End]),
            StreamItem::Data(morsel) => Ok(vec![StreamItem::Data(self.apply(&morsel)?)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, StringArray};
    use arrow::datatypes::DataType;
    use std::sync::Arc;

    fn make_morsel() -> (Morsel, ColumnId, ColumnId) {
        let id_col = SchemaColumn::new("id", DataType::Int32, false);
        let name_col = SchemaColumn::new("name", DataType::Utf8, false);
        let schema = build_schema(&[id_col.clone(), name_col.clone()]);
        let id_array: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let name_array: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c"]));
        let batch = RecordBatch::try_new(schema, vec![id_array, name_array]).unwrap();
        let id = id_col.identity;
        let name = name_col.identity;
        (Morsel::new(batch, vec![id_col, name_col]).unwrap(), id, name)
    }

    #[test]
    fn selects_subset_and_reorders() {
        let (morsel, id, name) = make_morsel();
        let mut node = ProjectionNode::new(vec![
            ProjectionItem::Identifier { column: name, alias: None },
            ProjectionItem::Identifier { column: id, alias: None },
        ]);
        let out = node.execute(StreamItem::Data(morsel)).unwrap();
        match &out[0] {
            StreamItem::Data(m) => {
                assert_eq!(m.columns()[0].name, "name");
                assert_eq!(m.columns()[1].name, "id");
            }
            _ => panic!("expected data"),
        }
    }

    #[test]
    fn renames_via_identity_not_name() {
        let (morsel, id, _name) = make_morsel();
        let mut node = ProjectionNode::new(vec![ProjectionItem::Identifier {
            column: id,
            alias: Some("renamed_id".to_string()),
        }]);
        let out = node.execute(StreamItem::Data(morsel)).unwrap();
        match &out[0] {
            StreamItem::Data(m) => {
                assert_eq!(m.columns()[0].name, "renamed_id");
                assert_eq!(m.columns()[0].identity, id);
            }
            _ => panic!("expected data"),
        }
    }

    #[test]
    fn expression_is_appended_then_selected() {
        let (morsel, id, _name) = make_morsel();
        let output = SchemaColumn::new("doubled", DataType::Int32, false);
        let output_id = output.identity;
        let mut node = ProjectionNode::new(vec![
            ProjectionItem::Identifier { column: id, alias: None },
            ProjectionItem::Expression {
                output,
                evaluate: Box::new(|m| {
                    let idx = m.column_index(*m.columns().iter().map(|c| &c.identity).next().unwrap()).unwrap();
                    let ids = m
                        .batch()
                        .column(idx)
                        .as_any()
                        .downcast_ref::<Int32Array>()
                        .unwrap();
                    let doubled: Int32Array = ids.iter().map(|v| v.map(|v| v * 2)).collect();
                    Ok(Arc::new(doubled) as ArrayRef)
                }),
            },
        ]);
        let out = node.execute(StreamItem::Data(morsel)).unwrap();
        match &out[0] {
            StreamItem::Data(m) => {
                assert_eq!(m.columns().len(), 2);
                assert_eq!(m.columns()[1].identity, output_id);
                let doubled = m
                    .batch()
                    .column(1)
                    .as_any()
                    .downcast_ref::<Int32Array>()
                    .unwrap();
                assert_eq!(doubled.values(), &[2, 4, 6]);
            }
            _ => panic!("expected data"),
        }
    }

    #[test]
    fn eos_passes_through_unchanged() {
        let mut node = ProjectionNode::new(vec![]);
        let out = node.execute(StreamItem::End).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_end());
    }
}
