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

//! Cursor: the public pipeline driver (spec §4.5). A three-state machine
//! (`Initialized -> Executed -> Closed`) guarded by explicit `ensure_state`
//! checks rather than decorators (spec §9).

use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use uuid::Uuid;

use crate::error::{QueryError, Result};
use crate::morsel::{concat_morsels, slice_morsel, Morsel, StreamItem};
use crate::rolling_log::RollingLog;
use crate::sql::preprocess;
use crate::stats::QueryStatistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Initialized,
    Executed,
    Closed,
}

impl CursorState {
    fn label(self) -> &'static str {
        match self {
            CursorState::Initialized => "initialized",
            CursorState::Executed => "executed",
            CursorState::Closed => "closed",
        }
    }
}

/// One executed statement's audit record. `success` starts `false` and is
/// fixed up once the corresponding plan drains without error.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub statement: String,
    pub success: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// A compiled statement: an iterator of morsels terminated by EOS. The
/// planner is an external collaborator (spec §1 non-goal); this trait is
/// the contract the cursor drives against.
pub trait Plan {
    fn next_item(&mut self) -> Result<StreamItem>;
}

/// Compiles one preprocessed SQL statement into a runnable `Plan`. An
/// external collaborator (spec §6, "Planner (consumed)").
pub trait Planner {
    fn compile(&mut self, statement: &str, params: &[String]) -> Result<Box<dyn Plan>>;
}

pub struct Cursor<P: Planner> {
    id: String,
    state: CursorState,
    planner: P,
    stats: QueryStatistics,
    history: Vec<HistoryEntry>,
    rolling_log: Option<RollingLog>,
    result: Option<Morsel>,
}

impl<P: Planner> Cursor<P> {
    pub fn new(planner: P, rolling_log: Option<RollingLog>) -> Self {
        Cursor {
            id: Uuid::new_v4().to_string(),
            state: CursorState::Initialized,
            planner,
            stats: QueryStatistics::new(),
            history: Vec::new(),
            rolling_log,
            result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stats(&self) -> &QueryStatistics {
        &self.stats
    }

    pub fn messages(&self) -> &[String] {
        &self.stats.messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn ensure_state(&self, expected: CursorState) -> Result<()> {
        if self.state != expected {
            return Err(QueryError::InvalidCursorState {
                expected: expected.label(),
                actual: self.state.label(),
            });
        }
        Ok(())
    }

    /// Drains one compiled plan fully, concatenating its morsels. A plan
    /// that ends without ever emitting a data morsel (a `WHERE` filtering
    /// out every row, with no heap-sort or join downstream to synthesize a
    /// terminal empty one) is a legitimate empty result, not a failure --
    /// EOS passing through unchanged never carries a schema, so we fall
    /// back to a schema-less, zero-row morsel rather than erroring.
    fn drain(plan: &mut dyn Plan) -> Result<Morsel> {
        let mut morsels = Vec::new();
        loop {
            match plan.next_item()? {
                StreamItem::End => break,
                StreamItem::Data(morsel) => morsels.push(morsel),
            }
        }
        if morsels.is_empty() {
            Ok(Morsel::from_batch(RecordBatch::new_empty(Arc::new(
                Schema::empty(),
            ))))
        } else {
            concat_morsels(&morsels)
        }
    }

    fn run(&mut self, sql: &str, params: Option<&[String]>) -> Result<Morsel> {
        self.ensure_state(CursorState::Initialized)?;

        let statements = preprocess(sql);
        if statements.is_empty() {
            return Err(QueryError::MissingSqlStatement(sql.to_string()));
        }
        let params = params.unwrap_or(&[]);
        if statements.len() > 1 && !params.is_empty() {
            return Err(QueryError::UnsupportedSyntax(
                "parameters are not supported with multiple statements".to_string(),
            ));
        }

        let mut last_result: Option<Morsel> = None;
        for (index, statement) in statements.iter().enumerate() {
            let timestamp = chrono::Utc::now();
            let mut plan = self.planner.compile(statement, params)?;
            let outcome = Self::drain(plan.as_mut());
            let success = outcome.is_ok();
            self.history.push(HistoryEntry {
                statement: statement.clone(),
                success,
                timestamp,
            });
            if let Some(log) = &self.rolling_log {
                log.append(statement);
            }
            let result = outcome?;
            if index == statements.len() - 1 {
                last_result = Some(result);
            }
        }

        self.stats.end_time = Some(chrono::Utc::now().timestamp());
        self.state = CursorState::Executed;
        last_result.ok_or_else(|| QueryError::internal("no statements were executed"))
    }

    /// Compiles and drains `sql`, keeping the final statement's result on
    /// the cursor (spec §4.5).
    pub fn execute(&mut self, sql: &str, params: Option<&[String]>) -> Result<()> {
        let result = self.run(sql, params)?;
        self.result = Some(result);
        Ok(())
    }

    /// Like `execute`, but returns the final result as a `RecordBatch`
    /// trimmed to `limit` rows, independent of any planner-level LIMIT
    /// pushdown (spec's supplemental `execute_to_arrow`).
    pub fn execute_to_arrow(
        &mut self,
        sql: &str,
        params: Option<&[String]>,
        limit: Option<usize>,
    ) -> Result<RecordBatch> {
        let result = self.run(sql, params)?;
        let trimmed = match limit {
            Some(limit) if limit < result.num_rows() => slice_morsel(&result, 0, limit),
            _ => result,
        };
        let batch = trimmed.batch().clone();
        self.result = Some(trimmed);
        Ok(batch)
    }

    /// The last executed statement's result, if the cursor has executed
    /// and not yet closed.
    pub fn fetch_result(&self) -> Result<&Morsel> {
        self.ensure_state(CursorState::Executed)?;
        self.result
            .as_ref()
            .ok_or_else(|| QueryError::internal("cursor is executed but holds no result"))
    }

    pub fn close(&mut self) -> Result<()> {
        self.ensure_state(CursorState::Executed)?;
        self.state = CursorState::Closed;
        self.result = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morsel::{build_schema, SchemaColumn};
    use arrow::array::{ArrayRef, Int32Array};
    use arrow::datatypes::DataType;
    use std::sync::Arc;

    struct OneMorselPlan {
        morsel: Option<Morsel>,
    }

    impl Plan for OneMorselPlan {
        fn next_item(&mut self) -> Result<StreamItem> {
            match self.morsel.take() {
                Some(m) => Ok(StreamItem::Data(m)),
                None => Ok(StreamItem::End),
            }
        }
    }

    struct EmptyPlan;

    impl Plan for EmptyPlan {
        fn next_item(&mut self) -> Result<StreamItem> {
            Ok(StreamItem::End)
        }
    }

    struct EmptyPlanner;

    impl Planner for EmptyPlanner {
        fn compile(&mut self, _statement: &str, _params: &[String]) -> Result<Box<dyn Plan>> {
            Ok(Box::new(EmptyPlan))
        }
    }

    struct StubPlanner;

    fn stub_morsel(values: Vec<i32>) -> Morsel {
        let col = SchemaColumn::new("n", DataType::Int32, false);
        let schema = build_schema(&[col.clone()]);
        let array: ArrayRef = Arc::new(Int32Array::from(values));
        let batch = RecordBatch::try_new(schema, vec![array]).unwrap();
        Morsel::new(batch, vec![col]).unwrap()
    }

    impl Planner for StubPlanner {
        fn compile(&mut self, _statement: &str, _params: &[String]) -> Result<Box<dyn Plan>> {
            Ok(Box::new(OneMorselPlan {
                morsel: Some(stub_morsel(vec![1, 2, 3])),
            }))
        }
    }

    #[test]
    fn execute_then_execute_again_fails_with_invalid_state() {
        let mut cursor = Cursor::new(StubPlanner, None);
        cursor.execute("SELECT 1", None).unwrap();
        let err = cursor.execute("SELECT 2", None).unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursorState { .. }));
    }

    #[test]
    fn empty_statement_fails_before_advancing_state() {
        let mut cursor = Cursor::new(StubPlanner, None);
        let err = cursor.execute("-- just a comment", None).unwrap_err();
        assert!(matches!(err, QueryError::MissingSqlStatement(_)));
    }

    #[test]
    fn execute_appends_a_history_record() {
        let mut cursor = Cursor::new(StubPlanner, None);
        cursor.execute("SELECT 1", None).unwrap();
        assert_eq!(cursor.history().len(), 1);
        assert!(cursor.history()[0].success);
    }

    #[test]
    fn execute_to_arrow_trims_independently_of_pushdown() {
        let mut cursor = Cursor::new(StubPlanner, None);
        let batch = cursor.execute_to_arrow("SELECT 1", None, Some(2)).unwrap();
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn a_plan_that_emits_no_data_morsels_is_an_empty_result_not_an_error() {
        let mut cursor = Cursor::new(EmptyPlanner, None);
        cursor.execute("SELECT 1 WHERE 1 = 0", None).unwrap();
        let result = cursor.fetch_result().unwrap();
        assert_eq!(result.num_rows(), 0);
    }

    #[test]
    fn close_then_close_again_fails() {
        let mut cursor = Cursor::new(StubPlanner, None);
        cursor.execute("SELECT 1", None).unwrap();
        cursor.close().unwrap();
        let err = cursor.close().unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursorState { .. }));
    }
}
