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

//! Error taxonomy for the execution core, see spec §6/§7.

use std::fmt;

/// The crate-wide error type. Every operator, the optimizer, and the
/// cursor return `Result<_, QueryError>`; no panics in non-test code.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A cursor method was called while the cursor was in the wrong state.
    #[error("Cursor must be in {expected} state, but is in {actual} state")]
    InvalidCursorState {
        expected: &'static str,
        actual: &'static str,
    },

    /// `execute` was called with an empty (or entirely commented-out) statement.
    #[error("SQL provided was empty: {0}")]
    MissingSqlStatement(String),

    /// Multiple statements were supplied with parameters, or some other
    /// combination of inputs the engine cannot service.
    #[error("Unsupported syntax: {0}")]
    UnsupportedSyntax(String),

    /// An operator was asked to reference a column that does not exist in
    /// its upstream schema.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A planning or evaluation error surfaced from an external collaborator.
    #[error("SQL error: {0}")]
    SqlError(String),

    /// An optional runtime dependency (e.g. a cache backend client) was not
    /// available.
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// An operator-internal invariant was violated. Fatal; the query is
    /// aborted and the cursor is considered poisoned (spec §7, category 3).
    #[error("Internal execution error: {0}")]
    Internal(String),

    /// Propagated from Arrow array/compute operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl QueryError {
    pub fn column_not_found(name: impl fmt::Display) -> Self {
        QueryError::ColumnNotFound(name.to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        QueryError::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
