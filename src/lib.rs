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

//! An embeddable columnar SQL execution core: morsel-driven physical
//! operators (heap-sort top-K, outer joins, projection), a limit-pushdown
//! optimizer over a logical plan DAG, and the cursor that drives both.
//!
//! The SQL parser, logical planner, expression evaluator, and concrete
//! storage/cache backends are external collaborators; this crate defines
//! the trait boundaries they satisfy and owns everything downstream of a
//! compiled plan.

pub mod cache;
pub mod config;
pub mod connectors;
pub mod cursor;
pub mod error;
pub mod morsel;
pub mod operators;
pub mod optimizer;
pub mod rolling_log;
pub mod sql;
pub mod stats;

pub use error::{QueryError, Result};
pub use morsel::{Morsel, StreamItem};
