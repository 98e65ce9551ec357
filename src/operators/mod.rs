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

//! Physical operators: streaming nodes driven morsel-by-morsel by the
//! cursor's pipeline driver (spec §2, §3, §5).

pub mod heap_sort;
pub mod join;
pub mod projection;

use crate::error::Result;
use crate::morsel::StreamItem;

/// The per-morsel execution contract every physical operator implements.
///
/// An operator MUST emit `StreamItem::End` after it has received `End` on
/// every input, and MUST NOT buffer an unbounded prefix except where its
/// algorithm requires it (sort accumulator, join build side). Suspension is
/// morsel-granular: an operator may return an empty vector to signal it has
/// nothing to emit yet for the given input (spec §5, "suspension points").
pub trait PhysicalOperator {
    /// Human-facing name, used in logging and `EXPLAIN`-style output.
    fn name(&self) -> &'static str;

    /// Consumes one upstream item and returns zero or more downstream
    /// items. Called exactly once per upstream item, in order.
    fn execute(&mut self, item: StreamItem) -> Result<Vec<StreamItem>>;
}
