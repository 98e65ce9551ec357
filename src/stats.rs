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

//! Per-cursor query statistics: single-writer during planning/execution,
//! reader-visible afterwards through the cursor's `stats` accessor (spec §5).

use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct QueryStatistics {
    pub optimization_limit_pushdown: u64,
    pub messages: Vec<String>,
    pub end_time: Option<i64>,
}

impl QueryStatistics {
    pub fn new() -> Self {
        QueryStatistics::default()
    }

    pub fn message(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    /// A mapping view, matching the original's dict-shaped `stats` surface.
    pub fn as_dict(&self) -> HashMap<&'static str, u64> {
        let mut map = HashMap::new();
        map.insert("optimization_limit_pushdown", self.optimization_limit_pushdown);
        map
    }
}
