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

//! Limit-pushdown strategy: push each `Limit` node as close to the leaves
//! as safely possible, stopping at barriers (spec §4.4).

use super::plan::{LogicalPlan, NodeId, NodeType};
use super::{OptimizationStrategy, OptimizerContext};
use crate::error::Result;

#[derive(Default)]
pub struct LimitPushdownStrategy;

impl LimitPushdownStrategy {
    pub fn new() -> Self {
        LimitPushdownStrategy
    }
}

impl OptimizationStrategy for LimitPushdownStrategy {
    fn visit(
        &mut self,
        plan: &mut LogicalPlan,
        node: NodeId,
        ctx: &mut OptimizerContext,
    ) -> Result<Vec<NodeId>> {
        let node_type = plan
            .node(node)
            .expect("visited node must exist in the plan")
            .node_type
            .clone();

        if node_type.is_limit() {
            // Track the limit but leave it in the plan; it is only ever
            // detached once a barrier is actually found beneath it, so a
            // branch with no barrier leaves every limit on it untouched.
            log::debug!("limit-pushdown: tracking limit node pending a barrier");
            ctx.collected_limits.push(node);
            return Ok(plan.children(node).to_vec());
        }

        if node_type.is_barrier() {
            for limit_id in ctx.collected_limits.drain(..) {
                let removed = plan.remove_node(limit_id, true)?;
                plan.insert_node_after(node, removed.node_type)?;
                ctx.stats.optimization_limit_pushdown += 1;
                log::debug!("limit-pushdown: reinserted limit after barrier {node:?}");
            }
        }

        Ok(plan.children(node).to_vec())
    }
}
