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

//! Logical plan optimization: a `LogicalPlan` DAG rewritten in place by
//! strategies that implement [`OptimizationStrategy`] (spec §4.4, §9).

pub mod limit_pushdown;
pub mod plan;

use plan::{LogicalPlan, NodeId};

use crate::error::Result;
use crate::stats::QueryStatistics;

/// Owned per-run scratch state, cleared at strategy boundaries rather than
/// left dangling on a shared context (spec §9, "avoid global mutable
/// state"). Each strategy keeps its own compartment; today only limit
/// pushdown exists, so its scratch lives here directly.
pub struct OptimizerContext<'a> {
    pub stats: &'a mut QueryStatistics,
    /// Ids of `Limit` nodes seen so far on the current root-to-here path,
    /// left in place in the plan until a barrier confirms where they are
    /// reinserted. A limit whose branch ends with no barrier below it is
    /// never removed from `collected_limits`, so it simply stays where it
    /// was -- the walk must not delete a `Limit` node speculatively.
    pub collected_limits: Vec<NodeId>,
}

impl<'a> OptimizerContext<'a> {
    pub fn new(stats: &'a mut QueryStatistics) -> Self {
        OptimizerContext {
            stats,
            collected_limits: Vec::new(),
        }
    }
}

/// A single rewrite pass over a logical plan. `visit` is called once per
/// node in a pre-order (root-to-leaf) depth-first traversal and returns the
/// node ids traversal should continue into next -- normally the node's
/// current children, but a strategy that rewires edges (limit pushdown
/// detaches the node it just visited) must report where the walk continues
/// explicitly, since the node's own child list may no longer reflect it.
/// `complete` runs once after traversal ends.
pub trait OptimizationStrategy {
    fn visit(
        &mut self,
        plan: &mut LogicalPlan,
        node: NodeId,
        ctx: &mut OptimizerContext,
    ) -> Result<Vec<NodeId>>;

    fn complete(&mut self, _plan: &mut LogicalPlan, _ctx: &mut OptimizerContext) -> Result<()> {
        Ok(())
    }
}

/// Drives `strategy` over `plan` in pre-order, then calls `complete`.
pub fn run_strategy(
    plan: &mut LogicalPlan,
    strategy: &mut dyn OptimizationStrategy,
    ctx: &mut OptimizerContext,
) -> Result<()> {
    fn walk(
        plan: &mut LogicalPlan,
        node: NodeId,
        strategy: &mut dyn OptimizationStrategy,
        ctx: &mut OptimizerContext,
    ) -> Result<()> {
        let next = strategy.visit(plan, node, ctx)?;
        for child in next {
            walk(plan, child, strategy, ctx)?;
        }
        Ok(())
    }

    let root = plan.root();
    walk(plan, root, strategy, ctx)?;
    strategy.complete(plan, ctx)
}
