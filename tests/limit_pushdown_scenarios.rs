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

//! Limit pushdown against plan shapes mirroring the worked scenarios in
//! spec §8: a sort sitting between a limit and the scan it would otherwise
//! reach, and a join barrier with a projection in between.

use morsel_engine::optimizer::plan::{LogicalPlan, NodeType};
use morsel_engine::optimizer::{run_strategy, OptimizerContext};
use morsel_engine::optimizer::limit_pushdown::LimitPushdownStrategy;
use morsel_engine::stats::QueryStatistics;

/// `SELECT * FROM $satellites ORDER BY name LIMIT 50 OFFSET 150` — the sort
/// must stop the limit from reaching the scan underneath it.
#[test]
fn limit_pushdown_stops_at_sort_and_does_not_reach_the_scan_beneath_it() {
    let mut plan = LogicalPlan::new(NodeType::Projection);
    let limit = plan.add_child(plan.root(), NodeType::Limit { limit: 50, offset: 150 });
    let sort = plan.add_child(limit, NodeType::Sort);
    let scan = plan.add_child(sort, NodeType::Scan);

    let mut stats = QueryStatistics::new();
    let mut ctx = OptimizerContext::new(&mut stats);
    let mut strategy = LimitPushdownStrategy::new();
    run_strategy(&mut plan, &mut strategy, &mut ctx).unwrap();

    // Projection -> Sort -> Limit -> Scan: the limit now sits directly
    // beneath the sort, never past it.
    assert_eq!(plan.children(plan.root()), &[sort]);
    let new_limit = plan.children(sort)[0];
    assert!(plan.node(new_limit).unwrap().node_type.is_limit());
    assert_eq!(plan.children(new_limit), &[scan]);
    assert_eq!(stats.optimization_limit_pushdown, 1);
}

/// A projection between the limit and a join barrier is transparent to the
/// pushdown: the limit still stops at the join, not at the scans below it.
#[test]
fn limit_pushdown_passes_through_projection_and_stops_at_join() {
    let mut plan = LogicalPlan::new(NodeType::Limit { limit: 20, offset: 0 });
    let root = plan.root();
    let projection = plan.add_child(root, NodeType::Projection);
    let join = plan.add_child(projection, NodeType::Join);
    let left_scan = plan.add_child(join, NodeType::Scan);
    let right_scan = plan.add_child(join, NodeType::Scan);

    let mut stats = QueryStatistics::new();
    let mut ctx = OptimizerContext::new(&mut stats);
    let mut strategy = LimitPushdownStrategy::new();
    run_strategy(&mut plan, &mut strategy, &mut ctx).unwrap();

    assert_eq!(plan.root(), projection);
    let new_limit = plan.children(projection)[0];
    assert!(plan.node(new_limit).unwrap().node_type.is_limit());
    assert_eq!(plan.children(new_limit), &[join]);
    assert_eq!(plan.children(join), &[left_scan, right_scan]);
    assert_eq!(stats.optimization_limit_pushdown, 1);
}

/// Two limits above the same barrier both land just beneath it.
#[test]
fn multiple_limits_above_one_barrier_all_push_down_to_it() {
    let mut plan = LogicalPlan::new(NodeType::Projection);
    let outer_limit = plan.add_child(plan.root(), NodeType::Limit { limit: 100, offset: 0 });
    let inner_limit = plan.add_child(outer_limit, NodeType::Limit { limit: 10, offset: 5 });
    let scan = plan.add_child(inner_limit, NodeType::Scan);

    let mut stats = QueryStatistics::new();
    let mut ctx = OptimizerContext::new(&mut stats);
    let mut strategy = LimitPushdownStrategy::new();
    run_strategy(&mut plan, &mut strategy, &mut ctx).unwrap();

    assert_eq!(stats.optimization_limit_pushdown, 2);
    // Both limits now sit directly above the scan, in some order.
    let first = plan.children(plan.root())[0];
    assert!(plan.node(first).unwrap().node_type.is_limit());
    let second = plan.children(first)[0];
    assert!(plan.node(second).unwrap().node_type.is_limit());
    assert_eq!(plan.children(second), &[scan]);
}
