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

//! Logical plan: a DAG keyed by stable node id, not a recursive tree (spec
//! §9, "graph rewrite"). Rewrites (`remove_node`, `insert_node_after`)
//! operate on the edge lists directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node payloads. `Sort` is not named among spec.md's barrier list but is
/// treated as one here: limit pushdown crossing a sort would change which
/// rows the limit selects, which §9 flags as a case implementers must
/// reconsider when a sort node type is added.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    Scan,
    Filter,
    Join,
    Aggregate,
    AggregateAndGroup,
    Subquery,
    Union,
    Sort,
    Projection,
    Limit { limit: usize, offset: usize },
    Other(String),
}

impl NodeType {
    pub fn is_barrier(&self) -> bool {
        matches!(
            self,
            NodeType::Scan
                | NodeType::Filter
                | NodeType::Join
                | NodeType::Aggregate
                | NodeType::AggregateAndGroup
                | NodeType::Subquery
                | NodeType::Union
                | NodeType::Sort
        )
    }

    pub fn is_limit(&self) -> bool {
        matches!(self, NodeType::Limit { .. })
    }
}

#[derive(Debug, Clone)]
pub struct LogicalPlanNode {
    pub id: NodeId,
    pub node_type: NodeType,
}

/// Node id -> payload map plus parent/child edge lists. The root has no
/// parent; leaves have no children. Multiple parents are permitted in
/// general (it's a DAG), but `remove_node(heal: true)` requires exactly one
/// parent and one child -- moving a limit assumes it sits on a simple chain.
pub struct LogicalPlan {
    nodes: HashMap<NodeId, LogicalPlanNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
    parents: HashMap<NodeId, Vec<NodeId>>,
    root: NodeId,
}

impl LogicalPlan {
    pub fn new(root_type: NodeType) -> Self {
        let root = NodeId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root, LogicalPlanNode { id: root, node_type: root_type });
        LogicalPlan {
            nodes,
            children: HashMap::new(),
            parents: HashMap::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&LogicalPlanNode> {
        self.nodes.get(&id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self.parents.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds a new child of `parent`, returning its id.
    pub fn add_child(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, LogicalPlanNode { id, node_type });
        self.children.entry(parent).or_default().push(id);
        self.parents.entry(id).or_default().push(parent);
        id
    }

    /// Removes `id`. When `heal` is true, `id` must have exactly one child
    /// and at most one parent; that parent (if any) is rewired to point
    /// directly at the child. Removing a node with no parent heals it as
    /// the plan root, promoting the child to root in its place. When
    /// `heal` is false, `id` is detached without rewiring (its parents
    /// simply lose it as a child).
    pub fn remove_node(&mut self, id: NodeId, heal: bool) -> Result<LogicalPlanNode> {
        let parents = self.parents.get(&id).cloned().unwrap_or_default();
        let children = self.children.get(&id).cloned().unwrap_or_default();

        if heal {
            if children.len() != 1 || parents.len() > 1 {
                return Err(QueryError::internal(
                    "remove_node(heal=true) requires exactly one child and at most one parent",
                ));
            }
            let child = children[0];
            if let Some(parent) = parents.first().copied() {
                if let Some(list) = self.children.get_mut(&parent) {
                    for slot in list.iter_mut() {
                        if *slot == id {
                            *slot = child;
                        }
                    }
                }
                if let Some(list) = self.parents.get_mut(&child) {
                    for slot in list.iter_mut() {
                        if *slot == id {
                            *slot = parent;
                        }
                    }
                }
            } else {
                // `id` had no parent: it was the plan root. The child
                // inherits that role and loses its (now dangling) parent link.
                if let Some(list) = self.parents.get_mut(&child) {
                    list.retain(|n| *n != id);
                }
                if self.root == id {
                    self.root = child;
                }
            }
        } else {
            for p in &parents {
                if let Some(list) = self.children.get_mut(p) {
                    list.retain(|n| *n != id);
                }
            }
            for c in &children {
                if let Some(list) = self.parents.get_mut(c) {
                    list.retain(|n| *n != id);
                }
            }
        }

        self.children.remove(&id);
        self.parents.remove(&id);
        self.nodes
            .remove(&id)
            .ok_or_else(|| QueryError::internal("remove_node: unknown node id"))
    }

    /// Inserts a new node of `node_type` so it becomes `anchor`'s sole
    /// parent, inheriting `anchor`'s former parents (spec §9: "insert limit
    /// between barrier and barrier's former parent" -- the new node sits
    /// immediately downstream of `anchor` in dataflow order).
    pub fn insert_node_after(&mut self, anchor: NodeId, node_type: NodeType) -> Result<NodeId> {
        if !self.nodes.contains_key(&anchor) {
            return Err(QueryError::internal("insert_node_after: unknown anchor node"));
        }
        let new_id = NodeId::new();
        let former_parents = self.parents.get(&anchor).cloned().unwrap_or_default();

        for p in &former_parents {
            if let Some(list) = self.children.get_mut(p) {
                for slot in list.iter_mut() {
                    if *slot == anchor {
                        *slot = new_id;
                    }
                }
            }
        }
        if self.root == anchor {
            self.root = new_id;
        }

        self.nodes.insert(new_id, LogicalPlanNode { id: new_id, node_type });
        self.parents.insert(new_id, former_parents);
        self.children.insert(new_id, vec![anchor]);
        self.parents.insert(anchor, vec![new_id]);
        Ok(new_id)
    }
}
