// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Label of the sentinel root node. The root is never indexed.
pub const ROOT_LABEL: &str = "Root";

/// Identifier of a node in the tree arena. Stable until [`LoggerTree::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Structural change notification, scoped to the immediate parent of the
/// affected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// A new node appeared under `parent` at child position `index`.
    NodeAdded {
        parent: NodeId,
        node: NodeId,
        index: usize,
    },
    /// The child list of `node` changed.
    ChildrenChanged { node: NodeId },
    /// The whole tree was cleared back to a bare root.
    Reset,
}

/// Owned view of a single node, safe to hand across task boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub id: NodeId,
    pub label: String,
    /// Dotted path from the root to this node, excluding the root label.
    pub full_name: String,
}

/// Owned, serializable nested view of the tree for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    pub label: String,
    pub children: Vec<TreeSnapshot>,
}

/// Tree of dotted logger-name segments with an exact-path lookup index.
///
/// Invariants:
/// - siblings are unique by exact label and kept sorted case-insensitively;
/// - every non-root node has exactly one index entry, keyed by the
///   dot-joined segment path from the root to that node.
pub struct LoggerTree {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl Default for LoggerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                label: ROOT_LABEL.to_string(),
                parent: None,
                children: Vec::new(),
            }],
            index: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Insert a dotted logger name, creating any missing path segments.
    ///
    /// Returns the structural change events the insertion produced, in
    /// order. Inserting an already-known name returns no events.
    pub fn insert(&mut self, name: &str) -> Vec<TreeEvent> {
        let segments = tokenize(name);
        let mut events = Vec::new();
        let mut current = self.root();

        for (i, segment) in segments.iter().enumerate() {
            if let Some(child) = self.find_child(current, segment) {
                current = child;
                continue;
            }

            let full_name = segments[..=i].join(".");
            let node = NodeId(self.nodes.len());
            self.nodes.push(Node {
                label: segment.to_string(),
                parent: Some(current),
                children: Vec::new(),
            });

            let index = self.insertion_point(current, segment);
            self.nodes[current.0].children.insert(index, node);
            self.index.insert(full_name, node);

            events.push(TreeEvent::NodeAdded {
                parent: current,
                node,
                index,
            });
            events.push(TreeEvent::ChildrenChanged { node: current });
            current = node;
        }

        events
    }

    /// Exact-path lookup. Misses are expected results, not errors.
    pub fn lookup(&self, full_name: &str) -> Option<NodeId> {
        match self.index.get(full_name) {
            Some(id) => Some(*id),
            None => {
                debug!(logger = full_name, "no logger found matching name");
                None
            }
        }
    }

    /// Clear all children of the root and the lookup index.
    pub fn reset(&mut self) -> TreeEvent {
        self.nodes.truncate(1);
        self.nodes[0].children.clear();
        self.index.clear();
        TreeEvent::Reset
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.0].label
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.0].children.len()
    }

    /// Number of nodes in the tree, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dotted path from the root to `id`, excluding the root label.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut labels = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root() {
                break;
            }
            labels.push(self.nodes[node.0].label.as_str());
            current = self.nodes[node.0].parent;
        }
        labels.reverse();
        labels.join(".")
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef {
        NodeRef {
            id,
            label: self.nodes[id.0].label.clone(),
            full_name: self.full_name(id),
        }
    }

    pub fn snapshot(&self) -> TreeSnapshot {
        self.snapshot_node(self.root())
    }

    fn snapshot_node(&self, id: NodeId) -> TreeSnapshot {
        TreeSnapshot {
            label: self.nodes[id.0].label.clone(),
            children: self.nodes[id.0]
                .children
                .iter()
                .map(|child| self.snapshot_node(*child))
                .collect(),
        }
    }

    /// Exact, case-sensitive child match.
    fn find_child(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].label == label)
    }

    /// Sorted position for a new child. Case-folded ties keep insertion
    /// order, which makes the ordering deterministic.
    fn insertion_point(&self, parent: NodeId, label: &str) -> usize {
        self.nodes[parent.0].children.partition_point(|child| {
            cmp_case_insensitive(&self.nodes[child.0].label, label) != Ordering::Greater
        })
    }
}

/// Case-insensitive label comparison, the sibling ordering key.
fn cmp_case_insensitive(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Split a dotted name into its non-empty segments. Leading, trailing and
/// doubled dots produce no segments.
pub(crate) fn tokenize(name: &str) -> Vec<&str> {
    name.split('.').filter(|s| !s.is_empty()).collect()
}
