//! Binary tree container and inspection utilities

use super::builder::split_point;
use super::node::{NodeId, TreeNode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which child of an internal node to descend into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// A binary hash tree stored as an arena
///
/// Nodes are stored in post-order: every child has a smaller index than its
/// parent, the root is the last node, and every other node has exactly one
/// parent. Trees built by [`TreeBuilder`](super::TreeBuilder) satisfy this
/// by construction; trees read from outside are checked by
/// [`BinaryTree::from_parts`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TreeParts")]
pub struct BinaryTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

/// Unchecked wire form of a tree; validated on the way in
#[derive(Deserialize)]
struct TreeParts {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl TryFrom<TreeParts> for BinaryTree {
    type Error = Error;

    fn try_from(parts: TreeParts) -> Result<Self> {
        BinaryTree::from_parts(parts.nodes, parts.root)
    }
}

impl BinaryTree {
    /// Assemble a tree from arena parts without checking them
    pub(crate) fn from_trusted(nodes: Vec<TreeNode>, root: NodeId) -> Self {
        debug_assert_eq!(root.index() + 1, nodes.len());
        BinaryTree { nodes, root }
    }

    /// Assemble a tree from untrusted arena parts
    pub fn from_parts(nodes: Vec<TreeNode>, root: NodeId) -> Result<Self> {
        if nodes.is_empty() || root.index() + 1 != nodes.len() {
            return Err(Error::Corruption(format!(
                "root {} is not the last of {} nodes",
                root,
                nodes.len()
            )));
        }

        let mut has_parent = vec![false; nodes.len()];
        for (idx, node) in nodes.iter().enumerate() {
            let Some((left, right)) = node.children() else {
                continue;
            };
            for child in [left, right] {
                if child.index() >= idx {
                    return Err(Error::UnknownNodeKind(format!(
                        "node #{} references {} out of order",
                        idx, child
                    )));
                }
                if std::mem::replace(&mut has_parent[child.index()], true) {
                    return Err(Error::Corruption(format!("node {} has two parents", child)));
                }
            }
        }

        if let Some(orphan) = (0..root.index()).find(|&idx| !has_parent[idx]) {
            return Err(Error::Corruption(format!("node #{} is unreachable", orphan)));
        }

        Ok(BinaryTree { nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        self.node(self.root)
    }

    /// Get a node by id
    ///
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of `Leaf` and `EmptyLeaf` nodes
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Child of an internal node on the given side
    pub fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        self.node(id).children().map(|(l, r)| match side {
            Side::Left => l,
            Side::Right => r,
        })
    }

    /// Height of the tree
    ///
    /// `EmptyLeaf` counts 0, `Leaf` counts 1, and every internal node adds
    /// one to the higher of its children. A pruned hole counts as 0 since
    /// its shape is unknown.
    pub fn max_level(&self) -> usize {
        // Post-order storage: children are always computed before parents.
        let mut levels = vec![0usize; self.nodes.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            levels[idx] = match node {
                TreeNode::EmptyLeaf | TreeNode::Pruned => 0,
                TreeNode::Leaf { .. } => 1,
                TreeNode::Node { left, right }
                | TreeNode::ArrayHead { left, right, .. }
                | TreeNode::DictHead { left, right, .. } => {
                    1 + levels[left.index()].max(levels[right.index()])
                }
            };
        }
        levels[self.root.index()]
    }

    /// Compact rendering of the tree's shape
    ///
    /// `L` leaf, `E` empty leaf, `P` pruned hole, `N(..)` plain node,
    /// `A<size>(..)` array head, `D<size>(..)` dict head.
    pub fn shape(&self) -> String {
        self.shape_of(self.root)
    }

    pub fn shape_of(&self, id: NodeId) -> String {
        let mut rendered: Vec<String> = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((id, expanded)) = stack.pop() {
            let node = self.node(id);
            match (node.children(), expanded) {
                (Some((left, right)), false) => {
                    stack.push((id, true));
                    stack.push((right, false));
                    stack.push((left, false));
                }
                (Some(_), true) => {
                    let right = rendered.pop().unwrap_or_default();
                    let left = rendered.pop().unwrap_or_default();
                    let head = match node {
                        TreeNode::ArrayHead { size, .. } => format!("A{}", size),
                        TreeNode::DictHead { size, .. } => format!("D{}", size),
                        _ => "N".to_string(),
                    };
                    rendered.push(format!("{}({},{})", head, left, right));
                }
                (None, _) => rendered.push(
                    match node {
                        TreeNode::EmptyLeaf => "E",
                        TreeNode::Pruned => "P",
                        _ => "L",
                    }
                    .to_string(),
                ),
            }
        }
        rendered.pop().unwrap_or_default()
    }

    /// Locate element `index` below an `ArrayHead`
    pub fn element(&self, head: NodeId, index: usize) -> Result<NodeId> {
        let route = self.element_route(head, index)?;
        Ok(route[route.len() - 1])
    }

    /// Nodes passed through from an `ArrayHead` (exclusive) to element
    /// `index` (inclusive)
    pub fn element_route(&self, head: NodeId, index: usize) -> Result<Vec<NodeId>> {
        let size = match *self.node(head) {
            TreeNode::ArrayHead { size, .. } => size as usize,
            ref other => {
                return Err(Error::StructuralMismatch(format!(
                    "index {} applied to {} {}",
                    index,
                    other.kind(),
                    head
                )))
            }
        };
        if index >= size {
            return Err(Error::StructuralMismatch(format!(
                "index {} out of range for array of {} elements",
                index, size
            )));
        }
        if size == 1 {
            return Ok(vec![self.children_of(head)?.0]);
        }

        let mut route = Vec::new();
        let (mut current, mut len, mut index) = (head, size, index);
        while len > 1 {
            let mid = split_point(len);
            let (left, right) = self.children_of(current)?;
            if index < mid {
                current = left;
                len = mid;
            } else {
                current = right;
                len -= mid;
                index -= mid;
            }
            route.push(current);
        }
        Ok(route)
    }

    /// Locate the entry node for `key` below a `DictHead`
    pub fn entry(&self, head: NodeId, key: &str) -> Result<NodeId> {
        let route = self.entry_route(head, key)?;
        Ok(route[route.len() - 1])
    }

    /// Nodes passed through from a `DictHead` (exclusive) to the entry node
    /// for `key` (inclusive)
    ///
    /// Entry nodes are `Node { left: Leaf(key), right: value }`. Pruned
    /// entries are skipped, so this also works on proof trees.
    pub fn entry_route(&self, head: NodeId, key: &str) -> Result<Vec<NodeId>> {
        let size = match *self.node(head) {
            TreeNode::DictHead { size, .. } => size as usize,
            ref other => {
                return Err(Error::StructuralMismatch(format!(
                    "key {:?} applied to {} {}",
                    key,
                    other.kind(),
                    head
                )))
            }
        };
        let not_present = || Error::StructuralMismatch(format!("key {:?} not present", key));

        let (left, right) = self.children_of(head)?;
        let mut stack = match size {
            0 => return Err(not_present()),
            1 => vec![(left, 1, 0)],
            _ => {
                let mid = split_point(size);
                vec![(right, size - mid, 0), (left, mid, 0)]
            }
        };

        let mut route: Vec<NodeId> = Vec::new();
        while let Some((id, len, depth)) = stack.pop() {
            route.truncate(depth);
            route.push(id);
            let node = self.node(id);
            if node.is_pruned() {
                continue;
            }
            if len == 1 {
                if self.entry_key(id).is_ok_and(|k| k == key.as_bytes()) {
                    return Ok(route);
                }
                continue;
            }
            let (a, b) = self.children_of(id)?;
            let mid = split_point(len);
            stack.push((b, len - mid, depth + 1));
            stack.push((a, mid, depth + 1));
        }
        Err(not_present())
    }

    /// Key bytes of an entry node
    pub fn entry_key(&self, entry: NodeId) -> Result<&[u8]> {
        let key_leaf = self.child(entry, Side::Left);
        match key_leaf.map(|id| self.node(id)) {
            Some(TreeNode::Leaf { content }) => Ok(&content[..]),
            _ => Err(Error::StructuralMismatch(format!(
                "{} is not a map entry",
                entry
            ))),
        }
    }

    fn children_of(&self, id: NodeId) -> Result<(NodeId, NodeId)> {
        self.node(id).children().ok_or_else(|| {
            Error::StructuralMismatch(format!(
                "expected an internal node at {}, found {}",
                id,
                self.node(id).kind()
            ))
        })
    }
}
