//! Tree node types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain-separation prefix bytes, one per node kind
///
/// The gaps are reserved for future node kinds and are part of the wire
/// format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HashPrefix {
    Node = 0,
    Leaf = 1,
    NodeArray = 7,
    NodeDict = 8,
}

impl HashPrefix {
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(HashPrefix::Node),
            1 => Some(HashPrefix::Leaf),
            7 => Some(HashPrefix::NodeArray),
            8 => Some(HashPrefix::NodeDict),
            _ => None,
        }
    }
}

/// Index of a node inside a [`BinaryTree`](super::BinaryTree) arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the binary hash tree
///
/// Children are arena references. `ArrayHead` and `DictHead` root the tree
/// built from an array or a map; their `size` is the number of original
/// elements or entries and only feeds the digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeNode {
    Node { left: NodeId, right: NodeId },
    Leaf { content: Bytes },
    EmptyLeaf,
    ArrayHead { left: NodeId, right: NodeId, size: u64 },
    DictHead { left: NodeId, right: NodeId, size: u64 },
    /// A subtree collapsed to a digest held outside the tree
    Pruned,
}

impl TreeNode {
    pub fn leaf(content: impl Into<Bytes>) -> Self {
        TreeNode::Leaf {
            content: content.into(),
        }
    }

    /// Prefix byte used when hashing this node
    ///
    /// `Pruned` has no prefix of its own: its digest is substituted whole.
    pub fn prefix(&self) -> Option<HashPrefix> {
        match self {
            TreeNode::Node { .. } => Some(HashPrefix::Node),
            TreeNode::Leaf { .. } | TreeNode::EmptyLeaf => Some(HashPrefix::Leaf),
            TreeNode::ArrayHead { .. } => Some(HashPrefix::NodeArray),
            TreeNode::DictHead { .. } => Some(HashPrefix::NodeDict),
            TreeNode::Pruned => None,
        }
    }

    /// Left and right children of an internal node
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self {
            TreeNode::Node { left, right }
            | TreeNode::ArrayHead { left, right, .. }
            | TreeNode::DictHead { left, right, .. } => Some((*left, *right)),
            TreeNode::Leaf { .. } | TreeNode::EmptyLeaf | TreeNode::Pruned => None,
        }
    }

    /// Leaf or empty leaf: the only nodes that may be disclosed as leaves
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. } | TreeNode::EmptyLeaf)
    }

    pub fn is_pruned(&self) -> bool {
        matches!(self, TreeNode::Pruned)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TreeNode::Node { .. } => "node",
            TreeNode::Leaf { .. } => "leaf",
            TreeNode::EmptyLeaf => "empty leaf",
            TreeNode::ArrayHead { .. } => "array head",
            TreeNode::DictHead { .. } => "dict head",
            TreeNode::Pruned => "pruned",
        }
    }
}
