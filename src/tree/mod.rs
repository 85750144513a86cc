//! Canonical binary hash tree over generic values
//!
//! A [`Value`](crate::model::Value) is turned into a binary tree whose shape
//! depends only on array lengths and sorted map keys:
//! - Scalars become leaves, `Null` becomes the empty leaf
//! - Arrays and maps are balanced by repeated halving under a typed head node
//! - Head nodes carry the collection size so different lengths never collide

mod builder;
mod container;
mod node;

pub use builder::{split_point, TreeBuilder};
pub use container::{BinaryTree, Side};
pub use node::{HashPrefix, NodeId, TreeNode};
