//! Value → binary tree construction
//!
//! Layout rules, fixed for every implementation that wants matching digests:
//!
//! - `Null` is an `EmptyLeaf`, a scalar is a `Leaf` holding its bytes.
//! - An array of `n` elements is rooted at `ArrayHead { size: n }`.
//!   With `n == 0` both children are `EmptyLeaf`; with `n == 1` the element
//!   is the left child and the right child is `EmptyLeaf`. Otherwise the
//!   sequence is split at `n / 2` (the left half is never larger) and each
//!   half is laid out recursively with plain `Node`s; a half of one element
//!   is that element's own subtree.
//! - A map is sorted by the UTF-8 bytes of its keys, each entry becomes
//!   `Node { Leaf(key), value }`, and the entry sequence is laid out exactly
//!   like an array under `DictHead { size: n }`.
//!
//! Construction uses an explicit work stack so deeply nested input cannot
//! overflow the call stack.

use super::container::BinaryTree;
use super::node::{NodeId, TreeNode};
use crate::model::Value;
use crate::{Error, Result};
use bytes::Bytes;
use tracing::debug;

/// Index at which a sequence of `len` items is split into two halves
pub fn split_point(len: usize) -> usize {
    len / 2
}

/// Builds [`BinaryTree`]s from [`Value`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeBuilder;

enum Frame<'v> {
    Value(&'v Value),
    Key(&'v str),
    Empty,
    /// An inner half of an array, never empty
    Elements(&'v [Value]),
    /// An inner half of a sorted entry list, never empty
    Entries {
        list: usize,
        start: usize,
        len: usize,
    },
    Join(Join),
}

#[derive(Clone, Copy)]
enum Join {
    Node,
    Array(u64),
    Dict(u64),
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder
    }

    /// Build the canonical tree for `value`
    pub fn build(&self, value: &Value) -> Result<BinaryTree> {
        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut results: Vec<NodeId> = Vec::new();
        let mut sorted_lists: Vec<Vec<(&str, &Value)>> = Vec::new();
        let mut stack = vec![Frame::Value(value)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Value(Value::Null) | Frame::Empty => {
                    results.push(push(&mut nodes, TreeNode::EmptyLeaf));
                }
                Frame::Value(Value::Scalar(bytes)) => {
                    let id = push(&mut nodes, TreeNode::Leaf { content: bytes.clone() });
                    results.push(id);
                }
                Frame::Key(key) => {
                    let content = Bytes::copy_from_slice(key.as_bytes());
                    results.push(push(&mut nodes, TreeNode::Leaf { content }));
                }
                Frame::Value(Value::Array(items)) => {
                    let n = items.len();
                    stack.push(Frame::Join(Join::Array(n as u64)));
                    match n {
                        0 => {
                            stack.push(Frame::Empty);
                            stack.push(Frame::Empty);
                        }
                        1 => {
                            stack.push(Frame::Empty);
                            stack.push(Frame::Value(&items[0]));
                        }
                        _ => {
                            let mid = split_point(n);
                            stack.push(Frame::Elements(&items[mid..]));
                            stack.push(Frame::Elements(&items[..mid]));
                        }
                    }
                }
                Frame::Value(Value::Map(entries)) => {
                    let sorted = sort_entries(entries)?;
                    let n = sorted.len();
                    let list = sorted_lists.len();
                    sorted_lists.push(sorted);

                    stack.push(Frame::Join(Join::Dict(n as u64)));
                    match n {
                        0 => {
                            stack.push(Frame::Empty);
                            stack.push(Frame::Empty);
                        }
                        1 => {
                            stack.push(Frame::Empty);
                            stack.push(Frame::Entries { list, start: 0, len: 1 });
                        }
                        _ => {
                            let mid = split_point(n);
                            stack.push(Frame::Entries { list, start: mid, len: n - mid });
                            stack.push(Frame::Entries { list, start: 0, len: mid });
                        }
                    }
                }
                Frame::Elements(items) => {
                    if items.len() == 1 {
                        stack.push(Frame::Value(&items[0]));
                    } else {
                        let mid = split_point(items.len());
                        stack.push(Frame::Join(Join::Node));
                        stack.push(Frame::Elements(&items[mid..]));
                        stack.push(Frame::Elements(&items[..mid]));
                    }
                }
                Frame::Entries { list, start, len } => {
                    if len == 1 {
                        let (key, value) = sorted_lists[list][start];
                        stack.push(Frame::Join(Join::Node));
                        stack.push(Frame::Value(value));
                        stack.push(Frame::Key(key));
                    } else {
                        let mid = split_point(len);
                        stack.push(Frame::Join(Join::Node));
                        stack.push(Frame::Entries { list, start: start + mid, len: len - mid });
                        stack.push(Frame::Entries { list, start, len: mid });
                    }
                }
                Frame::Join(join) => {
                    let (Some(right), Some(left)) = (results.pop(), results.pop()) else {
                        return Err(Error::UnknownNodeKind(
                            "join with fewer than two built children".into(),
                        ));
                    };
                    let node = match join {
                        Join::Node => TreeNode::Node { left, right },
                        Join::Array(size) => TreeNode::ArrayHead { left, right, size },
                        Join::Dict(size) => TreeNode::DictHead { left, right, size },
                    };
                    results.push(push(&mut nodes, node));
                }
            }
        }

        let root = match (results.pop(), results.is_empty()) {
            (Some(root), true) => root,
            _ => {
                return Err(Error::UnknownNodeKind(
                    "builder finished with an unbalanced result stack".into(),
                ))
            }
        };

        debug!(
            nodes = nodes.len(),
            root = %root,
            "built binary tree"
        );
        Ok(BinaryTree::from_trusted(nodes, root))
    }
}

fn push(nodes: &mut Vec<TreeNode>, node: TreeNode) -> NodeId {
    nodes.push(node);
    NodeId((nodes.len() - 1) as u32)
}

/// Sort map entries by key bytes, rejecting duplicates
fn sort_entries(entries: &[(String, Value)]) -> Result<Vec<(&str, &Value)>> {
    let mut sorted: Vec<(&str, &Value)> = entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    if let Some(pair) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(Error::DuplicateKey(pair[0].0.to_string()));
    }
    Ok(sorted)
}
