//! Disclosure overlay: which nodes of a built tree stay expanded

use super::selector::{Path, Selector, Terminal};
use crate::tree::{BinaryTree, NodeId, TreeNode};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Marker attached to a node that must stay expanded in a proof
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathElement {
    /// The node lies on the route to a disclosed descendant
    Node,
    /// The node is a disclosed leaf and keeps its content verbatim
    Leaf,
}

/// Side table of path markers for one tree
///
/// The tree itself is never modified, so the same tree can be annotated in
/// several independent ways. Annotating more than one path merges the
/// markers (set union).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disclosure {
    marks: BTreeMap<NodeId, PathElement>,
}

impl Disclosure {
    pub fn new() -> Self {
        Disclosure::default()
    }

    /// Annotate every path in `paths`, failing on the first mismatch
    pub fn from_paths<'p>(
        tree: &BinaryTree,
        paths: impl IntoIterator<Item = &'p Path>,
    ) -> Result<Self> {
        let mut disclosure = Disclosure::new();
        for path in paths {
            disclosure.annotate(tree, path)?;
        }
        Ok(disclosure)
    }

    /// Mark the route described by `path`
    ///
    /// Either the whole path is marked or, on error, nothing is.
    pub fn annotate(&mut self, tree: &BinaryTree, path: &Path) -> Result<()> {
        let (mut pending, current) = follow(tree, path)?;

        let node = tree.node(current);
        match path.terminal {
            Terminal::Leaf if node.is_leaf() => pending.push((current, PathElement::Leaf)),
            Terminal::Leaf => {
                return Err(Error::StructuralMismatch(format!(
                    "path {} expects a leaf but ends at {} {}",
                    path,
                    node.kind(),
                    current
                )))
            }
            Terminal::Subtree => mark_subtree(tree, current, &mut pending)?,
        }

        debug!(path = %path, marked = pending.len(), "annotated disclosure path");
        self.marks.extend(pending);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<PathElement> {
        self.marks.get(&id).copied()
    }

    /// The node is on some disclosure path
    pub fn is_path(&self, id: NodeId) -> bool {
        self.marks.contains_key(&id)
    }

    /// The node is a disclosed leaf
    pub fn is_path_leaf(&self, id: NodeId) -> bool {
        self.get(id) == Some(PathElement::Leaf)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, PathElement)> + '_ {
        self.marks.iter().map(|(id, el)| (*id, *el))
    }
}

/// Node reached by following `path` from the root, without marking anything
///
/// Works on proof trees as long as the route avoids pruned holes.
pub fn resolve(tree: &BinaryTree, path: &Path) -> Result<NodeId> {
    follow(tree, path).map(|(_, end)| end)
}

/// Walk the selectors of `path`, collecting the markers the route needs
/// (terminal excluded) and the node it ends at
fn follow(tree: &BinaryTree, path: &Path) -> Result<(Vec<(NodeId, PathElement)>, NodeId)> {
    let mut pending: Vec<(NodeId, PathElement)> = Vec::new();
    let mut current = tree.root();

    for selector in &path.selectors {
        pending.push((current, PathElement::Node));
        let node = tree.node(current);
        let Some((left, right)) = node.children() else {
            return Err(Error::StructuralMismatch(format!(
                "path {} continues past {} {}",
                path,
                node.kind(),
                current
            )));
        };

        match selector {
            Selector::Left => current = left,
            Selector::Right => current = right,
            Selector::Index(index) => {
                let route = tree.element_route(current, *index)?;
                current = walk(&mut pending, &route)?;
            }
            Selector::Key(key) => {
                let route = tree.entry_route(current, key)?;
                let entry = walk(&mut pending, &route)?;
                pending.push((entry, PathElement::Node));
                let (key_leaf, value) = tree.node(entry).children().ok_or_else(|| {
                    Error::StructuralMismatch(format!("{} is not a map entry", entry))
                })?;
                pending.push((key_leaf, PathElement::Leaf));
                current = value;
            }
        }
    }

    Ok((pending, current))
}

/// Queue route nodes as `PathElement::Node` and return the last one
fn walk(pending: &mut Vec<(NodeId, PathElement)>, route: &[NodeId]) -> Result<NodeId> {
    let (last, inner) = route
        .split_last()
        .ok_or_else(|| Error::UnknownNodeKind("empty collection route".into()))?;
    pending.extend(inner.iter().map(|id| (*id, PathElement::Node)));
    Ok(*last)
}

fn mark_subtree(
    tree: &BinaryTree,
    start: NodeId,
    pending: &mut Vec<(NodeId, PathElement)>,
) -> Result<()> {
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        match tree.node(id) {
            TreeNode::Pruned => {
                return Err(Error::StructuralMismatch(format!(
                    "cannot disclose subtree containing pruned node {}",
                    id
                )))
            }
            TreeNode::Leaf { .. } | TreeNode::EmptyLeaf => pending.push((id, PathElement::Leaf)),
            TreeNode::Node { left, right }
            | TreeNode::ArrayHead { left, right, .. }
            | TreeNode::DictHead { left, right, .. } => {
                pending.push((id, PathElement::Node));
                stack.push(*right);
                stack.push(*left);
            }
        }
    }
    Ok(())
}
