//! Bottom-up digest computation

use crate::digest::Digester;
use crate::model::Hash;
use crate::tree::{BinaryTree, HashPrefix, NodeId, TreeNode};
use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Payload hashed for an empty leaf, after the leaf prefix
pub const EMPTY_SENTINEL: &[u8] = &[0x00];

/// Digests of pruned subtrees, keyed by the node they replace
pub type Substitutes = BTreeMap<NodeId, Hash>;

/// Computes node digests with domain-separated prefixes
///
/// ```text
/// EmptyLeaf            H(1 || 0x00)
/// Leaf(content)        H(1 || content)
/// Node(l, r)           H(0 || h(l) || h(r))
/// ArrayHead(l, r, n)   H(7 || n as u64 BE || h(l) || h(r))
/// DictHead(l, r, n)    H(8 || n as u64 BE || h(l) || h(r))
/// ```
#[derive(Debug, Clone, Default)]
pub struct HashEngine<D> {
    digester: D,
}

impl<D: Digester> HashEngine<D> {
    pub fn new(digester: D) -> Self {
        HashEngine { digester }
    }

    pub fn digester(&self) -> &D {
        &self.digester
    }

    /// Digest of the canonical empty leaf
    pub fn empty_leaf_hash(&self) -> Hash {
        self.digester
            .digest_parts(&[&[HashPrefix::Leaf.as_byte()], EMPTY_SENTINEL])
    }

    pub fn leaf_hash(&self, content: &[u8]) -> Hash {
        self.digester
            .digest_parts(&[&[HashPrefix::Leaf.as_byte()], content])
    }

    /// Root digest of a fully expanded tree
    pub fn root_hash(&self, tree: &BinaryTree) -> Result<Hash> {
        self.node_hash(tree, tree.root())
    }

    /// Digest of the subtree rooted at `id`
    pub fn node_hash(&self, tree: &BinaryTree, id: NodeId) -> Result<Hash> {
        self.hash_from(tree, id, &Substitutes::new())
    }

    /// Root digest using precomputed digests for pruned subtrees
    ///
    /// Only `Pruned` nodes take their digest from `substitutes`; every other
    /// node is recomputed from its content and children. Reaching a `Pruned`
    /// node without a substitute fails with `MissingPrunedDigest`.
    pub fn root_hash_with(&self, tree: &BinaryTree, substitutes: &Substitutes) -> Result<Hash> {
        self.hash_from(tree, tree.root(), substitutes)
    }

    /// Digest of every node, indexed by `NodeId`
    ///
    /// Relies on post-order storage: children are hashed before parents.
    pub fn all_hashes(&self, tree: &BinaryTree) -> Result<Vec<Hash>> {
        let mut hashes: Vec<Hash> = Vec::with_capacity(tree.node_count());
        for (idx, node) in tree.nodes().iter().enumerate() {
            let children = match node.children() {
                Some((l, r)) => {
                    let left = hashes.get(l.index()).copied();
                    let right = hashes.get(r.index()).copied();
                    match (left, right) {
                        (Some(left), Some(right)) => Some((left, right)),
                        _ => {
                            return Err(Error::UnknownNodeKind(format!(
                                "node #{} hashed before its children",
                                idx
                            )))
                        }
                    }
                }
                None => None,
            };
            hashes.push(self.hash_node(NodeId(idx as u32), node, children)?);
        }
        Ok(hashes)
    }

    fn hash_from(
        &self,
        tree: &BinaryTree,
        start: NodeId,
        substitutes: &Substitutes,
    ) -> Result<Hash> {
        let mut stack = vec![(start, false)];
        let mut out: Vec<Hash> = Vec::new();

        while let Some((id, expanded)) = stack.pop() {
            let node = tree
                .get(id)
                .ok_or_else(|| Error::UnknownNodeKind(format!("dangling reference {}", id)))?;

            if expanded {
                let (Some(right), Some(left)) = (out.pop(), out.pop()) else {
                    return Err(Error::UnknownNodeKind(format!(
                        "{} {} lost its children",
                        node.kind(),
                        id
                    )));
                };
                out.push(self.hash_node(id, node, Some((left, right)))?);
                continue;
            }

            if node.is_pruned() {
                let digest = substitutes
                    .get(&id)
                    .ok_or(Error::MissingPrunedDigest(id.0))?;
                trace!(node = %id, digest = %digest.short(), "using substitute digest");
                out.push(*digest);
                continue;
            }

            match node.children() {
                Some((left, right)) => {
                    stack.push((id, true));
                    stack.push((right, false));
                    stack.push((left, false));
                }
                None => out.push(self.hash_node(id, node, None)?),
            }
        }

        match (out.pop(), out.is_empty()) {
            (Some(root), true) => {
                debug!(start = %start, digest = %root.short(), "hashed tree");
                Ok(root)
            }
            _ => Err(Error::UnknownNodeKind(
                "hash stack unbalanced after traversal".into(),
            )),
        }
    }

    /// Digest of a single node given its children's digests
    fn hash_node(&self, id: NodeId, node: &TreeNode, children: Option<(Hash, Hash)>) -> Result<Hash> {
        match (node, children) {
            (TreeNode::EmptyLeaf, None) => Ok(self.empty_leaf_hash()),
            (TreeNode::Leaf { content }, None) => Ok(self.leaf_hash(content)),
            (TreeNode::Pruned, None) => Err(Error::MissingPrunedDigest(id.0)),
            (TreeNode::Node { .. }, Some((l, r))) => Ok(self.digester.digest_parts(&[
                &[HashPrefix::Node.as_byte()],
                l.as_bytes(),
                r.as_bytes(),
            ])),
            (TreeNode::ArrayHead { size, .. }, Some((l, r))) => {
                Ok(self.head_hash(HashPrefix::NodeArray, *size, &l, &r))
            }
            (TreeNode::DictHead { size, .. }, Some((l, r))) => {
                Ok(self.head_hash(HashPrefix::NodeDict, *size, &l, &r))
            }
            (node, _) => Err(Error::UnknownNodeKind(format!(
                "{} {} hashed with mismatched children",
                node.kind(),
                id
            ))),
        }
    }

    fn head_hash(&self, prefix: HashPrefix, size: u64, left: &Hash, right: &Hash) -> Hash {
        self.digester.digest_parts(&[
            &[prefix.as_byte()],
            &size.to_be_bytes(),
            left.as_bytes(),
            right.as_bytes(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Blake3Digester, Sha256Digester};
    use crate::model::Value;
    use crate::tree::TreeBuilder;

    fn engine() -> HashEngine<Blake3Digester> {
        HashEngine::new(Blake3Digester)
    }

    fn s(b: &'static str) -> Value {
        Value::scalar(b.as_bytes())
    }

    fn digest(v: &Value) -> Hash {
        let tree = TreeBuilder::new().build(v).unwrap();
        engine().root_hash(&tree).unwrap()
    }

    #[test]
    fn test_empty_array_digest() {
        let e = engine();
        let d = Blake3Digester;
        let empty = d.digest_parts(&[&[1], &[0]]);
        let expected = d.digest_parts(&[
            &[7],
            &0u64.to_be_bytes(),
            empty.as_bytes(),
            empty.as_bytes(),
        ]);
        assert_eq!(e.empty_leaf_hash(), empty);
        assert_eq!(digest(&Value::Array(vec![])), expected);
    }

    #[test]
    fn test_leaf_and_node_formulas() {
        let d = Sha256Digester;
        let e = HashEngine::new(d);
        let a = d.digest_parts(&[&[1], b"a"]);
        let b = d.digest_parts(&[&[1], b"b"]);
        let c = d.digest_parts(&[&[1], b"c"]);
        let bc = d.digest_parts(&[&[0], b.as_bytes(), c.as_bytes()]);
        let root = d.digest_parts(&[&[7], &3u64.to_be_bytes(), a.as_bytes(), bc.as_bytes()]);

        let tree = TreeBuilder::new()
            .build(&Value::Array(vec![s("a"), s("b"), s("c")]))
            .unwrap();
        assert_eq!(e.root_hash(&tree).unwrap(), root);
    }

    #[test]
    fn test_prefixes_separate_domains() {
        // Same children, different head kinds
        let arr = digest(&Value::Array(vec![]));
        let map = digest(&Value::Map(vec![]));
        assert_ne!(arr, map);

        // Null vs. scalars that look like the sentinel
        assert_ne!(digest(&Value::Null), digest(&s("")));
        assert_ne!(digest(&Value::Null), digest(&Value::scalar(vec![0u8, 0u8])));
    }

    #[test]
    fn test_size_is_folded_in() {
        // [a] and a crafted two-element tree with the same shape
        let one = digest(&Value::Array(vec![s("a")]));
        let e = engine();
        let tree = BinaryTree::from_parts(
            vec![
                TreeNode::leaf(&b"a"[..]),
                TreeNode::EmptyLeaf,
                TreeNode::ArrayHead { left: NodeId(0), right: NodeId(1), size: 2 },
            ],
            NodeId(2),
        )
        .unwrap();
        assert_ne!(e.root_hash(&tree).unwrap(), one);
    }

    #[test]
    fn test_all_hashes_matches_traversal() {
        let tree = TreeBuilder::new()
            .build(&Value::map([
                ("k", Value::Array(vec![s("1"), s("2"), Value::Null])),
                ("j", s("x")),
            ]))
            .unwrap();
        let e = engine();
        let all = e.all_hashes(&tree).unwrap();
        for idx in 0..tree.node_count() {
            let id = NodeId(idx as u32);
            assert_eq!(all[idx], e.node_hash(&tree, id).unwrap());
        }
    }

    #[test]
    fn test_substitute_fills_pruned_hole() {
        let e = engine();
        let full = digest(&Value::Array(vec![s("a"), s("b")]));
        let holed = BinaryTree::from_parts(
            vec![
                TreeNode::Pruned,
                TreeNode::leaf(&b"b"[..]),
                TreeNode::ArrayHead { left: NodeId(0), right: NodeId(1), size: 2 },
            ],
            NodeId(2),
        )
        .unwrap();

        let mut subs = Substitutes::new();
        subs.insert(NodeId(0), e.leaf_hash(b"a"));
        assert_eq!(e.root_hash_with(&holed, &subs).unwrap(), full);

        subs.insert(NodeId(0), Hash::ZERO);
        assert_ne!(e.root_hash_with(&holed, &subs).unwrap(), full);
    }

    #[test]
    fn test_substitute_ignored_off_holes() {
        let tree = TreeBuilder::new()
            .build(&Value::Array(vec![s("a"), s("b")]))
            .unwrap();
        let e = engine();
        let full = e.root_hash(&tree).unwrap();

        // Digests keyed on a leaf or on the root itself never replace
        // the recomputed value
        let left = tree.element(tree.root(), 0).unwrap();
        let mut subs = Substitutes::new();
        subs.insert(left, Hash::ZERO);
        subs.insert(tree.root(), Hash::ZERO);
        assert_eq!(e.root_hash_with(&tree, &subs).unwrap(), full);
    }

    #[test]
    fn test_missing_pruned_digest() {
        let tree = BinaryTree::from_parts(
            vec![
                TreeNode::Pruned,
                TreeNode::EmptyLeaf,
                TreeNode::Node { left: NodeId(0), right: NodeId(1) },
            ],
            NodeId(2),
        )
        .unwrap();
        let err = engine().root_hash(&tree).unwrap_err();
        assert!(matches!(err, Error::MissingPrunedDigest(0)));
        assert!(engine().all_hashes(&tree).is_err());
    }

    #[test]
    fn test_deep_tree_hashes_without_recursion() {
        let mut nodes = vec![TreeNode::EmptyLeaf];
        let mut top = NodeId(0);
        for _ in 0..200_000 {
            nodes.push(TreeNode::EmptyLeaf);
            let right = NodeId(nodes.len() as u32 - 1);
            nodes.push(TreeNode::Node { left: top, right });
            top = NodeId(nodes.len() as u32 - 1);
        }
        let tree = BinaryTree::from_parts(nodes, top).unwrap();
        let e = engine();
        let all = e.all_hashes(&tree).unwrap();
        assert_eq!(e.root_hash(&tree).unwrap(), all[top.index()]);
        assert_eq!(tree.max_level(), 200_000);
    }
}
