//! Selective disclosure proofs
//!
//! A proof is a copy of a tree in which every subtree that is not on a
//! disclosure path has been collapsed to a `Pruned` hole, together with the
//! digest of each hole and the root digest of the full tree. Because the
//! hash engine substitutes a hole's digest for the subtree it replaced, the
//! proof recomputes to exactly the full tree's root.

mod blob;

pub use blob::{ProofBlob, PROOF_MAGIC, PROOF_VERSION};

use crate::digest::Digester;
use crate::hash::{HashEngine, Substitutes};
use crate::model::Hash;
use crate::path::{resolve, Disclosure, Path};
use crate::tree::{BinaryTree, NodeId, TreeNode};
use crate::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A pruned view of a tree plus the digests needed to recompute its root
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProofParts")]
pub struct Proof {
    /// Root digest of the full tree this proof was cut from
    root: Hash,
    tree: BinaryTree,
    /// Digest of every `Pruned` node in `tree`, and of nothing else
    pruned: Substitutes,
}

/// Unchecked wire form of a proof; validated on the way in
#[derive(Deserialize)]
struct ProofParts {
    root: Hash,
    tree: BinaryTree,
    pruned: Substitutes,
}

impl TryFrom<ProofParts> for Proof {
    type Error = Error;

    fn try_from(parts: ProofParts) -> Result<Self> {
        Proof::from_parts(parts.root, parts.tree, parts.pruned)
    }
}

impl Proof {
    /// Prune `tree` down to the nodes marked in `disclosure`
    ///
    /// Unmarked children of marked nodes become `Pruned` holes. With an
    /// empty disclosure the proof is a single hole holding the root digest.
    pub fn build<D: Digester>(
        tree: &BinaryTree,
        disclosure: &Disclosure,
        engine: &HashEngine<D>,
    ) -> Result<Self> {
        let hashes = engine.all_hashes(tree)?;

        enum Step {
            Visit(NodeId),
            Join(NodeId),
        }

        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut pruned = Substitutes::new();
        let mut built: Vec<NodeId> = Vec::new();
        let mut stack = vec![Step::Visit(tree.root())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(id) if !disclosure.is_path(id) => {
                    let new_id = NodeId(nodes.len() as u32);
                    nodes.push(TreeNode::Pruned);
                    pruned.insert(new_id, hashes[id.index()]);
                    built.push(new_id);
                }
                Step::Visit(id) => match tree.node(id).children() {
                    Some((left, right)) => {
                        stack.push(Step::Join(id));
                        stack.push(Step::Visit(right));
                        stack.push(Step::Visit(left));
                    }
                    None => {
                        built.push(NodeId(nodes.len() as u32));
                        nodes.push(tree.node(id).clone());
                    }
                },
                Step::Join(id) => {
                    let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                        return Err(Error::UnknownNodeKind(format!(
                            "lost children while pruning {}",
                            id
                        )));
                    };
                    built.push(NodeId(nodes.len() as u32));
                    nodes.push(with_children(tree.node(id), left, right)?);
                }
            }
        }

        let root_id = built
            .pop()
            .ok_or_else(|| Error::UnknownNodeKind("pruning produced no root".into()))?;
        let proof = Proof {
            root: hashes[tree.root().index()],
            tree: BinaryTree::from_trusted(nodes, root_id),
            pruned,
        };
        debug!(
            root = %proof.root.short(),
            kept = proof.tree.node_count() - proof.pruned.len(),
            pruned = proof.pruned.len(),
            "built disclosure proof"
        );
        Ok(proof)
    }

    /// Assemble a proof from parts received from elsewhere
    ///
    /// `pruned` must hold a digest for every `Pruned` node of `tree` and
    /// for no other node.
    pub fn from_parts(root: Hash, tree: BinaryTree, pruned: Substitutes) -> Result<Self> {
        for (idx, node) in tree.nodes().iter().enumerate() {
            if node.is_pruned() && !pruned.contains_key(&NodeId(idx as u32)) {
                return Err(Error::MissingPrunedDigest(idx as u32));
            }
        }
        if let Some(id) = pruned
            .keys()
            .find(|id| !tree.get(**id).is_some_and(TreeNode::is_pruned))
        {
            return Err(Error::Corruption(format!(
                "digest supplied for {}, which is not a pruned node",
                id
            )));
        }
        Ok(Proof { root, tree, pruned })
    }

    /// Root digest claimed by this proof
    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn tree(&self) -> &BinaryTree {
        &self.tree
    }

    pub fn pruned(&self) -> &Substitutes {
        &self.pruned
    }

    /// Recompute the root digest from the disclosed nodes and pruned digests
    pub fn compute_root<D: Digester>(&self, engine: &HashEngine<D>) -> Result<Hash> {
        engine.root_hash_with(&self.tree, &self.pruned)
    }

    /// Check that the proof recomputes to its own claimed root and that the
    /// claimed root is `expected`
    pub fn verify<D: Digester>(&self, engine: &HashEngine<D>, expected: &Hash) -> Result<()> {
        let computed = self.compute_root(engine)?;
        for claimed in [&self.root, expected] {
            if *claimed != computed {
                return Err(Error::RootMismatch {
                    expected: claimed.to_hex(),
                    computed: computed.to_hex(),
                });
            }
        }
        Ok(())
    }

    /// Content of the disclosed leaf at `path`; `None` for an empty leaf
    pub fn leaf_at(&self, path: &Path) -> Result<Option<&Bytes>> {
        let id = resolve(&self.tree, path)?;
        match self.tree.node(id) {
            TreeNode::Leaf { content } => Ok(Some(content)),
            TreeNode::EmptyLeaf => Ok(None),
            other => Err(Error::StructuralMismatch(format!(
                "path {} ends at {} {}, not a disclosed leaf",
                path,
                other.kind(),
                id
            ))),
        }
    }

    /// All leaves kept verbatim in the proof
    pub fn disclosed_leaves(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> + '_ {
        self.tree
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_leaf())
            .map(|(idx, node)| (NodeId(idx as u32), node))
    }

    /// Encode as a compressed proof blob
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        ProofBlob::encode(self)
    }

    /// Decode a proof blob
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ProofBlob::decode(data)
    }
}

/// Prune `tree` down to the nodes marked in `disclosure`
pub fn prune<D: Digester>(
    tree: &BinaryTree,
    disclosure: &Disclosure,
    engine: &HashEngine<D>,
) -> Result<Proof> {
    Proof::build(tree, disclosure, engine)
}

/// Same node kind as `node`, re-pointed at new children
fn with_children(node: &TreeNode, left: NodeId, right: NodeId) -> Result<TreeNode> {
    match node {
        TreeNode::Node { .. } => Ok(TreeNode::Node { left, right }),
        TreeNode::ArrayHead { size, .. } => Ok(TreeNode::ArrayHead {
            left,
            right,
            size: *size,
        }),
        TreeNode::DictHead { size, .. } => Ok(TreeNode::DictHead {
            left,
            right,
            size: *size,
        }),
        TreeNode::Leaf { .. } | TreeNode::EmptyLeaf | TreeNode::Pruned => Err(
            Error::UnknownNodeKind(format!("{} cannot take children", node.kind())),
        ),
    }
}
