//! # gtv_merkle
//!
//! Canonical Merkle trees over generic transferable values.
//!
//! A [`Value`] (null, scalar bytes, array, or string-keyed map) is laid out
//! as a deterministic binary tree whose root digest commits to its content
//! and shape. Parts of the value can then be disclosed selectively: the
//! undisclosed subtrees are replaced by their digests, and the resulting
//! [`Proof`] still recomputes to the original root.
//!
//! ## Core Concepts
//!
//! - **Trees**: post-order arenas of [`TreeNode`]s built by [`TreeBuilder`]
//! - **Digests**: domain-separated hashing by [`HashEngine`] over a pluggable [`Digester`]
//! - **Disclosure**: [`Path`]s annotated onto a tree as a [`Disclosure`] side table
//! - **Proofs**: pruned trees plus the digests of their holes
//!
//! ## Example
//!
//! ```ignore
//! use gtv_merkle::{Blake3Digester, Disclosure, HashEngine, Path, Proof, TreeBuilder, Value};
//!
//! let value = Value::map([("name", Value::scalar("alice")), ("age", Value::scalar("42"))]);
//! let tree = TreeBuilder::new().build(&value)?;
//! let engine = HashEngine::new(Blake3Digester);
//! let root = engine.root_hash(&tree)?;
//!
//! let disclosure = Disclosure::from_paths(&tree, [&Path::parse("name")?])?;
//! let proof = Proof::build(&tree, &disclosure, &engine)?;
//! proof.verify(&engine, &root)?;
//! ```

pub mod config;
pub mod confirm;
pub mod digest;
pub mod encode;
pub mod hash;
pub mod model;
pub mod path;
pub mod proof;
pub mod tree;

mod error;

pub use config::Config;
pub use confirm::{ConfirmationPoller, PollConfig, StatusResponse, StatusSource, TxStatus};
pub use digest::{Blake3Digester, Digester, HashAlgorithm, Sha256Digester};
pub use encode::{LeafEncoder, Scalar, TaggedEncoder};
pub use error::{Error, Result};
pub use hash::{HashEngine, Substitutes, EMPTY_SENTINEL};
pub use model::{Hash, Value};
pub use path::{Disclosure, Path, PathElement, Selector, Terminal};
pub use proof::{prune, Proof, PROOF_MAGIC, PROOF_VERSION};
pub use tree::{BinaryTree, HashPrefix, NodeId, Side, TreeBuilder, TreeNode};
