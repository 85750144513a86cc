//! Hash engine
//!
//! Walks a [`BinaryTree`](crate::tree::BinaryTree) bottom-up and computes a
//! digest per node. Each node kind hashes under its own prefix byte, so a
//! leaf digest can never be confused with an internal node digest.

mod engine;

pub use engine::{HashEngine, Substitutes, EMPTY_SENTINEL};
