//! Disclosure paths
//!
//! A [`Path`] names a route from the root of a value to the part that must
//! stay visible in a proof. Annotating a tree with one or more paths yields a
//! [`Disclosure`], a side table marking every node on those routes.

mod disclosure;
mod selector;

pub use disclosure::{resolve, Disclosure, PathElement};
pub use selector::{Path, Selector, Terminal};
