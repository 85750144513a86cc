//! Core data model types for gtv_merkle

mod hash;
mod value;

pub use hash::{Hash, HASH_LEN};
pub use value::Value;
