//! Pluggable digest functions
//!
//! The tree core never names a hash algorithm directly. It hashes through a
//! [`Digester`], which takes the parts of a preimage in order and returns a
//! fixed-width [`Hash`]. Two implementations ship with the crate:
//!
//! - [`Blake3Digester`]: BLAKE3, the default
//! - [`Sha256Digester`]: SHA-256, for deployments that require a NIST hash
//!
//! Which one a deployment uses is a configuration choice ([`HashAlgorithm`]);
//! digests produced under different algorithms are never comparable.

use crate::model::Hash;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A fixed-width cryptographic hash over a sequence of byte strings
///
/// `digest_parts(&[a, b])` must equal `digest_parts(&[a ++ b])`: parts are
/// concatenated, not framed.
pub trait Digester: Send + Sync + fmt::Debug {
    fn digest_parts(&self, parts: &[&[u8]]) -> Hash;

    /// Hash a single byte string
    fn digest(&self, data: &[u8]) -> Hash {
        self.digest_parts(&[data])
    }
}

impl<D: Digester + ?Sized> Digester for &D {
    fn digest_parts(&self, parts: &[&[u8]]) -> Hash {
        (**self).digest_parts(parts)
    }
}

impl<D: Digester + ?Sized> Digester for Box<D> {
    fn digest_parts(&self, parts: &[&[u8]]) -> Hash {
        (**self).digest_parts(parts)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Digester;

impl Digester for Blake3Digester {
    fn digest_parts(&self, parts: &[&[u8]]) -> Hash {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Hash::from_bytes(*hasher.finalize().as_bytes())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digester;

impl Digester for Sha256Digester {
    fn digest_parts(&self, parts: &[&[u8]]) -> Hash {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let mut output = [0u8; 32];
        output.copy_from_slice(&hasher.finalize());
        Hash::from_bytes(output)
    }
}

/// Runtime selection of the digest function
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl HashAlgorithm {
    pub fn digester(&self) -> Box<dyn Digester> {
        match self {
            HashAlgorithm::Blake3 => Box::new(Blake3Digester),
            HashAlgorithm::Sha256 => Box::new(Sha256Digester),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(crate::Error::Config(format!(
                "unknown hash algorithm: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
