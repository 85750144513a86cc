//! Proof blob - the binary transport form of a proof

use super::Proof;
use crate::{Error, Result};

/// Leading bytes of every proof blob
pub const PROOF_MAGIC: &[u8; 8] = b"GTVPROOF";

/// Current blob layout version
pub const PROOF_VERSION: u8 = 1;

/// Encoder and decoder for `MAGIC || version || zstd(bincode(proof))`
pub struct ProofBlob;

impl ProofBlob {
    /// Compress a proof for transport
    pub fn encode(proof: &Proof) -> Result<Vec<u8>> {
        let raw = bincode::serialize(proof)?;
        let mut output = Vec::with_capacity(PROOF_MAGIC.len() + 1 + raw.len() / 2);
        output.extend_from_slice(PROOF_MAGIC);
        output.push(PROOF_VERSION);
        let compressed = zstd::encode_all(raw.as_slice(), 3)?;
        output.extend(compressed);
        Ok(output)
    }

    /// Decompress and validate a proof blob
    pub fn decode(data: &[u8]) -> Result<Proof> {
        let header = PROOF_MAGIC.len() + 1;
        if data.len() < header {
            return Err(Error::Corruption(format!(
                "proof blob too short: {} bytes",
                data.len()
            )));
        }
        if &data[..PROOF_MAGIC.len()] != PROOF_MAGIC {
            return Err(Error::Corruption("not a proof blob".into()));
        }
        let version = data[PROOF_MAGIC.len()];
        if version != PROOF_VERSION {
            return Err(Error::Corruption(format!(
                "unsupported proof version: {}",
                version
            )));
        }

        let raw = zstd::decode_all(&data[header..])
            .map_err(|e| Error::Corruption(format!("proof payload: {}", e)))?;
        let proof = bincode::deserialize(&raw)?;
        Ok(proof)
    }
}
