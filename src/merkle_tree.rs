//! Merkle node values and authentication paths.
//!
//! A node value is a digest made of `DIGEST_ELEMS` base field words, the same
//! shape `p3_merkle_tree::MerkleTreeMmcs` uses for its commitments.

use alloc::vec::Vec;

use p3_field::PrimeField64;
use p3_symmetric::Hash;
use serde::{Deserialize, Serialize};

use crate::marshalling::{
    WireConfig,
    errors::{MarshalError, MarshalResult, WireFault},
    field::{INTEGRAL_BYTES, encode_integral, read_base, write_base},
    reader::WireReader,
};

/// Root or inner node of a Merkle tree over field elements.
pub type MerkleDigest<F, const DIGEST_ELEMS: usize> = [F; DIGEST_ELEMS];

/// Converts a Plonky3 hash output into a node value.
#[must_use]
pub fn digest_from_hash<F: PrimeField64, const DIGEST_ELEMS: usize>(
    hash: Hash<F, F, DIGEST_ELEMS>,
) -> MerkleDigest<F, DIGEST_ELEMS> {
    hash.into()
}

/// Size in bytes of one encoded node value.
#[must_use]
pub const fn node_value_bytes<const DIGEST_ELEMS: usize>(config: &WireConfig) -> usize {
    DIGEST_ELEMS * config.element_bytes()
}

/// Writes a node value, word by word.
pub fn encode_node_value<F: PrimeField64, const DIGEST_ELEMS: usize>(
    out: &mut Vec<u8>,
    value: &MerkleDigest<F, DIGEST_ELEMS>,
    config: &WireConfig,
) {
    for &word in value {
        write_base(out, word, config);
    }
}

/// Reads a node value.
pub fn decode_node_value<F: PrimeField64, const DIGEST_ELEMS: usize>(
    reader: &mut WireReader<'_>,
    config: &WireConfig,
    field: &'static str,
) -> MarshalResult<MerkleDigest<F, DIGEST_ELEMS>> {
    let mut digest = [F::ZERO; DIGEST_ELEMS];
    for word in &mut digest {
        *word = read_base(reader, config, field)?;
    }
    Ok(digest)
}

/// Authentication path from a leaf to the root.
///
/// The depth of the path is fixed by the layer being opened, so it never
/// travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct MerklePath<F, const DIGEST_ELEMS: usize> {
    /// Position of the opened leaf.
    pub leaf_index: usize,
    /// Sibling digests, from the leaf layer upwards.
    pub siblings: Vec<MerkleDigest<F, DIGEST_ELEMS>>,
}

/// Number of leaves of a tree with the given depth, saturating at `u64::MAX`.
const fn leaf_bound(depth: usize) -> u64 {
    if depth >= u64::BITS as usize {
        u64::MAX
    } else {
        1 << depth
    }
}

impl<F: PrimeField64, const DIGEST_ELEMS: usize> MerklePath<F, DIGEST_ELEMS> {
    #[must_use]
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Encoded size of a path of the given depth.
    #[must_use]
    pub const fn encoded_len(depth: usize, config: &WireConfig) -> usize {
        INTEGRAL_BYTES + depth * node_value_bytes::<DIGEST_ELEMS>(config)
    }

    /// Writes `leaf_index || siblings`. The path must have exactly `depth` siblings.
    pub fn encode(&self, out: &mut Vec<u8>, depth: usize, config: &WireConfig) -> MarshalResult<()> {
        if self.depth() != depth {
            return Err(MarshalError::InvalidProof(
                "merkle path depth does not match the opened layer",
            ));
        }
        if self.leaf_index as u64 >= leaf_bound(depth) {
            return Err(MarshalError::InvalidProof("merkle leaf index outside the layer"));
        }
        encode_integral(out, self.leaf_index, config)?;
        for sibling in &self.siblings {
            encode_node_value(out, sibling, config);
        }
        Ok(())
    }

    /// Reads a path of the given depth.
    pub fn decode(
        reader: &mut WireReader<'_>,
        depth: usize,
        config: &WireConfig,
    ) -> MarshalResult<Self> {
        let leaf_index = reader.read_u32(config, "leaf_index")?;
        let bound = leaf_bound(depth);
        if u64::from(leaf_index) >= bound {
            return Err(reader.fault(WireFault::IndexOutOfRange {
                field: "leaf_index",
                index: u64::from(leaf_index),
                bound,
            }));
        }
        let siblings = (0..depth)
            .map(|_| decode_node_value(reader, config, "sibling"))
            .collect::<MarshalResult<Vec<_>>>()?;
        Ok(Self {
            leaf_index: leaf_index as usize,
            siblings,
        })
    }
}
