use alloc::vec::Vec;

use p3_field::PrimeField64;

use crate::{
    marshalling::{
        WireConfig, WireForm,
        errors::{MarshalResult, WireFault, WireSection},
        reader::WireReader,
    },
    merkle_tree::{MerkleDigest, decode_node_value, encode_node_value, node_value_bytes},
};

/// Encodes an LPC commitment, which is the Merkle root of the committed batch.
pub fn encode_commitment<F: PrimeField64, const DIGEST_ELEMS: usize>(
    commitment: &MerkleDigest<F, DIGEST_ELEMS>,
    config: &WireConfig,
) -> MarshalResult<WireForm> {
    config.check_field::<F>()?;

    let mut out = Vec::with_capacity(node_value_bytes::<DIGEST_ELEMS>(config));
    encode_node_value(&mut out, commitment, config);
    Ok(WireForm::new(out))
}

/// Decodes an LPC commitment; the input must be exactly one node value.
pub fn decode_commitment<F: PrimeField64, const DIGEST_ELEMS: usize>(
    wire: &[u8],
    config: &WireConfig,
) -> MarshalResult<MerkleDigest<F, DIGEST_ELEMS>> {
    config.check_field::<F>()?;

    let mut reader = WireReader::new(wire, WireSection::Commitment);
    if wire.len() != node_value_bytes::<DIGEST_ELEMS>(config) {
        return Err(reader.fault(WireFault::InvalidLength {
            field: "commitment",
        }));
    }
    let digest = decode_node_value(&mut reader, config, "commitment")?;
    reader.finish()?;
    Ok(digest)
}
