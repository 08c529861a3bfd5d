//! Evaluation proof codec.
//!
//! An evaluation proof is the ordered bundle `[z, fri_proof]`. The FRI field
//! cannot be read on its own: the batches opened by every query are given by
//! the batch descriptor, which is not on the wire and is re-derived from the
//! decoded `z`.

use p3_field::{BasedVectorSpace, PrimeField64};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::eval_storage::{
    EvalStorage, decode_eval_storage, derive_batch_descriptor, encode_eval_storage,
};
use crate::{
    fri::{FriParams, FriProof, decode_fri_proof, encode_fri_proof, expected_fri_len},
    marshalling::{
        WireConfig, WireForm,
        bundle::{encode_bundle, split_bundle},
        errors::{MarshalError, MarshalResult, WireFault, WireSection},
    },
};

/// Number of fields in an evaluation proof bundle.
const EVAL_PROOF_FIELDS: usize = 2;

/// Evaluation proof of an LPC commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, EF: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, EF: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct EvalProof<F, EF, const DIGEST_ELEMS: usize> {
    /// Claimed evaluations, grouped by batch
    pub z: EvalStorage<EF>,

    /// Low-degree proof for the batched quotient
    pub fri_proof: FriProof<F, EF, DIGEST_ELEMS>,
}

/// Encodes an evaluation proof as the bundle `[z, fri_proof]`.
#[instrument(skip_all, fields(batches = proof.z.num_batches()))]
pub fn encode_eval_proof<F, EF, const DIGEST_ELEMS: usize>(
    proof: &EvalProof<F, EF, DIGEST_ELEMS>,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<WireForm>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    let descriptor = derive_batch_descriptor(&proof.z);

    let z = encode_eval_storage::<F, EF>(&proof.z, config)?;
    let fri = encode_fri_proof(&proof.fri_proof, &descriptor, params, config)?;
    let wire = encode_bundle(&[z, fri], config)?;

    debug!(bytes = wire.len(), "encoded evaluation proof");
    Ok(wire)
}

/// Decodes an evaluation proof.
///
/// `z` is decoded first and the batch descriptor is re-derived from it before
/// the FRI field is touched. A FRI field whose size or per-batch polynomial
/// counts disagree with that descriptor yields
/// [`MarshalError::InconsistentStructure`].
///
/// The FRI field carries no length of its own beyond the bundle framing, so a
/// short or padded FRI field, including one written under different
/// [`FriParams`], is also reported as a structure mismatch
/// (`what: "FRI proof length"`) rather than as [`MarshalError::MalformedWire`].
/// Defects found while reading the field itself, and any framing or `z`
/// defect, remain `MalformedWire`.
#[instrument(skip_all, fields(bytes = wire.len()))]
pub fn decode_eval_proof<F, EF, const DIGEST_ELEMS: usize>(
    wire: &[u8],
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<EvalProof<F, EF, DIGEST_ELEMS>>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    params.validate()?;

    let [z_field, fri_field] = eval_proof_fields(wire, config)?;

    let z = decode_eval_storage::<F, EF>(z_field, config)?;
    let descriptor = derive_batch_descriptor(&z);

    let expected = expected_fri_len::<F, EF, DIGEST_ELEMS>(&descriptor, params, config)?;
    if fri_field.len() != expected {
        return Err(MarshalError::InconsistentStructure {
            what: "FRI proof length",
            expected,
            actual: fri_field.len(),
        });
    }

    let fri_proof = decode_fri_proof(fri_field, &descriptor, params, config)?;

    debug!(
        batches = descriptor.num_batches(),
        polys = descriptor.total_polys(),
        "decoded evaluation proof"
    );
    Ok(EvalProof { z, fri_proof })
}

/// Splits an evaluation proof bundle into its `z` and FRI fields, in wire order.
pub fn eval_proof_fields<'a>(wire: &'a [u8], config: &WireConfig) -> MarshalResult<[&'a [u8]; 2]> {
    match split_bundle(wire, EVAL_PROOF_FIELDS, config)?.as_slice() {
        &[z, fri] => Ok([z, fri]),
        fields => Err(MarshalError::malformed(
            WireSection::Bundle,
            WireFault::FieldCount {
                expected: EVAL_PROOF_FIELDS,
                actual: fields.len(),
            },
        )),
    }
}
