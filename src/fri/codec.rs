//! Wire codec for [`FriProof`].
//!
//! The layout carries no repetition counts of its own: the number of rounds,
//! queries, coset values and Merkle siblings all follow from [`FriParams`], and
//! the batches opened by every query follow from the [`BatchDescriptor`]. Only
//! the per-batch polynomial count is written, so that a descriptor disagreeing
//! with the encoded openings is reported instead of silently misread.
//!
//! ```text
//! fri_roots      rounds x digest
//! final_poly     final_poly_len x EF
//! queries        num_queries x (
//!                    per batch: u32 num_polys || num_polys x coset x EF || path
//!                    per round: coset x EF || path )
//! proof_of_work  F
//! ```

use alloc::{collections::BTreeMap, vec::Vec};

use itertools::{EitherOrBoth, Itertools};
use p3_field::{BasedVectorSpace, PrimeField64};
use tracing::{debug, instrument, trace};

use super::{
    params::FriParams,
    proof::{FriProof, InitialProof, QueryProof, RoundProof},
};
use crate::{
    lpc::eval_storage::{BatchDescriptor, BatchShape},
    marshalling::{
        WireConfig, WireForm,
        errors::{MarshalError, MarshalResult, WireSection},
        field::{
            INTEGRAL_BYTES, encode_integral, ext_bytes, read_base, read_ext_array, write_base,
            write_ext_array,
        },
        reader::WireReader,
    },
    merkle_tree::{MerklePath, decode_node_value, encode_node_value, node_value_bytes},
};

/// Exact encoded length of a FRI proof with the given structure.
///
/// Fails with [`MarshalError::InvalidFriParams`] if `params` do not validate.
pub fn expected_fri_len<F, EF, const DIGEST_ELEMS: usize>(
    descriptor: &BatchDescriptor,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<usize>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    params.validate()?;

    let ext = ext_bytes::<F, EF>(config);
    let node = node_value_bytes::<DIGEST_ELEMS>(config);
    let path = |depth| MerklePath::<F, DIGEST_ELEMS>::encoded_len(depth, config);

    let initial: usize = descriptor
        .iter()
        .map(|(_, shape)| {
            INTEGRAL_BYTES
                + shape.num_polys * params.initial_coset_size() * ext
                + path(params.initial_path_depth())
        })
        .sum();
    let rounds: usize = (0..params.num_rounds())
        .map(|round| params.round_coset_size(round) * ext + path(params.round_path_depth(round)))
        .sum();

    Ok(params.num_rounds() * node
        + params.final_poly_len * ext
        + params.num_queries * (initial + rounds)
        + config.element_bytes())
}

/// Encodes a FRI proof whose initial openings follow `descriptor`.
#[instrument(skip_all, fields(rounds = params.num_rounds(), queries = params.num_queries))]
pub fn encode_fri_proof<F, EF, const DIGEST_ELEMS: usize>(
    proof: &FriProof<F, EF, DIGEST_ELEMS>,
    descriptor: &BatchDescriptor,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<WireForm>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    params.validate()?;
    config.check_field::<F>()?;

    if proof.fri_roots.len() != params.num_rounds() {
        return Err(MarshalError::InvalidProof(
            "number of FRI roots differs from the round count",
        ));
    }
    if proof.final_polynomial.len() != params.final_poly_len {
        return Err(MarshalError::InvalidProof(
            "final polynomial length differs from the parameters",
        ));
    }
    if proof.query_proofs.len() != params.num_queries {
        return Err(MarshalError::InvalidProof(
            "number of query proofs differs from the parameters",
        ));
    }

    let mut out = Vec::with_capacity(expected_fri_len::<F, EF, DIGEST_ELEMS>(
        descriptor, params, config,
    )?);

    for root in &proof.fri_roots {
        encode_node_value(&mut out, root, config);
    }
    write_ext_array::<F, EF>(&mut out, &proof.final_polynomial, config);
    for query in &proof.query_proofs {
        encode_query(&mut out, query, descriptor, params, config)?;
    }
    write_base(&mut out, proof.proof_of_work, config);

    debug!(bytes = out.len(), "encoded FRI proof");
    Ok(WireForm::new(out))
}

fn encode_query<F, EF, const DIGEST_ELEMS: usize>(
    out: &mut Vec<u8>,
    query: &QueryProof<F, EF, DIGEST_ELEMS>,
    descriptor: &BatchDescriptor,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<()>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    check_batches(&query.initial_proof, descriptor)?;

    let coset = params.initial_coset_size();
    for (opening, (_, shape)) in query.initial_proof.values().zip(descriptor.iter()) {
        if opening.values.len() != shape.num_polys {
            return Err(MarshalError::InconsistentStructure {
                what: "polynomial count",
                expected: shape.num_polys,
                actual: opening.values.len(),
            });
        }
        encode_integral(out, shape.num_polys, config)?;
        for poly in &opening.values {
            if poly.len() != coset {
                return Err(MarshalError::InvalidProof(
                    "initial opening does not cover a full coset",
                ));
            }
            write_ext_array::<F, EF>(out, poly, config);
        }
        opening.path.encode(out, params.initial_path_depth(), config)?;
    }

    if query.round_proofs.len() != params.num_rounds() {
        return Err(MarshalError::InvalidProof(
            "number of round proofs differs from the round count",
        ));
    }
    for (round, proof) in query.round_proofs.iter().enumerate() {
        if proof.y.len() != params.round_coset_size(round) {
            return Err(MarshalError::InvalidProof(
                "round opening does not cover a full coset",
            ));
        }
        write_ext_array::<F, EF>(out, &proof.y, config);
        proof.path.encode(out, params.round_path_depth(round), config)?;
    }
    Ok(())
}

/// Checks that a query opens exactly the batches named by the descriptor.
fn check_batches<T>(openings: &BTreeMap<usize, T>, descriptor: &BatchDescriptor) -> MarshalResult<()> {
    for pair in openings.keys().zip_longest(descriptor.iter()) {
        match pair {
            EitherOrBoth::Both(&actual, (expected, _)) if actual != expected => {
                return Err(MarshalError::InconsistentStructure {
                    what: "batch id",
                    expected,
                    actual,
                });
            }
            EitherOrBoth::Both(..) => {}
            EitherOrBoth::Left(_) | EitherOrBoth::Right(_) => {
                return Err(MarshalError::InconsistentStructure {
                    what: "batch count",
                    expected: descriptor.num_batches(),
                    actual: openings.len(),
                });
            }
        }
    }
    Ok(())
}

/// Decodes a FRI proof whose initial openings follow `descriptor`.
///
/// The per-batch polynomial counts found on the wire must agree with the
/// descriptor; a disagreement is an [`MarshalError::InconsistentStructure`].
#[instrument(skip_all, fields(rounds = params.num_rounds(), queries = params.num_queries))]
pub fn decode_fri_proof<F, EF, const DIGEST_ELEMS: usize>(
    field: &[u8],
    descriptor: &BatchDescriptor,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<FriProof<F, EF, DIGEST_ELEMS>>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    params.validate()?;
    config.check_field::<F>()?;

    let mut reader = WireReader::new(field, WireSection::FriProof);

    let fri_roots = (0..params.num_rounds())
        .map(|_| decode_node_value(&mut reader, config, "fri_root"))
        .collect::<MarshalResult<Vec<_>>>()?;
    let final_polynomial =
        read_ext_array::<F, EF>(&mut reader, params.final_poly_len, config, "final_polynomial")?;
    let query_proofs = (0..params.num_queries)
        .map(|_| decode_query(&mut reader, descriptor, params, config))
        .collect::<MarshalResult<Vec<_>>>()?;
    let proof_of_work = read_base(&mut reader, config, "proof_of_work")?;
    reader.finish()?;

    trace!(bytes = field.len(), "decoded FRI proof");
    Ok(FriProof {
        fri_roots,
        final_polynomial,
        query_proofs,
        proof_of_work,
    })
}

fn decode_query<F, EF, const DIGEST_ELEMS: usize>(
    reader: &mut WireReader<'_>,
    descriptor: &BatchDescriptor,
    params: &FriParams,
    config: &WireConfig,
) -> MarshalResult<QueryProof<F, EF, DIGEST_ELEMS>>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    let coset = params.initial_coset_size();

    let mut initial_proof = BTreeMap::new();
    for (batch_id, BatchShape { num_polys, .. }) in descriptor.iter() {
        let found = reader.read_u32(config, "num_polys")? as usize;
        if found != num_polys {
            return Err(MarshalError::InconsistentStructure {
                what: "polynomial count",
                expected: num_polys,
                actual: found,
            });
        }
        let values = (0..num_polys)
            .map(|_| read_ext_array::<F, EF>(reader, coset, config, "initial_values"))
            .collect::<MarshalResult<Vec<_>>>()?;
        let path = MerklePath::decode(reader, params.initial_path_depth(), config)?;
        initial_proof.insert(batch_id, InitialProof { values, path });
    }

    let round_proofs = (0..params.num_rounds())
        .map(|round| {
            let y = read_ext_array::<F, EF>(reader, params.round_coset_size(round), config, "y")?;
            let path = MerklePath::decode(reader, params.round_path_depth(round), config)?;
            Ok(RoundProof { y, path })
        })
        .collect::<MarshalResult<Vec<_>>>()?;

    Ok(QueryProof {
        initial_proof,
        round_proofs,
    })
}
