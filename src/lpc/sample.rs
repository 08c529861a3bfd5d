//! Random, well-shaped evaluation proofs.
//!
//! The values carry no cryptographic meaning; only the shape matches the
//! parameters, which is all the codecs look at.

use alloc::{collections::BTreeMap, vec::Vec};

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};

use super::{
    eval_proof::EvalProof,
    eval_storage::{BatchShape, EvalBatch, EvalStorage},
};
use crate::{
    fri::{FriParams, FriProof, InitialProof, QueryProof, RoundProof},
    merkle_tree::{MerkleDigest, MerklePath},
};

fn random_vec<T, R: Rng>(rng: &mut R, len: usize) -> Vec<T>
where
    StandardUniform: Distribution<T>,
{
    (0..len).map(|_| rng.random()).collect()
}

fn random_digest<F, R: Rng, const DIGEST_ELEMS: usize>(rng: &mut R) -> MerkleDigest<F, DIGEST_ELEMS>
where
    StandardUniform: Distribution<F>,
{
    core::array::from_fn(|_| rng.random())
}

fn random_path<F, R: Rng, const DIGEST_ELEMS: usize>(
    rng: &mut R,
    depth: usize,
) -> MerklePath<F, DIGEST_ELEMS>
where
    StandardUniform: Distribution<F>,
{
    MerklePath {
        leaf_index: rng.random_range(0..1usize << depth),
        siblings: (0..depth).map(|_| random_digest(rng)).collect(),
    }
}

/// Builds a random evaluation proof with the given batch shapes.
///
/// `params` must be valid.
pub fn random_eval_proof<F, EF, R, const DIGEST_ELEMS: usize>(
    rng: &mut R,
    shapes: &BTreeMap<usize, BatchShape>,
    params: &FriParams,
) -> EvalProof<F, EF, DIGEST_ELEMS>
where
    R: Rng,
    StandardUniform: Distribution<F> + Distribution<EF>,
{
    let z: EvalStorage<EF> = shapes
        .iter()
        .map(|(&id, shape)| {
            let points = random_vec(rng, shape.num_points);
            let values = (0..shape.num_polys)
                .map(|_| random_vec(rng, shape.num_points))
                .collect();
            (id, EvalBatch::new(points, values))
        })
        .collect();

    let query_proofs = (0..params.num_queries)
        .map(|_| QueryProof {
            initial_proof: shapes
                .iter()
                .map(|(&id, shape)| {
                    let values = (0..shape.num_polys)
                        .map(|_| random_vec(rng, params.initial_coset_size()))
                        .collect();
                    let path = random_path(rng, params.initial_path_depth());
                    (id, InitialProof { values, path })
                })
                .collect(),
            round_proofs: (0..params.num_rounds())
                .map(|round| RoundProof {
                    y: random_vec(rng, params.round_coset_size(round)),
                    path: random_path(rng, params.round_path_depth(round)),
                })
                .collect(),
        })
        .collect();

    let fri_proof = FriProof {
        fri_roots: (0..params.num_rounds())
            .map(|_| random_digest(rng))
            .collect(),
        final_polynomial: random_vec(rng, params.final_poly_len),
        query_proofs,
        proof_of_work: rng.random(),
    };

    EvalProof { z, fri_proof }
}
