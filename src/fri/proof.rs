use alloc::{collections::BTreeMap, vec::Vec};

use serde::{Deserialize, Serialize};

use crate::merkle_tree::{MerkleDigest, MerklePath};

/// Complete FRI proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, EF: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, EF: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct FriProof<F, EF, const DIGEST_ELEMS: usize> {
    /// Merkle root of every folded layer, one per round
    pub fri_roots: Vec<MerkleDigest<F, DIGEST_ELEMS>>,

    /// Coefficients of the final polynomial
    pub final_polynomial: Vec<EF>,

    /// One opening per query
    pub query_proofs: Vec<QueryProof<F, EF, DIGEST_ELEMS>>,

    /// Grinding witness
    pub proof_of_work: F,
}

/// Openings answering a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, EF: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, EF: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct QueryProof<F, EF, const DIGEST_ELEMS: usize> {
    /// Opening of every committed batch, keyed by batch id
    pub initial_proof: BTreeMap<usize, InitialProof<F, EF, DIGEST_ELEMS>>,

    /// Opening of each folded layer
    pub round_proofs: Vec<RoundProof<F, EF, DIGEST_ELEMS>>,
}

/// Opening of one batch commitment at a queried coset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, EF: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, EF: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct InitialProof<F, EF, const DIGEST_ELEMS: usize> {
    /// Coset values, indexed by `[polynomial][coset position]`
    pub values: Vec<Vec<EF>>,

    /// Authentication path of the coset leaf
    pub path: MerklePath<F, DIGEST_ELEMS>,
}

/// Opening of a folded layer at a queried coset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: Serialize, EF: Serialize, [F; DIGEST_ELEMS]: Serialize",
    deserialize = "F: Deserialize<'de>, EF: Deserialize<'de>, [F; DIGEST_ELEMS]: Deserialize<'de>"
))]
pub struct RoundProof<F, EF, const DIGEST_ELEMS: usize> {
    /// Coset values of the folded polynomial
    pub y: Vec<EF>,

    /// Authentication path of the coset leaf
    pub path: MerklePath<F, DIGEST_ELEMS>,
}
