//! Marshalling of LPC commitments and evaluation proofs.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::marker::PhantomData;

use p3_field::{BasedVectorSpace, PrimeField64};
use p3_maybe_rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    fri::FriParams,
    marshalling::{
        WireConfig, WireForm,
        errors::{MarshalError, MarshalResult},
    },
    merkle_tree::MerkleDigest,
};

pub mod commitment;
pub mod eval_proof;
pub mod eval_storage;
pub mod sample;

#[cfg(test)]
mod tests;

pub use commitment::{decode_commitment, encode_commitment};
pub use eval_proof::{EvalProof, decode_eval_proof, encode_eval_proof, eval_proof_fields};
pub use eval_storage::{
    BatchDescriptor, BatchShape, EvalBatch, EvalStorage, decode_eval_storage,
    derive_batch_descriptor, encode_eval_storage,
};

/// LPC scheme description: everything the layout depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpcScheme {
    pub fri_params: FriParams,
}

/// Commitment scheme a proof was produced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitmentScheme {
    /// List polynomial commitment over FRI.
    Lpc(LpcScheme),
    /// Any other scheme, identified by name.
    Other { name: String },
}

impl CommitmentScheme {
    /// Returns `true` if proofs of this scheme use the LPC layout.
    #[must_use]
    pub const fn is_lpc_family(&self) -> bool {
        matches!(self, Self::Lpc(_))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Lpc(_) => "lpc",
            Self::Other { name } => name,
        }
    }

    #[must_use]
    pub const fn as_lpc(&self) -> Option<&LpcScheme> {
        match self {
            Self::Lpc(scheme) => Some(scheme),
            Self::Other { .. } => None,
        }
    }
}

/// Codec for the proofs of one LPC scheme.
///
/// Holds the wire configuration and FRI parameters shared by both sides, so
/// that individual calls only take the value being converted.
#[derive(Debug, Clone)]
pub struct LpcCodec<F, EF, const DIGEST_ELEMS: usize> {
    config: WireConfig,
    fri_params: FriParams,
    _field: PhantomData<(F, EF)>,
}

impl<F, EF, const DIGEST_ELEMS: usize> LpcCodec<F, EF, DIGEST_ELEMS>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F> + Send + Sync,
{
    /// Creates a codec, validating the parameters against the field once.
    pub fn new(config: WireConfig, fri_params: FriParams) -> MarshalResult<Self> {
        fri_params.validate()?;
        config.check_field::<F>()?;
        Ok(Self {
            config,
            fri_params,
            _field: PhantomData,
        })
    }

    /// Selects the LPC layout for `scheme`.
    ///
    /// Schemes outside the LPC family are rejected with
    /// [`MarshalError::UnsupportedScheme`].
    pub fn for_scheme(scheme: &CommitmentScheme, config: WireConfig) -> MarshalResult<Self> {
        let lpc = scheme
            .as_lpc()
            .ok_or_else(|| MarshalError::UnsupportedScheme(scheme.name().to_string()))?;
        Self::new(config, lpc.fri_params.clone())
    }

    #[must_use]
    pub const fn config(&self) -> &WireConfig {
        &self.config
    }

    #[must_use]
    pub const fn fri_params(&self) -> &FriParams {
        &self.fri_params
    }

    pub fn encode_commitment(
        &self,
        commitment: &MerkleDigest<F, DIGEST_ELEMS>,
    ) -> MarshalResult<WireForm> {
        encode_commitment(commitment, &self.config)
    }

    pub fn decode_commitment(&self, wire: &[u8]) -> MarshalResult<MerkleDigest<F, DIGEST_ELEMS>> {
        decode_commitment(wire, &self.config)
    }

    pub fn encode_eval_proof(
        &self,
        proof: &EvalProof<F, EF, DIGEST_ELEMS>,
    ) -> MarshalResult<WireForm> {
        encode_eval_proof(proof, &self.fri_params, &self.config)
    }

    pub fn decode_eval_proof(&self, wire: &[u8]) -> MarshalResult<EvalProof<F, EF, DIGEST_ELEMS>> {
        decode_eval_proof(wire, &self.fri_params, &self.config)
    }

    /// Decodes independent evaluation proofs, in parallel with the `parallel`
    /// feature. Results are returned in input order.
    #[instrument(skip_all, fields(count = wires.len()))]
    pub fn decode_eval_proofs(
        &self,
        wires: &[WireForm],
    ) -> Vec<MarshalResult<EvalProof<F, EF, DIGEST_ELEMS>>> {
        let decoded: Vec<_> = wires
            .par_iter()
            .map(|wire| self.decode_eval_proof(wire.as_bytes()))
            .collect();
        info!(
            failed = decoded.iter().filter(|result| result.is_err()).count(),
            "decoded evaluation proofs"
        );
        decoded
    }
}
