//! Protocol parameters fixing the shape of a FRI proof.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest initial evaluation domain, bounded by the `u32` leaf index on the wire.
pub const MAX_LOG_DOMAIN_SIZE: usize = 32;

/// Errors that can occur when validating FRI parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FriParamsError {
    /// At least one query is required.
    #[error("FRI proofs need at least one query")]
    NoQueries,

    /// At least one folding round is required.
    #[error("FRI proofs need at least one folding round")]
    NoRounds,

    /// A folding step must reduce the domain.
    #[error("folding step of round {0} is zero")]
    ZeroStep(usize),

    /// The domain cannot absorb the requested folding.
    #[error("domain of size 2^{log_domain_size} is too small, 2^{required} needed")]
    DomainTooSmall {
        log_domain_size: usize,
        required: usize,
    },

    /// The domain exceeds what a Merkle leaf index can address.
    #[error("domain of size 2^{0} exceeds 2^32")]
    DomainTooLarge(usize),

    /// The final polynomial must have at least one coefficient.
    #[error("final polynomial length is zero")]
    EmptyFinalPolynomial,
}

/// FRI parameters agreed out of band by prover and verifier.
///
/// Nothing here is transmitted; both sides must use equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FriParams {
    /// Number of query repetitions.
    pub num_queries: usize,
    /// Log2 of the initial evaluation domain size.
    pub log_domain_size: usize,
    /// Log2 of the folding arity of each round.
    pub fold_steps: Vec<usize>,
    /// Number of coefficients of the final polynomial.
    pub final_poly_len: usize,
}

impl FriParams {
    /// Checks that every derived size is well defined.
    pub fn validate(&self) -> Result<(), FriParamsError> {
        if self.num_queries == 0 {
            return Err(FriParamsError::NoQueries);
        }
        if self.fold_steps.is_empty() {
            return Err(FriParamsError::NoRounds);
        }
        if let Some(round) = self.fold_steps.iter().position(|&step| step == 0) {
            return Err(FriParamsError::ZeroStep(round));
        }
        if self.log_domain_size > MAX_LOG_DOMAIN_SIZE {
            return Err(FriParamsError::DomainTooLarge(self.log_domain_size));
        }
        // The last round still opens a pair of points in the final layer
        let required = self
            .fold_steps
            .iter()
            .try_fold(1usize, |acc, &step| acc.checked_add(step))
            .unwrap_or(usize::MAX);
        if required > self.log_domain_size {
            return Err(FriParamsError::DomainTooSmall {
                log_domain_size: self.log_domain_size,
                required,
            });
        }
        if self.final_poly_len == 0 {
            return Err(FriParamsError::EmptyFinalPolynomial);
        }
        Ok(())
    }

    /// Number of folding rounds, which is also the number of layer commitments.
    #[must_use]
    pub fn num_rounds(&self) -> usize {
        self.fold_steps.len()
    }

    /// Log2 size of layer `layer`; layer 0 is the initial domain.
    fn layer_log_size(&self, layer: usize) -> usize {
        self.log_domain_size - self.fold_steps[..layer].iter().sum::<usize>()
    }

    /// Log2 of the coset opened in round `round`'s layer.
    fn round_step(&self, round: usize) -> usize {
        self.fold_steps.get(round + 1).copied().unwrap_or(1)
    }

    /// Values opened per polynomial in an initial (batch) opening.
    ///
    /// # Panics
    ///
    /// Panics if the parameters do not pass [`Self::validate`].
    #[must_use]
    pub fn initial_coset_size(&self) -> usize {
        1 << self.fold_steps[0]
    }

    /// Merkle depth of an initial (batch) opening.
    ///
    /// # Panics
    ///
    /// Panics if the parameters do not pass [`Self::validate`].
    #[must_use]
    pub fn initial_path_depth(&self) -> usize {
        self.log_domain_size - self.fold_steps[0]
    }

    /// Values opened in the layer committed after round `round`.
    ///
    /// # Panics
    ///
    /// Panics if the parameters do not pass [`Self::validate`].
    #[must_use]
    pub fn round_coset_size(&self, round: usize) -> usize {
        1 << self.round_step(round)
    }

    /// Merkle depth of the opening in the layer committed after round `round`.
    ///
    /// # Panics
    ///
    /// Panics if the parameters do not pass [`Self::validate`].
    #[must_use]
    pub fn round_path_depth(&self, round: usize) -> usize {
        self.layer_log_size(round + 1) - self.round_step(round)
    }
}
