//! Error types shared by every codec in the crate.

use alloc::string::String;
use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fri::params::FriParamsError;

/// Part of the wire form being processed when a failure was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireSection {
    /// Top-level commitment digest.
    Commitment,
    /// Ordered bundle framing.
    Bundle,
    /// Evaluation-point storage field.
    EvalStorage,
    /// FRI proof field.
    FriProof,
    /// Merkle authentication path inside a FRI opening.
    MerklePath,
}

impl fmt::Display for WireSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commitment => "commitment",
            Self::Bundle => "bundle",
            Self::EvalStorage => "evaluation storage",
            Self::FriProof => "fri proof",
            Self::MerklePath => "merkle path",
        })
    }
}

/// Structural defect found in a wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum WireFault {
    /// Input ended before `field` could be read.
    #[error("unexpected end of input while reading `{field}`")]
    UnexpectedEnd { field: &'static str },

    /// Bytes remained after the expected payload was consumed.
    #[error("{remaining} trailing bytes after offset {consumed}")]
    TrailingBytes { consumed: usize, remaining: usize },

    /// A bundle declared a different number of fields than the layout has.
    #[error("expected {expected} bundle fields, found {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A count or length prefix cannot be satisfied by the remaining input.
    #[error("length prefix of `{field}` is out of bounds")]
    InvalidLength { field: &'static str },

    /// A field element was not in canonical form.
    #[error("non-canonical field element in `{field}`")]
    NonCanonical { field: &'static str },

    /// An index does not fit in the range implied by its context.
    #[error("index {index} of `{field}` is out of range (bound {bound})")]
    IndexOutOfRange {
        field: &'static str,
        index: u64,
        bound: u64,
    },

    /// Batch ids were not strictly increasing.
    #[error("batch {id} does not follow batch {previous}")]
    UnorderedBatch { previous: usize, id: usize },

    /// A batch declared zero polynomials or zero points.
    #[error("batch {id} is empty")]
    EmptyBatch { id: usize },
}

/// Errors surfaced while encoding or decoding LPC proof objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The wire data is structurally invalid.
    #[error("malformed {section}: {fault}")]
    MalformedWire {
        section: WireSection,
        fault: WireFault,
    },

    /// The batch structure re-derived from the evaluation storage disagrees
    /// with the structure carried by the FRI proof.
    #[error("inconsistent {what}: expected {expected}, found {actual}")]
    InconsistentStructure {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The field modulus does not fit in the configured element width.
    #[error("field elements need {required} bits but the wire width is {available} bits")]
    FieldWidthOverflow { required: usize, available: usize },

    /// The configured element width is outside the supported range.
    #[error("unsupported field width of {0} bits")]
    InvalidFieldWidth(usize),

    /// Unknown endianness tag.
    #[error("invalid endianness tag {0:#04x}")]
    InvalidEndianness(u8),

    /// A count does not fit in a `u32` length prefix.
    #[error("length {0} does not fit in a u32 prefix")]
    LengthOverflow(usize),

    /// The FRI parameters are unusable.
    #[error(transparent)]
    InvalidFriParams(#[from] FriParamsError),

    /// An in-memory proof violates a layout precondition.
    #[error("invalid proof: {0}")]
    InvalidProof(&'static str),

    /// The commitment scheme does not use the LPC layout.
    #[error("commitment scheme `{0}` is not an LPC-family scheme")]
    UnsupportedScheme(String),
}

impl MarshalError {
    /// Shorthand for a [`MarshalError::MalformedWire`] error.
    pub const fn malformed(section: WireSection, fault: WireFault) -> Self {
        Self::MalformedWire { section, fault }
    }

    /// Returns `true` for malformed wire data.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedWire { .. })
    }

    /// Returns `true` for batch structure mismatches.
    #[must_use]
    pub const fn is_inconsistent(&self) -> bool {
        matches!(self, Self::InconsistentStructure { .. })
    }
}

/// Result alias used by all codecs.
pub type MarshalResult<T> = Result<T, MarshalError>;
