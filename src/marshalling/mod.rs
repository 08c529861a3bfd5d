//! Generic byte-level codec primitives.
//!
//! Every encoder and decoder in the crate receives an explicit [`WireConfig`]
//! describing the byte order of multi-byte values and the width of a single
//! field element on the wire. The layouts built from these primitives are
//! canonical: equal values always produce identical bytes.

use alloc::{format, string::String, vec::Vec};
use core::{fmt, str::FromStr};

use p3_field::PrimeField64;
use serde::{Deserialize, Serialize};

pub mod bundle;
pub mod errors;
pub mod field;
pub mod reader;

use errors::{MarshalError, MarshalResult};

/// Largest element width supported by the field codec.
pub const MAX_FIELD_BITS: usize = 64;

/// Byte order applied to integrals and field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Endianness {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Parses the single-byte tag used when a configuration travels out of band.
    pub const fn from_tag(tag: u8) -> MarshalResult<Self> {
        match tag {
            0 => Ok(Self::Little),
            1 => Ok(Self::Big),
            _ => Err(MarshalError::InvalidEndianness(tag)),
        }
    }

    /// Single-byte tag of this byte order.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Little => 0,
            Self::Big => 1,
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Little => "little",
            Self::Big => "big",
        })
    }
}

impl FromStr for Endianness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" | "le" => Ok(Self::Little),
            "big" | "be" => Ok(Self::Big),
            _ => Err(format!("Invalid endianness: {s}")),
        }
    }
}

/// Wire layout configuration passed down through every codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWireConfig")]
pub struct WireConfig {
    endianness: Endianness,
    field_bits: usize,
}

impl WireConfig {
    /// Creates a configuration, rejecting element widths outside `1..=64` bits.
    pub const fn new(endianness: Endianness, field_bits: usize) -> MarshalResult<Self> {
        if field_bits == 0 || field_bits > MAX_FIELD_BITS {
            return Err(MarshalError::InvalidFieldWidth(field_bits));
        }
        Ok(Self {
            endianness,
            field_bits,
        })
    }

    /// Configuration sized to the modulus of `F`.
    #[must_use]
    pub const fn for_field<F: PrimeField64>(endianness: Endianness) -> Self {
        Self {
            endianness,
            field_bits: modulus_bits::<F>(),
        }
    }

    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[must_use]
    pub const fn field_bits(&self) -> usize {
        self.field_bits
    }

    /// Number of bytes a single base field element occupies.
    #[must_use]
    pub const fn element_bytes(&self) -> usize {
        self.field_bits.div_ceil(8)
    }

    /// Ensures every canonical element of `F` fits in the configured width.
    pub const fn check_field<F: PrimeField64>(&self) -> MarshalResult<()> {
        let required = modulus_bits::<F>();
        if required > self.field_bits {
            return Err(MarshalError::FieldWidthOverflow {
                required,
                available: self.field_bits,
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawWireConfig {
    endianness: Endianness,
    field_bits: usize,
}

impl TryFrom<RawWireConfig> for WireConfig {
    type Error = MarshalError;

    fn try_from(raw: RawWireConfig) -> Result<Self, Self::Error> {
        Self::new(raw.endianness, raw.field_bits)
    }
}

/// Number of bits needed to represent the largest canonical element of `F`.
#[must_use]
pub const fn modulus_bits<F: PrimeField64>() -> usize {
    (u64::BITS - (F::ORDER_U64 - 1).leading_zeros()) as usize
}

/// Encoded byte-level representation of a proof object.
///
/// The contents are only meaningful to the codec that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WireForm(Vec<u8>);

impl WireForm {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for WireForm {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for WireForm {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
