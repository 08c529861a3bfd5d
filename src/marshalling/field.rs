//! Integral and field element encodings.
//!
//! Base field elements are written as their canonical `u64` value truncated to
//! [`WireConfig::element_bytes`] bytes. Extension field elements are written as
//! their basis coefficients, lowest degree first.

use alloc::vec::Vec;

use p3_field::{BasedVectorSpace, PrimeField64};

use super::{
    Endianness, WireConfig,
    errors::{MarshalError, MarshalResult, WireFault},
    reader::WireReader,
};

/// Size of every integral (count, length, index) on the wire.
pub const INTEGRAL_BYTES: usize = 4;

/// Writes a `u32` in the configured byte order.
pub fn write_u32(out: &mut Vec<u8>, value: u32, config: &WireConfig) {
    match config.endianness() {
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
}

/// Writes a count, length or index as a `u32` integral.
pub fn encode_integral(out: &mut Vec<u8>, value: usize, config: &WireConfig) -> MarshalResult<()> {
    let value = u32::try_from(value).map_err(|_| MarshalError::LengthOverflow(value))?;
    write_u32(out, value, config);
    Ok(())
}

/// Number of bytes used by one element of `EF` over the base field `F`.
#[must_use]
pub const fn ext_bytes<F: PrimeField64, EF: BasedVectorSpace<F>>(config: &WireConfig) -> usize {
    EF::DIMENSION * config.element_bytes()
}

/// Writes a base field element.
///
/// The caller is expected to have validated the width with
/// [`WireConfig::check_field`].
pub fn write_base<F: PrimeField64>(out: &mut Vec<u8>, value: F, config: &WireConfig) {
    let width = config.element_bytes();
    let raw = value.as_canonical_u64();
    match config.endianness() {
        Endianness::Little => out.extend_from_slice(&raw.to_le_bytes()[..width]),
        Endianness::Big => out.extend_from_slice(&raw.to_be_bytes()[8 - width..]),
    }
}

/// Reads a base field element, rejecting non-canonical encodings.
pub fn read_base<F: PrimeField64>(
    reader: &mut WireReader<'_>,
    config: &WireConfig,
    field: &'static str,
) -> MarshalResult<F> {
    let width = config.element_bytes();
    let bytes = reader.read_exact(width, field)?;
    let mut raw = [0u8; 8];
    let value = match config.endianness() {
        Endianness::Little => {
            raw[..width].copy_from_slice(bytes);
            u64::from_le_bytes(raw)
        }
        Endianness::Big => {
            raw[8 - width..].copy_from_slice(bytes);
            u64::from_be_bytes(raw)
        }
    };
    if value >= F::ORDER_U64 {
        return Err(reader.fault(WireFault::NonCanonical { field }));
    }
    Ok(F::from_u64(value))
}

/// Writes an extension field element as its basis coefficients.
pub fn write_ext<F, EF>(out: &mut Vec<u8>, value: &EF, config: &WireConfig)
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    for &coeff in value.as_basis_coefficients_slice() {
        write_base(out, coeff, config);
    }
}

/// Reads an extension field element.
pub fn read_ext<F, EF>(
    reader: &mut WireReader<'_>,
    config: &WireConfig,
    field: &'static str,
) -> MarshalResult<EF>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    let coeffs = (0..EF::DIMENSION)
        .map(|_| read_base::<F>(reader, config, field))
        .collect::<MarshalResult<Vec<_>>>()?;
    EF::from_basis_coefficients_slice(&coeffs)
        .ok_or_else(|| reader.fault(WireFault::NonCanonical { field }))
}

/// Writes a run of extension elements whose count is known from context.
pub fn write_ext_array<F, EF>(out: &mut Vec<u8>, values: &[EF], config: &WireConfig)
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    for value in values {
        write_ext::<F, EF>(out, value, config);
    }
}

/// Reads `count` extension elements.
pub fn read_ext_array<F, EF>(
    reader: &mut WireReader<'_>,
    count: usize,
    config: &WireConfig,
    field: &'static str,
) -> MarshalResult<Vec<EF>>
where
    F: PrimeField64,
    EF: BasedVectorSpace<F>,
{
    // Fail before allocating if the input cannot possibly hold `count` elements
    if count.saturating_mul(ext_bytes::<F, EF>(config)) > reader.remaining() {
        return Err(reader.fault(WireFault::UnexpectedEnd { field }));
    }
    (0..count)
        .map(|_| read_ext::<F, EF>(reader, config, field))
        .collect()
}
