//! Ordered bundles of independently encoded fields.
//!
//! Layout: `u32 field_count`, then for every field `u32 len || bytes`.
//! The framing lets a decoder split a bundle into its parts before any part is
//! interpreted, which is what allows the evaluation-proof codec to decode the
//! parts one after the other.

use alloc::vec::Vec;

use super::{
    WireConfig, WireForm,
    errors::{MarshalResult, WireFault, WireSection},
    field::{INTEGRAL_BYTES, encode_integral},
    reader::WireReader,
};

/// Wraps already encoded fields, in order, into one bundle.
pub fn encode_bundle(fields: &[WireForm], config: &WireConfig) -> MarshalResult<WireForm> {
    let body: usize = fields.iter().map(WireForm::len).sum();
    let mut out = Vec::with_capacity(INTEGRAL_BYTES * (fields.len() + 1) + body);

    encode_integral(&mut out, fields.len(), config)?;
    for field in fields {
        encode_integral(&mut out, field.len(), config)?;
        out.extend_from_slice(field.as_bytes());
    }
    Ok(WireForm::new(out))
}

/// Splits a bundle into exactly `expected` field slices, in wire order.
///
/// The whole input must be consumed.
pub fn split_bundle<'a>(
    wire: &'a [u8],
    expected: usize,
    config: &WireConfig,
) -> MarshalResult<Vec<&'a [u8]>> {
    let mut reader = WireReader::new(wire, WireSection::Bundle);

    let actual = reader.read_u32(config, "field_count")? as usize;
    if actual != expected {
        return Err(reader.fault(WireFault::FieldCount { expected, actual }));
    }

    let mut fields = Vec::with_capacity(expected);
    for _ in 0..expected {
        let len = reader.read_u32(config, "field_len")? as usize;
        fields.push(reader.read_exact(len, "field")?);
    }
    reader.finish()?;

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::marshalling::{Endianness, errors::MarshalError};

    fn le() -> WireConfig {
        WireConfig::new(Endianness::Little, 31).unwrap()
    }

    #[test]
    fn test_bundle_layout() {
        let fields = [WireForm::new(vec![0xAA]), WireForm::new(vec![0xBB, 0xCC])];
        let wire = encode_bundle(&fields, &le()).unwrap();

        assert_eq!(
            wire.as_bytes(),
            &[
                2, 0, 0, 0, // field count
                1, 0, 0, 0, 0xAA, // first field
                2, 0, 0, 0, 0xBB, 0xCC, // second field
            ]
        );

        let parts = split_bundle(wire.as_bytes(), 2, &le()).unwrap();
        assert_eq!(parts, vec![&[0xAAu8][..], &[0xBB, 0xCC][..]]);
    }

    #[test]
    fn test_big_endian_framing() {
        let be = WireConfig::new(Endianness::Big, 31).unwrap();
        let wire = encode_bundle(&[WireForm::new(vec![7])], &be).unwrap();
        assert_eq!(wire.as_bytes(), &[0, 0, 0, 1, 0, 0, 0, 1, 7]);
    }

    #[test]
    fn test_split_rejects_wrong_field_count() {
        let wire = encode_bundle(&[WireForm::new(vec![1, 2, 3])], &le()).unwrap();
        assert_eq!(
            split_bundle(wire.as_bytes(), 2, &le()),
            Err(MarshalError::malformed(
                WireSection::Bundle,
                WireFault::FieldCount {
                    expected: 2,
                    actual: 1
                }
            ))
        );
    }

    #[test]
    fn test_split_rejects_every_truncation() {
        let fields = [WireForm::new(vec![1, 2, 3]), WireForm::new(vec![4, 5])];
        let wire = encode_bundle(&fields, &le()).unwrap();

        for cut in 0..wire.len() {
            let err = split_bundle(&wire.as_bytes()[..cut], 2, &le()).unwrap_err();
            assert!(err.is_malformed(), "cut at {cut} gave {err:?}");
        }
    }

    #[test]
    fn test_split_rejects_trailing_bytes() {
        let mut bytes = encode_bundle(&[WireForm::new(vec![9])], &le())
            .unwrap()
            .into_bytes();
        bytes.push(0);
        assert_eq!(
            split_bundle(&bytes, 1, &le()),
            Err(MarshalError::malformed(
                WireSection::Bundle,
                WireFault::TrailingBytes {
                    consumed: 9,
                    remaining: 1
                }
            ))
        );
    }
}
