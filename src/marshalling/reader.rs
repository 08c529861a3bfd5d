//! Bounded cursor over an encoded field.

use super::{
    Endianness, WireConfig,
    errors::{MarshalError, MarshalResult, WireFault, WireSection},
};

/// Cursor over a byte slice that reports failures against a [`WireSection`].
///
/// All reads are bounds-checked; running past the end of the input yields
/// [`WireFault::UnexpectedEnd`] rather than a panic.
#[derive(Debug, Clone, Copy)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    section: WireSection,
}

impl<'a> WireReader<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8], section: WireSection) -> Self {
        Self {
            bytes,
            offset: 0,
            section,
        }
    }

    #[must_use]
    pub const fn section(&self) -> WireSection {
        self.section
    }

    /// Current offset within the slice.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.offset
    }

    /// Number of bytes not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Builds a malformed-wire error tagged with this reader's section.
    #[must_use]
    pub const fn fault(&self, fault: WireFault) -> MarshalError {
        MarshalError::malformed(self.section, fault)
    }

    /// Reads exactly `len` bytes.
    pub fn read_exact(&mut self, len: usize, field: &'static str) -> MarshalResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.fault(WireFault::UnexpectedEnd { field }));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..start + len])
    }

    /// Reads a `u32` in the configured byte order.
    pub fn read_u32(&mut self, config: &WireConfig, field: &'static str) -> MarshalResult<u32> {
        let bytes = self.read_exact(4, field)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        Ok(match config.endianness() {
            Endianness::Little => u32::from_le_bytes(raw),
            Endianness::Big => u32::from_be_bytes(raw),
        })
    }

    /// Reads a count prefix and checks that `count * min_item_len` bytes remain.
    ///
    /// This rejects absurd prefixes before anything is allocated for them.
    pub fn read_count(
        &mut self,
        config: &WireConfig,
        min_item_len: usize,
        field: &'static str,
    ) -> MarshalResult<usize> {
        let count = self.read_u32(config, field)? as usize;
        let needed = count.checked_mul(min_item_len);
        if needed.is_none_or(|needed| needed > self.remaining()) {
            return Err(self.fault(WireFault::InvalidLength { field }));
        }
        Ok(count)
    }

    /// Fails unless every byte has been consumed.
    pub const fn finish(self) -> MarshalResult<()> {
        if self.remaining() != 0 {
            return Err(self.fault(WireFault::TrailingBytes {
                consumed: self.offset,
                remaining: self.remaining(),
            }));
        }
        Ok(())
    }
}
