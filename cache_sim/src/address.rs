//! Address decomposition into offset / index / tag

use std::fmt;

use serde::Serialize;

use crate::{
    bin::{count_bits, extract},
    config::{ConfigError, Mapping, BLOCK_SIZE},
};

pub const ADDRESS_BITS: u32 = u32::BITS;
pub const OFFSET_BITS: u32 = count_bits(BLOCK_SIZE);

/// Bit widths of the three address fields. They always add up to 32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressFields {
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

/// Fields extracted from one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedAddress {
    pub offset: u32,
    pub index: u32,
    pub tag: u32,
}

/// computes field widths for a bank of `bank_length` blocks.
///
/// fully associative banks have no index field.
pub fn compute_fields(bank_length: u32, mapping: Mapping) -> Result<AddressFields, ConfigError> {
    if bank_length == 0 {
        return Err(ConfigError::Geometry { bank_length });
    }
    let offset_bits = OFFSET_BITS;
    let index_bits = match mapping {
        Mapping::DirectMapped => count_bits(bank_length),
        Mapping::FullyAssociative => 0,
    };
    let tag_bits = ADDRESS_BITS
        .checked_sub(offset_bits + index_bits)
        .ok_or(ConfigError::Geometry { bank_length })?;
    Ok(AddressFields {
        offset_bits,
        index_bits,
        tag_bits,
    })
}

impl AddressFields {
    /// splits `address` into its fields.
    /// ```
    /// use cache_sim::{address::compute_fields, config::Mapping};
    ///
    /// let fields = compute_fields(64, Mapping::DirectMapped).unwrap();
    /// let d = fields.decode(0x8cda3fa8);
    /// assert_eq!((d.offset, d.index, d.tag), (0x28, 0x3e, 0x8cda3));
    /// ```
    #[inline]
    pub fn decode(&self, address: u32) -> DecodedAddress {
        DecodedAddress {
            offset: extract(address, 0, self.offset_bits),
            index: extract(address, self.offset_bits, self.index_bits),
            tag: extract(address, self.offset_bits + self.index_bits, self.tag_bits),
        }
    }
}

impl fmt::Display for AddressFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "offset: {}, index: {}, tag: {}",
            self.offset_bits, self.index_bits, self.tag_bits
        )
    }
}

impl fmt::Display for DecodedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tag: {:#x}, idx: {:#x}, offset: {:#x}",
            self.tag, self.index, self.offset
        )
    }
}
