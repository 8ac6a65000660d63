use crate::config::{CacheConfig, WORD_SIZE_BYTES};
use crate::error::{AccessFault, SimError};

/// The three fields of a decomposed address. Bit 0 is the least significant:
/// the offset occupies the low bits, the index the middle bits, and the tag
/// whatever remains of the 32-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFields {
    pub tag: u32,
    pub index: u32,
    pub offset: u32,
}

/// Splits raw addresses into (tag, index, offset) for a fixed cache geometry
///
/// The field widths are derived once at construction and extraction is pure
/// shifting and masking, so decoding is exact for every address representable
/// in 32 bits
#[derive(Debug, Clone)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_bits: u32,
    offset_mask: u32,
    index_mask: u32,
    memory_size: u32,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfig) -> Self {
        let offset_bits = config.offset_bits();
        let index_bits = config.index_bits();
        Self {
            offset_bits,
            index_bits,
            offset_mask: (1 << offset_bits) - 1,
            index_mask: (1 << index_bits) - 1,
            memory_size: config.memory_size,
        }
    }

    /// Rejects addresses the simulated machine cannot access: anything not
    /// word aligned, and anything beyond the backing memory. Checked before
    /// an access mutates any state.
    pub fn validate(&self, address: u32) -> Result<(), SimError> {
        if address % WORD_SIZE_BYTES != 0 {
            return Err(SimError::InvalidAddress(AccessFault::Misaligned(address)));
        }
        if address >= self.memory_size {
            return Err(SimError::InvalidAddress(AccessFault::OutOfBounds(address)));
        }
        Ok(())
    }

    /// Splits an address into its fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use memlib::addr::AddressDecoder;
    /// use memlib::config::CacheConfig;
    ///
    /// // 64-byte blocks, 16 blocks, direct mapped: 6 offset bits, 4 index bits
    /// let config = CacheConfig { associativity: 1, ..CacheConfig::default() };
    /// let fields = AddressDecoder::new(&config).decode(17536);
    /// assert_eq!((fields.tag, fields.index, fields.offset), (17, 2, 0));
    /// ```
    pub fn decode(&self, address: u32) -> AddressFields {
        AddressFields {
            tag: address >> (self.offset_bits + self.index_bits),
            index: (address >> self.offset_bits) & self.index_mask,
            offset: address & self.offset_mask,
        }
    }

    /// Exact inverse of [`decode`](Self::decode).
    pub fn reassemble(&self, fields: AddressFields) -> u32 {
        (fields.tag << (self.offset_bits + self.index_bits))
            | (fields.index << self.offset_bits)
            | fields.offset
    }

    /// The base address of the block a resident (tag, index) pair was loaded
    /// from. Used when a dirty block has to be written back on eviction.
    pub fn block_base(&self, tag: u32, index: u32) -> u32 {
        self.reassemble(AddressFields { tag, index, offset: 0 })
    }
}
