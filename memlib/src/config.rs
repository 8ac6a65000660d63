use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Width of a machine word, and of an address, in bits.
pub const WORD_SIZE_BITS: u32 = 32;

/// Width of a machine word in bytes. Every access address must be a multiple
/// of this.
pub const WORD_SIZE_BYTES: u32 = WORD_SIZE_BITS / 8;

/// Hard upper bound on the cache size in bytes, independent of the memory
/// size.
pub const CACHE_SIZE_CAP: u32 = 500_000;

/// A configuration for a single simulated cache in front of a flat memory
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_size")]
    pub cache_size: u32,
    #[serde(default = "default_block_size")]
    pub block_size: u32,
    #[serde(default = "default_associativity")]
    pub associativity: u32,
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,
    #[serde(default = "WritePolicy::default")]
    pub write_policy: WritePolicy,
}

fn default_cache_size() -> u32 {
    1024
}

fn default_block_size() -> u32 {
    64
}

fn default_associativity() -> u32 {
    2
}

fn default_memory_size() -> u32 {
    65536
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            block_size: default_block_size(),
            associativity: default_associativity(),
            memory_size: default_memory_size(),
            write_policy: WritePolicy::default(),
        }
    }
}

/// The write policy - write-through or write-back. Defaults to write-through.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum WritePolicy {
    #[serde(alias = "write-through", alias = "wt")]
    WriteThrough,
    #[serde(alias = "write-back", alias = "wb")]
    WriteBack,
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::WriteThrough
    }
}

impl WritePolicy {
    /// The label reported alongside write events
    pub fn label(&self) -> &'static str {
        match self {
            WritePolicy::WriteThrough => "Write-through",
            WritePolicy::WriteBack => "Write-back",
        }
    }
}

impl CacheConfig {
    /// Checks the geometry once, before any access is processed.
    ///
    /// The bit-field split of an address is only exact when the block size and
    /// the number of sets are powers of two, so anything else is rejected
    /// here rather than producing silently wrong tags later.
    pub fn validate(&self) -> Result<(), SimError> {
        let reject = |reason: String| Err(SimError::Configuration(reason));
        if self.cache_size > self.memory_size {
            return reject(format!(
                "cache of {} bytes exceeds the memory of {} bytes",
                self.cache_size, self.memory_size
            ));
        }
        if self.cache_size > CACHE_SIZE_CAP {
            return reject(format!(
                "cache of {} bytes exceeds the hard cap of {CACHE_SIZE_CAP} bytes",
                self.cache_size
            ));
        }
        if !self.block_size.is_power_of_two() || self.block_size < WORD_SIZE_BYTES {
            return reject(format!(
                "block size {} must be a power of two of at least {WORD_SIZE_BYTES} bytes",
                self.block_size
            ));
        }
        if self.cache_size % self.block_size != 0 || !(self.cache_size / self.block_size).is_power_of_two() {
            return reject(format!(
                "cache size {} must be a power-of-two multiple of the block size {}",
                self.cache_size, self.block_size
            ));
        }
        let num_blocks = self.cache_size / self.block_size;
        if self.associativity == 0 || num_blocks % self.associativity != 0 {
            return reject(format!(
                "associativity {} must evenly divide the {num_blocks} blocks",
                self.associativity
            ));
        }
        if !(num_blocks / self.associativity).is_power_of_two() {
            return reject(format!(
                "{num_blocks} blocks at associativity {} give a non-power-of-two set count",
                self.associativity
            ));
        }
        if self.memory_size % WORD_SIZE_BYTES != 0 {
            return reject(format!(
                "memory size {} must be a multiple of the word size",
                self.memory_size
            ));
        }
        if self.offset_bits() + self.index_bits() >= WORD_SIZE_BITS {
            return reject("geometry leaves no tag bits in a 32-bit address".to_string());
        }
        Ok(())
    }

    /// Total number of blocks in the cache
    pub fn num_blocks(&self) -> u32 {
        self.cache_size / self.block_size
    }

    /// Number of sets, each holding `associativity` blocks
    pub fn num_sets(&self) -> u32 {
        self.num_blocks() / self.associativity
    }

    /// Bits of an address addressing a byte within a block
    pub fn offset_bits(&self) -> u32 {
        self.block_size.trailing_zeros()
    }

    /// Bits of an address selecting a set
    pub fn index_bits(&self) -> u32 {
        self.num_sets().trailing_zeros()
    }

    /// The remaining high bits of an address
    pub fn tag_bits(&self) -> u32 {
        WORD_SIZE_BITS - self.offset_bits() - self.index_bits()
    }
}
