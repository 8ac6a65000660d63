use thiserror::Error;

/// Fatal simulation errors. The simulated machine has no recovery path: a bad
/// configuration aborts before the first access, and a bad access aborts the
/// run before mutating any cache or memory state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// The cache geometry was rejected at startup.
    #[error("cache configuration rejected: {0}")]
    Configuration(String),

    /// An access address (or a set index derived from one) was rejected.
    #[error("invalid memory access: {0}")]
    InvalidAddress(AccessFault),
}

/// The reason an access was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFault {
    /// The address is not a multiple of the word size.
    Misaligned(u32),
    /// The address is outside the backing memory.
    OutOfBounds(u32),
    /// A derived set index fell outside the cache.
    SetOutOfRange(usize),
}

impl std::fmt::Display for AccessFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessFault::Misaligned(address) => {
                write!(f, "{address} is not aligned to the word size")
            }
            AccessFault::OutOfBounds(address) => {
                write!(f, "{address} is not a valid memory address")
            }
            AccessFault::SetOutOfRange(set) => {
                write!(f, "set index {set} is outside the cache")
            }
        }
    }
}
