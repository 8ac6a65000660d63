//! # MemLib
//!
//! Memlib is a library for functional cache simulation: a set-associative,
//! LRU-evicting cache in front of a flat byte-addressable memory, moving real
//! bytes rather than just counting hits
//!
//! Timing is not modelled. Given a fixed access trace the simulation is fully
//! deterministic, which is what makes hit/miss behaviour, set mapping, and
//! eviction choices easy to study and test

/// Contains the address decomposition into (tag, index, offset) fields
pub mod addr;

/// Contains the cache blocks and their organisation into sets
pub mod cache;

/// Contains definitions for the JSON configuration format and the derived
/// cache geometry
pub mod config;

/// Contains the two fatal error kinds of a simulation run
pub mod error;

/// Contains trace file handling
pub mod io;

/// Contains the per-set least-recently-used eviction state
pub mod lru;

/// Contains the backing memory and the word byte codec
pub mod memory;

/// Contains the controller orchestrating each access, and the simulator that
/// drives it over a trace
pub mod simulator;

/// Contains the trace operation type and the text trace parser
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
