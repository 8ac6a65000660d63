use crate::config::WORD_SIZE_BYTES;
use crate::trace::TraceOp;

/// Reads sweeping the memory at a fixed stride, wrapping at the end. A stride
/// equal to the block size misses on every access, a word-sized stride hits
/// on most.
pub fn strided_reads(memory_size: u32, stride: u32, count: usize) -> Vec<TraceOp> {
    let mut address = 0u32;
    (0..count)
        .map(|_| {
            let op = TraceOp::Read(address);
            address = (address + stride) % memory_size;
            op
        })
        .collect()
}

/// A deterministic pseudo-random read/write mix, for exercising eviction and
/// write paths in benchmarks. Every fourth op is a write.
pub fn mixed_ops(memory_size: u32, count: usize, seed: u64) -> Vec<TraceOp> {
    let words = (memory_size / WORD_SIZE_BYTES) as u64;
    let mut state = seed | 1;
    (0..count)
        .map(|i| {
            // Plain LCG, keeps the trace reproducible without extra crates
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let address = ((state >> 33) % words) as u32 * WORD_SIZE_BYTES;
            if i % 4 == 3 {
                TraceOp::Write(address, (state >> 17) as i32)
            } else {
                TraceOp::Read(address)
            }
        })
        .collect()
}
