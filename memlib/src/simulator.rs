use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::addr::{AddressDecoder, AddressFields};
use crate::cache::BlockStore;
use crate::config::{CacheConfig, WritePolicy};
use crate::error::SimError;
use crate::lru::LruQueues;
use crate::memory::MemoryStore;
use crate::trace::TraceOp;

/// Score awarded to a hit in the run summary
const HIT_SCORE: i64 = 50;
/// Score awarded to a miss in the run summary
const MISS_SCORE: i64 = -50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessKind {
    Read,
    Write,
}

/// Everything observable about a single access, in the order it happened.
///
/// The controller emits one of these per read or write; rendering them is the
/// reporting sink's business. `recency` is only populated for set-associative
/// caches, the direct mapped path has no recency state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    pub kind: AccessKind,
    pub hit: bool,
    pub address: u32,
    pub index: u32,
    pub tag: u32,
    pub word: i32,
    /// Inclusive block-aligned memory range the access falls in
    pub range_start: u32,
    pub range_end: u32,
    /// Resident tags of the affected set, oldest to newest
    pub recency: Option<Vec<u32>>,
    pub write_policy: WritePolicy,
}

/// A consumer of access events, fed in trace order
pub trait EventSink {
    fn record(&mut self, event: &AccessEvent);
}

impl EventSink for Vec<AccessEvent> {
    fn record(&mut self, event: &AccessEvent) {
        self.push(event.clone());
    }
}

/// Sink for callers only interested in the summary
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &AccessEvent) {}
}

/// Hit/miss statistics over a whole run. Can be serialised to the output
/// format
#[derive(Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct RunSummary {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub score: i64,
}

/// Orchestrates every access: decode, lookup, miss handling, eviction, and
/// the data transfer between blocks and memory
///
/// The controller exclusively owns the block store, the memory, and (for
/// set-associative geometries) the eviction policy for the lifetime of a run.
pub struct CacheController {
    decoder: AddressDecoder,
    store: BlockStore,
    memory: MemoryStore,
    lru: Option<LruQueues>,
    write_policy: WritePolicy,
    block_size: u32,
}

impl CacheController {
    /// Builds a controller for a configuration, rejecting bad geometry before
    /// any access is processed.
    pub fn new(config: &CacheConfig) -> Result<Self, SimError> {
        config.validate()?;
        debug!(
            blocks = config.num_blocks(),
            sets = config.num_sets(),
            associativity = config.associativity,
            tag_bits = config.tag_bits(),
            "cache geometry"
        );
        Ok(Self {
            decoder: AddressDecoder::new(config),
            store: BlockStore::new(config),
            memory: MemoryStore::new(config.memory_size),
            // Direct mapped caches have no recency to track, the single
            // candidate block is always the victim
            lru: (config.associativity > 1)
                .then(|| LruQueues::new(config.num_sets(), config.associativity)),
            write_policy: config.write_policy,
            block_size: config.block_size,
        })
    }

    /// Reads the word at `address` through the cache, installing the owning
    /// block on a miss.
    pub fn read_word(&mut self, address: u32) -> Result<AccessEvent, SimError> {
        let (fields, hit, evicted) = self.probe(address)?;
        let block_index = match hit {
            Some(index) => index,
            None => self.install(address, fields, evicted),
        };
        let word = self.store.block(block_index).word_at(fields.offset);
        Ok(self.event(AccessKind::Read, hit.is_some(), address, fields, word))
    }

    /// Writes a word at `address` through the cache.
    ///
    /// Both policies first make the block resident. Write-through then pushes
    /// the word to the block and memory and leaves the block clean;
    /// write-back updates the block alone and defers the memory update to
    /// eviction.
    pub fn write_word(&mut self, address: u32, word: i32) -> Result<AccessEvent, SimError> {
        let (fields, hit, evicted) = self.probe(address)?;
        let block_index = match hit {
            Some(index) => index,
            None => self.install(address, fields, evicted),
        };
        match self.write_policy {
            WritePolicy::WriteThrough => {
                self.store
                    .block_mut(block_index)
                    .write_word_at(fields.offset, word, false);
                self.memory.write_word(address, word);
            }
            WritePolicy::WriteBack => {
                self.store
                    .block_mut(block_index)
                    .write_word_at(fields.offset, word, true);
            }
        }
        Ok(self.event(AccessKind::Write, hit.is_some(), address, fields, word))
    }

    /// The shared front half of every access: validation, decode, recency
    /// update, lookup. Fails before any cache or memory state changes.
    fn probe(&mut self, address: u32) -> Result<(AddressFields, Option<usize>, Option<u32>), SimError> {
        self.decoder.validate(address)?;
        let fields = self.decoder.decode(address);
        // Recency is refreshed on every access, hit or miss alike
        let evicted = match self.lru.as_mut() {
            Some(lru) => lru.touch(fields.index as usize, fields.tag)?,
            None => None,
        };
        let hit = self.store.lookup(fields.index, fields.tag);
        Ok((fields, hit, evicted))
    }

    /// Services a miss: picks the victim, writes it back if the policy left
    /// it dirty, and fills the block from the aligned memory range.
    fn install(&mut self, address: u32, fields: AddressFields, evicted_tag: Option<u32>) -> usize {
        let victim = self.store.victim_index(fields.index, evicted_tag);
        let block = self.store.block(victim);
        if self.write_policy == WritePolicy::WriteBack && block.is_dirty() {
            if let Some(old_tag) = block.tag() {
                let base = self.decoder.block_base(old_tag, fields.index);
                debug!(base, set = fields.index, tag = old_tag, "writing back dirty block");
                self.memory.write_bytes(base, block.data());
            }
        }
        let base = address - address % self.block_size;
        trace!(address, set = fields.index, tag = fields.tag, "filling block");
        self.store
            .fill(victim, fields.tag, self.memory.block_at(base, self.block_size));
        victim
    }

    fn event(
        &self,
        kind: AccessKind,
        hit: bool,
        address: u32,
        fields: AddressFields,
        word: i32,
    ) -> AccessEvent {
        let range_start = address - address % self.block_size;
        AccessEvent {
            kind,
            hit,
            address,
            index: fields.index,
            tag: fields.tag,
            word,
            range_start,
            range_end: range_start + self.block_size - 1,
            recency: self
                .lru
                .as_ref()
                .map(|lru| lru.residency(fields.index as usize)),
            write_policy: self.write_policy,
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }
}

/// Drives a controller over a trace and collects results
///
/// Supports calling [`run`](Self::run) multiple times against the same cache
/// state, updating the summary and the time taken accordingly
pub struct Simulator {
    controller: CacheController,
    summary: RunSummary,
    simulation_time: Duration,
}

impl Simulator {
    pub fn new(config: &CacheConfig) -> Result<Self, SimError> {
        Ok(Self {
            controller: CacheController::new(config)?,
            summary: RunSummary::default(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Replays a trace, forwarding each access event to the sink in order.
    ///
    /// A fatal error aborts the run immediately; events already handed to the
    /// sink stand.
    pub fn run(
        &mut self,
        trace: &[TraceOp],
        sink: &mut impl EventSink,
    ) -> Result<&RunSummary, SimError> {
        let start = Instant::now();
        for op in trace {
            let event = match *op {
                TraceOp::Read(address) => self.controller.read_word(address)?,
                TraceOp::Write(address, word) => self.controller.write_word(address, word)?,
            };
            self.summary.accesses += 1;
            if event.hit {
                self.summary.hits += 1;
                self.summary.score += HIT_SCORE;
            } else {
                self.summary.misses += 1;
                self.summary.score += MISS_SCORE;
            }
            sink.record(&event);
        }
        self.simulation_time += start.elapsed();
        Ok(&self.summary)
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn controller(&self) -> &CacheController {
        &self.controller
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of blocks never filled. Useful for analysing cache
    /// utilisation or debugging
    pub fn unoccupied_block_count(&self) -> usize {
        self.controller.store.unoccupied_count()
    }
}
