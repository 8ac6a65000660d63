use std::ops::Range;

use crate::config::CacheConfig;
use crate::memory::{decode_word, encode_word};

/// A single cache block: its owning set, the tag it currently holds (`None`
/// while the block has never been filled), a dirty flag for write-back, and
/// the block-sized byte buffer.
///
/// Occupancy is carried by the tag itself rather than inferred from the
/// buffer contents, so a legitimately cached block whose bytes happen to be
/// zero is never mistaken for a free one.
pub struct Block {
    set: u32,
    tag: Option<u32>,
    dirty: bool,
    data: Box<[u8]>,
}

impl Block {
    fn new(set: u32, block_size: u32) -> Self {
        Self {
            set,
            tag: None,
            dirty: false,
            data: vec![0u8; block_size as usize].into_boxed_slice(),
        }
    }

    pub fn set(&self) -> u32 {
        self.set
    }

    pub fn tag(&self) -> Option<u32> {
        self.tag
    }

    pub fn is_occupied(&self) -> bool {
        self.tag.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The word stored at a byte offset within the block
    pub fn word_at(&self, offset: u32) -> i32 {
        let o = offset as usize;
        decode_word(self.data[o..o + 4].try_into().unwrap())
    }

    /// Overwrites the word at a byte offset. `dirty` records whether memory
    /// still has to be told about it (write-back), or already has been
    /// (write-through).
    pub fn write_word_at(&mut self, offset: u32, value: i32, dirty: bool) {
        let o = offset as usize;
        self.data[o..o + 4].copy_from_slice(&encode_word(value));
        self.dirty = dirty;
    }
}

/// All cache blocks, organised into sets of `associativity` consecutive
/// blocks
///
/// Blocks are stored flat, block `i` of set `s` lives at `s * associativity
/// + i`. Lookup and victim selection only ever scan the one set an address
/// maps to.
pub struct BlockStore {
    blocks: Vec<Block>,
    associativity: u32,
}

impl BlockStore {
    pub fn new(config: &CacheConfig) -> Self {
        let associativity = config.associativity;
        let blocks = (0..config.num_blocks())
            .map(|i| Block::new(i / associativity, config.block_size))
            .collect();
        Self { blocks, associativity }
    }

    fn set_range(&self, set: u32) -> Range<usize> {
        let start = (set * self.associativity) as usize;
        start..start + self.associativity as usize
    }

    /// Declares a hit iff an occupied block of the set holds the probe tag,
    /// returning the block's index. For associativity 1 this degenerates to a
    /// single comparison.
    pub fn lookup(&self, set: u32, tag: u32) -> Option<usize> {
        let range = self.set_range(set);
        self.blocks[range.clone()]
            .iter()
            .position(|block| block.tag == Some(tag))
            .map(|way| range.start + way)
    }

    /// Picks the block a miss will overwrite.
    ///
    /// A direct mapped set has only one candidate. Otherwise the victim is
    /// the block holding the tag the eviction policy pushed out, or the first
    /// never-filled block when the set still has room. The policy and the
    /// store move in lockstep, so one of the two always resolves.
    pub fn victim_index(&self, set: u32, evicted_tag: Option<u32>) -> usize {
        let range = self.set_range(set);
        if self.associativity == 1 {
            return range.start;
        }
        let way = match evicted_tag {
            Some(tag) => self.blocks[range.clone()]
                .iter()
                .position(|block| block.tag == Some(tag)),
            None => self.blocks[range.clone()].iter().position(|block| !block.is_occupied()),
        };
        range.start + way.unwrap_or(0)
    }

    /// Installs a freshly fetched block: assigns the tag, marks it clean, and
    /// copies in the block-aligned bytes.
    pub fn fill(&mut self, index: usize, tag: u32, bytes: &[u8]) {
        let block = &mut self.blocks[index];
        block.tag = Some(tag);
        block.dirty = false;
        block.data.copy_from_slice(bytes);
    }

    pub fn block(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut Block {
        &mut self.blocks[index]
    }

    /// Number of blocks never filled. Useful for analysing cache utilisation
    /// or debugging
    pub fn unoccupied_count(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_occupied()).count()
    }
}
