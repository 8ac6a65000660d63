use crate::addr::AddressDecoder;
use crate::cache::BlockStore;
use crate::config::{CacheConfig, WritePolicy};
use crate::error::{AccessFault, SimError};
use crate::lru::LruQueues;
use crate::memory::{decode_word, encode_word, MemoryStore};
use crate::simulator::{AccessEvent, AccessKind, Simulator};
use crate::trace::{demo_trace, parse_trace, TraceOp};

/// The configuration of the worked example: 1024-byte cache, 64-byte blocks,
/// direct mapped, 64KiB memory - 16 blocks, 6 offset bits, 4 index bits
fn direct_config() -> CacheConfig {
    CacheConfig {
        associativity: 1,
        ..CacheConfig::default()
    }
}

fn run_reads(config: &CacheConfig, addresses: &[u32]) -> (Vec<AccessEvent>, Simulator) {
    let trace: Vec<TraceOp> = addresses.iter().map(|a| TraceOp::Read(*a)).collect();
    let mut simulator = Simulator::new(config).unwrap();
    let mut events = Vec::new();
    simulator.run(&trace, &mut events).unwrap();
    (events, simulator)
}

fn hit_pattern(events: &[AccessEvent]) -> Vec<bool> {
    events.iter().map(|e| e.hit).collect()
}

#[test]
fn decomposition_round_trips_for_every_word_address() {
    for config in [direct_config(), CacheConfig::default()] {
        let decoder = AddressDecoder::new(&config);
        for address in (0..config.memory_size).step_by(4) {
            let fields = decoder.decode(address);
            assert_eq!(decoder.reassemble(fields), address);
        }
    }
}

#[test]
fn decode_splits_known_addresses() {
    let decoder = AddressDecoder::new(&direct_config());
    let fields = decoder.decode(17536);
    assert_eq!((fields.tag, fields.index, fields.offset), (17, 2, 0));
    let fields = decoder.decode(1000);
    assert_eq!((fields.tag, fields.index, fields.offset), (0, 15, 40));
    let fields = decoder.decode(20000);
    assert_eq!((fields.tag, fields.index, fields.offset), (19, 8, 32));
}

#[test]
fn word_codec_round_trips_including_negative_patterns() {
    for value in [0, 1, -1, 42, -987654321, 0x12345678, i32::MIN, i32::MAX] {
        assert_eq!(decode_word(encode_word(value)), value);
    }
    assert_eq!(encode_word(17536), [0x80, 0x44, 0x00, 0x00]);
    assert_eq!(encode_word(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn memory_initialises_each_word_region_to_its_base_address() {
    let memory = MemoryStore::new(65536);
    assert_eq!(memory.len(), 65536);
    for address in [0, 4, 1000, 17536, 65532] {
        assert_eq!(memory.read_word(address), address as i32);
    }
    // Byte level: word 4 encodes as 04 00 00 00 little-endian
    assert_eq!(memory.block_at(0, 8), &[0, 0, 0, 0, 4, 0, 0, 0]);
    assert_eq!(memory.read_byte(4), 4);

    let mut memory = memory;
    memory.write_byte(5, 0xAB);
    assert_eq!(memory.read_word(4), i32::from_le_bytes([4, 0xAB, 0, 0]));
}

#[test]
fn lru_queue_never_exceeds_capacity_or_duplicates() {
    let mut lru = LruQueues::new(4, 4);
    for tag in [1, 2, 3, 1, 2, 4, 5, 2, 6, 1] {
        lru.touch(1, tag).unwrap();
        let residency = lru.residency(1);
        assert!(residency.len() <= 4);
        let mut deduped = residency.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), residency.len());
    }
    // Untouched sets stay empty
    assert!(lru.residency(0).is_empty());
}

#[test]
fn lru_reorders_residents_and_evicts_the_oldest() {
    let mut lru = LruQueues::new(1, 4);
    for tag in [10, 20, 30, 40] {
        assert_eq!(lru.touch(0, tag).unwrap(), None);
    }
    assert_eq!(lru.residency(0), vec![10, 20, 30, 40]);
    // Full set: the next distinct tag evicts the least recently touched
    assert_eq!(lru.touch(0, 50).unwrap(), Some(10));
    // Resident tag: reorder only, nothing leaves
    assert_eq!(lru.touch(0, 20).unwrap(), None);
    assert_eq!(lru.residency(0), vec![30, 40, 50, 20]);
    assert_eq!(lru.touch(0, 60).unwrap(), Some(30));
}

#[test]
fn lru_rejects_a_set_outside_the_cache() {
    let mut lru = LruQueues::new(8, 2);
    assert_eq!(
        lru.touch(8, 1),
        Err(SimError::InvalidAddress(AccessFault::SetOutOfRange(8)))
    );
}

#[test]
fn victim_selection_prefers_the_evicted_tag_then_a_free_block() {
    let config = CacheConfig::default();
    let mut store = BlockStore::new(&config);
    let bytes = vec![0u8; 64];
    let first = store.victim_index(3, None);
    store.fill(first, 7, &bytes);
    // Still room in the set: next victim is the remaining free block
    let second = store.victim_index(3, None);
    assert_ne!(second, first);
    store.fill(second, 8, &bytes);
    // The policy named a victim: the block holding that tag is replaced
    assert_eq!(store.victim_index(3, Some(7)), first);
    assert_eq!(store.victim_index(3, Some(8)), second);
}

#[test]
fn demo_trace_on_the_direct_mapped_example() {
    let (events, simulator) = run_reads(
        &direct_config(),
        &[17536, 17536, 1000, 1000, 17536, 20000],
    );
    assert_eq!(hit_pattern(&events), [false, true, false, true, true, false]);

    // The installed words come from the memory initialisation pattern
    assert_eq!(events[0].word, 17536);
    assert_eq!(events[2].word, 1000);
    assert_eq!(events[5].word, 20000);

    assert_eq!(events[0].index, 2);
    assert_eq!(events[0].tag, 17);
    assert_eq!((events[0].range_start, events[0].range_end), (17536, 17599));
    assert_eq!((events[5].range_start, events[5].range_end), (19968, 20031));

    // Direct mapped: no recency state to report
    assert!(events.iter().all(|e| e.recency.is_none()));
    assert!(events.iter().all(|e| e.kind == AccessKind::Read));

    let summary = simulator.summary();
    assert_eq!(summary.accesses, 6);
    assert_eq!(summary.hits, 3);
    assert_eq!(summary.misses, 3);
    assert_eq!(summary.score, 0);

    // 17536, 1000, and 20000 land in three distinct blocks of the sixteen
    assert_eq!(simulator.unoccupied_block_count(), 13);
}

#[test]
fn repeating_an_access_is_always_a_hit() {
    for config in [direct_config(), CacheConfig::default()] {
        let (events, _) = run_reads(&config, &[512, 512, 512]);
        assert_eq!(hit_pattern(&events), [false, true, true]);
    }
}

#[test]
fn two_way_set_conflict_evicts_least_recently_used() {
    // Default geometry: 8 sets of 2 blocks, index bits 3, so addresses at
    // multiples of 512 all collide on set 0 with tag = address >> 9
    let config = CacheConfig::default();
    let (events, _) = run_reads(&config, &[512, 1024, 512, 1536, 1024, 512]);
    assert_eq!(
        hit_pattern(&events),
        [false, false, true, false, false, false]
    );

    // Reading 1536 overflowed the set and pushed out tag 2 (1024), the least
    // recently used of {1, 2}
    assert_eq!(events[3].recency, Some(vec![1, 3]));
    // The recency ordering is reported oldest to newest on every access
    assert_eq!(events[0].recency, Some(vec![1]));
    assert_eq!(events[1].recency, Some(vec![1, 2]));
    assert_eq!(events[2].recency, Some(vec![2, 1]));
}

#[test]
fn write_through_updates_block_and_memory_together() {
    let mut simulator = Simulator::new(&direct_config()).unwrap();
    let mut events = Vec::new();
    simulator
        .run(
            &[
                TraceOp::Write(512, 4242),
                TraceOp::Read(512),
                TraceOp::Write(512, -7),
            ],
            &mut events,
        )
        .unwrap();

    // Write miss installs the block, then the word lands in both places
    assert_eq!(hit_pattern(&events), [false, true, true]);
    assert_eq!(events[1].word, 4242);
    assert_eq!(events[2].kind, AccessKind::Write);
    assert_eq!(simulator.controller().memory().read_word(512), -7);
    assert_eq!(events[0].write_policy, WritePolicy::WriteThrough);
}

#[test]
fn write_back_defers_memory_update_until_eviction() {
    let config = CacheConfig {
        write_policy: WritePolicy::WriteBack,
        associativity: 1,
        ..CacheConfig::default()
    };
    let mut simulator = Simulator::new(&config).unwrap();
    let mut events = Vec::new();

    simulator.run(&[TraceOp::Write(0, 99)], &mut events).unwrap();
    // Dirty block only: memory still holds its initialisation pattern
    assert_eq!(simulator.controller().memory().read_word(0), 0);

    // 1024 maps to index 0 with a different tag, evicting the dirty block
    simulator.run(&[TraceOp::Read(1024)], &mut events).unwrap();
    assert_eq!(simulator.controller().memory().read_word(0), 99);

    // The flushed value survives a re-read through the cache
    simulator.run(&[TraceOp::Read(0)], &mut events).unwrap();
    assert_eq!(events.last().unwrap().word, 99);
    assert!(!events.last().unwrap().hit);
}

#[test]
fn write_back_flushes_the_lru_way_of_a_full_set() {
    let config = CacheConfig {
        write_policy: WritePolicy::WriteBack,
        ..CacheConfig::default()
    };
    let mut simulator = Simulator::new(&config).unwrap();
    let mut events = Vec::new();
    // Set 0 fills with dirty tags 1 and 2; tag 3 evicts and flushes tag 1
    simulator
        .run(
            &[
                TraceOp::Write(512, 7),
                TraceOp::Write(1024, 8),
                TraceOp::Read(1536),
            ],
            &mut events,
        )
        .unwrap();
    assert_eq!(simulator.controller().memory().read_word(512), 7);
    // Tag 2 is still resident and still unflushed
    assert_eq!(simulator.controller().memory().read_word(1024), 1024);
}

#[test]
fn oversized_caches_are_rejected_at_startup() {
    let too_big_for_memory = CacheConfig {
        cache_size: 131072,
        ..CacheConfig::default()
    };
    assert!(matches!(
        Simulator::new(&too_big_for_memory),
        Err(SimError::Configuration(_))
    ));

    // Under the memory size but over the hard cap
    let over_cap = CacheConfig {
        cache_size: 524288,
        memory_size: 1 << 20,
        ..CacheConfig::default()
    };
    assert!(matches!(
        Simulator::new(&over_cap),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn degenerate_geometry_is_rejected_at_startup() {
    for config in [
        CacheConfig {
            block_size: 48,
            ..CacheConfig::default()
        },
        CacheConfig {
            associativity: 3,
            ..CacheConfig::default()
        },
        CacheConfig {
            associativity: 0,
            ..CacheConfig::default()
        },
        CacheConfig {
            memory_size: 65534,
            ..CacheConfig::default()
        },
    ] {
        assert!(matches!(
            config.validate(),
            Err(SimError::Configuration(_))
        ));
    }
}

#[test]
fn bad_addresses_abort_the_access_without_touching_state() {
    let mut simulator = Simulator::new(&direct_config()).unwrap();
    let mut events = Vec::new();

    let misaligned = simulator.run(&[TraceOp::Read(2)], &mut events);
    assert_eq!(
        misaligned,
        Err(SimError::InvalidAddress(AccessFault::Misaligned(2)))
    );
    let out_of_bounds = simulator.run(&[TraceOp::Read(65536)], &mut events);
    assert_eq!(
        out_of_bounds,
        Err(SimError::InvalidAddress(AccessFault::OutOfBounds(65536)))
    );

    // Nothing was installed by the rejected accesses
    assert!(events.is_empty());
    assert_eq!(simulator.unoccupied_block_count(), 16);
    simulator.run(&[TraceOp::Read(17536)], &mut events).unwrap();
    assert!(!events[0].hit);
}

#[test]
fn text_traces_parse_with_comments_and_blanks() {
    let text = b"# warmup\nR 17536\n\nW 1000 -42\nR 0\n";
    assert_eq!(
        parse_trace(text).unwrap(),
        vec![
            TraceOp::Read(17536),
            TraceOp::Write(1000, -42),
            TraceOp::Read(0)
        ]
    );

    assert!(parse_trace(b"W 12\n").unwrap_err().contains("missing"));
    assert!(parse_trace(b"X 5\n").is_err());
    assert_eq!(parse_trace(b"# only comments\n").unwrap(), vec![]);
}

#[test]
fn demo_trace_matches_the_fixed_sequence() {
    assert_eq!(
        demo_trace(),
        vec![
            TraceOp::Read(17536),
            TraceOp::Read(17536),
            TraceOp::Read(1000),
            TraceOp::Read(1000),
            TraceOp::Read(17536),
            TraceOp::Read(20000),
        ]
    );
}

#[test]
fn configs_parse_from_json_with_defaults_and_aliases() {
    let config: CacheConfig = serde_json::from_str(
        r#"{"cache_size": 1024, "block_size": 64, "associativity": 1,
            "memory_size": 65536, "write_policy": "wb"}"#,
    )
    .unwrap();
    assert_eq!(config.write_policy, WritePolicy::WriteBack);
    assert_eq!(config.num_blocks(), 16);
    assert_eq!(config.num_sets(), 16);

    let defaulted: CacheConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(defaulted.associativity, 2);
    assert_eq!(defaulted.write_policy, WritePolicy::WriteThrough);
    assert_eq!(
        (defaulted.offset_bits(), defaulted.index_bits(), defaulted.tag_bits()),
        (6, 3, 23)
    );
}
