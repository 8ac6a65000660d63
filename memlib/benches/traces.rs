use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use memlib::config::{CacheConfig, WritePolicy};
use memlib::simulator::{NullSink, Simulator};
use memlib::util::{mixed_ops, strided_reads};

/// Synthetic traces over the interesting geometries: a block-sized stride
/// misses every access, the mixed trace exercises eviction and both write
/// paths
pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Traces");
    let configs = [
        (
            "direct",
            CacheConfig {
                associativity: 1,
                ..CacheConfig::default()
            },
        ),
        ("2way", CacheConfig::default()),
        (
            "2way-wb",
            CacheConfig {
                write_policy: WritePolicy::WriteBack,
                ..CacheConfig::default()
            },
        ),
    ];
    for (name, config) in configs {
        let strided = strided_reads(config.memory_size, config.block_size, 100_000);
        let mixed = mixed_ops(config.memory_size, 100_000, 0xC0FFEE);
        group.bench_with_input(
            BenchmarkId::new("strided", name),
            &(config.clone(), strided),
            |bench, (config, trace)| {
                bench.iter(|| {
                    Simulator::new(config).unwrap().run(trace, &mut NullSink).unwrap();
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("mixed", name),
            &(config, mixed),
            |bench, (config, trace)| {
                bench.iter(|| {
                    Simulator::new(config).unwrap().run(trace, &mut NullSink).unwrap();
                });
            },
        );
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
