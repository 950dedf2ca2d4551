use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use neuromem::memory::build_chain;
use neuromem::{Brain, MemoryConfig};

const TEXT: &str = "the river runs past the old mill where the miller keeps his stones \
                    and the stones turn slowly while the river sings to the mill";

fn trained_brain(rounds: usize) -> Brain {
    let brain = Brain::fresh(MemoryConfig::default());
    let mut now = 0.0;
    for _ in 0..rounds {
        for word in TEXT.split_whitespace() {
            brain.respond_at(word, true, now);
            now += 0.1;
        }
    }
    brain
}

fn benchmark_signal_processing(c: &mut Criterion) {
    let brain = trained_brain(10);
    let mut now = 1_000.0;

    c.bench_function("signal processing", |b| {
        b.iter(|| {
            brain.respond_at("river", true, now);
            now += 0.1;
        });
    });
}

fn benchmark_chain_building(c: &mut Criterion) {
    let brain = trained_brain(10);

    c.bench_function("chain building", |b| {
        b.iter(|| {
            brain.with_state(|s| build_chain("the", &s.neurons, &s.associations, 1_000.0, 3600.0))
        });
    });
}

fn benchmark_vocabulary_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("vocabulary_sizes");

    for size in [10usize, 50, 200].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let brain = Brain::fresh(MemoryConfig::default());
            for i in 0..size {
                brain.respond_at(&format!("token{i}"), true, i as f64 * 0.01);
            }

            b.iter(|| brain.estimate_size());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_signal_processing,
    benchmark_chain_building,
    benchmark_vocabulary_sizes
);
criterion_main!(benches);
