//! Performance Benchmarks for jetgroom
//!
//! Run with: cargo bench
//!
//! Benchmarks cover:
//! - Clustering strategies over event multiplicity
//! - Each groomer on the leading jet of a synthetic event
//! - Substructure observables
//! - Full event processing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jetgroom::{
    AnalysisConfig, BottomUpSoftDrop, ClusterSequence, ClusterStrategy, EventProcessor,
    EventSource, FourMomentum, Groomer, JetDefinition, Pruner, RecursiveSoftDrop, SoftDrop,
    SubstructureSettings, SyntheticSource, Trimmer,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

fn uniform_event(n: usize, seed: u64) -> Vec<FourMomentum> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            FourMomentum::from_pt_eta_phi_m(
                rng.gen_range(0.5..100.0),
                rng.gen_range(-4.0..4.0),
                rng.gen_range(0.0..TAU),
                0.0,
            )
        })
        .collect()
}

fn synthetic_event(seed: u64) -> Vec<FourMomentum> {
    SyntheticSource::new(1, seed)
        .next_event()
        .ok()
        .flatten()
        .map(|event| event.particles)
        .unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════
// CLUSTERING BENCHMARKS
// ═══════════════════════════════════════════════════════════════════════════

fn bench_clustering_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");
    for n in [50, 200, 1000].iter() {
        let particles = uniform_event(*n, 7);
        group.throughput(Throughput::Elements(*n as u64));
        for strategy in [
            ClusterStrategy::Naive,
            ClusterStrategy::NearestNeighbour,
            ClusterStrategy::Tiled,
        ] {
            // The naive strategy is cubic; skip the largest size
            if strategy == ClusterStrategy::Naive && *n > 200 {
                continue;
            }
            let def = JetDefinition::anti_kt(0.4).unwrap().with_strategy(strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), n),
                &particles,
                |b, particles| b.iter(|| ClusterSequence::new(black_box(particles), &def)),
            );
        }
    }
    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// GROOMING BENCHMARKS
// ═══════════════════════════════════════════════════════════════════════════

fn bench_groomers(c: &mut Criterion) {
    let particles = synthetic_event(11);
    let def = JetDefinition::anti_kt(1.0).unwrap();
    let seq = ClusterSequence::new(&particles, &def);
    let Some(jet) = jetgroom::sorted_by_pt(seq.jets()).into_iter().next() else {
        return;
    };

    let groomers: Vec<Box<dyn Groomer>> = vec![
        Box::new(Trimmer::default()),
        Box::new(Pruner::default()),
        Box::new(SoftDrop::default()),
        Box::new(RecursiveSoftDrop::default()),
        Box::new(BottomUpSoftDrop::default()),
    ];

    let mut group = c.benchmark_group("grooming");
    group.throughput(Throughput::Elements(jet.n_constituents() as u64));
    for groomer in &groomers {
        group.bench_function(groomer.name(), |b| {
            b.iter(|| groomer.groom(black_box(&jet), seq.history()))
        });
    }
    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// SUBSTRUCTURE BENCHMARKS
// ═══════════════════════════════════════════════════════════════════════════

fn bench_substructure(c: &mut Criterion) {
    let particles = synthetic_event(13);
    let seq = ClusterSequence::new(&particles, &JetDefinition::anti_kt(1.0).unwrap());
    let Some(jet) = jetgroom::sorted_by_pt(seq.jets()).into_iter().next() else {
        return;
    };
    let settings = SubstructureSettings::default();

    c.bench_function("d2", |b| {
        b.iter(|| settings.energy_correlator().d2(black_box(&jet)))
    });
    c.bench_function("tau32", |b| {
        b.iter(|| settings.nsubjettiness(2).tau32(black_box(&jet)))
    });
}

// ═══════════════════════════════════════════════════════════════════════════
// PIPELINE BENCHMARKS
// ═══════════════════════════════════════════════════════════════════════════

fn bench_event_processing(c: &mut Criterion) {
    let processor = EventProcessor::new(AnalysisConfig::default()).unwrap();
    let events = SyntheticSource::new(64, 17).collect_events().unwrap();

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    group.throughput(Throughput::Elements(events.len() as u64));
    group.bench_function("process_batch_64", |b| {
        b.iter(|| processor.process_batch(black_box(&events)))
    });
    group.finish();
}

criterion_group!(clustering, bench_clustering_strategies);
criterion_group!(grooming, bench_groomers);
criterion_group!(substructure, bench_substructure);
criterion_group!(pipeline, bench_event_processing);

criterion_main!(clustering, grooming, substructure, pipeline);
