//! Benchmark for noise generation performance.
//!
//! TARGET: 1,000,000 samples per second
//!
//! Run with: cargo bench --package terrane_procedural --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use terrane_core::{GeneratorConfig, NoiseLayerConfig, WorldSeed};
use terrane_procedural::noise::purpose;
use terrane_procedural::{HeightPipeline, LayeredNoise, SimplexNoise};

fn benchmark_single_sample(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("single_noise_sample", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_million_samples(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("million_samples");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);

    group.bench_function("1M_noise_samples", |b| {
        b.iter(|| {
            for i in 0..1_000_000 {
                let x = f64::from(i % 1000) * 0.1;
                let y = f64::from(i / 1000) * 0.1;
                black_box(noise.sample(x, y));
            }
        });
    });

    group.finish();
}

fn benchmark_layered_noise(c: &mut Criterion) {
    let layer = LayeredNoise::new(
        WorldSeed::new(42),
        purpose::TERRAIN,
        &NoiseLayerConfig::fractal(0.01, 6, 0.5, 2.0),
    );

    c.bench_function("layered_noise_6_octaves", |b| {
        let mut x = 0i64;
        b.iter(|| {
            x += 1;
            black_box(layer.sample_column(black_box(x), black_box(x / 2)))
        });
    });
}

fn benchmark_3d_noise(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    c.bench_function("single_noise_sample_3d", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.1;
            black_box(noise.sample3(black_box(x), black_box(x * 0.3), black_box(x * 0.7)))
        });
    });
}

fn benchmark_column_sample(c: &mut Criterion) {
    let pipeline = HeightPipeline::new(WorldSeed::new(42), &GeneratorConfig::default());

    c.bench_function("height_and_climate_per_column", |b| {
        let mut x = 0i64;
        b.iter(|| {
            x += 1;
            black_box(pipeline.column(black_box(x), black_box(x * 3)))
        });
    });
}

criterion_group!(
    benches,
    benchmark_single_sample,
    benchmark_million_samples,
    benchmark_layered_noise,
    benchmark_3d_noise,
    benchmark_column_sample
);
criterion_main!(benches);
