//! Benchmark for chunk generation performance.
//!
//! Run with: cargo bench --package terrane_procedural --bench chunk_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use terrane_core::{
    BiomeRegistry, ChunkBuffer, ChunkCoord, ChunkGenerator, GeneratorConfig, WorldAdapter, WorldSeed,
};
use terrane_procedural::{presets, TerrainGenerator};

struct Isolated(Arc<BiomeRegistry>);

impl WorldAdapter for Isolated {
    fn generated_neighbor(&self, _coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
        None
    }

    fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(42)
    }

    fn biome_registry(&self) -> Arc<BiomeRegistry> {
        Arc::clone(&self.0)
    }
}

fn setup() -> (TerrainGenerator, Isolated) {
    let registry = Arc::new(BiomeRegistry::from_config(presets::temperate()).expect("valid preset"));
    let generator = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(42), Arc::clone(&registry))
        .expect("valid config");
    (generator, Isolated(registry))
}

fn benchmark_single_chunk(c: &mut Criterion) {
    let (generator, world) = setup();

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(generator.generate_blocking(ChunkCoord::new(coord, coord / 2), &world))
        });
    });
}

fn benchmark_chunk_grid(c: &mut Criterion) {
    let (generator, world) = setup();

    let mut group = c.benchmark_group("chunk_grid");
    group.sample_size(10);

    // 8x8 chunks = 128x128 columns
    group.throughput(Throughput::Elements(8 * 8));
    group.bench_function("8x8_chunks", |b| {
        b.iter(|| {
            for z in 0..8 {
                for x in 0..8 {
                    black_box(generator.generate_blocking(ChunkCoord::new(x, z), &world)).ok();
                }
            }
        });
    });

    group.finish();
}

fn benchmark_height_plan(c: &mut Criterion) {
    let (generator, _) = setup();

    c.bench_function("height_field_and_blending", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(generator.plan(ChunkCoord::new(coord, -coord), false))
        });
    });
}

criterion_group!(benches, benchmark_single_chunk, benchmark_chunk_grid, benchmark_height_plan);
criterion_main!(benches);
