//! # Generation Integration Tests
//!
//! End-to-end checks of the chunk pipeline against a minimal host.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use terrane_core::{
    BiomeRegistry, ChunkBuffer, ChunkCoord, ChunkDimensions, ChunkGenerator, ConfigError,
    CrossChunkFeature, GeneratorConfig, MaterialId, NoiseLayerConfig, RiverConfig, WorldAdapter,
    WorldSeed,
};
use terrane_procedural::{presets, TerrainGenerator};

/// Host holding a fixed set of finished chunks.
struct StaticWorld {
    registry: Arc<BiomeRegistry>,
    chunks: HashMap<ChunkCoord, Arc<ChunkBuffer>>,
}

impl StaticWorld {
    fn new(registry: Arc<BiomeRegistry>) -> Self {
        Self {
            registry,
            chunks: HashMap::new(),
        }
    }
}

impl WorldAdapter for StaticWorld {
    fn generated_neighbor(&self, coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
        self.chunks.get(&coord).cloned()
    }

    fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(12345)
    }

    fn biome_registry(&self) -> Arc<BiomeRegistry> {
        Arc::clone(&self.registry)
    }
}

fn plains_registry() -> Arc<BiomeRegistry> {
    Arc::new(BiomeRegistry::from_config(presets::flat_plains(64.0)).unwrap())
}

/// Flat plains where every column is river and every strip ties, so the
/// river always drains east.
fn river_generator() -> (TerrainGenerator, Arc<BiomeRegistry>) {
    let registry = plains_registry();
    let mut config = GeneratorConfig::flat(ChunkDimensions::STANDARD);
    config.rivers = Some(RiverConfig {
        noise: NoiseLayerConfig::fractal(0.01, 1, 0.5, 2.0),
        width: 1.5,
        depth: 3,
        water: presets::WATER,
        bed: presets::GRAVEL,
    });
    let generator = TerrainGenerator::new(config, WorldSeed::new(12345), Arc::clone(&registry)).unwrap();
    (generator, registry)
}

/// Test: the canonical flat plains chunk.
#[test]
fn test_flat_plains_scenario() {
    let registry = plains_registry();
    let config = GeneratorConfig::flat(ChunkDimensions::STANDARD);
    let generator = TerrainGenerator::new(config, WorldSeed::new(12345), Arc::clone(&registry)).unwrap();
    let world = StaticWorld::new(registry);

    let chunk = generator.generate_blocking(ChunkCoord::new(0, 0), &world).unwrap();
    let buf = &chunk.buffer;
    let dims = buf.dims();

    for z in 0..dims.depth {
        for x in 0..dims.width {
            for y in 0..64 {
                assert_eq!(buf.get(x, y, z), Ok(presets::DIRT), "filler at ({x}, {y}, {z})");
            }
            assert_eq!(buf.get(x, 64, z), Ok(presets::GRASS), "top at ({x}, {z})");
            for y in 65..dims.height {
                assert_eq!(buf.get(x, y, z), Ok(MaterialId::EMPTY), "air at ({x}, {y}, {z})");
            }
        }
    }
    assert!(chunk.deferred.is_empty());
}

/// Test: same seed and coordinate give identical chunks, in any order.
#[test]
fn test_generation_is_deterministic() {
    let registry = Arc::new(BiomeRegistry::from_config(presets::temperate()).unwrap());
    let world = StaticWorld::new(Arc::clone(&registry));
    let a = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(777), Arc::clone(&registry)).unwrap();
    let b = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(777), Arc::clone(&registry)).unwrap();

    let coords = [ChunkCoord::new(0, 0), ChunkCoord::new(-3, 7), ChunkCoord::new(40, -12)];
    let forward: Vec<_> = coords
        .iter()
        .map(|&c| a.generate_blocking(c, &world).unwrap())
        .collect();
    let backward: Vec<_> = coords
        .iter()
        .rev()
        .map(|&c| b.generate_blocking(c, &world).unwrap())
        .collect();

    for (x, y) in forward.iter().zip(backward.iter().rev()) {
        assert_eq!(x, y, "chunk {} differs between runs", x.buffer.coord());
    }

    let other = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(778), registry).unwrap();
    let different = other.generate_blocking(coords[1], &world).unwrap();
    assert_ne!(different.buffer, forward[1].buffer, "seed should matter");
}

/// Test: chunks at the edge of the coordinate space generate normally.
#[test]
fn test_extreme_coordinates() {
    let registry = Arc::new(BiomeRegistry::from_config(presets::temperate()).unwrap());
    let world = StaticWorld::new(Arc::clone(&registry));
    let generator = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(1), registry).unwrap();

    for coord in [
        ChunkCoord::new(i32::MAX, i32::MIN),
        ChunkCoord::new(i32::MIN, i32::MAX),
        ChunkCoord::new(i32::MAX, i32::MAX),
    ] {
        let chunk = generator.generate_blocking(coord, &world).unwrap();
        assert!(!chunk.buffer.is_empty(), "chunk {coord} has no terrain");
    }
}

/// Test: a registry without its default biome never produces a generator.
#[test]
fn test_missing_default_biome() {
    let mut config = presets::temperate();
    config.default = "swamp".into();
    assert_eq!(
        BiomeRegistry::from_config(config).unwrap_err(),
        ConfigError::MissingDefaultBiome("swamp".into())
    );
}

/// Test: a river whose downstream neighbour is missing is deferred.
#[test]
fn test_river_deferred_without_neighbor() {
    let (generator, registry) = river_generator();
    let world = StaticWorld::new(registry);

    let chunk = generator.generate_blocking(ChunkCoord::new(5, 5), &world).unwrap();
    assert_eq!(chunk.deferred.len(), 1);
    let obligation = chunk.deferred[0];
    assert_eq!(obligation.origin, ChunkCoord::new(5, 5));
    assert_eq!(obligation.requires, ChunkCoord::new(6, 5));
    assert_eq!(obligation.feature, CrossChunkFeature::River);
    assert_eq!(chunk.buffer.count(presets::WATER), 0, "river must be omitted");
}

/// Test: the deferred patch reproduces exactly what in-place carving does.
#[test]
fn test_deferred_patch_matches_direct_carve() {
    let (generator, registry) = river_generator();
    let mut world = StaticWorld::new(registry);

    let deferred = generator.generate_blocking(ChunkCoord::new(5, 5), &world).unwrap();
    let neighbor = generator.generate_blocking(ChunkCoord::new(6, 5), &world).unwrap();
    world
        .chunks
        .insert(ChunkCoord::new(6, 5), Arc::new(neighbor.buffer.clone()));

    let direct = generator.generate_blocking(ChunkCoord::new(5, 5), &world).unwrap();
    assert!(direct.deferred.is_empty());
    assert!(direct.buffer.count(presets::WATER) > 0);
    // Level = min(64 - 1, 64) = 63, bed 3 below
    assert_eq!(direct.buffer.get(0, 63, 0), Ok(presets::WATER));
    assert_eq!(direct.buffer.get(0, 60, 0), Ok(presets::GRAVEL));
    assert_eq!(direct.buffer.get(0, 64, 0), Ok(MaterialId::EMPTY));

    let patch = generator
        .resolve_deferred(&deferred.deferred[0], &neighbor.buffer)
        .unwrap()
        .expect("river patch");
    let mut patched = deferred.buffer.clone();
    patched.apply_patch(&patch).unwrap();
    assert_eq!(patched, direct.buffer);
}

/// Test: full chunk generation stays fast enough for streaming.
#[test]
fn test_generation_performance() {
    let registry = Arc::new(BiomeRegistry::from_config(presets::temperate()).unwrap());
    let world = StaticWorld::new(Arc::clone(&registry));
    let generator = TerrainGenerator::new(GeneratorConfig::default(), WorldSeed::new(42), registry).unwrap();

    let start = Instant::now();
    for z in 0..4 {
        for x in 0..4 {
            generator.generate_blocking(ChunkCoord::new(x, z), &world).unwrap();
        }
    }
    let elapsed = start.elapsed();

    println!("16 chunks in {elapsed:?} ({:?}/chunk)", elapsed / 16);
    assert!(elapsed.as_secs_f64() < 30.0, "16 chunks took {elapsed:?}");
}
