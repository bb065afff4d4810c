//! # Engine Scenarios
//!
//! End-to-end runs through `Engine` with the in-memory host.

use std::sync::Arc;

use terrane::{Engine, EngineConfig, GenerationEvent, InMemoryWorld, PollResult, SchedulerConfig};
use terrane_core::{
    BiomeRegistry, ChunkBuffer, ChunkCoord, ChunkDimensions, ConfigError, GeneratorConfig, MaterialId,
    NoiseLayerConfig, RiverConfig, WorldSeed,
};
use terrane_procedural::presets;

fn complete(engine: &Engine, coord: ChunkCoord) -> Arc<ChunkBuffer> {
    let handle = engine.request_chunk(coord);
    match handle.wait() {
        PollResult::Complete(buffer) => buffer,
        other => panic!("chunk {coord}: unexpected {other:?}"),
    }
}

/// Flat plains where every column is river and the river drains east.
fn river_engine(patching: bool) -> (Engine, Arc<InMemoryWorld>) {
    let registry = Arc::new(BiomeRegistry::from_config(presets::flat_plains(64.0)).unwrap());
    let world = Arc::new(InMemoryWorld::new(WorldSeed::new(12345), registry).with_patching(patching));

    let mut generator = GeneratorConfig::flat(ChunkDimensions::STANDARD);
    generator.rivers = Some(RiverConfig {
        noise: NoiseLayerConfig::fractal(0.01, 1, 0.5, 2.0),
        width: 1.5,
        depth: 3,
        water: presets::WATER,
        bed: presets::GRAVEL,
    });
    let config = EngineConfig {
        generator,
        scheduler: SchedulerConfig::single_threaded(),
    };
    let engine = Engine::load(config, Arc::clone(&world) as Arc<dyn terrane_core::WorldAdapter>).unwrap();
    (engine, world)
}

/// Test: the flat plains chunk through the whole engine.
#[test]
fn test_flat_plains_through_engine() {
    let registry = Arc::new(BiomeRegistry::from_config(presets::flat_plains(64.0)).unwrap());
    let world = Arc::new(InMemoryWorld::new(WorldSeed::new(12345), registry));
    let config = EngineConfig {
        generator: GeneratorConfig::flat(ChunkDimensions::STANDARD),
        ..EngineConfig::default()
    };
    let engine = Engine::load(config, world).unwrap();

    let chunk = complete(&engine, ChunkCoord::new(0, 0));
    assert_eq!(chunk.dims(), ChunkDimensions::STANDARD);
    assert_eq!(chunk.count(presets::GRASS), 16 * 16);
    assert_eq!(chunk.count(presets::DIRT), 16 * 16 * 64);
    assert_eq!(chunk.count(MaterialId::EMPTY), 16 * 16 * (256 - 65));
    assert_eq!(chunk.as_bytes().len(), ChunkBuffer::data_size(ChunkDimensions::STANDARD));
}

/// Test: a host with patch support receives the river once the
/// downstream neighbour is generated.
#[test]
fn test_river_patched_when_neighbor_arrives() {
    let (engine, world) = river_engine(true);
    let origin = ChunkCoord::new(5, 5);
    let downstream = ChunkCoord::new(6, 5);

    let first = complete(&engine, origin);
    assert_eq!(first.count(presets::WATER), 0, "river needs the neighbour");
    world.store(Arc::clone(&first));
    assert_eq!(engine.neighbor_available(origin), 0);
    assert_eq!(engine.pending_obligations(), 1);

    let second = complete(&engine, downstream);
    world.store(second);

    let patched = world.chunk(origin).unwrap();
    assert!(patched.count(presets::WATER) > 0);
    assert_eq!(patched.get(0, 63, 0), Ok(presets::WATER));
    assert_eq!(patched.get(0, 60, 0), Ok(presets::GRAVEL));
    assert_eq!(first.count(presets::WATER), 0, "handed-out buffer is unchanged");

    // (6,5) itself now waits on (7,5)
    assert_eq!(engine.pending_obligations(), 1);

    let events = engine.events().drain();
    assert!(events.iter().any(|e| matches!(
        e,
        GenerationEvent::Patched { coord, neighbor, writes }
            if *coord == origin && *neighbor == downstream && *writes > 0
    )));
}

/// Test: obligations survive until the host actually holds the origin.
#[test]
fn test_river_patched_after_late_store() {
    let (engine, world) = river_engine(true);
    let origin = ChunkCoord::new(5, 5);
    let downstream = ChunkCoord::new(6, 5);

    // Neither chunk is stored while both generate
    let first = complete(&engine, origin);
    let second = complete(&engine, downstream);
    assert_eq!(engine.pending_obligations(), 2);

    world.store(second);
    world.store(first);
    assert_eq!(engine.neighbor_available(origin), 1);
    assert_eq!(world.chunk(origin).unwrap().get(0, 63, 0), Ok(presets::WATER));
    assert_eq!(engine.pending_obligations(), 1);
}

/// Test: without patch support the river is skipped for good.
#[test]
fn test_river_skipped_without_patching() {
    let (engine, world) = river_engine(false);
    let origin = ChunkCoord::new(5, 5);

    let first = complete(&engine, origin);
    world.store(first);
    world.store(complete(&engine, ChunkCoord::new(6, 5)));

    assert_eq!(engine.pending_obligations(), 0);
    assert_eq!(engine.neighbor_available(origin), 0);
    assert_eq!(world.chunk(origin).unwrap().count(presets::WATER), 0);

    let events = engine.events().drain();
    assert!(events.iter().any(|e| matches!(
        e,
        GenerationEvent::Deferred { obligation, retained: false }
            if obligation.origin == origin && obligation.requires == ChunkCoord::new(6, 5)
    )));
}

/// Test: worker count never changes the generated terrain.
#[test]
fn test_determinism_across_worker_counts() {
    let run = |workers: usize| {
        let registry = Arc::new(BiomeRegistry::from_config(presets::temperate()).unwrap());
        let world = Arc::new(InMemoryWorld::new(WorldSeed::new(2024), registry));
        let config = EngineConfig {
            scheduler: SchedulerConfig {
                workers,
                ..SchedulerConfig::default()
            },
            ..EngineConfig::default()
        };
        let engine = Engine::load(config, world).unwrap();
        let handles: Vec<_> = (-1..=1)
            .flat_map(|z| (-1..=1).map(move |x| ChunkCoord::new(x, z)))
            .map(|c| engine.request_chunk(c))
            .collect();
        handles
            .iter()
            .map(|h| match h.wait() {
                PollResult::Complete(buffer) => buffer,
                other => panic!("unexpected {other:?}"),
            })
            .collect::<Vec<_>>()
    };

    let serial = run(1);
    let parallel = run(4);
    for (a, b) in serial.iter().zip(&parallel) {
        assert_eq!(a, b, "chunk {} differs", a.coord());
    }
}

/// Test: a registry without its default biome never yields an engine.
#[test]
fn test_missing_default_fails_load() {
    let mut biomes = presets::temperate();
    biomes.default = "volcano".into();
    assert_eq!(
        BiomeRegistry::from_config(biomes).err(),
        Some(ConfigError::MissingDefaultBiome("volcano".into()))
    );
}
