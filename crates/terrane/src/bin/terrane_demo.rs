//! # TERRANE Demo
//!
//! Generates a square of chunks around the origin and prints a top-down
//! map of their surface.
//!
//! ```text
//! terrane_demo [world.toml]
//! ```
//!
//! Without an argument the bundled `config/default_world.toml` is used.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;
use terrane::{Engine, EngineConfig, GenerationEvent, InMemoryWorld, PollResult};
use terrane_core::material::palette;
use terrane_core::{BiomeRegistry, BiomeRegistryConfig, ChunkBuffer, ChunkCoord, MaterialId, WorldSeed};
use tracing_subscriber::EnvFilter;

const DEFAULT_WORLD: &str = include_str!("../../config/default_world.toml");

/// On-disk world description.
#[derive(Debug, Deserialize)]
struct WorldFile {
    seed: u64,
    #[serde(default = "default_radius")]
    radius: i32,
    #[serde(default)]
    engine: EngineConfig,
    biomes: BiomeRegistryConfig,
}

const fn default_radius() -> i32 {
    2
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .init();

    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)?,
        None => DEFAULT_WORLD.to_owned(),
    };
    let file: WorldFile = toml::from_str(&text)?;
    let radius = file.radius.clamp(0, 16);

    let registry = Arc::new(BiomeRegistry::from_config(file.biomes)?);
    let world = Arc::new(InMemoryWorld::new(WorldSeed::new(file.seed), registry));
    let engine = Engine::load(file.engine, Arc::clone(&world) as Arc<dyn terrane_core::WorldAdapter>)?;

    let start = Instant::now();
    let handles: Vec<_> = (-radius..=radius)
        .flat_map(|z| (-radius..=radius).map(move |x| ChunkCoord::new(x, z)))
        .map(|coord| engine.request_chunk(coord))
        .collect();

    let mut failed = 0;
    for handle in &handles {
        match handle.wait() {
            PollResult::Complete(buffer) => {
                world.store(buffer);
                engine.neighbor_available(handle.coord());
            }
            PollResult::Failed(error) => {
                tracing::error!(coord = %handle.coord(), %error, "chunk failed");
                failed += 1;
            }
            PollResult::Cancelled | PollResult::Pending => failed += 1,
        }
    }
    let elapsed = start.elapsed();

    let mut patched = 0;
    let mut deferred = 0;
    for event in engine.events().drain() {
        match event {
            GenerationEvent::Patched { .. } => patched += 1,
            GenerationEvent::Deferred { .. } => deferred += 1,
            _ => {}
        }
    }

    tracing::info!(
        chunks = handles.len(),
        failed,
        deferred,
        patched,
        pending = engine.pending_obligations(),
        ?elapsed,
        "generation finished"
    );

    let chunks: HashMap<ChunkCoord, Arc<ChunkBuffer>> = handles
        .iter()
        .filter_map(|h| world.chunk(h.coord()).map(|c| (h.coord(), c)))
        .collect();
    print_map(&chunks, radius);
    Ok(())
}

/// One character per column, by the material on top.
fn print_map(chunks: &HashMap<ChunkCoord, Arc<ChunkBuffer>>, radius: i32) {
    let Some(dims) = chunks.values().next().map(|c| c.dims()) else {
        return;
    };

    for cz in -radius..=radius {
        for lz in 0..dims.depth {
            let mut line = String::new();
            for cx in -radius..=radius {
                let Some(chunk) = chunks.get(&ChunkCoord::new(cx, cz)) else {
                    line.extend(std::iter::repeat(' ').take(dims.width as usize));
                    continue;
                };
                for lx in 0..dims.width {
                    let top = chunk
                        .surface_height(lx, lz)
                        .ok()
                        .flatten()
                        .and_then(|y| chunk.get(lx, y, lz).ok())
                        .unwrap_or(MaterialId::EMPTY);
                    line.push(glyph(top));
                }
            }
            println!("{line}");
        }
    }
}

fn glyph(material: MaterialId) -> char {
    match material {
        palette::WATER => '~',
        palette::SAND => '.',
        palette::GRASS | palette::FLOWER | palette::SHRUB => '"',
        palette::SNOW => '*',
        palette::STONE | palette::GRAVEL => '^',
        palette::LOG | palette::LEAVES => 'T',
        palette::COBBLE => '#',
        palette::CACTUS => '!',
        MaterialId::EMPTY => ' ',
        _ => '?',
    }
}
