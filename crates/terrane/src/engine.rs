//! # Engine
//!
//! The host-facing facade. Loading validates every setting up front;
//! after that the configuration is immutable and shared by all workers.
//!
//! ```text
//! EngineConfig ──validate──> TerrainGenerator ──> Scheduler ──> workers
//!        ▲                          ▲
//!        └── host-parsed            └── seed + registry from WorldAdapter
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terrane_core::{ChunkCoord, ConfigError, GeneratorConfig, WorldAdapter};
use terrane_procedural::TerrainGenerator;

use crate::events::EventReceiver;
use crate::scheduler::{GenerationHandle, PollResult, Scheduler, SchedulerConfig};

/// Everything the engine needs besides the host adapter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Terrain pipeline settings.
    pub generator: GeneratorConfig,
    /// Worker pool settings.
    pub scheduler: SchedulerConfig,
}

/// A loaded generation engine.
///
/// Dropping it stops the workers; outstanding handles resolve to
/// [`PollResult::Cancelled`] unless their chunk already finished.
pub struct Engine {
    generator: Arc<TerrainGenerator>,
    scheduler: Scheduler,
    events: EventReceiver,
}

impl Engine {
    /// Validates `config` against the host's registry and starts workers.
    ///
    /// The seed and biome registry are read from `world` once, here.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found. No engine exists on error,
    /// so no chunk can be requested with a bad configuration.
    pub fn load(config: EngineConfig, world: Arc<dyn WorldAdapter>) -> Result<Self, ConfigError> {
        config.scheduler.validate()?;

        let seed = world.world_seed();
        let registry = world.biome_registry();
        let biomes = registry.len();
        let generator = Arc::new(TerrainGenerator::new(config.generator, seed, registry)?);

        let (scheduler, events) = Scheduler::start(
            config.scheduler,
            Arc::clone(&generator) as Arc<dyn terrane_core::ChunkGenerator>,
            world,
        )?;

        tracing::info!(
            seed = seed.value(),
            biomes,
            workers = config.scheduler.workers,
            dims = ?generator.config().dims,
            "terrain engine loaded"
        );

        Ok(Self {
            generator,
            scheduler,
            events,
        })
    }

    /// Requests generation of `coord`. Never blocks.
    #[must_use]
    pub fn request_chunk(&self, coord: ChunkCoord) -> GenerationHandle {
        self.scheduler.request(coord)
    }

    /// Current state of `handle`.
    #[must_use]
    pub fn poll_result(&self, handle: &GenerationHandle) -> PollResult {
        self.scheduler.poll(handle)
    }

    /// Cancels `handle`.
    pub fn cancel(&self, handle: &GenerationHandle) {
        self.scheduler.cancel(handle);
    }

    /// Reports that the host now holds the chunk at `coord`.
    ///
    /// Call it after storing every chunk when the host accepts patches;
    /// otherwise features deferred across chunks finished in the wrong
    /// order are never applied. Returns the number of deferred features
    /// applied as a result.
    pub fn neighbor_available(&self, coord: ChunkCoord) -> usize {
        self.scheduler.neighbor_available(coord)
    }

    /// Generation events.
    #[must_use]
    pub const fn events(&self) -> &EventReceiver {
        &self.events
    }

    /// The immutable generator.
    #[must_use]
    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Tasks queued or running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    /// Obligations waiting for a neighbour.
    #[must_use]
    pub fn pending_obligations(&self) -> usize {
        self.scheduler.pending_obligations()
    }
}
