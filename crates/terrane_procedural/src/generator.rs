//! # Terrain Generator
//!
//! The [`ChunkGenerator`] implementation. Each request runs a [`ChunkTask`]:
//!
//! ```text
//! Pending ──► HeightComputed ──► Carved ──► Decorated ──► NeighborResolved ──► Complete
//!   │ height field, biome map,   columns,   features,    rivers (or a
//!   │ blended column plans       caves,     structures   deferred obligation)
//!   │                            sea
//!   └─────────── any stage may fail ──► Failed
//! ```
//!
//! The cancel token is checked before every transition.
//!
//! ## Determinism
//!
//! Everything a task computes is a pure function of the seed, the
//! configuration and the chunk coordinate. The only outside input is the
//! downstream neighbour used by rivers.

use std::sync::Arc;

use terrane_core::{
    BiomeId, BiomeRegistry, CancelToken, ChunkBuffer, ChunkCoord, ChunkGenerator, ChunkPatch,
    ConfigError, CrossChunkFeature, DecorationFeature, DeferredObligation, GeneratedChunk,
    GenerationError, GenerationOutcome, GenerationStage, GeneratorConfig, MaterialId, WorldAdapter,
    WorldSeed,
};

use crate::biome::{BiomeMap, BiomeResolver, Blender};
use crate::decoration::{self, DecorationContext};
use crate::height::{HeightField, HeightPipeline};
use crate::river::RiverLayer;
use crate::structure::StructureSpec;

/// Final decision for one inner column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnPlan {
    /// Biome resolved at the column.
    pub biome: BiomeId,
    /// Biome whose surface rules apply (differs near boundaries).
    pub surface: BiomeId,
    /// Surface height (the top cell's Y).
    pub height: u32,
}

/// Everything the height stage computes for a chunk.
pub struct ChunkPlan {
    /// Chunk coordinate.
    pub coord: ChunkCoord,
    /// Noise over the chunk and its border ring.
    pub field: HeightField,
    /// Resolved biomes over the same extent.
    pub biomes: BiomeMap,
    /// Inner column plans, `[lz][lx]`.
    pub columns: Vec<ColumnPlan>,
}

impl ChunkPlan {
    /// Plan of an inner column.
    #[inline]
    #[must_use]
    pub fn column(&self, lx: u32, lz: u32, width: u32) -> Option<ColumnPlan> {
        self.columns.get(lz as usize * width as usize + lx as usize).copied()
    }
}

/// Deterministic multi-stage terrain generator.
///
/// Holds only immutable state; one instance serves every worker.
pub struct TerrainGenerator {
    /// Validated configuration.
    config: GeneratorConfig,
    /// World seed.
    seed: WorldSeed,
    /// Shared biome registry.
    registry: Arc<BiomeRegistry>,
    /// Height and climate noise.
    pipeline: HeightPipeline,
    /// Climate → biome.
    resolver: BiomeResolver,
    /// Boundary blending.
    blender: Blender,
    /// River noise, when rivers are enabled.
    rivers: Option<RiverLayer>,
    /// Structure features of every biome, in registry order.
    structures: Vec<StructureSpec>,
}

impl TerrainGenerator {
    /// Validates the configuration against the registry and builds every
    /// noise layer.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn new(config: GeneratorConfig, seed: WorldSeed, registry: Arc<BiomeRegistry>) -> Result<Self, ConfigError> {
        config.validate()?;
        registry.validate_against(config.dims, config.border_margin)?;

        let resolver = BiomeResolver::new(Arc::clone(&registry))?;
        let structures = registry
            .iter()
            .flat_map(|(biome, descriptor)| {
                descriptor.features.iter().enumerate().filter_map(move |(feature_index, feature)| {
                    match *feature {
                        DecorationFeature::Structure {
                            wall,
                            floor,
                            size,
                            height,
                            spacing,
                            chance,
                        } => Some(StructureSpec {
                            biome,
                            feature_index,
                            wall,
                            floor,
                            size,
                            height,
                            spacing,
                            chance,
                        }),
                        _ => None,
                    }
                })
            })
            .collect();

        Ok(Self {
            pipeline: HeightPipeline::new(seed, &config),
            blender: Blender::new(&registry, seed),
            rivers: config.rivers.as_ref().map(|rivers| RiverLayer::new(seed, rivers)),
            structures,
            resolver,
            registry,
            seed,
            config,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// The biome registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<BiomeRegistry> {
        &self.registry
    }

    /// Biome and unblended height at any world column.
    ///
    /// # Errors
    ///
    /// Propagates [`GenerationError::NonFiniteNoise`].
    pub fn unblended_column(&self, x: i64, z: i64) -> Result<(BiomeId, f64), GenerationError> {
        let sample = self.pipeline.column(x, z)?;
        let biome = self.resolver.resolve(&sample.climate);
        Ok((biome, self.registry.descriptor(biome).height.apply(sample.terrain)))
    }

    /// Computes the height field, biome map and blended column plans.
    ///
    /// # Errors
    ///
    /// Propagates [`GenerationError::NonFiniteNoise`].
    pub fn plan(&self, coord: ChunkCoord, with_caves: bool) -> Result<ChunkPlan, GenerationError> {
        let dims = self.config.dims;
        let field = HeightField::compute(&self.pipeline, coord, dims, self.config.border_margin, with_caves)?;
        let biomes = BiomeMap::resolve(&field, &self.resolver);
        let ceiling = f64::from(dims.height - 1);

        let mut columns = Vec::with_capacity(dims.column_count());
        for lz in 0..dims.depth {
            for lx in 0..dims.width {
                let sample = field.inner(lx, lz).ok_or_else(|| {
                    GenerationError::Internal(format!("height field is missing column ({lx}, {lz})"))
                })?;
                let world = (coord.origin_x(dims) + i64::from(lx), coord.origin_z(dims) + i64::from(lz));
                let blended = self
                    .blender
                    .blend(&self.registry, &biomes, lx, lz, sample.terrain, world);
                columns.push(ColumnPlan {
                    biome: blended.biome,
                    surface: blended.surface,
                    height: blended.height.round().clamp(0.0, ceiling) as u32,
                });
            }
        }

        Ok(ChunkPlan {
            coord,
            field,
            biomes,
            columns,
        })
    }

    /// Fills every column: floor, filler/stone, top, caves, sea water.
    fn carve(&self, plan: &ChunkPlan, buffer: &mut ChunkBuffer) -> Result<(), GenerationError> {
        let dims = self.config.dims;
        for lz in 0..dims.depth {
            for lx in 0..dims.width {
                let column = plan
                    .column(lx, lz, dims.width)
                    .ok_or_else(|| GenerationError::Internal(format!("no plan for column ({lx}, {lz})")))?;
                self.carve_column(plan, buffer, lx, lz, column)?;
            }
        }
        Ok(())
    }

    fn carve_column(
        &self,
        plan: &ChunkPlan,
        buffer: &mut ChunkBuffer,
        lx: u32,
        lz: u32,
        column: ColumnPlan,
    ) -> Result<(), GenerationError> {
        let rules = self.registry.descriptor(column.surface).surface;
        let h = column.height;
        let underwater = self.config.sea_level.is_some_and(|sea| h < sea);

        for y in 0..=h {
            let material = match self.config.floor {
                Some(floor) if y == 0 => floor,
                _ if y == h && underwater => rules.underwater,
                _ if y == h => rules.top,
                _ if rules.filler_depth.is_some_and(|depth| h - y > depth) => self.config.stone,
                _ => rules.filler,
            };
            buffer.set(lx, y, lz, material)?;
        }

        if let Some(caves) = &self.config.caves {
            for y in caves.min_y..caves.max_y.min(h) {
                if h - y <= caves.surface_margin || (y == 0 && self.config.floor.is_some()) {
                    continue;
                }
                if plan.field.cave_density(lx, y, lz).is_some_and(|d| d > caves.threshold) {
                    buffer.set(lx, y, lz, MaterialId::EMPTY)?;
                }
            }
        }

        if let Some(sea) = self.config.sea_level {
            for y in h + 1..=sea {
                buffer.set(lx, y, lz, self.config.water)?;
            }
        }
        Ok(())
    }

    /// Biome features, then structures from region anchors.
    fn decorate(&self, plan: &ChunkPlan, buffer: &mut ChunkBuffer) -> Result<(), GenerationError> {
        let ctx = DecorationContext {
            seed: self.seed,
            coord: plan.coord,
            registry: &self.registry,
            columns: &plan.columns,
        };
        decoration::decorate(&ctx, &plan.biomes.inner_biomes(), buffer);

        let dims = self.config.dims;
        let (ox, oz) = (plan.coord.origin_x(dims), plan.coord.origin_z(dims));
        for spec in &self.structures {
            for region in spec.regions(ox, oz, dims.width, dims.depth) {
                let Some(anchor) = spec.anchor(self.seed, region) else {
                    continue;
                };
                let (cx, cz) = spec.center(anchor);
                let (biome, height) = self.unblended_column(cx, cz)?;
                let base = height.round() as i64;
                if biome != spec.biome || base < 1 || base + i64::from(spec.height) >= i64::from(dims.height) {
                    continue;
                }
                let written = spec.stamp(buffer, plan.coord, anchor, base);
                tracing::trace!("chunk {} structure at ({}, {}): {} cells", plan.coord, anchor.0, anchor.1, written);
            }
        }
        Ok(())
    }

    /// Rivers: carve now if the downstream neighbour exists, defer otherwise.
    fn resolve_neighbors(
        &self,
        plan: &ChunkPlan,
        buffer: &mut ChunkBuffer,
        world: &dyn WorldAdapter,
    ) -> Result<Vec<DeferredObligation>, GenerationError> {
        let Some(rivers) = &self.rivers else {
            return Ok(Vec::new());
        };
        let Some(river) = rivers.plan(plan.coord, &plan.field, &plan.biomes, &self.registry, &plan.columns) else {
            return Ok(Vec::new());
        };

        let downstream = plan.coord.neighbor(river.downstream);
        match world.generated_neighbor(downstream) {
            Some(neighbor) => {
                let level = rivers.water_level(&river, &neighbor);
                let patch = rivers.channel(plan.coord, &river, level, self.config.dims.height);
                buffer.apply_patch(&patch)?;
                tracing::debug!("chunk {} river carved towards {} at level {}", plan.coord, downstream, level);
                Ok(Vec::new())
            }
            None => {
                tracing::debug!("chunk {} river deferred until {} exists", plan.coord, downstream);
                Ok(vec![DeferredObligation {
                    origin: plan.coord,
                    requires: downstream,
                    feature: CrossChunkFeature::River,
                }])
            }
        }
    }
}

impl ChunkGenerator for TerrainGenerator {
    fn generate(
        &self,
        coord: ChunkCoord,
        world: &dyn WorldAdapter,
        cancel: &CancelToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        ChunkTask::new(self, coord).run(world, cancel)
    }

    fn resolve_deferred(
        &self,
        obligation: &DeferredObligation,
        neighbor: &ChunkBuffer,
    ) -> Result<Option<ChunkPatch>, GenerationError> {
        match obligation.feature {
            CrossChunkFeature::River => {
                let Some(rivers) = &self.rivers else {
                    return Ok(None);
                };
                let plan = self.plan(obligation.origin, false)?;
                let Some(river) = rivers.plan(plan.coord, &plan.field, &plan.biomes, &self.registry, &plan.columns)
                else {
                    return Ok(None);
                };
                if plan.coord.neighbor(river.downstream) != obligation.requires {
                    return Ok(None);
                }
                let level = rivers.water_level(&river, neighbor);
                let patch = rivers.channel(plan.coord, &river, level, self.config.dims.height);
                Ok((!patch.is_empty()).then_some(patch))
            }
        }
    }
}

/// State of a running task. Each variant carries what the next stage needs.
enum TaskState {
    Pending,
    HeightComputed(ChunkPlan),
    Carved(ChunkPlan, ChunkBuffer),
    Decorated(ChunkPlan, ChunkBuffer),
    NeighborResolved(GeneratedChunk),
    Complete(GeneratedChunk),
}

impl TaskState {
    const fn stage(&self) -> GenerationStage {
        match self {
            Self::Pending => GenerationStage::Pending,
            Self::HeightComputed(..) => GenerationStage::HeightComputed,
            Self::Carved(..) => GenerationStage::Carved,
            Self::Decorated(..) => GenerationStage::Decorated,
            Self::NeighborResolved(..) => GenerationStage::NeighborResolved,
            Self::Complete(..) => GenerationStage::Complete,
        }
    }
}

/// One chunk's pass through the pipeline.
pub struct ChunkTask<'a> {
    generator: &'a TerrainGenerator,
    coord: ChunkCoord,
    state: TaskState,
}

impl<'a> ChunkTask<'a> {
    /// Creates a pending task.
    #[must_use]
    pub const fn new(generator: &'a TerrainGenerator, coord: ChunkCoord) -> Self {
        Self {
            generator,
            coord,
            state: TaskState::Pending,
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> GenerationStage {
        self.state.stage()
    }

    /// Drives the task to a terminal state or cancellation.
    ///
    /// # Errors
    ///
    /// Returns the failing stage's [`GenerationError`]; the task is then
    /// `Failed`.
    pub fn run(mut self, world: &dyn WorldAdapter, cancel: &CancelToken) -> Result<GenerationOutcome, GenerationError> {
        loop {
            if let TaskState::Complete(chunk) = self.state {
                return Ok(GenerationOutcome::Complete(chunk));
            }
            if cancel.is_cancelled() {
                tracing::debug!("chunk {} cancelled at {}", self.coord, self.stage());
                return Ok(GenerationOutcome::Cancelled { stage: self.stage() });
            }

            let from = self.stage();
            self.state = match self.step(world) {
                Ok(next) => next,
                Err(err) => {
                    tracing::debug!("chunk {} {} after {}: {}", self.coord, GenerationStage::Failed, from, err);
                    return Err(err);
                }
            };
            tracing::trace!("chunk {} {} -> {}", self.coord, from, self.stage());
        }
    }

    /// Performs exactly one transition.
    fn step(&mut self, world: &dyn WorldAdapter) -> Result<TaskState, GenerationError> {
        let generator = self.generator;
        let state = std::mem::replace(&mut self.state, TaskState::Pending);
        Ok(match state {
            TaskState::Pending => TaskState::HeightComputed(generator.plan(self.coord, true)?),
            TaskState::HeightComputed(plan) => {
                let mut buffer = ChunkBuffer::new(self.coord, generator.config.dims);
                generator.carve(&plan, &mut buffer)?;
                TaskState::Carved(plan, buffer)
            }
            TaskState::Carved(plan, mut buffer) => {
                generator.decorate(&plan, &mut buffer)?;
                TaskState::Decorated(plan, buffer)
            }
            TaskState::Decorated(plan, mut buffer) => {
                let deferred = generator.resolve_neighbors(&plan, &mut buffer, world)?;
                TaskState::NeighborResolved(GeneratedChunk { buffer, deferred })
            }
            TaskState::NeighborResolved(chunk) | TaskState::Complete(chunk) => TaskState::Complete(chunk),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use terrane_core::{BiomeDescriptor, ChunkDimensions, HeightModifier, SurfaceRules};

    struct NoNeighbors(Arc<BiomeRegistry>);

    impl WorldAdapter for NoNeighbors {
        fn generated_neighbor(&self, _coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
            None
        }
        fn world_seed(&self) -> WorldSeed {
            WorldSeed::new(0)
        }
        fn biome_registry(&self) -> Arc<BiomeRegistry> {
            Arc::clone(&self.0)
        }
    }

    fn layered_registry() -> Arc<BiomeRegistry> {
        Arc::new(
            BiomeRegistry::new(
                "hills",
                vec![BiomeDescriptor {
                    name: "hills".into(),
                    climate: None,
                    surface: SurfaceRules {
                        top: presets::GRASS,
                        filler: presets::DIRT,
                        underwater: presets::SAND,
                        filler_depth: Some(3),
                    },
                    height: HeightModifier::flat(40.0),
                    features: Vec::new(),
                    blending_radius: 0,
                }],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_column_layers() {
        let registry = layered_registry();
        let mut config = GeneratorConfig::flat(ChunkDimensions::new(4, 4, 64));
        config.floor = Some(presets::BEDROCK);
        let generator = TerrainGenerator::new(config, WorldSeed::new(3), Arc::clone(&registry)).unwrap();
        let chunk = generator
            .generate_blocking(ChunkCoord::new(0, 0), &NoNeighbors(registry))
            .unwrap();

        let buf = &chunk.buffer;
        assert_eq!(buf.get(1, 0, 1), Ok(presets::BEDROCK));
        assert_eq!(buf.get(1, 36, 1), Ok(presets::STONE));
        assert_eq!(buf.get(1, 37, 1), Ok(presets::DIRT));
        assert_eq!(buf.get(1, 39, 1), Ok(presets::DIRT));
        assert_eq!(buf.get(1, 40, 1), Ok(presets::GRASS));
        assert_eq!(buf.get(1, 41, 1), Ok(MaterialId::EMPTY));
        assert!(chunk.deferred.is_empty());
    }

    #[test]
    fn test_sea_fills_above_low_ground() {
        let registry = layered_registry();
        let mut config = GeneratorConfig::flat(ChunkDimensions::new(4, 4, 64));
        config.sea_level = Some(45);
        let generator = TerrainGenerator::new(config, WorldSeed::new(3), Arc::clone(&registry)).unwrap();
        let chunk = generator
            .generate_blocking(ChunkCoord::new(2, -2), &NoNeighbors(registry))
            .unwrap();

        assert_eq!(chunk.buffer.get(0, 40, 0), Ok(presets::SAND));
        assert_eq!(chunk.buffer.get(0, 41, 0), Ok(presets::WATER));
        assert_eq!(chunk.buffer.get(0, 45, 0), Ok(presets::WATER));
        assert_eq!(chunk.buffer.get(0, 46, 0), Ok(MaterialId::EMPTY));
    }

    #[test]
    fn test_cancel_before_start() {
        let registry = layered_registry();
        let generator = TerrainGenerator::new(
            GeneratorConfig::flat(ChunkDimensions::new(4, 4, 64)),
            WorldSeed::new(3),
            Arc::clone(&registry),
        )
        .unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = generator
            .generate(ChunkCoord::new(0, 0), &NoNeighbors(registry), &cancel)
            .unwrap();
        assert_eq!(outcome, GenerationOutcome::Cancelled { stage: GenerationStage::Pending });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GeneratorConfig::default();
        config.noise.terrain.octaves[0].frequency = -0.5;
        let result = TerrainGenerator::new(config, WorldSeed::new(1), layered_registry());
        assert!(matches!(result, Err(ConfigError::NonPositiveFrequency { .. })));
    }

    #[test]
    fn test_caves_stay_below_surface_margin() {
        let registry = layered_registry();
        let mut config = GeneratorConfig::flat(ChunkDimensions::STANDARD);
        let mut caves = terrane_core::CaveConfig::default();
        caves.threshold = -0.99;
        caves.min_y = 1;
        caves.max_y = 60;
        caves.surface_margin = 5;
        config.caves = Some(caves);
        let generator = TerrainGenerator::new(config, WorldSeed::new(9), Arc::clone(&registry)).unwrap();
        let chunk = generator
            .generate_blocking(ChunkCoord::new(0, 0), &NoNeighbors(registry))
            .unwrap();

        // Nearly everything in range is carved, but never within 5 of the surface
        assert_eq!(chunk.buffer.get(3, 10, 3), Ok(MaterialId::EMPTY));
        for y in 35..=40 {
            assert_ne!(chunk.buffer.get(3, y, 3), Ok(MaterialId::EMPTY), "y = {y}");
        }
        assert_eq!(chunk.buffer.get(3, 0, 3), Ok(presets::STONE));
    }

    #[test]
    fn test_largest_surface_margin_carves_nothing() {
        let registry = layered_registry();
        let mut config = GeneratorConfig::flat(ChunkDimensions::STANDARD);
        let mut caves = terrane_core::CaveConfig::default();
        caves.threshold = -0.99;
        caves.min_y = 1;
        caves.max_y = 60;
        caves.surface_margin = ChunkDimensions::STANDARD.height - 1;
        config.caves = Some(caves);
        let generator = TerrainGenerator::new(config, WorldSeed::new(9), Arc::clone(&registry)).unwrap();
        let chunk = generator
            .generate_blocking(ChunkCoord::new(0, 0), &NoNeighbors(registry))
            .unwrap();

        for y in 0..=40 {
            assert_ne!(chunk.buffer.get(3, y, 3), Ok(MaterialId::EMPTY), "y = {y}");
        }
    }
}
