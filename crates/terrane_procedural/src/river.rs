//! # Rivers
//!
//! River channels are the one feature that needs a neighbour's data: the
//! water level depends on the downstream chunk's terrain.
//!
//! 1. River columns are inner columns where `|river_noise| < width`
//! 2. Downstream is the side whose border strip has the lowest mean
//!    unblended height (ties resolved in `Direction::ALL` order)
//! 3. Water level = `min(lowest river surface - 1, lowest neighbour edge surface)`
//!
//! The plan depends only on the seed and the chunk coordinate, so the
//! same channel can be carved in place or produced later as a patch.

use terrane_core::{
    BiomeRegistry, CellWrite, ChunkBuffer, ChunkCoord, ChunkPatch, Direction, MaterialId, RiverConfig,
    WorldSeed,
};

use crate::biome::BiomeMap;
use crate::generator::ColumnPlan;
use crate::height::HeightField;
use crate::noise::{purpose, LayeredNoise};

/// River course noise plus channel settings.
pub struct RiverLayer {
    noise: LayeredNoise,
    config: RiverConfig,
}

/// Where this chunk's channel runs and which columns it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiverPlan {
    /// Side the river drains towards.
    pub downstream: Direction,
    /// `(lx, lz, surface height)` of every river column.
    pub columns: Vec<(u32, u32, u32)>,
}

impl RiverPlan {
    /// Lowest surface among river columns.
    #[must_use]
    pub fn min_surface(&self) -> u32 {
        self.columns.iter().map(|&(_, _, h)| h).min().unwrap_or(0)
    }
}

impl RiverLayer {
    /// Builds the layer.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &RiverConfig) -> Self {
        Self {
            noise: LayeredNoise::new(seed, purpose::RIVERS, &config.noise),
            config: config.clone(),
        }
    }

    /// Computes the chunk's river plan, `None` if no column is river.
    #[must_use]
    pub fn plan(
        &self,
        coord: ChunkCoord,
        field: &HeightField,
        biomes: &BiomeMap,
        registry: &BiomeRegistry,
        columns: &[ColumnPlan],
    ) -> Option<RiverPlan> {
        let margin = field.margin();
        let width = field.width() - 2 * margin;
        let depth = field.depth() - 2 * margin;
        let origin_x = i64::from(coord.x) * i64::from(width);
        let origin_z = i64::from(coord.z) * i64::from(depth);

        let mut river = Vec::new();
        for lz in 0..depth {
            for lx in 0..width {
                let value = self
                    .noise
                    .sample_column(origin_x + i64::from(lx), origin_z + i64::from(lz));
                if value.abs() < self.config.width {
                    if let Some(column) = columns.get(lz as usize * width as usize + lx as usize) {
                        river.push((lx, lz, column.height));
                    }
                }
            }
        }
        if river.is_empty() {
            return None;
        }

        let strip_mean = |direction: Direction| {
            let (xs, zs) = match direction {
                Direction::East => (width + margin..width + 2 * margin, margin..depth + margin),
                Direction::West => (0..margin, margin..depth + margin),
                Direction::South => (margin..width + margin, depth + margin..depth + 2 * margin),
                Direction::North => (margin..width + margin, 0..margin),
            };
            let mut total = 0.0;
            let mut count = 0.0;
            for ez in zs {
                for ex in xs.clone() {
                    if let (Some(sample), Some(biome)) = (field.get(ex, ez), biomes.get(ex, ez)) {
                        total += registry.descriptor(biome).height.apply(sample.terrain);
                        count += 1.0;
                    }
                }
            }
            if count > 0.0 { total / count } else { f64::INFINITY }
        };

        let mut downstream = Direction::ALL[0];
        let mut lowest = strip_mean(downstream);
        for direction in Direction::ALL.into_iter().skip(1) {
            let mean = strip_mean(direction);
            if mean < lowest {
                lowest = mean;
                downstream = direction;
            }
        }

        Some(RiverPlan {
            downstream,
            columns: river,
        })
    }

    /// Water level given the downstream neighbour's terrain.
    #[must_use]
    pub fn water_level(&self, plan: &RiverPlan, neighbor: &ChunkBuffer) -> u32 {
        let own = plan.min_surface().saturating_sub(1);
        let dims = neighbor.dims();
        let edge: Vec<(u32, u32)> = match plan.downstream {
            Direction::East => (0..dims.depth).map(|z| (0, z)).collect(),
            Direction::West => (0..dims.depth).map(|z| (dims.width - 1, z)).collect(),
            Direction::South => (0..dims.width).map(|x| (x, 0)).collect(),
            Direction::North => (0..dims.width).map(|x| (x, dims.depth - 1)).collect(),
        };
        edge.into_iter()
            .filter_map(|(x, z)| neighbor.surface_height(x, z).ok().flatten())
            .min()
            .map_or(own, |edge_min| own.min(edge_min))
    }

    /// Channel writes for a water level: bed, water up to the level and
    /// cleared banks up to one cell above the old surface.
    #[must_use]
    pub fn channel(&self, coord: ChunkCoord, plan: &RiverPlan, level: u32, height: u32) -> ChunkPatch {
        let bed = level.saturating_sub(self.config.depth);
        let mut patch = ChunkPatch::new(coord);
        for &(x, z, surface) in &plan.columns {
            let mut write = |y: u32, material: MaterialId| patch.writes.push(CellWrite { x, y, z, material });
            write(bed, self.config.bed);
            for y in bed + 1..=level {
                write(y, self.config.water);
            }
            for y in level + 1..=(surface + 1).min(height - 1) {
                write(y, MaterialId::EMPTY);
            }
        }
        patch
    }
}
