//! # Height Pipeline
//!
//! Per-column terrain noise and climate, plus the transient [`HeightField`]
//! a task computes for its chunk and a border ring around it.
//!
//! ## Extent Layout
//!
//! ```text
//!  margin │      chunk       │ margin
//! ────────┼──────────────────┼────────
//!         │  inner columns   │
//! ```
//!
//! Extent coordinates `(ex, ez)` start at the ring's corner; inner column
//! `(lx, lz)` sits at `(lx + margin, lz + margin)`.

use terrane_core::{
    CaveConfig, ChunkCoord, ChunkDimensions, ClimateSample, GenerationError, GeneratorConfig,
    WorldSeed,
};

use crate::climate::ClimateSampler;
use crate::noise::{purpose, LayeredNoise};

/// Noise values of one world column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSample {
    /// Terrain shape noise in [-1, 1].
    pub terrain: f64,
    /// Climate at the column.
    pub climate: ClimateSample,
}

/// Cave density layer and its vertical range.
struct CaveLayer {
    noise: LayeredNoise,
    min_y: u32,
    max_y: u32,
}

/// Immutable noise stack shared by every task.
pub struct HeightPipeline {
    terrain: LayeredNoise,
    climate: ClimateSampler,
    caves: Option<CaveLayer>,
}

impl HeightPipeline {
    /// Builds every layer from a validated configuration.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &GeneratorConfig) -> Self {
        Self {
            terrain: LayeredNoise::new(seed, purpose::TERRAIN, &config.noise.terrain),
            climate: ClimateSampler::new(seed, &config.noise),
            caves: config.caves.as_ref().map(|caves: &CaveConfig| CaveLayer {
                noise: LayeredNoise::new(seed, purpose::CAVES, &caves.noise),
                min_y: caves.min_y,
                max_y: caves.max_y,
            }),
        }
    }

    /// Terrain noise and climate at a world column.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::NonFiniteNoise`] if any value is NaN or
    /// infinite.
    pub fn column(&self, x: i64, z: i64) -> Result<ColumnSample, GenerationError> {
        let sample = ColumnSample {
            terrain: self.terrain.sample_column(x, z),
            climate: self.climate.sample(x, z),
        };
        if sample.terrain.is_finite() && sample.climate.is_finite() {
            Ok(sample)
        } else {
            Err(GenerationError::NonFiniteNoise { x, z })
        }
    }

    /// Cave density at a world cell, `None` when caves are disabled.
    #[must_use]
    pub fn cave_density(&self, x: i64, y: u32, z: i64) -> Option<f64> {
        self.caves
            .as_ref()
            .map(|caves| caves.noise.sample3(x as f64, f64::from(y), z as f64))
    }
}

/// Column samples over a chunk plus its border ring.
pub struct HeightField {
    margin: u32,
    width: u32,
    depth: u32,
    samples: Vec<ColumnSample>,
    cave_min_y: u32,
    cave_span: u32,
    /// Inner-column density, `[lz][lx][y - cave_min_y]`.
    density: Vec<f64>,
}

impl HeightField {
    /// Computes the field for `coord`.
    ///
    /// Cave density is computed only when `with_caves` is set and the
    /// pipeline has a cave layer.
    ///
    /// # Errors
    ///
    /// Propagates [`GenerationError::NonFiniteNoise`].
    pub fn compute(
        pipeline: &HeightPipeline,
        coord: ChunkCoord,
        dims: ChunkDimensions,
        margin: u32,
        with_caves: bool,
    ) -> Result<Self, GenerationError> {
        let width = dims.width + 2 * margin;
        let depth = dims.depth + 2 * margin;
        let corner_x = coord.origin_x(dims) - i64::from(margin);
        let corner_z = coord.origin_z(dims) - i64::from(margin);

        let mut samples = Vec::with_capacity(width as usize * depth as usize);
        for ez in 0..depth {
            for ex in 0..width {
                samples.push(pipeline.column(corner_x + i64::from(ex), corner_z + i64::from(ez))?);
            }
        }

        let (cave_min_y, cave_span, density) = match pipeline.caves.as_ref() {
            Some(caves) if with_caves => {
                let span = caves.max_y - caves.min_y;
                let mut density = Vec::with_capacity(dims.column_count() * span as usize);
                for lz in 0..dims.depth {
                    for lx in 0..dims.width {
                        let x = coord.origin_x(dims) + i64::from(lx);
                        let z = coord.origin_z(dims) + i64::from(lz);
                        density.extend(
                            (caves.min_y..caves.max_y)
                                .map(|y| caves.noise.sample3(x as f64, f64::from(y), z as f64)),
                        );
                    }
                }
                (caves.min_y, span, density)
            }
            _ => (0, 0, Vec::new()),
        };

        Ok(Self {
            margin,
            width,
            depth,
            samples,
            cave_min_y,
            cave_span,
            density,
        })
    }

    /// Border ring width.
    #[inline]
    #[must_use]
    pub const fn margin(&self) -> u32 {
        self.margin
    }

    /// Extent width (chunk width + 2 * margin).
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Extent depth (chunk depth + 2 * margin).
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Sample at extent coordinates, `None` outside the extent.
    #[inline]
    #[must_use]
    pub fn get(&self, ex: u32, ez: u32) -> Option<&ColumnSample> {
        if ex < self.width && ez < self.depth {
            self.samples.get(ez as usize * self.width as usize + ex as usize)
        } else {
            None
        }
    }

    /// Sample of an inner column (local chunk coordinates).
    #[inline]
    #[must_use]
    pub fn inner(&self, lx: u32, lz: u32) -> Option<&ColumnSample> {
        self.get(lx + self.margin, lz + self.margin)
    }

    /// Cave density of an inner cell, `None` outside the density range.
    #[must_use]
    pub fn cave_density(&self, lx: u32, y: u32, lz: u32) -> Option<f64> {
        if y < self.cave_min_y || y - self.cave_min_y >= self.cave_span {
            return None;
        }
        let inner_width = self.width - 2 * self.margin;
        let column = lz as usize * inner_width as usize + lx as usize;
        self.density
            .get(column * self.cave_span as usize + (y - self.cave_min_y) as usize)
            .copied()
    }
}
