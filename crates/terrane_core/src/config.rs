//! # Generator Configuration
//!
//! Pre-parsed configuration records. The core never reads text itself:
//! hosts deserialize these with the `serde` format of their choice and the
//! engine validates them once, at load time.
//!
//! ## Validation
//!
//! [`GeneratorConfig::validate`] rejects every malformed value with a
//! [`ConfigError`]. A configuration that validates can never fail
//! generation for configuration reasons.

use serde::{Deserialize, Serialize};

use crate::dims::ChunkDimensions;
use crate::error::ConfigError;
use crate::material::{palette, MaterialId};

/// One octave of a layered noise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OctaveConfig {
    /// Spatial frequency (cycles per block). Must be positive.
    pub frequency: f64,
    /// Weight of this octave. Must be positive.
    pub amplitude: f64,
    /// Offset mixed into the octave's seed.
    #[serde(default)]
    pub seed_offset: u64,
}

/// A layered (fractal) noise definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    /// Octaves, summed with normalised weights.
    pub octaves: Vec<OctaveConfig>,
}

impl NoiseLayerConfig {
    /// Builds a classic fractal layer.
    ///
    /// # Arguments
    ///
    /// * `base_frequency` - Frequency of the first octave
    /// * `octaves` - Number of noise layers (typically 4-8)
    /// * `persistence` - Amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    #[must_use]
    pub fn fractal(base_frequency: f64, octaves: usize, persistence: f64, lacunarity: f64) -> Self {
        let mut amplitude = 1.0;
        let mut frequency = base_frequency;
        let octaves = (0..octaves)
            .map(|i| {
                let octave = OctaveConfig {
                    frequency,
                    amplitude,
                    seed_offset: i as u64,
                };
                amplitude *= persistence;
                frequency *= lacunarity;
                octave
            })
            .collect();
        Self { octaves }
    }

    /// Validates every octave.
    ///
    /// # Errors
    ///
    /// Rejects empty layers and non-positive or non-finite parameters.
    pub fn validate(&self, layer: &str) -> Result<(), ConfigError> {
        if self.octaves.is_empty() {
            return Err(ConfigError::EmptyNoiseLayer(layer.to_string()));
        }
        for (octave, cfg) in self.octaves.iter().enumerate() {
            if !(cfg.frequency.is_finite() && cfg.frequency > 0.0) {
                return Err(ConfigError::NonPositiveFrequency {
                    layer: layer.to_string(),
                    octave,
                    value: cfg.frequency,
                });
            }
            if !(cfg.amplitude.is_finite() && cfg.amplitude > 0.0) {
                return Err(ConfigError::NonPositiveAmplitude {
                    layer: layer.to_string(),
                    octave,
                    value: cfg.amplitude,
                });
            }
        }
        Ok(())
    }
}

/// Noise layers of the height and climate pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Terrain shape noise, mapped to height by each biome.
    pub terrain: NoiseLayerConfig,
    /// Temperature climate axis.
    pub temperature: NoiseLayerConfig,
    /// Humidity climate axis.
    pub humidity: NoiseLayerConfig,
    /// Continentalness climate axis.
    pub continentalness: NoiseLayerConfig,
}

impl NoiseConfig {
    /// Validates all layers.
    ///
    /// # Errors
    ///
    /// Returns the first invalid layer.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate("terrain")?;
        self.temperature.validate("temperature")?;
        self.humidity.validate("humidity")?;
        self.continentalness.validate("continentalness")
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            terrain: NoiseLayerConfig::fractal(0.0025, 4, 0.5, 2.0),
            temperature: NoiseLayerConfig::fractal(0.002, 2, 0.5, 2.0),
            humidity: NoiseLayerConfig::fractal(0.003, 4, 0.5, 2.0),
            continentalness: NoiseLayerConfig::fractal(0.0012, 3, 0.5, 2.0),
        }
    }
}

/// 3-D density carving (caves).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaveConfig {
    /// 3-D density noise.
    pub noise: NoiseLayerConfig,
    /// Cells with density above this value are carved out.
    pub threshold: f64,
    /// Lowest carved Y (inclusive).
    pub min_y: u32,
    /// Highest carved Y (exclusive).
    pub max_y: u32,
    /// Solid cells always kept below the surface.
    pub surface_margin: u32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            noise: NoiseLayerConfig::fractal(0.04, 2, 0.5, 2.0),
            threshold: 0.55,
            min_y: 4,
            max_y: 56,
            surface_margin: 6,
        }
    }
}

/// River channels carved towards a downstream neighbour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiverConfig {
    /// River course noise; a column is river where `|noise| < width`.
    pub noise: NoiseLayerConfig,
    /// Half-width of the course in noise units.
    pub width: f64,
    /// Channel depth below the water level.
    pub depth: u32,
    /// Water material.
    pub water: MaterialId,
    /// River bed material.
    pub bed: MaterialId,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            noise: NoiseLayerConfig::fractal(0.003, 2, 0.5, 2.0),
            width: 0.035,
            depth: 3,
            water: palette::WATER,
            bed: palette::GRAVEL,
        }
    }
}

/// Complete generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Chunk dimensions (process-wide constant).
    pub dims: ChunkDimensions,
    /// Extra columns computed around each chunk for blending and rivers.
    pub border_margin: u32,
    /// Water fills empty cells below this level.
    pub sea_level: Option<u32>,
    /// Sea water material.
    pub water: MaterialId,
    /// Material below a biome's filler depth.
    pub stone: MaterialId,
    /// Material forced at y = 0.
    pub floor: Option<MaterialId>,
    /// Height and climate noise.
    pub noise: NoiseConfig,
    /// Cave carving.
    pub caves: Option<CaveConfig>,
    /// River channels.
    pub rivers: Option<RiverConfig>,
}

impl GeneratorConfig {
    /// Largest accepted border margin.
    pub const MAX_BORDER_MARGIN: u32 = 32;

    /// Flat, feature-free configuration: no sea, caves, rivers or floor.
    #[must_use]
    pub fn flat(dims: ChunkDimensions) -> Self {
        Self {
            dims,
            sea_level: None,
            floor: None,
            caves: None,
            rivers: None,
            ..Self::default()
        }
    }

    /// Validates the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dims.validate()?;
        self.noise.validate()?;

        if !(1..=Self::MAX_BORDER_MARGIN).contains(&self.border_margin) {
            return Err(ConfigError::InvalidSetting {
                field: "border_margin",
                reason: format!("must be in 1..={}, got {}", Self::MAX_BORDER_MARGIN, self.border_margin),
            });
        }
        if let Some(sea) = self.sea_level {
            if sea >= self.dims.height {
                return Err(ConfigError::InvalidSetting {
                    field: "sea_level",
                    reason: format!("{sea} is not below world height {}", self.dims.height),
                });
            }
        }
        if self.water.is_empty() || self.stone.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "water/stone",
                reason: "must not be the empty material".into(),
            });
        }
        if let Some(caves) = &self.caves {
            self.validate_caves(caves)?;
        }
        if let Some(rivers) = &self.rivers {
            self.validate_rivers(rivers)?;
        }
        Ok(())
    }

    fn validate_caves(&self, caves: &CaveConfig) -> Result<(), ConfigError> {
        caves.noise.validate("caves")?;
        if !(caves.threshold.is_finite() && caves.threshold > -1.0 && caves.threshold < 1.0) {
            return Err(ConfigError::InvalidSetting {
                field: "caves.threshold",
                reason: format!("must be inside (-1, 1), got {}", caves.threshold),
            });
        }
        if caves.min_y >= caves.max_y || caves.max_y > self.dims.height {
            return Err(ConfigError::InvalidSetting {
                field: "caves.min_y/max_y",
                reason: format!(
                    "need min_y < max_y <= {}, got {}..{}",
                    self.dims.height, caves.min_y, caves.max_y
                ),
            });
        }
        if caves.surface_margin >= self.dims.height {
            return Err(ConfigError::InvalidSetting {
                field: "caves.surface_margin",
                reason: format!(
                    "must be below world height {}, got {}",
                    self.dims.height, caves.surface_margin
                ),
            });
        }
        Ok(())
    }

    fn validate_rivers(&self, rivers: &RiverConfig) -> Result<(), ConfigError> {
        rivers.noise.validate("rivers")?;
        if !(rivers.width.is_finite() && rivers.width > 0.0) {
            return Err(ConfigError::InvalidSetting {
                field: "rivers.width",
                reason: format!("must be positive, got {}", rivers.width),
            });
        }
        if rivers.depth == 0 || rivers.depth >= self.dims.height {
            return Err(ConfigError::InvalidSetting {
                field: "rivers.depth",
                reason: format!("must be in 1..{}, got {}", self.dims.height, rivers.depth),
            });
        }
        if rivers.water.is_empty() || rivers.bed.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "rivers.water/bed",
                reason: "must not be the empty material".into(),
            });
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dims: ChunkDimensions::STANDARD,
            border_margin: 8,
            sea_level: Some(62),
            water: palette::WATER,
            stone: palette::STONE,
            floor: Some(palette::BEDROCK),
            noise: NoiseConfig::default(),
            caves: Some(CaveConfig::default()),
            rivers: Some(RiverConfig::default()),
        }
    }
}
