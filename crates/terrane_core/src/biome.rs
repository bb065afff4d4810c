//! # Biome Registry
//!
//! Data-driven biome descriptors, validated once and shared read-only.
//!
//! ## Climate Model
//!
//! Each biome may declare a target [`ClimateSample`]. The resolver picks
//! the biome whose target is nearest to the sampled climate. Biomes with no
//! target are only reachable as the registry default.
//!
//! ## Ordering
//!
//! Descriptors keep their insertion order. [`BiomeId`] is the insertion
//! index, and every ordered walk (resolution ties, decoration order) uses
//! it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dims::ChunkDimensions;
use crate::error::ConfigError;
use crate::material::MaterialId;

/// Largest accepted blending radius, in columns.
pub const MAX_BLENDING_RADIUS: u32 = 32;

/// Index of a biome inside its registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BiomeId(u16);

impl BiomeId {
    /// Insertion index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Climate at a column, or the target climate of a biome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateSample {
    /// Temperature axis.
    pub temperature: f64,
    /// Humidity axis.
    pub humidity: f64,
    /// Continentalness axis (ocean to inland).
    pub continentalness: f64,
}

impl ClimateSample {
    /// Creates a sample.
    #[inline]
    #[must_use]
    pub const fn new(temperature: f64, humidity: f64, continentalness: f64) -> Self {
        Self {
            temperature,
            humidity,
            continentalness,
        }
    }

    /// Squared Euclidean distance over the three axes.
    #[inline]
    #[must_use]
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dt = self.temperature - other.temperature;
        let dh = self.humidity - other.humidity;
        let dc = self.continentalness - other.continentalness;
        dt * dt + dh * dh + dc * dc
    }

    /// Returns true if every axis is finite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.humidity.is_finite() && self.continentalness.is_finite()
    }
}

/// Materials of a biome's columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRules {
    /// Topmost cell above sea level.
    pub top: MaterialId,
    /// Cells below the top.
    pub filler: MaterialId,
    /// Topmost cell at or below sea level.
    pub underwater: MaterialId,
    /// Filler thickness; `None` fills all the way down.
    #[serde(default)]
    pub filler_depth: Option<u32>,
}

impl SurfaceRules {
    /// One material for every layer.
    #[must_use]
    pub const fn uniform(material: MaterialId) -> Self {
        Self {
            top: material,
            filler: material,
            underwater: material,
            filler_depth: None,
        }
    }
}

/// Maps terrain noise (in `[-1, 1]`) to a column height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightModifier {
    /// Height at terrain noise 0.
    pub base: f64,
    /// Height change per unit of terrain noise.
    #[serde(default)]
    pub variation: f64,
}

impl HeightModifier {
    /// Constant height.
    #[must_use]
    pub const fn flat(base: f64) -> Self {
        Self { base, variation: 0.0 }
    }

    /// Height for a terrain noise value.
    #[inline]
    #[must_use]
    pub fn apply(&self, terrain: f64) -> f64 {
        self.base + self.variation * terrain
    }
}

/// One decoration feature of a biome, placed in declared order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecorationFeature {
    /// Trunk with a square canopy, rooted on the surface.
    Tree {
        /// Trunk material.
        trunk: MaterialId,
        /// Canopy material.
        leaves: MaterialId,
        /// Shortest trunk.
        min_height: u32,
        /// Tallest trunk.
        max_height: u32,
        /// Canopy half-width.
        canopy_radius: u32,
        /// Per-column placement probability.
        chance: f64,
    },
    /// Single cell placed on top of the surface.
    Scatter {
        /// Placed material.
        material: MaterialId,
        /// Per-column placement probability.
        chance: f64,
        /// Only place on this surface material.
        #[serde(default)]
        on: Option<MaterialId>,
    },
    /// Rough sphere half-buried in the surface.
    Boulder {
        /// Boulder material.
        material: MaterialId,
        /// Sphere radius.
        radius: u32,
        /// Per-column placement probability.
        chance: f64,
    },
    /// Underground clusters replacing one material.
    Vein {
        /// Deposit material.
        material: MaterialId,
        /// Only cells of this material are replaced.
        replace: MaterialId,
        /// Lowest Y (inclusive).
        min_y: u32,
        /// Highest Y (exclusive).
        max_y: u32,
        /// Cells per cluster.
        size: u32,
        /// Clusters per chunk.
        count: u32,
    },
    /// Walled enclosure that may span several chunks.
    Structure {
        /// Wall material.
        wall: MaterialId,
        /// Floor material.
        floor: MaterialId,
        /// Footprint edge length.
        size: u32,
        /// Wall height.
        height: u32,
        /// Region edge length; at most one structure per region.
        spacing: u32,
        /// Per-region placement probability.
        chance: f64,
    },
}

impl DecorationFeature {
    fn validate(&self) -> Result<(), String> {
        let check_chance = |chance: f64| {
            if (0.0..=1.0).contains(&chance) {
                Ok(())
            } else {
                Err(format!("chance must be in [0, 1], got {chance}"))
            }
        };

        match *self {
            Self::Tree {
                min_height,
                max_height,
                canopy_radius,
                chance,
                ..
            } => {
                check_chance(chance)?;
                if min_height == 0 || min_height > max_height {
                    return Err(format!("tree heights {min_height}..={max_height} are invalid"));
                }
                if canopy_radius > 8 {
                    return Err(format!("canopy radius {canopy_radius} exceeds 8"));
                }
            }
            Self::Scatter { material, chance, .. } => {
                check_chance(chance)?;
                if material.is_empty() {
                    return Err("scatter material is empty".into());
                }
            }
            Self::Boulder { radius, chance, .. } => {
                check_chance(chance)?;
                if !(1..=8).contains(&radius) {
                    return Err(format!("boulder radius must be in 1..=8, got {radius}"));
                }
            }
            Self::Vein {
                min_y,
                max_y,
                size,
                count,
                ..
            } => {
                if min_y >= max_y {
                    return Err(format!("vein range {min_y}..{max_y} is empty"));
                }
                if !(1..=32).contains(&size) || count > 256 {
                    return Err(format!("vein size {size} / count {count} out of range"));
                }
            }
            Self::Structure {
                size,
                height,
                spacing,
                chance,
                ..
            } => {
                check_chance(chance)?;
                if !(3..=64).contains(&size) || height == 0 {
                    return Err(format!("structure size {size} / height {height} out of range"));
                }
                if spacing < size {
                    return Err(format!("structure spacing {spacing} is smaller than size {size}"));
                }
            }
        }
        Ok(())
    }
}

/// Immutable description of one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDescriptor {
    /// Unique name.
    pub name: String,
    /// Target climate; `None` makes the biome reachable only as default.
    #[serde(default)]
    pub climate: Option<ClimateSample>,
    /// Column materials.
    pub surface: SurfaceRules,
    /// Height mapping.
    pub height: HeightModifier,
    /// Decoration features, placed in this order.
    #[serde(default)]
    pub features: Vec<DecorationFeature>,
    /// Columns over which this biome blends into its neighbours.
    #[serde(default)]
    pub blending_radius: u32,
}

impl BiomeDescriptor {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBiome {
            biome: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".into()));
        }
        if self.climate.is_some_and(|c| !c.is_finite()) {
            return Err(invalid("target climate is not finite".into()));
        }
        if self.surface.top.is_empty() || self.surface.filler.is_empty() {
            return Err(invalid("top and filler materials must not be empty".into()));
        }
        if !(self.height.base.is_finite() && self.height.variation.is_finite()) {
            return Err(invalid("height modifier is not finite".into()));
        }
        if self.height.base < 0.0 {
            return Err(invalid(format!("base height {} is negative", self.height.base)));
        }
        if self.blending_radius > MAX_BLENDING_RADIUS {
            return Err(invalid(format!(
                "blending radius {} exceeds {MAX_BLENDING_RADIUS}",
                self.blending_radius
            )));
        }
        for (index, feature) in self.features.iter().enumerate() {
            feature
                .validate()
                .map_err(|reason| invalid(format!("feature {index}: {reason}")))?;
        }
        Ok(())
    }
}

/// Serializable registry definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeRegistryConfig {
    /// Name of the mandatory default biome.
    pub default: String,
    /// Descriptors in priority order.
    pub biomes: Vec<BiomeDescriptor>,
}

/// Validated, insertion-ordered set of biomes.
#[derive(Clone, Debug)]
pub struct BiomeRegistry {
    descriptors: Vec<BiomeDescriptor>,
    by_name: HashMap<String, BiomeId>,
    default: BiomeId,
    max_blending_radius: u32,
}

impl BiomeRegistry {
    /// Builds a registry.
    ///
    /// # Errors
    ///
    /// Rejects an empty list, duplicate names, a default that is not
    /// present, and invalid descriptor parameters.
    pub fn new(default: &str, descriptors: Vec<BiomeDescriptor>) -> Result<Self, ConfigError> {
        if descriptors.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        if descriptors.len() > usize::from(u16::MAX) {
            return Err(ConfigError::InvalidSetting {
                field: "biomes",
                reason: format!("{} biomes exceed the id space", descriptors.len()),
            });
        }

        let mut by_name = HashMap::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.iter().enumerate() {
            descriptor.validate()?;
            #[allow(clippy::cast_possible_truncation)]
            let id = BiomeId(index as u16);
            if by_name.insert(descriptor.name.clone(), id).is_some() {
                return Err(ConfigError::DuplicateBiome(descriptor.name.clone()));
            }
        }

        let default = *by_name
            .get(default)
            .ok_or_else(|| ConfigError::MissingDefaultBiome(default.to_string()))?;
        let max_blending_radius = descriptors
            .iter()
            .map(|d| d.blending_radius)
            .max()
            .unwrap_or(0);

        Ok(Self {
            descriptors,
            by_name,
            default,
            max_blending_radius,
        })
    }

    /// Builds a registry from its serialized form.
    ///
    /// # Errors
    ///
    /// See [`BiomeRegistry::new`].
    pub fn from_config(config: BiomeRegistryConfig) -> Result<Self, ConfigError> {
        Self::new(&config.default, config.biomes)
    }

    /// Descriptor for an id, `None` for ids of another registry.
    #[inline]
    #[must_use]
    pub fn get(&self, id: BiomeId) -> Option<&BiomeDescriptor> {
        self.descriptors.get(id.index())
    }

    /// Descriptor for an id, falling back to the default biome.
    #[inline]
    #[must_use]
    pub fn descriptor(&self, id: BiomeId) -> &BiomeDescriptor {
        self.descriptors
            .get(id.index())
            .unwrap_or(&self.descriptors[self.default.index()])
    }

    /// Looks a biome up by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<BiomeId> {
        self.by_name.get(name).copied()
    }

    /// The mandatory default biome.
    #[inline]
    #[must_use]
    pub const fn default_id(&self) -> BiomeId {
        self.default
    }

    /// Largest blending radius of any biome.
    #[inline]
    #[must_use]
    pub const fn max_blending_radius(&self) -> u32 {
        self.max_blending_radius
    }

    /// Number of biomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Always false for a constructed registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Biomes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDescriptor)> {
        self.descriptors.iter().enumerate().map(|(index, d)| {
            #[allow(clippy::cast_possible_truncation)]
            let id = BiomeId(index as u16);
            (id, d)
        })
    }

    /// Checks the registry against the generator's fixed settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a base height does not fit the world,
    /// a vein range exceeds it, or a blending radius exceeds the border
    /// margin.
    pub fn validate_against(&self, dims: ChunkDimensions, border_margin: u32) -> Result<(), ConfigError> {
        if self.max_blending_radius > border_margin {
            return Err(ConfigError::InvalidSetting {
                field: "border_margin",
                reason: format!(
                    "{border_margin} is smaller than the largest blending radius {}",
                    self.max_blending_radius
                ),
            });
        }

        for descriptor in &self.descriptors {
            let invalid = |reason: String| ConfigError::InvalidBiome {
                biome: descriptor.name.clone(),
                reason,
            };
            if descriptor.height.base >= f64::from(dims.height) {
                return Err(invalid(format!(
                    "base height {} does not fit world height {}",
                    descriptor.height.base, dims.height
                )));
            }
            for feature in &descriptor.features {
                if let DecorationFeature::Vein { max_y, .. } = feature {
                    if *max_y > dims.height {
                        return Err(invalid(format!("vein max_y {max_y} exceeds world height {}", dims.height)));
                    }
                }
            }
        }
        Ok(())
    }
}
