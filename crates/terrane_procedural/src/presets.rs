//! Ready-made biome sets built on the sample material palette.
//!
//! Used by the demo host, benches and tests. Real hosts supply their own
//! registries with their own material codes.

use terrane_core::{
    BiomeDescriptor, BiomeRegistryConfig, ClimateSample, DecorationFeature, HeightModifier, SurfaceRules,
};

pub use terrane_core::material::palette::*;

/// Flat grassland at a fixed height, no features.
#[must_use]
pub fn plains(height: f64) -> BiomeDescriptor {
    BiomeDescriptor {
        name: "plains".into(),
        climate: None,
        surface: SurfaceRules {
            top: GRASS,
            filler: DIRT,
            underwater: SAND,
            filler_depth: None,
        },
        height: HeightModifier::flat(height),
        features: Vec::new(),
        blending_radius: 0,
    }
}

/// Registry holding only [`plains`], which is also the default.
#[must_use]
pub fn flat_plains(height: f64) -> BiomeRegistryConfig {
    BiomeRegistryConfig {
        default: "plains".into(),
        biomes: vec![plains(height)],
    }
}

fn ore_vein() -> DecorationFeature {
    DecorationFeature::Vein {
        material: ORE,
        replace: STONE,
        min_y: 5,
        max_y: 48,
        size: 8,
        count: 6,
    }
}

/// A temperate world: ocean, plains, forest, desert, tundra, mountains.
///
/// Plains is the default and carries a scattered ruin structure.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn temperate() -> BiomeRegistryConfig {
    let biomes = vec![
        BiomeDescriptor {
            name: "plains".into(),
            climate: Some(ClimateSample::new(0.1, 0.0, 0.3)),
            surface: SurfaceRules {
                top: GRASS,
                filler: DIRT,
                underwater: SAND,
                filler_depth: Some(4),
            },
            height: HeightModifier { base: 67.0, variation: 6.0 },
            features: vec![
                DecorationFeature::Scatter {
                    material: FLOWER,
                    chance: 0.04,
                    on: Some(GRASS),
                },
                DecorationFeature::Tree {
                    trunk: LOG,
                    leaves: LEAVES,
                    min_height: 4,
                    max_height: 5,
                    canopy_radius: 2,
                    chance: 0.003,
                },
                ore_vein(),
                DecorationFeature::Structure {
                    wall: COBBLE,
                    floor: STONE,
                    size: 7,
                    height: 3,
                    spacing: 64,
                    chance: 0.3,
                },
            ],
            blending_radius: 6,
        },
        BiomeDescriptor {
            name: "ocean".into(),
            climate: Some(ClimateSample::new(0.0, 0.2, -0.6)),
            surface: SurfaceRules {
                top: SAND,
                filler: SAND,
                underwater: GRAVEL,
                filler_depth: Some(3),
            },
            height: HeightModifier { base: 46.0, variation: 10.0 },
            features: Vec::new(),
            blending_radius: 8,
        },
        BiomeDescriptor {
            name: "forest".into(),
            climate: Some(ClimateSample::new(0.1, 0.5, 0.3)),
            surface: SurfaceRules {
                top: GRASS,
                filler: DIRT,
                underwater: DIRT,
                filler_depth: Some(4),
            },
            height: HeightModifier { base: 69.0, variation: 10.0 },
            features: vec![
                DecorationFeature::Tree {
                    trunk: LOG,
                    leaves: LEAVES,
                    min_height: 4,
                    max_height: 6,
                    canopy_radius: 2,
                    chance: 0.06,
                },
                DecorationFeature::Scatter {
                    material: SHRUB,
                    chance: 0.03,
                    on: Some(GRASS),
                },
                ore_vein(),
            ],
            blending_radius: 5,
        },
        BiomeDescriptor {
            name: "desert".into(),
            climate: Some(ClimateSample::new(0.7, -0.6, 0.3)),
            surface: SurfaceRules {
                top: SAND,
                filler: SAND,
                underwater: SAND,
                filler_depth: Some(5),
            },
            height: HeightModifier { base: 67.0, variation: 5.0 },
            features: vec![
                DecorationFeature::Scatter {
                    material: CACTUS,
                    chance: 0.01,
                    on: Some(SAND),
                },
                DecorationFeature::Boulder {
                    material: COBBLE,
                    radius: 1,
                    chance: 0.002,
                },
            ],
            blending_radius: 6,
        },
        BiomeDescriptor {
            name: "tundra".into(),
            climate: Some(ClimateSample::new(-0.7, 0.0, 0.3)),
            surface: SurfaceRules {
                top: SNOW,
                filler: DIRT,
                underwater: GRAVEL,
                filler_depth: Some(3),
            },
            height: HeightModifier { base: 68.0, variation: 8.0 },
            features: vec![DecorationFeature::Tree {
                trunk: LOG,
                leaves: SNOW,
                min_height: 4,
                max_height: 7,
                canopy_radius: 1,
                chance: 0.01,
            }],
            blending_radius: 5,
        },
        BiomeDescriptor {
            name: "mountains".into(),
            climate: Some(ClimateSample::new(-0.2, 0.0, 0.8)),
            surface: SurfaceRules {
                top: STONE,
                filler: STONE,
                underwater: GRAVEL,
                filler_depth: None,
            },
            height: HeightModifier { base: 96.0, variation: 48.0 },
            features: vec![
                DecorationFeature::Boulder {
                    material: COBBLE,
                    radius: 2,
                    chance: 0.003,
                },
                DecorationFeature::Vein {
                    material: ORE,
                    replace: STONE,
                    min_y: 5,
                    max_y: 120,
                    size: 10,
                    count: 10,
                },
            ],
            blending_radius: 8,
        },
    ];

    BiomeRegistryConfig {
        default: "plains".into(),
        biomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_core::{BiomeRegistry, ChunkDimensions, GeneratorConfig};

    #[test]
    fn test_presets_are_valid() {
        let config = GeneratorConfig::default();
        for preset in [temperate(), flat_plains(64.0)] {
            let registry = BiomeRegistry::from_config(preset).unwrap();
            registry
                .validate_against(ChunkDimensions::STANDARD, config.border_margin)
                .unwrap();
        }
    }
}
