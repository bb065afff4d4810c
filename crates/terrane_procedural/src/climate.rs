//! Climate sampling: three independent layered noises per world column.

use terrane_core::{ClimateSample, NoiseConfig, WorldSeed};

use crate::noise::{purpose, LayeredNoise};

/// Pure `(seed, x, z) -> ClimateSample` mapping.
pub struct ClimateSampler {
    temperature: LayeredNoise,
    humidity: LayeredNoise,
    continentalness: LayeredNoise,
}

impl ClimateSampler {
    /// Builds the three climate layers.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &NoiseConfig) -> Self {
        Self {
            temperature: LayeredNoise::new(seed, purpose::TEMPERATURE, &config.temperature),
            humidity: LayeredNoise::new(seed, purpose::HUMIDITY, &config.humidity),
            continentalness: LayeredNoise::new(seed, purpose::CONTINENTALNESS, &config.continentalness),
        }
    }

    /// Climate at a world column.
    #[must_use]
    pub fn sample(&self, x: i64, z: i64) -> ClimateSample {
        ClimateSample {
            temperature: self.temperature.sample_column(x, z),
            humidity: self.humidity.sample_column(x, z),
            continentalness: self.continentalness.sample_column(x, z),
        }
    }
}
