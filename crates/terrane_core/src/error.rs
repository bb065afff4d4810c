//! # Error Types
//!
//! All errors that can occur while loading or generating terrain.
//!
//! - [`ConfigError`]: load-time, fatal, never retried
//! - [`OutOfBoundsError`]: buffer contract violation (a bug)
//! - [`GenerationError`]: isolated to one chunk's task

use std::fmt;

use thiserror::Error;

use crate::dims::ChunkDimensions;

/// Invalid configuration detected while loading the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The biome registry has no descriptors.
    #[error("biome registry is empty")]
    EmptyRegistry,

    /// The configured default biome is not in the registry.
    #[error("default biome `{0}` is not present in the registry")]
    MissingDefaultBiome(String),

    /// Two descriptors share a name.
    #[error("duplicate biome `{0}`")]
    DuplicateBiome(String),

    /// A descriptor has an invalid parameter.
    #[error("biome `{biome}`: {reason}")]
    InvalidBiome {
        /// Biome name.
        biome: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A noise layer has no octaves.
    #[error("noise layer `{0}` has no octaves")]
    EmptyNoiseLayer(String),

    /// An octave frequency is zero, negative or not finite.
    #[error("noise layer `{layer}` octave {octave}: frequency must be positive, got {value}")]
    NonPositiveFrequency {
        /// Noise layer name.
        layer: String,
        /// Octave index.
        octave: usize,
        /// Rejected value.
        value: f64,
    },

    /// An octave amplitude is zero, negative or not finite.
    #[error("noise layer `{layer}` octave {octave}: amplitude must be positive, got {value}")]
    NonPositiveAmplitude {
        /// Noise layer name.
        layer: String,
        /// Octave index.
        octave: usize,
        /// Rejected value.
        value: f64,
    },

    /// Chunk dimensions are zero or too large.
    #[error("invalid chunk dimensions {width}x{depth}x{height}")]
    InvalidDimensions {
        /// Width (X).
        width: u32,
        /// Depth (Z).
        depth: u32,
        /// Height (Y).
        height: u32,
    },

    /// Any other generator or scheduler setting is out of range.
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Local buffer coordinates outside the chunk.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cell ({x}, {y}, {z}) is outside chunk bounds {}x{}x{}", .dims.width, .dims.height, .dims.depth)]
pub struct OutOfBoundsError {
    /// Requested X.
    pub x: i64,
    /// Requested Y.
    pub y: i64,
    /// Requested Z.
    pub z: i64,
    /// Dimensions of the buffer.
    pub dims: ChunkDimensions,
}

/// Failure of a single chunk's generation pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Configuration problem surfacing during generation.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The pipeline addressed a cell outside its buffer.
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),

    /// Noise evaluation produced NaN or infinity.
    #[error("non-finite noise value at world column ({x}, {z})")]
    NonFiniteNoise {
        /// World X.
        x: i64,
        /// World Z.
        z: i64,
    },

    /// Unexpected internal fault.
    #[error("internal generation fault: {0}")]
    Internal(String),
}

impl GenerationError {
    /// Coarse classification used by poll results and events.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::OutOfBounds(_) => ErrorKind::OutOfBounds,
            Self::NonFiniteNoise { .. } | Self::Internal(_) => ErrorKind::GenerationFailure,
        }
    }
}

/// Error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration.
    Configuration,
    /// Buffer contract violation.
    OutOfBounds,
    /// Per-chunk pipeline fault.
    GenerationFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::OutOfBounds => "out-of-bounds",
            Self::GenerationFailure => "generation-failure",
        };
        f.write_str(name)
    }
}
