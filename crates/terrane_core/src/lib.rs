//! # TERRANE Core
//!
//! The engine-agnostic generation contract.
//!
//! ## Design Principles
//!
//! 1. **Host-agnostic**: the generator only talks to a [`WorldAdapter`]
//! 2. **Fixed buffers**: chunk dimensions are agreed once at load time
//! 3. **Immutable configuration**: validated at load, shared read-only
//! 4. **Explicit errors**: configuration problems never reach generation
//!
//! ## Core Components
//!
//! - `ChunkCoord`: Chunk position in the world grid
//! - `ChunkBuffer`: Dense cell storage written by generation
//! - `WorldAdapter`: Capabilities the host exposes to the generator
//! - `ChunkGenerator`: The single generation entry point
//! - `BiomeRegistry`: Validated, insertion-ordered biome descriptors
//!
//! ## Example
//!
//! ```rust
//! use terrane_core::{ChunkBuffer, ChunkCoord, ChunkDimensions, MaterialId};
//!
//! let mut buffer = ChunkBuffer::new(ChunkCoord::new(0, 0), ChunkDimensions::STANDARD);
//! assert_eq!(buffer.get(3, 10, 7), Ok(MaterialId::EMPTY));
//!
//! buffer.set(3, 10, 7, MaterialId::new(4)).unwrap();
//! assert!(buffer.set(16, 0, 0, MaterialId::new(4)).is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod adapter;
pub mod biome;
pub mod buffer;
pub mod config;
pub mod coord;
pub mod dims;
pub mod error;
pub mod generation;
pub mod material;
pub mod seed;

pub use adapter::{CellWrite, ChunkPatch, WorldAdapter};
pub use biome::{
    BiomeDescriptor, BiomeId, BiomeRegistry, BiomeRegistryConfig, ClimateSample,
    DecorationFeature, HeightModifier, SurfaceRules,
};
pub use buffer::ChunkBuffer;
pub use config::{CaveConfig, GeneratorConfig, NoiseConfig, NoiseLayerConfig, OctaveConfig, RiverConfig};
pub use coord::{ChunkCoord, Direction};
pub use dims::ChunkDimensions;
pub use error::{ConfigError, ErrorKind, GenerationError, OutOfBoundsError};
pub use generation::{
    CancelToken, ChunkGenerator, CrossChunkFeature, DeferredObligation, GeneratedChunk,
    GenerationOutcome, GenerationStage,
};
pub use material::MaterialId;
pub use seed::WorldSeed;
