//! # TERRANE Procedural Generation
//!
//! Deterministic terrain generation for infinite, reproducible worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same chunk
//! 2. **Chunked**: Every chunk is generated independently
//! 3. **Non-blocking**: Neighbour-dependent features are deferred, never awaited
//! 4. **Shared-nothing tasks**: noise and configuration are immutable
//!
//! ## Core Components
//!
//! - `SimplexNoise` / `LayeredNoise`: 2D/3D noise generation
//! - `HeightPipeline`: terrain height, climate and cave density
//! - `BiomeResolver`: climate → biome, with boundary blending
//! - `TerrainGenerator`: the multi-stage chunk pipeline
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use terrane_core::{BiomeRegistry, ChunkCoord, ChunkDimensions, GeneratorConfig, WorldSeed};
//! use terrane_procedural::{presets, TerrainGenerator};
//!
//! let registry = Arc::new(BiomeRegistry::from_config(presets::flat_plains(64.0)).unwrap());
//! let config = GeneratorConfig::flat(ChunkDimensions::STANDARD);
//! let generator = TerrainGenerator::new(config, WorldSeed::new(12345), registry).unwrap();
//!
//! let plan = generator.plan(ChunkCoord::new(0, 0), false).unwrap();
//! assert!(plan.columns.iter().all(|c| c.height == 64));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod climate;
pub mod decoration;
pub mod generator;
pub mod height;
pub mod noise;
pub mod presets;
pub mod river;
pub mod structure;

pub use biome::{BiomeMap, BiomeResolver, BlendedColumn, Blender};
pub use climate::ClimateSampler;
pub use generator::{ChunkPlan, ChunkTask, ColumnPlan, TerrainGenerator};
pub use height::{ColumnSample, HeightField, HeightPipeline};
pub use noise::{LayeredNoise, SimplexNoise};
pub use river::{RiverLayer, RiverPlan};
pub use structure::StructureSpec;
