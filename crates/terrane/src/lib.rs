//! # TERRANE
//!
//! Procedural voxel terrain generation for infinite, chunked worlds.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          HOST                            │
//! │   request_chunk / poll_result / cancel    WorldAdapter   │
//! └──────────────┬──────────────────────────────────▲────────┘
//!                │                                  │
//! ┌──────────────▼──────────────┐   neighbours,     │
//! │  Engine → Scheduler         │   seed, registry, │
//! │  (dedup, cancel, workers)   │───patches─────────┘
//! └──────────────┬──────────────┘
//!                │
//! ┌──────────────▼──────────────┐
//! │  TerrainGenerator           │
//! │  height → carve → decorate  │
//! │  → neighbour resolution     │
//! └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use terrane::{Engine, EngineConfig, InMemoryWorld, PollResult};
//! use terrane_core::{BiomeRegistry, ChunkCoord, ChunkDimensions, GeneratorConfig, WorldSeed};
//! use terrane_procedural::presets;
//!
//! let registry = Arc::new(BiomeRegistry::from_config(presets::flat_plains(64.0)).unwrap());
//! let world = Arc::new(InMemoryWorld::new(WorldSeed::new(12345), registry));
//! let config = EngineConfig {
//!     generator: GeneratorConfig::flat(ChunkDimensions::STANDARD),
//!     ..EngineConfig::default()
//! };
//!
//! let engine = Engine::load(config, world).unwrap();
//! let handle = engine.request_chunk(ChunkCoord::new(0, 0));
//! match handle.wait() {
//!     PollResult::Complete(chunk) => assert_eq!(chunk.surface_height(0, 0), Ok(Some(64))),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod engine;
pub mod events;
pub mod host;
pub mod scheduler;

pub use engine::{Engine, EngineConfig};
pub use events::{EventReceiver, EventSender, GenerationEvent};
pub use host::InMemoryWorld;
pub use scheduler::{GenerationHandle, PollResult, Scheduler, SchedulerConfig};
