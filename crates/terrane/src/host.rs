//! # In-Memory Host
//!
//! A reference [`WorldAdapter`]: finished chunks in a hash map.
//!
//! Suitable for tools, tests and small worlds. Game hosts implement the
//! adapter over their own chunk storage instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use terrane_core::{BiomeRegistry, ChunkBuffer, ChunkCoord, ChunkPatch, WorldAdapter, WorldSeed};

/// Chunk store shared between the host thread and the generator's workers.
pub struct InMemoryWorld {
    seed: WorldSeed,
    registry: Arc<BiomeRegistry>,
    patching: bool,
    chunks: RwLock<HashMap<ChunkCoord, Arc<ChunkBuffer>>>,
}

impl InMemoryWorld {
    /// Creates an empty world that accepts patches.
    #[must_use]
    pub fn new(seed: WorldSeed, registry: Arc<BiomeRegistry>) -> Self {
        Self {
            seed,
            registry,
            patching: true,
            chunks: RwLock::new(HashMap::new()),
        }
    }

    /// Enables or disables patch support.
    #[must_use]
    pub const fn with_patching(mut self, enabled: bool) -> Self {
        self.patching = enabled;
        self
    }

    /// Stores a finished chunk, replacing any previous one.
    pub fn store(&self, buffer: Arc<ChunkBuffer>) {
        self.chunks.write().insert(buffer.coord(), buffer);
    }

    /// The stored chunk at `coord`.
    #[must_use]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
        self.chunks.read().get(&coord).cloned()
    }

    /// Number of stored chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.read().len()
    }

    /// True if no chunk is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.read().is_empty()
    }
}

impl WorldAdapter for InMemoryWorld {
    fn generated_neighbor(&self, coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
        self.chunk(coord)
    }

    fn world_seed(&self) -> WorldSeed {
        self.seed
    }

    fn biome_registry(&self) -> Arc<BiomeRegistry> {
        Arc::clone(&self.registry)
    }

    fn supports_patching(&self) -> bool {
        self.patching
    }

    fn apply_patch(&self, patch: &ChunkPatch) -> bool {
        if !self.patching {
            return false;
        }
        let mut chunks = self.chunks.write();
        let Some(stored) = chunks.get_mut(&patch.coord) else {
            return false;
        };
        // Copy-on-write: buffers already handed out stay unchanged
        match Arc::make_mut(stored).apply_patch(patch) {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(coord = %patch.coord, %error, "patch out of bounds");
                false
            }
        }
    }
}
