//! # World Adapter
//!
//! The narrow set of capabilities a host exposes to the generator.
//!
//! The generator never sees the host's world type. It asks for:
//!
//! - already-generated neighbour chunks (non-blocking)
//! - the world seed
//! - the biome registry (read-only)
//!
//! Hosts that can accept edits to chunks they already hold may also opt in
//! to [`WorldAdapter::apply_patch`], which delivers the result of a
//! deferred cross-chunk feature once its neighbour becomes available.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::biome::BiomeRegistry;
use crate::buffer::ChunkBuffer;
use crate::coord::ChunkCoord;
use crate::material::MaterialId;
use crate::seed::WorldSeed;

/// Host capabilities required by the generator.
///
/// Implementations are shared by every worker thread.
pub trait WorldAdapter: Send + Sync {
    /// Returns the chunk at `coord` if the host already holds it.
    ///
    /// Must never block waiting for generation.
    fn generated_neighbor(&self, coord: ChunkCoord) -> Option<Arc<ChunkBuffer>>;

    /// The world seed.
    fn world_seed(&self) -> WorldSeed;

    /// The biome registry.
    fn biome_registry(&self) -> Arc<BiomeRegistry>;

    /// Whether the host accepts [`ChunkPatch`]es for chunks it holds.
    fn supports_patching(&self) -> bool {
        false
    }

    /// Applies a patch to a chunk the host holds.
    ///
    /// Returns true if the patch was applied.
    fn apply_patch(&self, patch: &ChunkPatch) -> bool {
        let _ = patch;
        false
    }
}

/// One absolute cell write inside a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellWrite {
    /// Local X.
    pub x: u32,
    /// Local Y.
    pub y: u32,
    /// Local Z.
    pub z: u32,
    /// Material to write.
    pub material: MaterialId,
}

/// Post-hoc edits to an already-handed-off chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPatch {
    /// Chunk the writes belong to.
    pub coord: ChunkCoord,
    /// Writes, applied in order.
    pub writes: Vec<CellWrite>,
}

impl ChunkPatch {
    /// Creates an empty patch.
    #[must_use]
    pub const fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            writes: Vec::new(),
        }
    }

    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the patch writes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeDescriptor, HeightModifier, SurfaceRules};
    use crate::dims::ChunkDimensions;

    struct EmptyWorld {
        registry: Arc<BiomeRegistry>,
    }

    impl WorldAdapter for EmptyWorld {
        fn generated_neighbor(&self, _coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
            None
        }

        fn world_seed(&self) -> WorldSeed {
            WorldSeed::new(1)
        }

        fn biome_registry(&self) -> Arc<BiomeRegistry> {
            Arc::clone(&self.registry)
        }
    }

    #[test]
    fn test_patching_is_opt_in() {
        let stone = MaterialId::new(1);
        let plains = BiomeDescriptor {
            name: "plains".into(),
            climate: None,
            surface: SurfaceRules::uniform(stone),
            height: HeightModifier::flat(64.0),
            features: Vec::new(),
            blending_radius: 0,
        };
        let world = EmptyWorld {
            registry: Arc::new(BiomeRegistry::new("plains", vec![plains]).unwrap()),
        };

        let adapter: &dyn WorldAdapter = &world;
        assert!(!adapter.supports_patching());

        let mut patch = ChunkPatch::new(ChunkCoord::new(1, 1));
        assert!(patch.is_empty());
        patch.writes.push(CellWrite { x: 0, y: 0, z: 0, material: stone });
        assert_eq!(patch.len(), 1);
        assert!(!adapter.apply_patch(&patch));
        assert!(adapter.generated_neighbor(ChunkCoord::new(0, 0)).is_none());

        let buf = ChunkBuffer::new(patch.coord, ChunkDimensions::new(4, 4, 4));
        assert!(buf.is_empty());
    }
}
