//! # Generation Contract
//!
//! The single entry point the scheduler drives: [`ChunkGenerator`].
//!
//! ## Task Lifecycle
//!
//! ```text
//! Pending → HeightComputed → Carved → Decorated → NeighborResolved → Complete
//!    └──────────┴──────────────┴─────────┴──────────────┴──→ Failed
//! ```
//!
//! Cancellation is observed at stage boundaries only. A cancelled task
//! reports the last stage it reached and its buffer is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::adapter::{ChunkPatch, WorldAdapter};
use crate::buffer::ChunkBuffer;
use crate::coord::ChunkCoord;
use crate::error::GenerationError;

/// Shared cancellation flag for one generation task.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true once cancellation was requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Stage of a chunk's generation pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationStage {
    /// Created, nothing computed.
    Pending,
    /// Height field and biome map computed.
    HeightComputed,
    /// Terrain columns filled and carved.
    Carved,
    /// Decoration features placed.
    Decorated,
    /// Neighbour-dependent features resolved or deferred.
    NeighborResolved,
    /// Buffer handed off.
    Complete,
    /// Pipeline failed.
    Failed,
}

impl GenerationStage {
    /// Returns true for `Complete` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::HeightComputed => "height-computed",
            Self::Carved => "carved",
            Self::Decorated => "decorated",
            Self::NeighborResolved => "neighbor-resolved",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A feature that spans a chunk boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrossChunkFeature {
    /// River channel flowing towards the required neighbour.
    River,
}

/// Neighbour-dependent work postponed until `requires` exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeferredObligation {
    /// Chunk that owns the feature (and receives the patch).
    pub origin: ChunkCoord,
    /// Chunk whose data is needed.
    pub requires: ChunkCoord,
    /// What was postponed.
    pub feature: CrossChunkFeature,
}

/// A fully populated chunk plus any postponed work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedChunk {
    /// The populated buffer.
    pub buffer: ChunkBuffer,
    /// Features that could not be resolved yet.
    pub deferred: Vec<DeferredObligation>,
}

/// How a generation call ended, short of failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Pipeline ran to completion.
    Complete(GeneratedChunk),
    /// Cancelled before reaching the next stage.
    Cancelled {
        /// Last stage reached.
        stage: GenerationStage,
    },
}

/// Produces terrain for one chunk coordinate.
///
/// Implementations hold only immutable, shared state so one instance can
/// serve every worker thread at once.
pub trait ChunkGenerator: Send + Sync {
    /// Runs the full pipeline for `coord`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if any stage fails. The error is isolated
    /// to this chunk.
    fn generate(
        &self,
        coord: ChunkCoord,
        world: &dyn WorldAdapter,
        cancel: &CancelToken,
    ) -> Result<GenerationOutcome, GenerationError>;

    /// Computes the patch for `obligation.origin` now that `neighbor`
    /// (at `obligation.requires`) exists.
    ///
    /// Returns `None` if there is nothing to write.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if recomputing the origin's plan fails.
    fn resolve_deferred(
        &self,
        obligation: &DeferredObligation,
        neighbor: &ChunkBuffer,
    ) -> Result<Option<ChunkPatch>, GenerationError>;

    /// Generates without cancellation.
    ///
    /// # Errors
    ///
    /// Same as [`ChunkGenerator::generate`].
    fn generate_blocking(
        &self,
        coord: ChunkCoord,
        world: &dyn WorldAdapter,
    ) -> Result<GeneratedChunk, GenerationError> {
        match self.generate(coord, world, &CancelToken::new())? {
            GenerationOutcome::Complete(chunk) => Ok(chunk),
            GenerationOutcome::Cancelled { stage } => Err(GenerationError::Internal(format!(
                "uncancellable generation of {coord} stopped at {stage}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(GenerationStage::Complete.is_terminal());
        assert!(GenerationStage::Failed.is_terminal());
        assert!(!GenerationStage::Decorated.is_terminal());
        assert_eq!(GenerationStage::NeighborResolved.to_string(), "neighbor-resolved");
    }
}
