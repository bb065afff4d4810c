//! # Generation Events
//!
//! Non-blocking notifications from the scheduler's workers to the host.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Workers   │─────>│   Bounded   │─────>│    Host     │
//! │ (Scheduler) │      │   Channel   │      │  (drain)    │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Workers never wait on the host: a full channel drops the event.
//! Poll results remain the source of truth.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use terrane_core::{ChunkCoord, DeferredObligation, ErrorKind, GenerationStage};

/// Something that happened to a chunk task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationEvent {
    /// A chunk finished generating.
    Completed {
        /// Generated chunk.
        coord: ChunkCoord,
        /// Cross-chunk features left unresolved.
        deferred: usize,
    },

    /// A chunk's pipeline failed.
    Failed {
        /// Failed chunk.
        coord: ChunkCoord,
        /// Error classification.
        kind: ErrorKind,
    },

    /// A task stopped early because every requester cancelled.
    Cancelled {
        /// Cancelled chunk.
        coord: ChunkCoord,
        /// Last stage the task reached.
        stage: GenerationStage,
    },

    /// A cross-chunk feature was postponed.
    Deferred {
        /// The obligation.
        obligation: DeferredObligation,
        /// False when the host cannot take patches and the feature is skipped.
        retained: bool,
    },

    /// A deferred feature was applied to a chunk the host holds.
    Patched {
        /// Chunk that received the writes.
        coord: ChunkCoord,
        /// Neighbour whose arrival allowed the patch.
        neighbor: ChunkCoord,
        /// Number of cell writes.
        writes: usize,
    },
}

impl GenerationEvent {
    /// The chunk the event is about.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        match self {
            Self::Completed { coord, .. }
            | Self::Failed { coord, .. }
            | Self::Cancelled { coord, .. }
            | Self::Patched { coord, .. } => *coord,
            Self::Deferred { obligation, .. } => obligation.origin,
        }
    }
}

/// Creates a connected sender/receiver pair.
#[must_use]
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (sender, receiver) = bounded(capacity);
    (EventSender { sender }, EventReceiver { receiver })
}

/// Handle for emitting events.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: Sender<GenerationEvent>,
}

impl EventSender {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: GenerationEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::trace!(coord = %event.coord(), "event channel full, dropping");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming events.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<GenerationEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[must_use]
    pub fn drain(&self) -> Vec<GenerationEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<GenerationEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
