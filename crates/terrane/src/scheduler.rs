//! # Generation Scheduler
//!
//! Runs chunk generation on a fixed worker pool.
//!
//! ## Guarantees
//!
//! - **Deduplication**: at most one task per coordinate is in flight; a
//!   second request for it shares the running task.
//! - **Cancellation**: a cancelled handle reports `Cancelled` forever. The
//!   task itself stops, at its next stage boundary, only once every handle
//!   sharing it has cancelled.
//! - **Isolation**: a failed task affects only the handles waiting on it.
//!   A panicking generator is reported as `Failed` and the worker lives on.
//! - **No retention**: finished tasks leave the registry immediately;
//!   results live as long as the handles holding them.
//!
//! ## Deferred features
//!
//! Cross-chunk features a task could not finish are kept in an obligation
//! table keyed by the neighbour they wait for, when the host accepts
//! patches. Each time a chunk completes here, or the host reports one via
//! [`Scheduler::neighbor_available`], matching obligations are resolved
//! and the resulting patch is handed to the host. Hosts without patch
//! support never see those features.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use terrane_core::{
    CancelToken, ChunkBuffer, ChunkCoord, ChunkGenerator, ConfigError, DeferredObligation,
    GeneratedChunk, GenerationError, GenerationOutcome, GenerationStage, WorldAdapter,
};

use crate::events::{self, EventReceiver, EventSender, GenerationEvent};

/// Worker pool settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Capacity of the event channel.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            event_capacity: 1024,
        }
    }
}

impl SchedulerConfig {
    /// A single worker; handy for reproducing ordering issues.
    #[must_use]
    pub const fn single_threaded() -> Self {
        Self {
            workers: 1,
            event_capacity: 1024,
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for zero workers or a zero
    /// event capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "scheduler.workers",
                reason: "at least one worker is required".into(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "scheduler.event_capacity",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Outcome of polling a handle.
#[derive(Clone, Debug, PartialEq)]
pub enum PollResult {
    /// Still queued or running.
    Pending,
    /// The finished chunk.
    Complete(Arc<ChunkBuffer>),
    /// The pipeline failed.
    Failed(GenerationError),
    /// This handle was cancelled, or the scheduler shut down first.
    Cancelled,
}

impl PollResult {
    /// True for every variant except [`PollResult::Pending`].
    #[inline]
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One in-flight generation, shared by every handle that requested it.
struct Task {
    id: u64,
    coord: ChunkCoord,
    cancel: CancelToken,
    /// Handles that have not cancelled. Changed only under the registry lock.
    interest: AtomicUsize,
    result: Mutex<Option<PollResult>>,
    done: Condvar,
}

impl Task {
    fn new(id: u64, coord: ChunkCoord) -> Self {
        Self {
            id,
            coord,
            cancel: CancelToken::new(),
            interest: AtomicUsize::new(1),
            result: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn finish(&self, result: PollResult) {
        let mut slot = self.result.lock();
        if slot.is_none() {
            *slot = Some(result);
        }
        drop(slot);
        self.done.notify_all();
    }

    fn current(&self) -> PollResult {
        self.result.lock().clone().unwrap_or(PollResult::Pending)
    }

    /// Blocks until a result exists or `cancelled` is set.
    fn wait(&self, cancelled: &AtomicBool) -> PollResult {
        let mut slot = self.result.lock();
        loop {
            if cancelled.load(Ordering::Acquire) {
                return PollResult::Cancelled;
            }
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }

    fn wait_timeout(&self, cancelled: &AtomicBool, timeout: Duration) -> PollResult {
        let deadline = Instant::now() + timeout;
        let mut slot = self.result.lock();
        loop {
            if cancelled.load(Ordering::Acquire) {
                return PollResult::Cancelled;
            }
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            if self.done.wait_until(&mut slot, deadline).timed_out() {
                return if cancelled.load(Ordering::Acquire) {
                    PollResult::Cancelled
                } else {
                    slot.clone().unwrap_or(PollResult::Pending)
                };
            }
        }
    }

    /// Wakes waiters so they re-check their handle's cancel flag.
    fn wake(&self) {
        let _slot = self.result.lock();
        self.done.notify_all();
    }
}

/// State shared between the scheduler, its workers and its handles.
struct Shared {
    generator: Arc<dyn ChunkGenerator>,
    world: Arc<dyn WorldAdapter>,
    registry: Mutex<HashMap<ChunkCoord, Arc<Task>>>,
    /// Obligations keyed by the neighbour they wait for.
    obligations: Mutex<HashMap<ChunkCoord, Vec<DeferredObligation>>>,
    events: EventSender,
    shutdown: AtomicBool,
    next_id: AtomicU64,
}

impl Shared {
    /// Drops one handle's interest in `task`.
    fn release(&self, task: &Arc<Task>) {
        let mut registry = self.registry.lock();
        if task.interest.fetch_sub(1, Ordering::AcqRel) == 1 {
            task.cancel.cancel();
            if registry
                .get(&task.coord)
                .is_some_and(|current| Arc::ptr_eq(current, task))
            {
                registry.remove(&task.coord);
            }
            tracing::debug!(coord = %task.coord, task = task.id, "last requester gone, task cancelled");
        }
    }

    fn unregister(&self, task: &Arc<Task>) {
        let mut registry = self.registry.lock();
        if registry
            .get(&task.coord)
            .is_some_and(|current| Arc::ptr_eq(current, task))
        {
            registry.remove(&task.coord);
        }
    }

    fn run(&self, task: &Arc<Task>) {
        if self.shutdown.load(Ordering::Acquire) {
            self.unregister(task);
            task.finish(PollResult::Cancelled);
            return;
        }

        let coord = task.coord;
        if task.cancel.is_cancelled() {
            self.events.send(GenerationEvent::Cancelled {
                coord,
                stage: GenerationStage::Pending,
            });
            task.finish(PollResult::Cancelled);
            return;
        }
        tracing::debug!(%coord, task = task.id, "generation started");

        let generated = panic::catch_unwind(AssertUnwindSafe(|| {
            self.generator.generate(coord, &*self.world, &task.cancel)
        }))
        .unwrap_or_else(|payload| Err(GenerationError::Internal(panic_message(payload.as_ref()))));

        let result = match generated {
            Ok(GenerationOutcome::Complete(GeneratedChunk { buffer, deferred })) => {
                let buffer = Arc::new(buffer);
                self.settle_arrival(coord, &buffer);
                self.defer(&deferred);
                self.events.send(GenerationEvent::Completed {
                    coord,
                    deferred: deferred.len(),
                });
                tracing::debug!(%coord, deferred = deferred.len(), "generation complete");
                PollResult::Complete(buffer)
            }
            Ok(GenerationOutcome::Cancelled { stage }) => {
                self.events.send(GenerationEvent::Cancelled { coord, stage });
                tracing::debug!(%coord, %stage, "generation cancelled");
                PollResult::Cancelled
            }
            Err(error) => {
                tracing::warn!(%coord, %error, "generation failed");
                self.events.send(GenerationEvent::Failed {
                    coord,
                    kind: error.kind(),
                });
                PollResult::Failed(error)
            }
        };

        task.finish(result);
        self.unregister(task);
    }

    /// Records obligations, or drops them when the host cannot be patched.
    fn defer(&self, deferred: &[DeferredObligation]) {
        if deferred.is_empty() {
            return;
        }
        let retained = self.world.supports_patching();
        for obligation in deferred {
            self.events.send(GenerationEvent::Deferred {
                obligation: *obligation,
                retained,
            });
        }
        if !retained {
            tracing::debug!(
                origin = %deferred[0].origin,
                count = deferred.len(),
                "host does not accept patches, skipping cross-chunk features"
            );
            return;
        }

        let mut table = self.obligations.lock();
        for obligation in deferred {
            table.entry(obligation.requires).or_default().push(*obligation);
        }
    }

    /// Resolves obligations waiting on `coord`, using its fresh buffer.
    fn settle_arrival(&self, coord: ChunkCoord, buffer: &ChunkBuffer) -> usize {
        let Some(waiting) = self.obligations.lock().remove(&coord) else {
            return 0;
        };
        self.settle_all(waiting, buffer)
    }

    /// Applies what can be applied and puts the rest back.
    fn settle_all(&self, waiting: Vec<DeferredObligation>, neighbor: &ChunkBuffer) -> usize {
        let mut applied = 0;
        let mut remaining = Vec::new();
        for obligation in waiting {
            match self.settle(&obligation, neighbor) {
                Settled::Applied => applied += 1,
                Settled::Dropped => {}
                Settled::NotReady => remaining.push(obligation),
            }
        }
        if !remaining.is_empty() {
            let mut table = self.obligations.lock();
            table
                .entry(neighbor.coord())
                .or_default()
                .extend(remaining);
        }
        applied
    }

    fn settle(&self, obligation: &DeferredObligation, neighbor: &ChunkBuffer) -> Settled {
        let resolved = panic::catch_unwind(AssertUnwindSafe(|| {
            self.generator.resolve_deferred(obligation, neighbor)
        }))
        .unwrap_or_else(|payload| Err(GenerationError::Internal(panic_message(payload.as_ref()))));

        match resolved {
            Ok(None) => Settled::Dropped,
            Ok(Some(patch)) => {
                let writes = patch.len();
                if self.world.apply_patch(&patch) {
                    tracing::debug!(origin = %obligation.origin, neighbor = %obligation.requires, writes, "deferred feature applied");
                    self.events.send(GenerationEvent::Patched {
                        coord: patch.coord,
                        neighbor: obligation.requires,
                        writes,
                    });
                    Settled::Applied
                } else {
                    tracing::trace!(origin = %obligation.origin, "host rejected patch, keeping obligation");
                    Settled::NotReady
                }
            }
            Err(error) => {
                tracing::warn!(origin = %obligation.origin, %error, "failed to resolve deferred feature");
                Settled::Dropped
            }
        }
    }
}

/// Text of a caught panic.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("generator panicked: {detail}")
}

enum Settled {
    Applied,
    Dropped,
    NotReady,
}

/// A requester's view of a chunk task.
///
/// Dropping a handle withdraws its interest, exactly like cancelling it.
pub struct GenerationHandle {
    task: Arc<Task>,
    shared: Arc<Shared>,
    cancelled: AtomicBool,
}

impl GenerationHandle {
    /// Id of the underlying task; equal for deduplicated requests.
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> u64 {
        self.task.id
    }

    /// Requested chunk.
    #[inline]
    #[must_use]
    pub fn coord(&self) -> ChunkCoord {
        self.task.coord
    }

    /// True once this handle has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Current state, without blocking.
    #[must_use]
    pub fn poll(&self) -> PollResult {
        if self.is_cancelled() {
            return PollResult::Cancelled;
        }
        self.task.current()
    }

    /// Blocks until the task is finished.
    #[must_use]
    pub fn wait(&self) -> PollResult {
        self.task.wait(&self.cancelled)
    }

    /// Blocks for at most `timeout`. Returns `Pending` if still running.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> PollResult {
        self.task.wait_timeout(&self.cancelled, timeout)
    }

    /// Withdraws this handle's interest. Idempotent.
    ///
    /// A thread blocked in [`wait`](Self::wait) on this handle returns
    /// `Cancelled`, even if other handles keep the task running.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.task.wake();
            self.shared.release(&self.task);
        }
    }
}

impl Drop for GenerationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for GenerationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationHandle")
            .field("task_id", &self.task.id)
            .field("coord", &self.task.coord)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Fixed worker pool with a deduplicating task registry.
pub struct Scheduler {
    shared: Arc<Shared>,
    jobs: Option<Sender<Arc<Task>>>,
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Validates `config` and spawns the workers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for invalid settings or if a worker thread
    /// cannot be spawned.
    pub fn start(
        config: SchedulerConfig,
        generator: Arc<dyn ChunkGenerator>,
        world: Arc<dyn WorldAdapter>,
    ) -> Result<(Self, EventReceiver), ConfigError> {
        config.validate()?;

        let (event_tx, event_rx) = events::channel(config.event_capacity);
        let shared = Arc::new(Shared {
            generator,
            world,
            registry: Mutex::new(HashMap::new()),
            obligations: Mutex::new(HashMap::new()),
            events: event_tx,
            shutdown: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        });

        let (job_tx, job_rx) = unbounded::<Arc<Task>>();
        let mut scheduler = Self {
            shared,
            jobs: Some(job_tx),
            workers: Vec::with_capacity(config.workers),
        };

        for index in 0..config.workers {
            let shared = Arc::clone(&scheduler.shared);
            let jobs = job_rx.clone();
            let worker = std::thread::Builder::new()
                .name(format!("terrane-worker-{index}"))
                .spawn(move || worker_loop(&shared, &jobs))
                .map_err(|e| ConfigError::InvalidSetting {
                    field: "scheduler.workers",
                    reason: format!("failed to spawn worker {index}: {e}"),
                })?;
            scheduler.workers.push(worker);
        }

        tracing::debug!(workers = config.workers, "scheduler started");
        Ok((scheduler, event_rx))
    }

    /// Requests a chunk. Shares an in-flight task for the same coordinate.
    #[must_use]
    pub fn request(&self, coord: ChunkCoord) -> GenerationHandle {
        let mut registry = self.shared.registry.lock();

        if let Some(task) = registry.get(&coord) {
            if !task.cancel.is_cancelled() {
                task.interest.fetch_add(1, Ordering::AcqRel);
                tracing::trace!(%coord, task = task.id, "joined in-flight task");
                return self.handle(Arc::clone(task));
            }
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let task = Arc::new(Task::new(id, coord));
        registry.insert(coord, Arc::clone(&task));
        drop(registry);

        let queued = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(Arc::clone(&task)).is_ok());
        if !queued {
            self.shared.unregister(&task);
            task.finish(PollResult::Cancelled);
        }
        tracing::trace!(%coord, task = id, "task queued");
        self.handle(task)
    }

    fn handle(&self, task: Arc<Task>) -> GenerationHandle {
        GenerationHandle {
            task,
            shared: Arc::clone(&self.shared),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Current state of `handle`, without blocking.
    #[must_use]
    pub fn poll(&self, handle: &GenerationHandle) -> PollResult {
        handle.poll()
    }

    /// Cancels `handle`.
    pub fn cancel(&self, handle: &GenerationHandle) {
        handle.cancel();
    }

    /// Tells the scheduler the host now holds the chunk at `coord`.
    ///
    /// Retries obligations that wait for `coord` and those that originate
    /// there. Returns the number of patches applied.
    ///
    /// Hosts that accept patches must call this after storing every
    /// chunk. A neighbour can finish before the obligation that needs it
    /// is recorded, or before the origin is stored; only this call
    /// resolves those obligations.
    pub fn neighbor_available(&self, coord: ChunkCoord) -> usize {
        let shared = &self.shared;
        let mut applied = 0;

        if let Some(buffer) = shared.world.generated_neighbor(coord) {
            applied += shared.settle_arrival(coord, &buffer);
        }

        let originating: Vec<ChunkCoord> = shared
            .obligations
            .lock()
            .iter()
            .filter(|(_, list)| list.iter().any(|o| o.origin == coord))
            .map(|(requires, _)| *requires)
            .collect();
        for requires in originating {
            if let Some(buffer) = shared.world.generated_neighbor(requires) {
                applied += shared.settle_arrival(requires, &buffer);
            }
        }
        applied
    }

    /// Number of tasks queued or running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Number of obligations waiting for a neighbour.
    #[must_use]
    pub fn pending_obligations(&self) -> usize {
        self.shared.obligations.lock().values().map(Vec::len).sum()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        for task in self.shared.registry.lock().values() {
            task.cancel.cancel();
        }
        // Workers drain the queue, resolving every job as cancelled.
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("worker panicked during shutdown");
            }
        }
        tracing::debug!("scheduler stopped");
    }
}

fn worker_loop(shared: &Shared, jobs: &Receiver<Arc<Task>>) {
    while let Ok(task) = jobs.recv() {
        shared.run(&task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_core::{BiomeRegistry, ChunkDimensions, ChunkPatch, WorldSeed};

    /// Generator that produces empty chunks, or fails for negative X.
    struct EmptyGenerator;

    impl ChunkGenerator for EmptyGenerator {
        fn generate(
            &self,
            coord: ChunkCoord,
            _world: &dyn WorldAdapter,
            _cancel: &CancelToken,
        ) -> Result<GenerationOutcome, GenerationError> {
            if coord.x < 0 {
                return Err(GenerationError::Internal("negative".into()));
            }
            Ok(GenerationOutcome::Complete(GeneratedChunk {
                buffer: ChunkBuffer::new(coord, ChunkDimensions::new(4, 4, 4)),
                deferred: Vec::new(),
            }))
        }

        fn resolve_deferred(
            &self,
            _obligation: &DeferredObligation,
            _neighbor: &ChunkBuffer,
        ) -> Result<Option<ChunkPatch>, GenerationError> {
            Ok(None)
        }
    }

    struct NoWorld;

    impl WorldAdapter for NoWorld {
        fn generated_neighbor(&self, _coord: ChunkCoord) -> Option<Arc<ChunkBuffer>> {
            None
        }
        fn world_seed(&self) -> WorldSeed {
            WorldSeed::new(0)
        }
        fn biome_registry(&self) -> Arc<BiomeRegistry> {
            unreachable!("not used by the scheduler")
        }
    }

    fn start(workers: usize) -> (Scheduler, EventReceiver) {
        let config = SchedulerConfig {
            workers,
            ..SchedulerConfig::default()
        };
        Scheduler::start(config, Arc::new(EmptyGenerator), Arc::new(NoWorld)).unwrap()
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SchedulerConfig {
            workers: 0,
            ..SchedulerConfig::default()
        };
        let err = Scheduler::start(config, Arc::new(EmptyGenerator), Arc::new(NoWorld)).err();
        assert!(matches!(
            err,
            Some(ConfigError::InvalidSetting {
                field: "scheduler.workers",
                ..
            })
        ));
    }

    #[test]
    fn test_complete_and_leave_registry() {
        let (scheduler, events) = start(2);
        let handle = scheduler.request(ChunkCoord::new(1, 2));

        match handle.wait() {
            PollResult::Complete(buffer) => assert_eq!(buffer.coord(), ChunkCoord::new(1, 2)),
            other => panic!("unexpected {other:?}"),
        }
        // Registry removal happens right after the result is published
        while scheduler.in_flight() > 0 {
            std::thread::yield_now();
        }
        assert_eq!(
            events.try_recv(),
            Some(GenerationEvent::Completed {
                coord: ChunkCoord::new(1, 2),
                deferred: 0
            })
        );

        let again = scheduler.request(ChunkCoord::new(1, 2));
        assert_ne!(again.task_id(), handle.task_id(), "finished tasks are not reused");
    }

    #[test]
    fn test_failure_is_isolated() {
        let (scheduler, _events) = start(2);
        let bad = scheduler.request(ChunkCoord::new(-1, 0));
        let good = scheduler.request(ChunkCoord::new(1, 0));

        assert!(matches!(bad.wait(), PollResult::Failed(GenerationError::Internal(_))));
        assert!(matches!(good.wait(), PollResult::Complete(_)));
    }

    #[test]
    fn test_cancelled_handle_stays_cancelled() {
        let (scheduler, _events) = start(1);
        let handle = scheduler.request(ChunkCoord::new(3, 3));
        scheduler.cancel(&handle);
        scheduler.cancel(&handle);

        assert_eq!(scheduler.poll(&handle), PollResult::Cancelled);
        assert_eq!(handle.wait(), PollResult::Cancelled);
        assert_eq!(handle.wait_timeout(Duration::from_millis(1)), PollResult::Cancelled);
    }

    #[test]
    fn test_drop_resolves_outstanding_handles() {
        let (scheduler, _events) = start(1);
        let handles: Vec<_> = (0..32).map(|x| scheduler.request(ChunkCoord::new(x, 0))).collect();
        drop(scheduler);

        for handle in &handles {
            assert!(handle.poll().is_ready(), "{handle:?} left pending after shutdown");
        }
    }
}
