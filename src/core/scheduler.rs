//! Deferred Callback Scheduler
//!
//! Timed effects ("destroy after two seconds", "deactivate when the lifetime
//! runs out") are expressed as callbacks scheduled against the frame clock
//! and serviced once per tick.
//!
//! # Design Principles
//!
//! - **Frame Driven**: Nothing fires on its own; `run_due` is called by the update loop
//! - **Cancellable**: Every task has a `TaskId` that can cancel it before it fires
//! - **Idempotent Cancel**: Cancelling twice, or after firing, is a no-op
//! - **Deterministic**: Tasks due at the same instant run in scheduling order
//!
//! # Example
//!
//! ```ignore
//! let mut scheduler: Scheduler<World> = Scheduler::new();
//! let id = scheduler.schedule_at(Duration::from_secs(2), move |world| {
//!     let _ = world.despawn(entity);
//! });
//!
//! // Impact restarted the countdown
//! scheduler.cancel(id);
//!
//! // Once per frame
//! scheduler.run_due(time.elapsed(), &mut world);
//! ```

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use rustc_hash::FxHashMap;

/// Identifier of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Get the raw id value.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

type Task<C> = Box<dyn FnOnce(&mut C)>;

/// Min-heap of callbacks keyed by fire time.
///
/// Cancelled tasks are removed from the task map immediately and their heap
/// entries are skipped when they surface.
pub struct Scheduler<C> {
    /// Fire times, earliest first
    queue: BinaryHeap<Reverse<(Duration, TaskId)>>,
    /// Callbacks still pending
    tasks: FxHashMap<TaskId, Task<C>>,
    /// Next id to hand out
    next_id: u64,
}

impl<C> Scheduler<C> {
    /// Create an empty scheduler
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            tasks: FxHashMap::default(),
            next_id: 0,
        }
    }

    /// Schedule `task` to run on the first `run_due` at or after `at`.
    pub fn schedule_at(&mut self, at: Duration, task: impl FnOnce(&mut C) + 'static) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queue.push(Reverse((at, id)));
        self.tasks.insert(id, Box::new(task));
        id
    }

    /// Schedule `task` to run `delay` after `now`.
    pub fn schedule_after(
        &mut self,
        now: Duration,
        delay: Duration,
        task: impl FnOnce(&mut C) + 'static,
    ) -> TaskId {
        self.schedule_at(now.saturating_add(delay), task)
    }

    /// Cancel a pending task.
    ///
    /// Returns `true` if the task was pending. Unknown, fired, or already
    /// cancelled ids are ignored.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    /// Check whether a task is still waiting to fire
    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Run every task due at `now`, returning how many ran.
    pub fn run_due(&mut self, now: Duration, ctx: &mut C) -> usize {
        let mut ran = 0;

        while let Some(&Reverse((at, id))) = self.queue.peek() {
            if at > now {
                break;
            }
            self.queue.pop();

            if let Some(task) = self.tasks.remove(&id) {
                task(ctx);
                ran += 1;
            }
        }

        if self.tasks.is_empty() {
            self.queue.clear();
        }

        ran
    }

    /// Number of pending tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check whether nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every pending task without running it
    pub fn clear(&mut self) {
        self.queue.clear();
        self.tasks.clear();
    }
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
