//! Capacity-Bound Recycling Pool
//!
//! Grows lazily up to a capacity, reissues the first inactive instance it
//! finds, and once full with nothing inactive repossesses the instance that
//! has been held the longest.
//!
//! # Admission Policy
//!
//! 1. **Recycle**: the first live entry (creation order) that is not active
//! 2. **Compact**: forget entries whose instance was destroyed externally
//! 3. **Grow**: build a new instance if below capacity
//! 4. **Steal**: reissue the active entry with the oldest activation time,
//!    without deactivating it first
//!
//! # Example
//!
//! ```ignore
//! let mut pool = ObjectPool::new(
//!     8,
//!     |scene: &mut Scene| template.instantiate(&mut scene.world),
//!     |scene: &Scene, &entity: &Entity| scene.world.is_active(entity),
//! );
//!
//! let entity = pool.get_instance(&mut scene)?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::error::PoolError;
use crate::core::PoolEvent;

// ============================================================================
// Pool Context
// ============================================================================

/// What a pool needs from the loop that drives it.
pub trait PoolContext {
    /// Current frame time
    fn now(&self) -> Duration;

    /// Report a pool event. Ignored by default.
    fn emit(&mut self, _event: PoolEvent) {}
}

// ============================================================================
// Pool Entry
// ============================================================================

/// A tracked instance and the time it was last handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry<T> {
    instance: T,
    last_activated_at: Duration,
}

impl<T> PoolEntry<T> {
    fn new(instance: T, now: Duration) -> Self {
        Self {
            instance,
            last_activated_at: now,
        }
    }

    /// The pooled instance
    #[must_use]
    pub fn instance(&self) -> &T {
        &self.instance
    }

    /// When the instance was last issued
    #[must_use]
    pub fn last_activated_at(&self) -> Duration {
        self.last_activated_at
    }
}

/// Index of the eligible entry with the smallest activation time.
///
/// Ties go to the entry that appears first.
pub(crate) fn oldest_index<T>(
    entries: &[PoolEntry<T>],
    mut eligible: impl FnMut(&T) -> bool,
) -> Option<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| eligible(&entry.instance))
        .min_by_key(|(_, entry)| entry.last_activated_at)
        .map(|(index, _)| index)
}

// ============================================================================
// Statistics
// ============================================================================

/// Counters describing how a pool has been satisfying requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built
    pub created: u64,
    /// Inactive instances reissued
    pub recycled: u64,
    /// Active instances repossessed
    pub stolen: u64,
    /// Entries dropped because their instance disappeared
    pub compacted: u64,
    /// Instances destroyed by `clear` or capacity shrinking
    pub cleared: u64,
}

// ============================================================================
// Object Pool
// ============================================================================

type Builder<T, C> = Box<dyn FnMut(&mut C) -> T>;
type Probe<T, C> = Box<dyn Fn(&C, &T) -> bool>;
type Destroyer<T, C> = Box<dyn FnMut(&mut C, T, Duration)>;

/// Generic recycling pool over instances of type `T` living in context `C`.
///
/// Creation, activity and destruction are injected as closures, so the
/// typed adapters are thin compositions rather than subclasses.
///
/// # Performance Characteristics
///
/// | Operation      | Time Complexity |
/// |----------------|-----------------|
/// | `get_instance` | O(n)            |
/// | `clear`        | O(n)            |
pub struct ObjectPool<T, C> {
    /// Label used in logs and events
    label: Arc<str>,
    /// Maximum number of tracked entries
    capacity: usize,
    /// Entries in creation order
    entries: Vec<PoolEntry<T>>,
    /// Builds a new instance
    builder: Builder<T, C>,
    /// Whether an instance is currently in use
    is_active: Probe<T, C>,
    /// Whether an instance still exists
    is_alive: Probe<T, C>,
    /// Destroys an instance after the given delay
    destroy: Destroyer<T, C>,
    /// Request counters
    stats: PoolStats,
}

impl<T: Clone, C: PoolContext> ObjectPool<T, C> {
    /// Create an empty pool.
    ///
    /// Instances are considered alive forever and dropped on destruction
    /// unless [`with_liveness`](Self::with_liveness) and
    /// [`with_destroyer`](Self::with_destroyer) say otherwise.
    pub fn new(
        capacity: usize,
        builder: impl FnMut(&mut C) -> T + 'static,
        is_active: impl Fn(&C, &T) -> bool + 'static,
    ) -> Self {
        Self {
            label: Arc::from("pool"),
            capacity,
            // Grows on demand; capacity is only an upper bound
            entries: Vec::new(),
            builder: Box::new(builder),
            is_active: Box::new(is_active),
            is_alive: Box::new(|_, _| true),
            destroy: Box::new(|_, _, _| {}),
            stats: PoolStats::default(),
        }
    }

    /// Set the label used in logs and events
    #[must_use]
    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = Arc::from(label.as_ref());
        self
    }

    /// Set the predicate detecting externally destroyed instances
    #[must_use]
    pub fn with_liveness(mut self, is_alive: impl Fn(&C, &T) -> bool + 'static) -> Self {
        self.is_alive = Box::new(is_alive);
        self
    }

    /// Set how instances are destroyed
    #[must_use]
    pub fn with_destroyer(mut self, destroy: impl FnMut(&mut C, T, Duration) + 'static) -> Self {
        self.destroy = Box::new(destroy);
        self
    }

    /// Hand out an instance, creating or recycling as needed.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfiguration`] if the capacity is zero and
    ///   nothing can be recycled
    /// - [`PoolError::InternalInvariantViolation`] if the pool is full but
    ///   holds no active entry to repossess
    pub fn get_instance(&mut self, ctx: &mut C) -> Result<T, PoolError> {
        let now = ctx.now();

        // First fit in creation order
        let view: &C = ctx;
        let is_active = &self.is_active;
        let is_alive = &self.is_alive;
        let free = self
            .entries
            .iter()
            .position(|entry| is_alive(view, &entry.instance) && !is_active(view, &entry.instance));
        if let Some(index) = free {
            let entry = &mut self.entries[index];
            entry.last_activated_at = now;
            self.stats.recycled += 1;
            log::debug!("[{}] recycled entry {index}", self.label);
            ctx.emit(PoolEvent::InstanceRecycled {
                pool: Arc::clone(&self.label),
            });
            return Ok(entry.instance.clone());
        }

        self.compact(ctx);

        if self.capacity == 0 {
            return Err(PoolError::invalid(format!(
                "pool '{}' has zero capacity and nothing to recycle",
                self.label
            )));
        }

        if self.entries.len() < self.capacity {
            let instance = (self.builder)(ctx);
            self.entries.push(PoolEntry::new(instance.clone(), now));
            self.stats.created += 1;
            log::debug!(
                "[{}] created instance {}/{}",
                self.label,
                self.entries.len(),
                self.capacity
            );
            ctx.emit(PoolEvent::InstanceCreated {
                pool: Arc::clone(&self.label),
                tracked: self.entries.len(),
            });
            return Ok(instance);
        }

        self.steal(ctx, now)
    }

    /// Repossess the longest-held active entry.
    fn steal(&mut self, ctx: &mut C, now: Duration) -> Result<T, PoolError> {
        let view: &C = ctx;
        let is_active = &self.is_active;
        let index = oldest_index(&self.entries, |instance| is_active(view, instance)).ok_or_else(
            || PoolError::InternalInvariantViolation {
                pool: self.label.to_string(),
                detail: format!(
                    "full at {} of {} entries with no active or inactive instance",
                    self.entries.len(),
                    self.capacity
                ),
            },
        )?;

        let entry = &mut self.entries[index];
        let held_for = now.saturating_sub(entry.last_activated_at);
        entry.last_activated_at = now;
        self.stats.stolen += 1;

        log::warn!(
            "[{}] pool exhausted, repossessing entry {index} held for {held_for:?}",
            self.label
        );
        ctx.emit(PoolEvent::InstanceStolen {
            pool: Arc::clone(&self.label),
            held_for,
        });

        Ok(entry.instance.clone())
    }

    /// Forget entries whose instance no longer exists.
    fn compact(&mut self, ctx: &C) {
        let before = self.entries.len();
        let is_alive = &self.is_alive;
        self.entries.retain(|entry| is_alive(ctx, &entry.instance));

        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.compacted += removed as u64;
            log::debug!("[{}] compacted {removed} destroyed entries", self.label);
        }
    }

    /// Destroy every tracked instance after `delay` and empty the pool.
    ///
    /// Returns the number of instances cleared. Clearing an empty pool is a
    /// no-op returning 0.
    pub fn clear(&mut self, ctx: &mut C, delay: Duration) -> usize {
        let count = self.entries.len();
        if count == 0 {
            return 0;
        }

        for entry in self.entries.drain(..) {
            (self.destroy)(ctx, entry.instance, delay);
        }
        self.stats.cleared += count as u64;

        log::info!("[{}] cleared {count} instances", self.label);
        ctx.emit(PoolEvent::PoolCleared {
            pool: Arc::clone(&self.label),
            count,
        });
        count
    }

    /// Change the capacity.
    ///
    /// Shrinking below the tracked count destroys the most recently created
    /// surplus entries immediately. Returns how many were destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] for a zero capacity.
    pub fn set_capacity(&mut self, ctx: &mut C, capacity: usize) -> Result<usize, PoolError> {
        if capacity == 0 {
            return Err(PoolError::invalid(format!(
                "pool '{}' capacity must be at least 1",
                self.label
            )));
        }

        self.capacity = capacity;
        let mut removed = 0;
        while self.entries.len() > capacity {
            if let Some(entry) = self.entries.pop() {
                (self.destroy)(ctx, entry.instance, Duration::ZERO);
                removed += 1;
            }
        }

        if removed > 0 {
            self.stats.cleared += removed as u64;
            log::info!(
                "[{}] shrank to {capacity}, destroyed {removed} surplus instances",
                self.label
            );
        }
        Ok(removed)
    }
}

impl<T, C> ObjectPool<T, C> {
    /// Maximum number of tracked entries
    #[must_use]
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tracked entries
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pool tracks nothing
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked entries in creation order
    #[must_use]
    pub fn entries(&self) -> &[PoolEntry<T>] {
        &self.entries
    }

    /// Request counters
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Label used in logs and events
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: fmt::Debug, C> fmt::Debug for ObjectPool<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("label", &self.label)
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
