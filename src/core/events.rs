//! Pool Event Queue
//!
//! Pools report what they did (created, recycled, stole, cleared or
//! suppressed) into a double-buffered queue. Events written during one frame
//! are read during the next.
//!
//! # Design Principles
//!
//! - **Typed**: every event is a [`PoolEvent`] variant
//! - **Frame-consistent**: observers never see a half-written frame
//! - **Passive**: reporting never changes what a pool does
//!
//! # Example
//!
//! ```ignore
//! // Frame N: a pool had to repossess a live instance
//! scene.events.push(PoolEvent::InstanceStolen { pool, held_for });
//!
//! // Frame N+1: diagnostics overlay
//! for event in scene.events.iter() {
//!     if let PoolEvent::InstanceStolen { pool, .. } = event {
//!         log::warn!("pool {pool} is under pressure");
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::assets::AssetKey;

// ============================================================================
// Event Types
// ============================================================================

/// Things pools report to observers.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PoolEvent {
    // -------------------------------------------------------------------------
    // Recycling pool
    // -------------------------------------------------------------------------
    /// A new instance was created.
    InstanceCreated {
        /// Pool label
        pool: Arc<str>,
        /// Entries tracked after the creation
        tracked: usize,
    },

    /// An inactive instance was reissued.
    InstanceRecycled {
        /// Pool label
        pool: Arc<str>,
    },

    /// A still-active instance was repossessed because the pool was full.
    InstanceStolen {
        /// Pool label
        pool: Arc<str>,
        /// How long the victim had been held since its last issue
        held_for: Duration,
    },

    /// Every tracked instance was destroyed.
    PoolCleared {
        /// Pool label
        pool: Arc<str>,
        /// Number of instances destroyed
        count: usize,
    },

    // -------------------------------------------------------------------------
    // Ring-buffer pool
    // -------------------------------------------------------------------------
    /// The head of a per-asset queue was reissued.
    RingRecycled {
        /// Asset the queue belongs to
        key: AssetKey,
        /// Whether the recycled instance was still enabled
        was_active: bool,
    },

    // -------------------------------------------------------------------------
    // Rate limiting
    // -------------------------------------------------------------------------
    /// A debounced spawn was dropped.
    SpawnSuppressed {
        /// Recipe whose spawn was dropped
        key: AssetKey,
    },
}

// ============================================================================
// Event Queue
// ============================================================================

/// Pool events, readable one frame after they were reported.
///
/// Pools write into the current frame's buffer while observers read the
/// previous frame's. [`EventQueue::swap`] flips the two at frame start.
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Reported during this frame
    incoming: Vec<PoolEvent>,
    /// Reported during the last frame
    visible: Vec<PoolEvent>,
}

impl EventQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an event; it becomes visible after the next swap
    #[inline]
    pub fn push(&mut self, event: PoolEvent) {
        self.incoming.push(event);
    }

    /// Publish this frame's events and discard the unread ones from the last.
    pub fn swap(&mut self) {
        self.visible.clear();
        std::mem::swap(&mut self.incoming, &mut self.visible);
    }

    /// Last frame's events, in report order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PoolEvent> {
        self.visible.iter()
    }

    /// Take last frame's events
    pub fn drain(&mut self) -> impl Iterator<Item = PoolEvent> + '_ {
        self.visible.drain(..)
    }

    /// Count last frame's steals, the usual sign of an undersized pool
    #[must_use]
    pub fn steals(&self) -> usize {
        self.iter()
            .filter(|event| matches!(event, PoolEvent::InstanceStolen { .. }))
            .count()
    }

    /// Check if last frame reported nothing
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Number of events from last frame
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Number of events reported so far this frame
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.incoming.len()
    }

    /// Drop everything, published or not
    pub fn clear(&mut self) {
        self.incoming.clear();
        self.visible.clear();
    }
}
