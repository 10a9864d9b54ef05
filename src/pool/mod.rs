//! Instance pooling
//!
//! Reuses scene instances instead of creating and destroying them every time
//! one is needed.
//!
//! # Design Principles
//!
//! - **Bounded**: a pool never tracks more instances than its capacity
//! - **Lazy**: instances are created on first demand, not up front
//! - **Explicit failure**: every error surfaces as a [`PoolError`]
//!
//! # Pools
//!
//! - [`ObjectPool`]: generic first-fit recycling with oldest-first stealing
//! - [`GameObjectPool`] / [`ComponentPool`]: [`ObjectPool`] wired to a scene
//! - [`KeyedRingPool`]: per-key FIFO recycling for projectiles
//! - [`SpamProtectedInstantiator`]: debounced creation of one-shot effects

mod adapters;
mod error;
mod object_pool;
mod ring;
mod spam;

pub use adapters::{ComponentPool, ComponentRef, GameObjectPool};
pub use error::PoolError;
pub use object_pool::{ObjectPool, PoolContext, PoolEntry, PoolStats};
pub use ring::{KeyedRingPool, RingStats};
pub use spam::{SpamProtectedInstantiator, SpamProtection, SpamStats};
