//! Instance pooling for real-time game scenes
//!
//! This crate provides:
//! - A generic capacity-bound recycling pool with oldest-first stealing
//! - Scene-backed pools handing out instances or typed components
//! - A per-key FIFO ring pool for projectiles
//! - Debounced creation of short-lived effects
//! - Entity Component System (ECS) scene layer built on hecs

pub mod assets;
pub mod core;
pub mod ecs;
pub mod pool;

// Re-exports for convenience
pub use glam;
pub use hecs;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{AssetHandle, AssetKey, Template, TemplateRegistry};
    pub use crate::core::{PoolConfig, PoolEvent, RingPoolSettings, Scene, SpamSettings, TaskId};
    pub use crate::ecs::{Active, Name, Projectile, Transform, Velocity, World};
    pub use crate::pool::{
        ComponentPool, ComponentRef, GameObjectPool, KeyedRingPool, ObjectPool, PoolContext,
        PoolError, SpamProtectedInstantiator,
    };
    pub use glam::{Quat, Vec3};
}
