//! Core module
//!
//! Frame clock, deferred callbacks, pool events, configuration and the
//! scene context that ties them together.

mod config;
mod events;
mod scene;
mod scheduler;
mod time;

pub use config::{ConfigError, PoolConfig, PoolSettings, RingPoolSettings, SpamSettings};
pub use events::{EventQueue, PoolEvent};
pub use scene::Scene;
pub use scheduler::{Scheduler, TaskId};
pub use time::Time;
