//! Entity Component System module
//!
//! Built on top of the hecs ECS library. This is the scene layer pooled
//! instances live in.

mod components;
mod world;

pub use components::{Active, Name, Projectile, Retired, Transform, Velocity, rotation_towards};
pub use world::World;
