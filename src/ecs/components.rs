//! Common ECS components used by pooled instances

use glam::{Quat, Vec3};
use hecs::Entity;

use crate::core::TaskId;

/// Transform component for position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Transform {
    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform at `position` whose forward axis points along `direction`.
    ///
    /// A zero-length direction leaves the rotation at identity.
    pub fn looking_along(position: Vec3, direction: Vec3) -> Self {
        Self::from_position_rotation(position, rotation_towards(direction))
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Rotation that maps local forward (negative Z) onto `direction`.
pub fn rotation_towards(direction: Vec3) -> Quat {
    direction
        .try_normalize()
        .map_or(Quat::IDENTITY, |dir| Quat::from_rotation_arc(Vec3::NEG_Z, dir))
}

/// Linear and angular velocity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

/// Name component for debugging
#[derive(Debug, Clone)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Enabled-in-scene flag.
///
/// Pools only observe this flag to decide recycling; gameplay code clears it
/// when an instance is logically dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

/// Marker for an instance whose pool has released it for destruction.
///
/// The scene object may linger until a deferred despawn fires, but handles
/// to it are already stale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retired;

/// Transient state of a fired projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    /// Forward impulse applied when fired
    pub impulse: f32,
    /// Mass used to turn the impulse into a velocity
    pub mass: f32,
    /// Surfaces hit since the last spawn
    pub bounces: u32,
    /// Shooter credited with damage, if any
    pub fired_by: Option<Entity>,
    /// Pending deactivation countdown
    pub countdown: Option<TaskId>,
}

impl Projectile {
    /// Create projectile state with the given impulse and mass
    #[must_use]
    pub fn new(impulse: f32, mass: f32) -> Self {
        Self {
            impulse,
            mass,
            ..Default::default()
        }
    }

    /// Launch velocity along `direction`.
    #[must_use]
    pub fn launch_velocity(&self, direction: Vec3) -> Vec3 {
        if self.mass <= 0.0 {
            return Vec3::ZERO;
        }
        direction.normalize_or_zero() * (self.impulse / self.mass)
    }
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            impulse: 1.0,
            mass: 1.0,
            bounces: 0,
            fired_by: None,
            countdown: None,
        }
    }
}
