//! World wrapper around hecs
//!
//! This is the placement layer pools talk to: it creates, enables, moves and
//! destroys instances, and detects stale handles through hecs' generation
//! counted entity ids.

use glam::{Quat, Vec3};
use hecs::Entity;

use super::components::{Active, Retired, Transform};
use crate::pool::PoolError;

/// Game world containing all entities and components
pub struct World {
    /// The underlying hecs world
    pub inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn an entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Despawn an entity
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Get a reference to a component
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Get a mutable reference to a component
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, T>, hecs::ComponentError> {
        self.inner.get::<&mut T>(entity)
    }

    /// Check whether an entity carries a component of type `T`
    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.inner.get::<&T>(entity).is_ok()
    }

    /// Add or replace a component
    pub fn insert_one(
        &mut self,
        entity: Entity,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Check if a handle still refers to a live, unretired instance
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.contains(entity) && !self.has::<Retired>(entity)
    }

    /// Resolve a handle, failing with [`PoolError::StaleHandle`] if its
    /// instance was destroyed or released for destruction.
    pub fn resolve(&self, entity: Entity) -> Result<Entity, PoolError> {
        if self.is_alive(entity) {
            Ok(entity)
        } else {
            Err(PoolError::StaleHandle(entity))
        }
    }

    /// Whether the instance is enabled in the scene.
    ///
    /// Instances without an [`Active`] component count as enabled; missing
    /// entities count as disabled.
    pub fn is_active(&self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.get::<Active>(entity).map_or(true, |active| active.0)
    }

    /// Enable or disable an instance
    pub fn set_active(&mut self, entity: Entity, active: bool) -> Result<(), PoolError> {
        let entity = self.resolve(entity)?;
        self.insert_one(entity, Active(active))
            .map_err(|_| PoolError::StaleHandle(entity))
    }

    /// Move an instance, optionally replacing its rotation.
    ///
    /// `None` leaves the current rotation untouched.
    pub fn place(
        &mut self,
        entity: Entity,
        position: Vec3,
        rotation: Option<Quat>,
    ) -> Result<(), PoolError> {
        let entity = self.resolve(entity)?;
        if let Ok(mut transform) = self.get_mut::<Transform>(entity) {
            transform.position = position;
            if let Some(rotation) = rotation {
                transform.rotation = rotation;
            }
            return Ok(());
        }

        let transform = Transform::from_position_rotation(position, rotation.unwrap_or_default());
        self.insert_one(entity, transform)
            .map_err(|_| PoolError::StaleHandle(entity))
    }

    /// Tombstone an instance so existing handles become stale
    pub fn retire(&mut self, entity: Entity) -> bool {
        self.insert_one(entity, Retired).is_ok()
    }

    /// Get the number of entities
    pub fn len(&self) -> u32 {
        self.inner.len()
    }

    /// Check if the world is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active_defaults() {
        let mut world = World::new();
        let bare = world.spawn((Transform::default(),));
        let disabled = world.spawn((Active(false),));

        assert!(world.is_active(bare));
        assert!(!world.is_active(disabled));

        world.despawn(bare).unwrap();
        assert!(!world.is_active(bare));
    }

    #[test]
    fn test_place_preserves_rotation() {
        let mut world = World::new();
        let rotation = Quat::from_rotation_y(1.0);
        let entity = world.spawn((Transform::from_position_rotation(Vec3::ZERO, rotation),));

        world.place(entity, Vec3::X, None).unwrap();
        let transform = *world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::X);
        assert_eq!(transform.rotation, rotation);

        world.place(entity, Vec3::Y, Some(Quat::IDENTITY)).unwrap();
        assert_eq!(world.get::<Transform>(entity).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_place_adds_missing_transform() {
        let mut world = World::new();
        let entity = world.spawn((Active(true),));

        world.place(entity, Vec3::Z, None).unwrap();
        assert_eq!(world.get::<Transform>(entity).unwrap().position, Vec3::Z);
    }

    #[test]
    fn test_retired_handle_is_stale() {
        let mut world = World::new();
        let entity = world.spawn((Active(true),));

        assert!(world.retire(entity));
        assert!(world.contains(entity));
        assert!(matches!(
            world.set_active(entity, false),
            Err(PoolError::StaleHandle(e)) if e == entity
        ));
    }

    #[test]
    fn test_despawned_handle_is_stale() {
        let mut world = World::new();
        let entity = world.spawn((Active(true),));
        world.despawn(entity).unwrap();

        let reused = world.spawn((Active(true),));
        assert_ne!(entity, reused);
        assert!(world.resolve(entity).is_err());
        assert!(world.resolve(reused).is_ok());
    }
}
