//! Scene-backed pool adapters
//!
//! [`GameObjectPool`] hands out raw scene instances; [`ComponentPool`] hands
//! out a typed component on each instance, adding the component when the
//! template lacks it. Both are thin wiring around [`ObjectPool`]: activity
//! is the container's [`Active`](crate::ecs::Active) flag and destruction
//! goes through [`Scene::destroy`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::time::Duration;

use glam::{Quat, Vec3};
use hecs::Entity;

use super::error::PoolError;
use super::object_pool::{ObjectPool, PoolStats};
use crate::assets::{AssetHandle, AssetKey, Template, TemplateRegistry};
use crate::core::Scene;
use crate::ecs::World;

/// A pooled handle that lives on a scene instance.
trait SceneHandle: Clone + 'static {
    /// The instance that owns the handle
    fn container(&self) -> Entity;
}

impl SceneHandle for Entity {
    fn container(&self) -> Entity {
        *self
    }
}

impl<TC: 'static> SceneHandle for ComponentRef<TC> {
    fn container(&self) -> Entity {
        self.entity
    }
}

/// Wire an [`ObjectPool`] to the scene through the handle's container.
fn scene_pool<H: SceneHandle>(
    label: &str,
    capacity: usize,
    builder: impl FnMut(&mut Scene) -> H + 'static,
) -> ObjectPool<H, Scene> {
    ObjectPool::new(capacity, builder, |scene: &Scene, handle: &H| {
        scene.world.is_active(handle.container())
    })
    .with_label(label)
    .with_liveness(|scene: &Scene, handle: &H| scene.world.is_alive(handle.container()))
    .with_destroyer(|scene: &mut Scene, handle: H, delay: Duration| {
        scene.destroy(handle.container(), delay);
    })
}

/// Enable an issued instance and move it into place.
fn place(
    scene: &mut Scene,
    entity: Entity,
    position: Vec3,
    rotation: Option<Quat>,
) -> Result<(), PoolError> {
    scene.world.set_active(entity, true)?;
    scene.world.place(entity, position, rotation)
}

fn lookup(registry: &TemplateRegistry, key: &AssetKey) -> Result<AssetHandle<Template>, PoolError> {
    registry
        .get(key)
        .ok_or_else(|| PoolError::invalid(format!("no creation recipe registered for '{key}'")))
}

// ============================================================================
// Game Object Pool
// ============================================================================

/// Recycling pool of scene instances cloned from one template.
pub struct GameObjectPool {
    template: AssetHandle<Template>,
    pool: ObjectPool<Entity, Scene>,
}

impl GameObjectPool {
    /// Create a pool instantiating `template`
    pub fn new(template: AssetHandle<Template>, capacity: usize) -> Self {
        let recipe = template.clone();
        let pool = scene_pool(template.name(), capacity, move |scene: &mut Scene| {
            recipe.instantiate(&mut scene.world)
        });
        Self { template, pool }
    }

    /// Create a pool for the template registered under `key`
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `key` has no template
    pub fn from_registry(
        registry: &TemplateRegistry,
        key: &AssetKey,
        capacity: usize,
    ) -> Result<Self, PoolError> {
        Ok(Self::new(lookup(registry, key)?, capacity))
    }

    /// Hand out an instance without touching its state.
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::get_instance`]
    pub fn get_instance(&mut self, scene: &mut Scene) -> Result<Entity, PoolError> {
        self.pool.get_instance(scene)
    }

    /// Hand out an instance, enabled and moved to `position`.
    ///
    /// `rotation` replaces the instance's rotation when given; `None` keeps
    /// whatever rotation it had.
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::get_instance`]
    pub fn spawn_at(
        &mut self,
        scene: &mut Scene,
        position: Vec3,
        rotation: Option<Quat>,
    ) -> Result<Entity, PoolError> {
        let entity = self.pool.get_instance(scene)?;
        place(scene, entity, position, rotation)?;
        Ok(entity)
    }

    /// Destroy every instance after `delay`; returns how many
    pub fn clear(&mut self, scene: &mut Scene, delay: Duration) -> usize {
        self.pool.clear(scene, delay)
    }

    /// Change the capacity
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::set_capacity`]
    pub fn set_capacity(&mut self, scene: &mut Scene, capacity: usize) -> Result<usize, PoolError> {
        self.pool.set_capacity(scene, capacity)
    }

    /// Maximum number of instances
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of tracked instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Check if nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Request counters
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The template instances are cloned from
    #[must_use]
    pub fn template(&self) -> &AssetHandle<Template> {
        &self.template
    }
}

impl fmt::Debug for GameObjectPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObjectPool")
            .field("template", &self.template.name())
            .field("pool", &self.pool)
            .finish()
    }
}

// ============================================================================
// Component Pool
// ============================================================================

/// Handle to a component of type `TC` on a pooled instance.
pub struct ComponentRef<TC> {
    entity: Entity,
    _marker: PhantomData<fn() -> TC>,
}

impl<TC: hecs::Component> ComponentRef<TC> {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            _marker: PhantomData,
        }
    }

    /// The instance carrying the component
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Borrow the component
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::StaleHandle`] if the instance was destroyed or
    /// lost the component
    pub fn get<'w>(&self, world: &'w World) -> Result<hecs::Ref<'w, TC>, PoolError> {
        let entity = world.resolve(self.entity)?;
        world
            .get::<TC>(entity)
            .map_err(|_| PoolError::StaleHandle(entity))
    }

    /// Mutably borrow the component
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::StaleHandle`] if the instance was destroyed or
    /// lost the component
    pub fn get_mut<'w>(&self, world: &'w mut World) -> Result<hecs::RefMut<'w, TC>, PoolError> {
        let entity = world.resolve(self.entity)?;
        world
            .get_mut::<TC>(entity)
            .map_err(|_| PoolError::StaleHandle(entity))
    }
}

impl<TC> Clone for ComponentRef<TC> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<TC> Copy for ComponentRef<TC> {}

impl<TC> PartialEq for ComponentRef<TC> {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity
    }
}

impl<TC> Eq for ComponentRef<TC> {}

impl<TC> Hash for ComponentRef<TC> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

impl<TC> fmt::Debug for ComponentRef<TC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef")
            .field(&self.entity)
            .field(&std::any::type_name::<TC>())
            .finish()
    }
}

/// Recycling pool of instances guaranteed to carry a `TC` component.
pub struct ComponentPool<TC: hecs::Component + Default> {
    template: AssetHandle<Template>,
    pool: ObjectPool<ComponentRef<TC>, Scene>,
}

impl<TC: hecs::Component + Default> ComponentPool<TC> {
    /// Create a pool instantiating `template`
    pub fn new(template: AssetHandle<Template>, capacity: usize) -> Self {
        let recipe = template.clone();
        let pool = scene_pool(template.name(), capacity, move |scene: &mut Scene| {
            let entity = recipe.instantiate(&mut scene.world);
            if !scene.world.has::<TC>(entity) {
                // Just spawned, so the entity exists
                let _ = scene.world.insert_one(entity, TC::default());
            }
            ComponentRef::new(entity)
        });
        Self { template, pool }
    }

    /// Create a pool for the template registered under `key`
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `key` has no template
    pub fn from_registry(
        registry: &TemplateRegistry,
        key: &AssetKey,
        capacity: usize,
    ) -> Result<Self, PoolError> {
        Ok(Self::new(lookup(registry, key)?, capacity))
    }

    /// Hand out a component without touching its instance.
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::get_instance`]
    pub fn get_instance(&mut self, scene: &mut Scene) -> Result<ComponentRef<TC>, PoolError> {
        self.pool.get_instance(scene)
    }

    /// Hand out a component whose instance is enabled and moved to `position`.
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::get_instance`]
    pub fn spawn_at(
        &mut self,
        scene: &mut Scene,
        position: Vec3,
        rotation: Option<Quat>,
    ) -> Result<ComponentRef<TC>, PoolError> {
        let handle = self.pool.get_instance(scene)?;
        place(scene, handle.entity, position, rotation)?;
        Ok(handle)
    }

    /// Destroy every instance (not just the component) after `delay`
    pub fn clear(&mut self, scene: &mut Scene, delay: Duration) -> usize {
        self.pool.clear(scene, delay)
    }

    /// Change the capacity
    ///
    /// # Errors
    ///
    /// See [`ObjectPool::set_capacity`]
    pub fn set_capacity(&mut self, scene: &mut Scene, capacity: usize) -> Result<usize, PoolError> {
        self.pool.set_capacity(scene, capacity)
    }

    /// Maximum number of instances
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of tracked instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Check if nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Request counters
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// The template instances are cloned from
    #[must_use]
    pub fn template(&self) -> &AssetHandle<Template> {
        &self.template
    }
}

impl<TC: hecs::Component + Default> fmt::Debug for ComponentPool<TC> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentPool")
            .field("template", &self.template.name())
            .field("component", &std::any::type_name::<TC>())
            .field("pool", &self.pool)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PoolEvent;
    use crate::ecs::{Active, Transform};

    /// Health component some templates carry
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Health(f32);

    impl Default for Health {
        fn default() -> Self {
            Self(100.0)
        }
    }

    fn soldier_scene() -> (Scene, AssetKey) {
        let mut scene = Scene::new();
        let key = AssetKey::new("soldier");
        scene.templates.register(key.clone(), Template::empty("Soldier"));
        (scene, key)
    }

    fn soldier_pool(scene: &Scene, key: &AssetKey, capacity: usize) -> GameObjectPool {
        GameObjectPool::from_registry(&scene.templates, key, capacity).unwrap()
    }

    #[test]
    fn test_spawn_at_enables_and_moves() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 2);

        let entity = pool.spawn_at(&mut scene, Vec3::new(1.0, 0.0, 2.0), None).unwrap();
        assert!(scene.world.is_active(entity));
        assert_eq!(
            scene.world.get::<Transform>(entity).unwrap().position,
            Vec3::new(1.0, 0.0, 2.0)
        );
    }

    #[test]
    fn test_spawn_at_rotation_handling() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 1);

        let turned = Quat::from_rotation_y(0.75);
        let entity = pool.spawn_at(&mut scene, Vec3::ZERO, Some(turned)).unwrap();
        assert_eq!(scene.world.get::<Transform>(entity).unwrap().rotation, turned);

        scene.world.set_active(entity, false).unwrap();
        let again = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        assert_eq!(again, entity);
        assert_eq!(
            scene.world.get::<Transform>(entity).unwrap().rotation,
            turned,
            "Omitted rotation must not reset to identity"
        );

        let exact = Quat::from_rotation_x(-0.3);
        pool.spawn_at(&mut scene, Vec3::ZERO, Some(exact)).unwrap();
        assert_eq!(scene.world.get::<Transform>(entity).unwrap().rotation, exact);
    }

    #[test]
    fn test_recycles_deactivated_instance() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 2);

        let first = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        let second = pool.spawn_at(&mut scene, Vec3::X, None).unwrap();
        assert_ne!(first, second);

        scene.world.set_active(first, false).unwrap();
        let recycled = pool.spawn_at(&mut scene, Vec3::Y, None).unwrap();
        assert_eq!(recycled, first);
        assert!(scene.world.is_active(recycled));
        assert_eq!(pool.len(), 2);
        assert_eq!(scene.world.len(), 2);
    }

    #[test]
    fn test_steal_reported_next_frame() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 1);

        let only = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        scene.tick(Duration::from_millis(100));
        let stolen = pool.spawn_at(&mut scene, Vec3::X, None).unwrap();
        assert_eq!(stolen, only);
        assert_eq!(pool.stats().stolen, 1);

        scene.tick(Duration::from_millis(16));
        assert!(scene.events.iter().any(|event| matches!(
            event,
            PoolEvent::InstanceStolen { held_for, .. } if *held_for == Duration::from_millis(100)
        )));
    }

    #[test]
    fn test_from_registry_requires_recipe() {
        let scene = Scene::new();
        let err = GameObjectPool::from_registry(&scene.templates, &AssetKey::new("tank"), 4)
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_clear_makes_handles_stale() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 3);

        let handles: Vec<Entity> = (0..3)
            .map(|i| pool.spawn_at(&mut scene, Vec3::splat(i as f32), None).unwrap())
            .collect();

        assert_eq!(pool.clear(&mut scene, Duration::ZERO), 3);
        assert!(pool.is_empty());
        for handle in handles {
            assert_eq!(
                scene.world.set_active(handle, false),
                Err(PoolError::StaleHandle(handle))
            );
        }
        assert!(scene.world.is_empty());
    }

    #[test]
    fn test_delayed_clear() {
        let (mut scene, key) = soldier_scene();
        let mut pool = soldier_pool(&scene, &key, 2);

        let a = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();

        assert_eq!(pool.clear(&mut scene, Duration::from_secs(1)), 2);
        assert!(scene.world.resolve(a).is_err());
        assert_eq!(scene.world.len(), 2, "Instances linger until the delay passes");

        // New instances are created rather than reviving the doomed ones
        let fresh = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        assert_ne!(fresh, a);

        scene.tick(Duration::from_secs(1));
        assert_eq!(scene.world.len(), 1);
    }

    #[test]
    fn test_component_pool_adds_missing_component() {
        let (mut scene, key) = soldier_scene();
        let mut pool: ComponentPool<Health> =
            ComponentPool::from_registry(&scene.templates, &key, 2).unwrap();

        let health = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        assert_eq!(*health.get(&scene.world).unwrap(), Health(100.0));
    }

    #[test]
    fn test_component_pool_keeps_template_component() {
        let mut scene = Scene::new();
        let key = AssetKey::new("medic");
        scene.templates.register(
            key.clone(),
            Template::new("Medic", |builder| {
                builder.add(Health(40.0));
            }),
        );
        let mut pool: ComponentPool<Health> =
            ComponentPool::from_registry(&scene.templates, &key, 2).unwrap();

        let health = pool.get_instance(&mut scene).unwrap();
        assert_eq!(*health.get(&scene.world).unwrap(), Health(40.0));

        health.get_mut(&mut scene.world).unwrap().0 = 10.0;
        assert_eq!(health.get(&scene.world).unwrap().0, 10.0);
    }

    #[test]
    fn test_component_pool_activity_follows_container() {
        let (mut scene, key) = soldier_scene();
        let mut pool: ComponentPool<Health> =
            ComponentPool::from_registry(&scene.templates, &key, 2).unwrap();

        let first = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        scene.world.insert_one(first.entity(), Active(false)).unwrap();

        let second = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        assert_eq!(second, first, "Disabled container is recycled");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_component_pool_clear_destroys_container() {
        let (mut scene, key) = soldier_scene();
        let mut pool: ComponentPool<Health> =
            ComponentPool::from_registry(&scene.templates, &key, 2).unwrap();

        let health = pool.spawn_at(&mut scene, Vec3::ZERO, None).unwrap();
        assert_eq!(pool.clear(&mut scene, Duration::ZERO), 1);

        assert!(!scene.world.contains(health.entity()));
        assert!(matches!(
            health.get(&scene.world),
            Err(PoolError::StaleHandle(entity)) if entity == health.entity()
        ));
    }
}
