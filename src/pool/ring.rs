//! Keyed Ring-Buffer Pool
//!
//! Projectile-style pooling: one FIFO queue per asset key. Every issued
//! instance goes to the back of its queue, and once the pool decides to
//! recycle it takes the queue head regardless of whether that instance is
//! still in flight.
//!
//! # Growth Rule
//!
//! A new instance is created while the number of enabled instances across
//! *all* queues is below the *per-key* capacity and the key's own queue has
//! room. Otherwise the head of the key's queue is reissued. A key whose
//! queue is still empty always creates.
//!
//! # Example
//!
//! ```ignore
//! let mut bullets = KeyedRingPool::new(RingPoolSettings::default())?;
//! let key = AssetKey::new("rifle_bullet");
//!
//! let bullet = bullets.spawn_and_fire(&mut scene, &key, muzzle, aim, Some(shooter))?;
//!
//! // On impact
//! bullets.register_bounce(&mut scene, bullet)?;
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec3;
use hecs::Entity;
use rustc_hash::FxHashMap;

use super::error::PoolError;
use super::object_pool::PoolContext;
use crate::assets::AssetKey;
use crate::core::{PoolEvent, RingPoolSettings, Scene, TaskId};
use crate::ecs::{Projectile, Velocity, World, rotation_towards};

/// Counters for the ring pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingStats {
    /// Instances built
    pub created: u64,
    /// Queue heads reissued
    pub recycled: u64,
    /// Reissued heads that were still enabled
    pub recycled_active: u64,
}

/// Per-asset FIFO recycling of projectile instances.
#[derive(Debug)]
pub struct KeyedRingPool {
    /// Queue of instances per asset
    queues: FxHashMap<AssetKey, VecDeque<Entity>>,
    /// Capacity, lifetime and teardown settings
    settings: RingPoolSettings,
    /// Request counters
    stats: RingStats,
}

impl KeyedRingPool {
    /// Create an empty pool
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] for a zero per-key capacity
    pub fn new(settings: RingPoolSettings) -> Result<Self, PoolError> {
        if settings.per_key_capacity == 0 {
            return Err(PoolError::invalid("per-key capacity must be at least 1"));
        }
        Ok(Self {
            queues: FxHashMap::default(),
            settings,
            stats: RingStats::default(),
        })
    }

    /// Number of enabled instances across every queue.
    ///
    /// Recomputed by scanning all tracked instances. Instances already
    /// released for destruction do not count.
    #[must_use]
    pub fn active_instances(&self, world: &World) -> usize {
        self.queues
            .values()
            .flatten()
            .filter(|&&entity| world.is_alive(entity) && world.is_active(entity))
            .count()
    }

    /// Issue an instance of `key` at `position`, facing `direction`.
    ///
    /// The instance comes back enabled, motionless, with its bounce count and
    /// shooter cleared and a fresh lifetime countdown.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownAssetKey`] if an instance has to be
    /// created and `key` has no registered template
    pub fn spawn(
        &mut self,
        scene: &mut Scene,
        key: &AssetKey,
        position: Vec3,
        direction: Vec3,
    ) -> Result<Entity, PoolError> {
        let capacity = self.settings.per_key_capacity;
        let queued = match self.queues.get_mut(key) {
            Some(queue) => {
                // Forget members destroyed behind the pool's back
                queue.retain(|&entity| scene.world.is_alive(entity));
                queue.len()
            }
            None => 0,
        };
        let active = self.active_instances(&scene.world);

        let grow = queued == 0 || (active < capacity && queued < capacity);
        let entity = if grow {
            let entity = scene.instantiate(key)?;
            self.stats.created += 1;
            log::debug!("Created {key} instance {}/{capacity}", queued + 1);
            entity
        } else {
            self.recycle_head(scene, key)?
        };

        self.reset(scene, entity, position, direction)?;
        self.queues.entry(key.clone()).or_default().push_back(entity);
        Ok(entity)
    }

    /// Take the oldest member of `key`'s queue.
    fn recycle_head(&mut self, scene: &mut Scene, key: &AssetKey) -> Result<Entity, PoolError> {
        let entity = self
            .queues
            .get_mut(key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| PoolError::InternalInvariantViolation {
                pool: key.to_string(),
                detail: "recycling from an empty queue".to_string(),
            })?;

        let was_active = scene.world.is_active(entity);
        self.stats.recycled += 1;
        if was_active {
            self.stats.recycled_active += 1;
            log::warn!("Recycling {key} instance {entity:?} while still in flight");
        } else {
            log::debug!("Recycling {key} instance {entity:?}");
        }
        scene.emit(PoolEvent::RingRecycled {
            key: key.clone(),
            was_active,
        });
        Ok(entity)
    }

    /// Clear transient state, place, enable and restart the countdown.
    fn reset(
        &self,
        scene: &mut Scene,
        entity: Entity,
        position: Vec3,
        direction: Vec3,
    ) -> Result<(), PoolError> {
        let cleared = scene
            .world
            .get_mut::<Projectile>(entity)
            .ok()
            .map(|mut projectile| {
                projectile.bounces = 0;
                projectile.fired_by = None;
                projectile.countdown.take()
            });
        let previous = match cleared {
            Some(previous) => previous,
            None => {
                scene
                    .world
                    .insert_one(entity, Projectile::default())
                    .map_err(|_| PoolError::StaleHandle(entity))?;
                None
            }
        };

        scene
            .world
            .insert_one(entity, Velocity::default())
            .map_err(|_| PoolError::StaleHandle(entity))?;
        scene
            .world
            .place(entity, position, Some(rotation_towards(direction)))?;
        scene.world.set_active(entity, true)?;

        self.restart_countdown(scene, entity, previous);
        Ok(())
    }

    /// Cancel `previous` and schedule a fresh deactivation.
    fn restart_countdown(&self, scene: &mut Scene, entity: Entity, previous: Option<TaskId>) {
        if let Some(id) = previous {
            scene.scheduler.cancel(id);
        }

        let lifetime = self.settings.lifetime();
        if lifetime.is_zero() {
            return;
        }
        let id = scene
            .scheduler
            .schedule_after(scene.time.elapsed(), lifetime, move |world: &mut World| {
                let _ = world.set_active(entity, false);
            });
        if let Ok(mut projectile) = scene.world.get_mut::<Projectile>(entity) {
            projectile.countdown = Some(id);
        }
    }

    /// Spawn and immediately launch along `direction`.
    ///
    /// `fired_by` is credited for damage; `None` fires anonymously.
    ///
    /// # Errors
    ///
    /// See [`KeyedRingPool::spawn`]
    pub fn spawn_and_fire(
        &mut self,
        scene: &mut Scene,
        key: &AssetKey,
        position: Vec3,
        direction: Vec3,
        fired_by: Option<Entity>,
    ) -> Result<Entity, PoolError> {
        let entity = self.spawn(scene, key, position, direction)?;

        let linear = {
            let mut projectile = scene
                .world
                .get_mut::<Projectile>(entity)
                .map_err(|_| PoolError::StaleHandle(entity))?;
            projectile.fired_by = fired_by;
            projectile.launch_velocity(direction)
        };
        scene
            .world
            .insert_one(
                entity,
                Velocity {
                    linear,
                    angular: Vec3::ZERO,
                },
            )
            .map_err(|_| PoolError::StaleHandle(entity))?;

        Ok(entity)
    }

    /// Record an impact.
    ///
    /// Restarts the lifetime countdown, or deactivates the projectile once it
    /// has bounced `max_bounces` times. Returns whether it is still flying.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::StaleHandle`] if the instance is gone or is not a
    /// projectile
    pub fn register_bounce(&self, scene: &mut Scene, entity: Entity) -> Result<bool, PoolError> {
        let entity = scene.world.resolve(entity)?;

        let (bounces, previous) = {
            let mut projectile = scene
                .world
                .get_mut::<Projectile>(entity)
                .map_err(|_| PoolError::StaleHandle(entity))?;
            projectile.bounces += 1;
            (projectile.bounces, projectile.countdown.take())
        };

        if bounces >= self.settings.max_bounces {
            if let Some(id) = previous {
                scene.scheduler.cancel(id);
            }
            scene.world.set_active(entity, false)?;
            log::debug!("{entity:?} spent after {bounces} bounces");
            return Ok(false);
        }

        self.restart_countdown(scene, entity, previous);
        Ok(true)
    }

    /// Destroy every tracked instance, staggering the destroys.
    ///
    /// The n-th instance (keys in sorted order) is destroyed after
    /// n times the stagger interval. Returns the number destroyed.
    pub fn teardown(&mut self, scene: &mut Scene) -> usize {
        let mut keys: Vec<AssetKey> = self.queues.keys().cloned().collect();
        keys.sort();

        let stagger = self.settings.stagger();
        let mut delay = Duration::ZERO;
        let mut count = 0;

        for key in keys {
            let Some(queue) = self.queues.remove(&key) else {
                continue;
            };
            for entity in queue {
                let countdown = scene
                    .world
                    .get_mut::<Projectile>(entity)
                    .ok()
                    .and_then(|mut projectile| projectile.countdown.take());
                if let Some(id) = countdown {
                    scene.scheduler.cancel(id);
                }

                scene.destroy(entity, delay);
                delay += stagger;
                count += 1;
            }
        }

        if count > 0 {
            log::info!("Tore down {count} pooled projectiles over {delay:?}");
        }
        count
    }

    /// Number of instances queued for `key`
    #[must_use]
    pub fn queue_len(&self, key: &AssetKey) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }

    /// Instances queued for `key`, oldest first
    pub fn queue(&self, key: &AssetKey) -> impl Iterator<Item = Entity> + '_ {
        self.queues.get(key).into_iter().flatten().copied()
    }

    /// Total tracked instances
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }

    /// Check if nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Queue length limit per key
    #[must_use]
    pub fn per_key_capacity(&self) -> usize {
        self.settings.per_key_capacity
    }

    /// Request counters
    #[must_use]
    pub fn stats(&self) -> RingStats {
        self.stats
    }
}
