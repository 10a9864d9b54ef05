//! Scene context driven by the update loop
//!
//! Bundles everything pools touch during a frame: the world instances live
//! in, the frame clock, deferred callbacks, registered templates and the pool
//! event queue.

use std::time::Duration;

use hecs::Entity;

use super::events::{EventQueue, PoolEvent};
use super::scheduler::Scheduler;
use super::time::Time;
use crate::assets::{AssetKey, TemplateRegistry};
use crate::ecs::World;
use crate::pool::{PoolContext, PoolError};

/// One logical update loop's worth of state.
#[derive(Default)]
pub struct Scene {
    /// Instances and their components
    pub world: World,
    /// Frame clock
    pub time: Time,
    /// Deferred callbacks serviced once per tick
    pub scheduler: Scheduler<World>,
    /// Creation recipes by asset key
    pub templates: TemplateRegistry,
    /// Pool events, double buffered
    pub events: EventQueue,
}

impl Scene {
    /// Create an empty scene at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one frame.
    ///
    /// Moves the clock forward, makes last frame's events readable, and runs
    /// every deferred callback that has come due. Returns the number of
    /// callbacks run.
    pub fn tick(&mut self, delta: Duration) -> usize {
        self.time.advance(delta);
        self.events.swap();
        self.scheduler.run_due(self.time.elapsed(), &mut self.world)
    }

    /// Destroy an instance, now or after `delay`.
    ///
    /// With a delay the instance stays in the world until the despawn fires,
    /// but handles to it are stale from this call on.
    pub fn destroy(&mut self, entity: Entity, delay: Duration) {
        if delay.is_zero() {
            if self.world.despawn(entity).is_err() {
                log::debug!("{entity:?} was already destroyed");
            }
            return;
        }

        if !self.world.retire(entity) {
            log::debug!("{entity:?} was already destroyed");
            return;
        }
        self.scheduler
            .schedule_after(self.time.elapsed(), delay, move |world: &mut World| {
                // Something else may have despawned it first
                let _ = world.despawn(entity);
            });
    }

    /// Create a fresh instance from the template registered for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownAssetKey`] if no template is registered.
    pub fn instantiate(&mut self, key: &AssetKey) -> Result<Entity, PoolError> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| PoolError::UnknownAssetKey(key.clone()))?;
        Ok(template.instantiate(&mut self.world))
    }
}

impl PoolContext for Scene {
    fn now(&self) -> Duration {
        self.time.elapsed()
    }

    fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }
}
