//! Spam Protection
//!
//! Debounces repeated creation requests. A request for a key runs only if
//! that key has never run, or if at least the configured interval has passed
//! since it last ran. Suppressed requests are dropped, not queued.
//!
//! # Example
//!
//! ```ignore
//! let mut sparks = SpamProtectedInstantiator::from_settings(&config.spam);
//!
//! // Called every frame a weapon grinds against a wall; at most one
//! // effect per interval actually appears.
//! sparks.instantiate(&mut scene, &AssetKey::new("sparks"), contact, None)?;
//! ```

use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use glam::{Quat, Vec3};
use hecs::Entity;
use rustc_hash::FxHashMap;

use super::error::PoolError;
use super::object_pool::PoolContext;
use crate::assets::AssetKey;
use crate::core::{PoolEvent, Scene, SpamSettings};
use crate::ecs::World;

/// Counters for debounced requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpamStats {
    /// Requests that ran
    pub executed: u64,
    /// Requests dropped inside the interval
    pub suppressed: u64,
}

/// Per-key debounce gate.
pub struct SpamProtection<K = AssetKey> {
    interval: Duration,
    last: FxHashMap<K, Duration>,
    stats: SpamStats,
}

impl<K: Eq + Hash> SpamProtection<K> {
    /// Create a gate that admits one request per key per `interval`
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: FxHashMap::default(),
            stats: SpamStats::default(),
        }
    }

    /// Whether a request for `key` at `now` would run
    #[must_use]
    pub fn is_ready(&self, now: Duration, key: &K) -> bool {
        match self.last.get(key) {
            Some(&last) => now.saturating_sub(last) >= self.interval,
            None => true,
        }
    }

    /// Run `factory` unless `key` ran less than an interval ago.
    ///
    /// Returns the factory's output, or `None` if the request was
    /// suppressed. Only executed requests restart the interval.
    pub fn safe_execute<T>(
        &mut self,
        now: Duration,
        key: K,
        factory: impl FnOnce() -> T,
    ) -> Option<T> {
        if !self.is_ready(now, &key) {
            self.stats.suppressed += 1;
            return None;
        }
        self.last.insert(key, now);
        self.stats.executed += 1;
        Some(factory())
    }

    /// Like [`safe_execute`](Self::safe_execute) for a factory that can fail.
    ///
    /// A failed run neither counts as executed nor restarts the interval, so
    /// the next request for `key` is not held back by it.
    pub fn try_safe_execute<T, E>(
        &mut self,
        now: Duration,
        key: K,
        factory: impl FnOnce() -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        if !self.is_ready(now, &key) {
            self.stats.suppressed += 1;
            return None;
        }
        let outcome = factory();
        if outcome.is_ok() {
            self.last.insert(key, now);
            self.stats.executed += 1;
        }
        Some(outcome)
    }

    /// Time of the last executed request for `key`
    #[must_use]
    pub fn last_executed(&self, key: &K) -> Option<Duration> {
        self.last.get(key).copied()
    }

    /// Forget every key's history
    pub fn reset(&mut self) {
        self.last.clear();
    }

    /// Debounce interval
    #[must_use]
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Request counters
    #[must_use]
    #[inline]
    pub fn stats(&self) -> SpamStats {
        self.stats
    }
}

impl<K> fmt::Debug for SpamProtection<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpamProtection")
            .field("interval", &self.interval)
            .field("tracked_keys", &self.last.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Debounced creation of short-lived, self-destroying effects.
#[derive(Debug)]
pub struct SpamProtectedInstantiator {
    protection: SpamProtection<AssetKey>,
    effect_lifetime: Duration,
}

impl SpamProtectedInstantiator {
    /// Create an instantiator
    #[must_use]
    pub fn new(interval: Duration, effect_lifetime: Duration) -> Self {
        Self {
            protection: SpamProtection::new(interval),
            effect_lifetime,
        }
    }

    /// Create an instantiator from loaded settings
    #[must_use]
    pub fn from_settings(settings: &SpamSettings) -> Self {
        Self::new(settings.interval(), settings.effect_lifetime())
    }

    /// Create an enabled instance of `key` at `position`.
    ///
    /// `rotation` of `None` keeps the template's rotation. The instance
    /// despawns itself after the effect lifetime. Returns `Ok(None)` when
    /// the request was suppressed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownAssetKey`] if `key` has no template
    pub fn instantiate(
        &mut self,
        scene: &mut Scene,
        key: &AssetKey,
        position: Vec3,
        rotation: Option<Quat>,
    ) -> Result<Option<Entity>, PoolError> {
        let now = scene.now();
        let Some(created) = self
            .protection
            .try_safe_execute(now, key.clone(), || scene.instantiate(key))
        else {
            log::debug!("Suppressed {key} spawn");
            scene.emit(PoolEvent::SpawnSuppressed { key: key.clone() });
            return Ok(None);
        };

        let entity = created?;
        scene.world.set_active(entity, true)?;
        scene.world.place(entity, position, rotation)?;

        // Unlike `Scene::destroy`, the effect stays live until it expires
        if !self.effect_lifetime.is_zero() {
            scene
                .scheduler
                .schedule_after(now, self.effect_lifetime, move |world: &mut World| {
                    let _ = world.despawn(entity);
                });
        }
        Ok(Some(entity))
    }

    /// Debounce interval
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.protection.interval()
    }

    /// Time an effect lives before despawning
    #[must_use]
    pub fn effect_lifetime(&self) -> Duration {
        self.effect_lifetime
    }

    /// Request counters
    #[must_use]
    pub fn stats(&self) -> SpamStats {
        self.protection.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Template;
    use crate::ecs::Transform;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_first_request_runs() {
        let mut gate = SpamProtection::new(ms(100));
        assert_eq!(gate.safe_execute(ms(0), "boom", || 7), Some(7));
        assert_eq!(gate.last_executed(&"boom"), Some(ms(0)));
    }

    #[test]
    fn test_debounce_window() {
        let mut gate = SpamProtection::new(ms(100));
        let mut runs = 0;

        assert!(gate.safe_execute(ms(0), "boom", || runs += 1).is_some());
        assert!(gate.safe_execute(ms(50), "boom", || runs += 1).is_none());
        assert!(gate.safe_execute(ms(99), "boom", || runs += 1).is_none());
        // Exactly one interval later is allowed
        assert!(gate.safe_execute(ms(100), "boom", || runs += 1).is_some());

        assert_eq!(runs, 2);
        assert_eq!(
            gate.stats(),
            SpamStats {
                executed: 2,
                suppressed: 2
            }
        );
    }

    #[test]
    fn test_suppression_does_not_extend_window() {
        let mut gate = SpamProtection::new(ms(100));
        gate.safe_execute(ms(0), "boom", || ());
        gate.safe_execute(ms(90), "boom", || ());

        assert_eq!(gate.last_executed(&"boom"), Some(ms(0)));
        assert!(gate.is_ready(ms(100), &"boom"));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut gate = SpamProtection::new(ms(100));
        assert!(gate.safe_execute(ms(0), "sparks", || ()).is_some());
        assert!(gate.safe_execute(ms(10), "smoke", || ()).is_some());
        assert!(gate.safe_execute(ms(20), "sparks", || ()).is_none());
    }

    #[test]
    fn test_failed_run_does_not_start_window() {
        let mut gate = SpamProtection::new(ms(100));

        let failed = gate.try_safe_execute(ms(0), "boom", || Err::<(), _>("no recipe"));
        assert_eq!(failed, Some(Err("no recipe")));
        assert_eq!(gate.last_executed(&"boom"), None);

        let retried = gate.try_safe_execute(ms(10), "boom", || Ok::<_, ()>(3));
        assert_eq!(retried, Some(Ok(3)));
        let spammed = gate.try_safe_execute(ms(20), "boom", || Ok::<_, ()>(4));
        assert_eq!(spammed, None);
        assert_eq!(
            gate.stats(),
            SpamStats {
                executed: 1,
                suppressed: 1
            }
        );
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut gate = SpamProtection::new(ms(100));
        gate.safe_execute(ms(0), "boom", || ());
        gate.reset();
        assert!(gate.safe_execute(ms(1), "boom", || ()).is_some());
    }

    #[test]
    fn test_zero_interval_never_suppresses() {
        let mut gate = SpamProtection::new(Duration::ZERO);
        for _ in 0..3 {
            assert!(gate.safe_execute(ms(5), "boom", || ()).is_some());
        }
    }

    fn sparks_scene() -> (Scene, AssetKey) {
        let mut scene = Scene::new();
        let key = AssetKey::new("sparks");
        scene.templates.register(
            key.clone(),
            Template::new("Sparks", |builder| {
                builder.add(Transform::from_position_rotation(
                    Vec3::ZERO,
                    Quat::from_rotation_y(1.0),
                ));
            }),
        );
        (scene, key)
    }

    #[test]
    fn test_instantiate_places_and_expires() {
        let (mut scene, key) = sparks_scene();
        let mut sparks = SpamProtectedInstantiator::new(ms(100), ms(500));

        let effect = sparks
            .instantiate(&mut scene, &key, Vec3::new(1.0, 2.0, 3.0), None)
            .unwrap()
            .unwrap();

        assert!(scene.world.is_alive(effect));
        assert!(scene.world.is_active(effect));
        {
            let transform = scene.world.get::<Transform>(effect).unwrap();
            assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
            assert_eq!(transform.rotation, Quat::from_rotation_y(1.0));
        }

        scene.tick(ms(400));
        assert!(scene.world.is_alive(effect));
        scene.tick(ms(100));
        assert!(!scene.world.contains(effect));
    }

    #[test]
    fn test_instantiate_suppressed() {
        let (mut scene, key) = sparks_scene();
        let mut sparks = SpamProtectedInstantiator::new(ms(100), ms(500));

        assert!(
            sparks
                .instantiate(&mut scene, &key, Vec3::ZERO, None)
                .unwrap()
                .is_some()
        );
        scene.tick(ms(50));
        assert_eq!(
            sparks.instantiate(&mut scene, &key, Vec3::ZERO, Some(Quat::IDENTITY)),
            Ok(None)
        );
        assert_eq!(scene.world.len(), 1);

        scene.tick(ms(50));
        assert!(
            scene
                .events
                .iter()
                .any(|event| matches!(event, PoolEvent::SpawnSuppressed { .. }))
        );
        assert!(
            sparks
                .instantiate(&mut scene, &key, Vec3::ZERO, None)
                .unwrap()
                .is_some()
        );
        assert_eq!(sparks.stats().suppressed, 1);
    }

    #[test]
    fn test_instantiate_unknown_key() {
        let mut scene = Scene::new();
        let mut sparks = SpamProtectedInstantiator::from_settings(&SpamSettings::default());
        let key = AssetKey::new("missing");

        assert_eq!(
            sparks.instantiate(&mut scene, &key, Vec3::ZERO, None),
            Err(PoolError::UnknownAssetKey(key))
        );
    }

    #[test]
    fn test_retry_after_unknown_key() {
        let mut scene = Scene::new();
        let mut sparks = SpamProtectedInstantiator::new(ms(100), ms(500));
        let key = AssetKey::new("sparks");

        assert!(sparks.instantiate(&mut scene, &key, Vec3::ZERO, None).is_err());

        scene.templates.register(key.clone(), Template::empty("Sparks"));
        scene.tick(ms(10));
        let effect = sparks
            .instantiate(&mut scene, &key, Vec3::ZERO, None)
            .unwrap();

        assert!(effect.is_some());
        assert_eq!(
            sparks.stats(),
            SpamStats {
                executed: 1,
                suppressed: 0
            }
        );
    }
}
