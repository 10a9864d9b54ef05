//! Template storage and lookup
//!
//! Templates are the creation recipes pools instantiate from. They are
//! registered under an [`AssetKey`] by asset loading before any spawn.

use std::fmt;
use std::sync::Arc;

use hecs::EntityBuilder;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::handle::AssetHandle;
use crate::ecs::{Active, Name, Transform, World};

/// Identity used to select a creation recipe and its ring-buffer queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(Arc<str>);

impl AssetKey {
    /// Create a key from a name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

type Recipe = dyn Fn(&mut EntityBuilder) + Send + Sync;

/// A creation recipe: the components a fresh instance starts with.
///
/// Every instance gets a [`Name`], a default [`Transform`] and an enabled
/// [`Active`] flag unless the recipe supplies its own.
pub struct Template {
    /// Display name given to instances
    name: String,
    /// Adds the template's components
    recipe: Arc<Recipe>,
}

impl Template {
    /// Create a template from a recipe closure
    pub fn new(
        name: impl Into<String>,
        recipe: impl Fn(&mut EntityBuilder) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            recipe: Arc::new(recipe),
        }
    }

    /// Create a template with only the default components
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, |_| {})
    }

    /// Template display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new scene instance from this template
    pub fn instantiate(&self, world: &mut World) -> hecs::Entity {
        let mut builder = EntityBuilder::new();
        builder.add(Name::new(self.name.clone()));
        builder.add(Transform::default());
        builder.add(Active(true));
        (self.recipe)(&mut builder);
        world.spawn(builder.build())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

/// Registry mapping asset keys to templates.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    /// Templates indexed by key
    templates: FxHashMap<AssetKey, AssetHandle<Template>>,
}

impl TemplateRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the template for `key` and return its handle
    pub fn register(
        &mut self,
        key: impl Into<AssetKey>,
        template: Template,
    ) -> AssetHandle<Template> {
        let key = key.into();
        let handle = AssetHandle::new(template);
        if self.templates.insert(key.clone(), handle.clone()).is_some() {
            log::debug!("Replaced template for {key}");
        }
        handle
    }

    /// Look up the template for `key`
    #[must_use]
    pub fn get(&self, key: &AssetKey) -> Option<AssetHandle<Template>> {
        self.templates.get(key).cloned()
    }

    /// Check if a key has a template
    #[must_use]
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.templates.contains_key(key)
    }

    /// Remove a template
    ///
    /// Returns true if the template was removed
    pub fn remove(&mut self, key: &AssetKey) -> bool {
        self.templates.remove(key).is_some()
    }

    /// Get the number of registered templates
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate over registered keys
    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.templates.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Velocity;
    use glam::Vec3;

    #[test]
    fn test_register_and_get() {
        let mut registry = TemplateRegistry::new();
        let handle = registry.register("soldier", Template::empty("Soldier"));

        let retrieved = registry.get(&AssetKey::new("soldier")).unwrap();
        assert_eq!(retrieved, handle);
        assert_eq!(retrieved.name(), "Soldier");
        assert!(registry.get(&AssetKey::new("tank")).is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TemplateRegistry::new();
        let first = registry.register("bullet", Template::empty("A"));
        let second = registry.register("bullet", Template::empty("B"));

        assert_ne!(first, second);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&AssetKey::new("bullet")).unwrap().name(), "B");
    }

    #[test]
    fn test_instantiate_adds_defaults() {
        let template = Template::new("Rock", |builder| {
            builder.add(Velocity {
                linear: Vec3::X,
                angular: Vec3::ZERO,
            });
        });
        let mut world = World::new();
        let entity = template.instantiate(&mut world);

        assert!(world.is_active(entity));
        assert_eq!(world.get::<Name>(entity).unwrap().0, "Rock");
        assert_eq!(world.get::<Velocity>(entity).unwrap().linear, Vec3::X);
        assert!(world.has::<Transform>(entity));
    }

    #[test]
    fn test_recipe_overrides_defaults() {
        let template = Template::new("Dormant", |builder| {
            builder.add(Active(false));
        });
        let mut world = World::new();
        let entity = template.instantiate(&mut world);

        assert!(!world.is_active(entity));
    }

    #[test]
    fn test_asset_key_serde() {
        let key = AssetKey::new("rifle_bullet");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"rifle_bullet\"");
        let back: AssetKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
