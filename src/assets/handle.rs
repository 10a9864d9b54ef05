//! Shared template handles
//!
//! A pool holds an [`AssetHandle`] to the template it builds from, so the
//! recipe outlives any later change to the registry.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Shared, immutable reference to a registered asset.
///
/// Two handles are equal when they point at the same registration, not when
/// the assets compare equal.
pub struct AssetHandle<T> {
    inner: Arc<T>,
}

impl<T> AssetHandle<T> {
    /// Wrap a freshly registered asset
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Get a reference to the underlying asset
    #[must_use]
    #[inline]
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Number of pools and registries sharing this asset
    #[must_use]
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for AssetHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for AssetHandle<T> {}

impl<T> Hash for AssetHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl<T> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&self.inner).finish()
    }
}
