//! Pool error taxonomy

use hecs::Entity;
use thiserror::Error;

use crate::assets::AssetKey;

/// Errors raised by pools.
///
/// All of these indicate a setup or bookkeeping mistake. Running out of free
/// instances is not an error: it triggers recycling instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Zero capacity, or no creation recipe to build from
    #[error("invalid pool configuration: {reason}")]
    InvalidConfiguration {
        /// What is wrong with the configuration
        reason: String,
    },

    /// Spawn requested for a key with no registered template
    #[error("no template registered for asset key '{0}'")]
    UnknownAssetKey(AssetKey),

    /// The pool is full yet has nothing to hand out
    #[error("pool '{pool}' invariant violated: {detail}")]
    InternalInvariantViolation {
        /// Label of the offending pool
        pool: String,
        /// Description of the inconsistency
        detail: String,
    },

    /// The handle's instance has been destroyed or released by its pool
    #[error("stale handle {0:?}: instance was destroyed")]
    StaleHandle(Entity),
}

impl PoolError {
    /// Shorthand for [`PoolError::InvalidConfiguration`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PoolError::invalid("capacity must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid pool configuration: capacity must be at least 1"
        );

        let err = PoolError::UnknownAssetKey(AssetKey::new("grenade"));
        assert_eq!(err.to_string(), "no template registered for asset key 'grenade'");
    }
}
