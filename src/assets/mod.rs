//! Asset and template management
//!
//! Provides handle-based template storage with:
//! - Type-safe asset handles
//! - Key-based template lookup for pools

mod handle;
mod registry;

pub use handle::AssetHandle;
pub use registry::{AssetKey, Template, TemplateRegistry};
