// src/lib.rs
//! Grouped shader-property overrides.
//!
//! Many renderers share one base material while each *group* of them carries
//! its own small set of overrides. A [`GroupRegistry`] maps group keys to a
//! shared [`PropertyStore`] plus the members of that group; every write made
//! through an [`InstancedMaterial`] lands in the shared store and is pushed
//! to all active members of the group, without copying the material.
//!
//! ```no_run
//! use std::sync::Arc;
//! use slop_instancing::{GroupRegistry, InstanceConfig, InstancedMaterial, RenderTarget};
//!
//! # fn renderer() -> Arc<dyn RenderTarget> { unimplemented!() }
//! let registry = GroupRegistry::shared();
//! let mut a = InstancedMaterial::new(registry.clone(), InstanceConfig::new("fx"), Some(renderer()));
//! let mut b = InstancedMaterial::new(registry.clone(), InstanceConfig::new("fx"), Some(renderer()));
//! a.on_activated();
//! b.on_activated();
//! a.set_float("_FillAmount", 0.25, true)?; // b's renderer sees 0.25 too
//! # Ok::<(), slop_instancing::InstanceError>(())
//! ```

pub mod config;
pub mod error;
pub mod member;
pub mod property;
pub mod registry;
pub mod store;
pub mod sync;
pub mod target;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::InstanceConfig;
pub use error::{InstanceError, Result};
pub use member::InstancedMaterial;
pub use property::{Color, NamedProperty, PropertyDefinition, PropertyKind, PropertyValue, TextureHandle};
pub use registry::{GroupKey, GroupRegistry, MemberHandle, SharedRegistry};
pub use store::{PropertyStore, Snapshot};
pub use sync::SyncReport;
pub use target::{MaterialSource, RenderTarget};
