// src/target.rs
//! Seams to the host rendering engine.
//!
//! The instancing core never touches GPU state. It reads authored values from
//! a [`MaterialSource`] once during seeding, and pushes finished snapshots to
//! a [`RenderTarget`] which the engine applies at its next draw.

use std::sync::Arc;

use glam::Vec4;

use crate::property::{Color, PropertyKind, PropertyValue, TextureHandle};
use crate::store::Snapshot;

/// Read-only view of a shared material asset.
pub trait MaterialSource: Send + Sync {
    fn has_property(&self, name: &str) -> bool;
    fn get_float(&self, name: &str) -> f32;
    fn get_color(&self, name: &str) -> Color;
    fn get_vector(&self, name: &str) -> Vec4;
    fn get_int(&self, name: &str) -> i32;
    fn get_texture(&self, name: &str) -> TextureHandle;

    /// Current value of `name` read as `kind`, or `None` if the material
    /// does not expose that property.
    fn read(&self, name: &str, kind: PropertyKind) -> Option<PropertyValue> {
        if !self.has_property(name) {
            return None;
        }
        Some(match kind {
            PropertyKind::Float => PropertyValue::Float(self.get_float(name)),
            PropertyKind::Color => PropertyValue::Color(self.get_color(name)),
            PropertyKind::Vector4 => PropertyValue::Vector4(self.get_vector(name)),
            PropertyKind::Integer => PropertyValue::Integer(self.get_int(name)),
            PropertyKind::Texture => PropertyValue::Texture(self.get_texture(name)),
        })
    }
}

/// A renderer that draws with a shared material plus per-draw overrides.
///
/// `apply_property_block` is called while the group registry is locked for
/// reading; implementations must not call back into the registry from it.
pub trait RenderTarget: Send + Sync {
    /// Whether the hosting object is active and its renderer enabled.
    fn is_active_and_enabled(&self) -> bool;

    /// Replace the renderer's override block with `block`. Must not modify
    /// the shared material asset.
    fn apply_property_block(&self, block: &Snapshot);

    /// Material used as the seed source, if one is assigned.
    fn shared_material(&self) -> Option<Arc<dyn MaterialSource>>;
}
