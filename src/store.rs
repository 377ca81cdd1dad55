// src/store.rs
//! Shared per-group property overrides.
//!
//! A [`PropertyStore`] grows only through explicit `set` calls. Names keep
//! the order in which they were first written, so every [`Snapshot`] of the
//! same contents lists properties in the same order.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec4;

use crate::error::{InstanceError, Result};
use crate::property::{Color, NamedProperty, PropertyKind, PropertyValue, TextureHandle};

/// Mutable bag of named typed overrides for one group.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    entries: Vec<NamedProperty>,
    /// Name to index into `entries`
    index: HashMap<String, usize>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value for `name`.
    ///
    /// A name keeps the kind it was first written with; writing another kind
    /// fails with `TypeMismatch` and leaves the store untouched.
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        if name.is_empty() {
            return Err(InstanceError::invalid("property name must not be empty"));
        }

        if let Some(&i) = self.index.get(name) {
            let slot = &mut self.entries[i];
            if slot.kind() != value.kind() {
                return Err(InstanceError::TypeMismatch {
                    name: name.to_string(),
                    expected: slot.kind(),
                    got: value.kind(),
                });
            }
            slot.value = value;
        } else {
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push(NamedProperty::new(name, value));
        }
        log::trace!("store set {} = {}", name, value);
        Ok(())
    }

    /// Stored value for `name`, which must be of `kind`.
    pub fn get(&self, name: &str, kind: PropertyKind) -> Result<PropertyValue> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| InstanceError::NotFound(name.to_string()))?;
        if entry.kind() != kind {
            return Err(InstanceError::TypeMismatch {
                name: name.to_string(),
                expected: entry.kind(),
                got: kind,
            });
        }
        Ok(entry.value)
    }

    fn typed<T>(
        &self,
        name: &str,
        kind: PropertyKind,
        pick: fn(&PropertyValue) -> Option<T>,
    ) -> Result<T> {
        let value = self.get(name, kind)?;
        pick(&value).ok_or(InstanceError::TypeMismatch {
            name: name.to_string(),
            expected: value.kind(),
            got: kind,
        })
    }

    pub fn get_float(&self, name: &str) -> Result<f32> {
        self.typed(name, PropertyKind::Float, PropertyValue::as_float)
    }

    pub fn get_color(&self, name: &str) -> Result<Color> {
        self.typed(name, PropertyKind::Color, PropertyValue::as_color)
    }

    pub fn get_vector(&self, name: &str) -> Result<Vec4> {
        self.typed(name, PropertyKind::Vector4, PropertyValue::as_vector)
    }

    pub fn get_int(&self, name: &str) -> Result<i32> {
        self.typed(name, PropertyKind::Integer, PropertyValue::as_int)
    }

    pub fn get_texture(&self, name: &str) -> Result<TextureHandle> {
        self.typed(name, PropertyKind::Texture, PropertyValue::as_texture)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Drop the override for `name`, returning the previous value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let i = self.index.remove(name)?;
        let removed = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed.value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time copy for the apply step. Does not mutate the store.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: Arc::from(self.entries.as_slice()),
        }
    }
}

/// Immutable, ordered read of a [`PropertyStore`].
///
/// Clones share the same allocation, so one snapshot can be handed to every
/// member of a group during a sync pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Arc<[NamedProperty]>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedProperty> {
        self.entries.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[NamedProperty] {
        &self.entries
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.entries[..] == other.entries[..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins_per_name() {
        let mut store = PropertyStore::new();
        store.set("_FillAmount", 0.25f32).unwrap();
        store.set("_Tint", Color::RED).unwrap();
        store.set("_FillAmount", 0.75f32).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_float("_FillAmount").unwrap(), 0.75f32);
        assert_eq!(store.get_color("_Tint").unwrap(), Color::RED);
    }

    #[test]
    fn empty_name_is_rejected_without_mutation() {
        let mut store = PropertyStore::new();
        let err = store.set("", 1.0f32).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(store.is_empty());
    }

    #[test]
    fn missing_name_is_not_found() {
        let store = PropertyStore::new();
        assert!(store.get("_Nope", PropertyKind::Float).unwrap_err().is_not_found());
    }

    #[test]
    fn kind_collisions_are_type_mismatch() {
        let mut store = PropertyStore::new();
        store.set("_Mode", 2).unwrap();

        assert!(store.get_float("_Mode").unwrap_err().is_type_mismatch());
        assert!(store.set("_Mode", 2.0f32).unwrap_err().is_type_mismatch());
        assert_eq!(store.get_int("_Mode").unwrap(), 2);
    }

    #[test]
    fn snapshot_is_ordered_and_detached() {
        let mut store = PropertyStore::new();
        store.set("_B", 1.0f32).unwrap();
        store.set("_A", Vec4::ONE).unwrap();
        store.set("_C", TextureHandle(4)).unwrap();

        let snap = store.snapshot();
        let names: Vec<_> = snap.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["_B", "_A", "_C"]);

        store.set("_B", 9.0f32).unwrap();
        assert_eq!(snap.get("_B"), Some(&PropertyValue::Float(1.0)));
        assert_eq!(store.snapshot().get("_B"), Some(&PropertyValue::Float(9.0)));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut store = PropertyStore::new();
        store.set("_A", 1).unwrap();
        store.set("_B", 2).unwrap();
        store.set("_C", 3).unwrap();

        assert_eq!(store.remove("_A"), Some(PropertyValue::Integer(1)));
        assert_eq!(store.remove("_A"), None);
        assert_eq!(store.get_int("_C").unwrap(), 3);
        assert_eq!(store.names().collect::<Vec<_>>(), ["_B", "_C"]);

        store.set("_C", 4).unwrap();
        assert_eq!(store.get_int("_C").unwrap(), 4);
    }
}
