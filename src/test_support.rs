// src/test_support.rs
//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec4;
use parking_lot::Mutex;

use crate::property::{Color, PropertyValue, TextureHandle};
use crate::store::Snapshot;
use crate::target::{MaterialSource, RenderTarget};

/// Material backed by a plain map.
#[derive(Default)]
pub(crate) struct TestMaterial {
    values: HashMap<String, PropertyValue>,
}

impl TestMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }
}

impl MaterialSource for TestMaterial {
    fn has_property(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get_float(&self, name: &str) -> f32 {
        self.value(name).and_then(PropertyValue::as_float).unwrap_or_default()
    }

    fn get_color(&self, name: &str) -> Color {
        self.value(name).and_then(PropertyValue::as_color).unwrap_or_default()
    }

    fn get_vector(&self, name: &str) -> Vec4 {
        self.value(name).and_then(PropertyValue::as_vector).unwrap_or_default()
    }

    fn get_int(&self, name: &str) -> i32 {
        self.value(name).and_then(PropertyValue::as_int).unwrap_or_default()
    }

    fn get_texture(&self, name: &str) -> TextureHandle {
        self.value(name).and_then(PropertyValue::as_texture).unwrap_or_default()
    }
}

/// Render target that records every block applied to it.
pub(crate) struct RecordingTarget {
    active: AtomicBool,
    applied: Mutex<Vec<Snapshot>>,
    material: Option<Arc<dyn MaterialSource>>,
}

impl RecordingTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(true),
            applied: Mutex::new(Vec::new()),
            material: None,
        })
    }

    pub fn with_material(material: TestMaterial) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(true),
            applied: Mutex::new(Vec::new()),
            material: Some(Arc::new(material)),
        })
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().len()
    }

    pub fn last(&self) -> Option<Snapshot> {
        self.applied.lock().last().cloned()
    }

    pub fn last_float(&self, name: &str) -> Option<f32> {
        self.last()?.get(name)?.as_float()
    }
}

impl RenderTarget for RecordingTarget {
    fn is_active_and_enabled(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn apply_property_block(&self, block: &Snapshot) {
        self.applied.lock().push(block.clone());
    }

    fn shared_material(&self) -> Option<Arc<dyn MaterialSource>> {
        self.material.clone()
    }
}
