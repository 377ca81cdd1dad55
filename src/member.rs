// src/member.rs
//! Per-renderer participant in a property group.
//!
//! An [`InstancedMaterial`] belongs to exactly one group at a time. Its own
//! definition list is a record of initial values and a mirror of what it last
//! wrote; the group's store in the registry holds the values that are applied.

use std::sync::Arc;

use glam::Vec4;
use parking_lot::RwLockWriteGuard;

use crate::config::InstanceConfig;
use crate::error::{InstanceError, Result};
use crate::property::{Color, PropertyDefinition, PropertyKind, PropertyValue, TextureHandle};
use crate::registry::{GroupKey, GroupRegistry, MemberHandle, SharedRegistry};
use crate::store::PropertyStore;
use crate::sync::{self, SyncReport};
use crate::target::{MaterialSource, RenderTarget};

pub struct InstancedMaterial {
    registry: SharedRegistry,
    handle: MemberHandle,
    key: GroupKey,
    definitions: Vec<PropertyDefinition>,
    initialize_from_material: bool,
    target: Option<Arc<dyn RenderTarget>>,
    registered: bool,
    seeded: bool,
}

impl InstancedMaterial {
    /// Create an inactive member. Call [`on_activated`](Self::on_activated)
    /// once the hosting object is enabled.
    pub fn new(
        registry: SharedRegistry,
        config: InstanceConfig,
        target: Option<Arc<dyn RenderTarget>>,
    ) -> Self {
        let handle = registry.write().attach(target.as_ref());

        let mut definitions: Vec<PropertyDefinition> = Vec::with_capacity(config.properties.len());
        for def in config.properties {
            if definitions.iter().any(|d| d.matches(&def.name, def.kind())) {
                log::warn!("Ignoring duplicate property '{}' ({:?})", def.name, def.kind());
                continue;
            }
            definitions.push(def);
        }

        Self {
            registry,
            handle,
            key: config.group_key,
            definitions,
            initialize_from_material: config.initialize_from_material,
            target,
            registered: false,
            seeded: false,
        }
    }

    // ---------- Lifecycle ----------

    /// Hosting object became enabled.
    pub fn on_activated(&mut self) {
        self.initialize();
    }

    /// Hosting object became disabled. Leaves the group, which is torn down
    /// if this was its last member. The next activation seeds again.
    pub fn on_deactivated(&mut self) {
        self.seeded = false;
        if !self.registered {
            return;
        }
        if let Err(e) = self
            .registry
            .write()
            .unregister_member(self.key.as_str(), self.handle)
        {
            log::warn!("Failed to leave group '{}': {}", self.key, e);
        }
        self.registered = false;
    }

    /// Join the group (creating its store if absent), seed the store from
    /// the material if configured, and apply.
    ///
    /// Seeding runs once per activation. A seeded value overwrites whatever
    /// the group already held under that name, and the whole group is
    /// re-synced so existing members pick it up.
    pub fn initialize(&mut self) {
        let mut seeded_any = false;
        {
            let mut reg = self.registry.write();
            if let Err(e) = reg.register_member(self.key.as_str(), self.handle) {
                log::warn!("Failed to join group '{}': {}", self.key, e);
                return;
            }
            self.registered = true;

            if self.initialize_from_material && !self.seeded {
                match self.target.as_ref().and_then(|t| t.shared_material()) {
                    Some(material) => {
                        let store = reg.get_or_create_store(self.key.as_str());
                        for def in &mut self.definitions {
                            seeded_any |= seed_definition(store, material.as_ref(), def);
                        }
                        self.seeded = true;
                    }
                    None => log::debug!(
                        "No source material to seed group '{}' from",
                        self.key
                    ),
                }
            }
        }

        if seeded_any {
            self.apply_to_group();
        } else {
            self.apply_to_render_target();
        }
    }

    // ---------- Apply ----------

    /// Push the group's current values to this member's renderer only.
    /// Silently does nothing without a renderer or a store.
    pub fn apply_to_render_target(&self) {
        let Some(target) = self.target.as_ref() else {
            log::debug!("{}", InstanceError::MissingCollaborator("render target"));
            return;
        };
        let reg = self.registry.read();
        if !sync::apply_to_target(&reg, self.key.as_str(), target.as_ref()) {
            log::debug!("No store for group '{}' yet", self.key);
        }
    }

    /// Push the group's current values to every active member, e.g. to flush
    /// writes made with `apply_immediately = false`.
    pub fn apply_to_group(&self) -> SyncReport {
        self.registry.read().apply_to_group(self.key.as_str())
    }

    // ---------- Setters ----------

    pub fn set_float(&mut self, name: &str, value: f32, apply_immediately: bool) -> Result<()> {
        self.set_property(name, PropertyValue::Float(value), apply_immediately)
    }

    pub fn set_color(&mut self, name: &str, value: Color, apply_immediately: bool) -> Result<()> {
        self.set_property(name, PropertyValue::Color(value), apply_immediately)
    }

    pub fn set_vector(&mut self, name: &str, value: Vec4, apply_immediately: bool) -> Result<()> {
        self.set_property(name, PropertyValue::Vector4(value), apply_immediately)
    }

    pub fn set_int(&mut self, name: &str, value: i32, apply_immediately: bool) -> Result<()> {
        self.set_property(name, PropertyValue::Integer(value), apply_immediately)
    }

    pub fn set_texture(
        &mut self,
        name: &str,
        value: TextureHandle,
        apply_immediately: bool,
    ) -> Result<()> {
        self.set_property(name, PropertyValue::Texture(value), apply_immediately)
    }

    /// Write `value` into the group's shared store and mirror it into the
    /// matching definition. With `apply_immediately`, every active member of
    /// the group is re-synced before this returns.
    ///
    /// An inactive member can only write into a group that other members
    /// keep alive; otherwise this fails with `NotFound` and changes nothing.
    pub fn set_property(
        &mut self,
        name: &str,
        value: PropertyValue,
        apply_immediately: bool,
    ) -> Result<()> {
        let mut reg = self.registry.write();
        writable_store(&mut reg, &self.key, self.handle, &mut self.registered)?
            .set(name, value)
            .map_err(|e| e.context(format!("setting '{}' on group '{}'", name, self.key)))?;

        if let Some(def) = self
            .definitions
            .iter_mut()
            .find(|d| d.matches(name, value.kind()))
        {
            def.value = value;
        }

        if apply_immediately {
            let reg = RwLockWriteGuard::downgrade(reg);
            reg.apply_to_group(self.key.as_str());
        }
        Ok(())
    }

    // ---------- Group key ----------

    /// Move to another group. Leaving may tear the old group down; the new
    /// group is created if absent and its values are applied right away.
    /// An inactive member only records the new key.
    pub fn change_group_key(&mut self, new_key: impl Into<GroupKey>) {
        let new_key = new_key.into();
        if new_key == self.key {
            return;
        }

        let old_key = std::mem::replace(&mut self.key, new_key);
        if !self.registered {
            return;
        }

        {
            let mut reg = self.registry.write();
            if let Err(e) = reg.unregister_member(old_key.as_str(), self.handle) {
                log::warn!("Failed to leave group '{}': {}", old_key, e);
            }
            if let Err(e) = reg.register_member(self.key.as_str(), self.handle) {
                log::warn!("Failed to join group '{}': {}", self.key, e);
                self.registered = false;
            }
        }
        log::debug!("Member {:?} moved '{}' -> '{}'", self.handle, old_key, self.key);
        self.apply_to_render_target();
    }

    // ---------- Definitions ----------

    /// Start controlling `(name, kind)`. Adding a pair twice is a no-op.
    ///
    /// With seeding enabled and the material exposing `name`, the material's
    /// value goes into both the shared store and the new definition, and the
    /// group is re-synced. An inactive member whose group does not exist
    /// seeds only the definition.
    pub fn add_controlled_property(&mut self, name: &str, kind: PropertyKind) -> Result<()> {
        if name.is_empty() {
            return Err(InstanceError::invalid("property name must not be empty"));
        }
        if self.definitions.iter().any(|d| d.matches(name, kind)) {
            return Ok(());
        }
        self.definitions.push(PropertyDefinition::new(name, kind));

        if !self.initialize_from_material {
            return Ok(());
        }
        let Some(material) = self.target.as_ref().and_then(|t| t.shared_material()) else {
            return Ok(());
        };

        let seeded = {
            let mut reg = self.registry.write();
            let store =
                writable_store(&mut reg, &self.key, self.handle, &mut self.registered).ok();
            match (store, self.definitions.last_mut()) {
                (Some(store), Some(def)) => seed_definition(store, material.as_ref(), def),
                (None, Some(def)) => {
                    if let Some(value) = material.read(&def.name, def.kind()) {
                        def.value = value;
                    }
                    false
                }
                (_, None) => false,
            }
        };
        if seeded {
            self.apply_to_group();
        }
        Ok(())
    }

    pub fn definitions(&self) -> &[PropertyDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str, kind: PropertyKind) -> Option<&PropertyDefinition> {
        self.definitions.iter().find(|d| d.matches(name, kind))
    }

    /// Current shared value for `name` in this member's group.
    pub fn property(&self, name: &str, kind: PropertyKind) -> Result<PropertyValue> {
        self.registry
            .read()
            .store(self.key.as_str())
            .ok_or_else(|| InstanceError::NotFound(name.to_string()))?
            .get(name, kind)
    }

    // ---------- Accessors ----------

    pub fn group_key(&self) -> &GroupKey {
        &self.key
    }

    pub fn handle(&self) -> MemberHandle {
        self.handle
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn initialize_from_material(&self) -> bool {
        self.initialize_from_material
    }

    pub fn render_target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.target.as_ref()
    }
}

impl Drop for InstancedMaterial {
    fn drop(&mut self) {
        if let Err(e) = self.registry.write().detach(self.handle) {
            log::debug!("Member {:?} already released: {}", self.handle, e);
        }
    }
}

/// Store a member may write into. A registered member rejoins if the registry
/// was cleared under it; an inactive one never creates a group.
fn writable_store<'r>(
    reg: &'r mut GroupRegistry,
    key: &GroupKey,
    handle: MemberHandle,
    registered: &mut bool,
) -> Result<&'r mut PropertyStore> {
    if *registered && reg.key_of(handle) != Some(key) {
        if let Err(e) = reg.register_member(key.as_str(), handle) {
            *registered = false;
            return Err(e.context(format!("rejoining group '{}'", key)));
        }
    }
    reg.store_mut(key.as_str())
        .ok_or_else(|| InstanceError::NotFound(format!("group '{}'", key)))
}

/// Copy the material's value for `def` into the store and the definition.
/// Properties the material does not expose are skipped.
fn seed_definition(
    store: &mut PropertyStore,
    material: &dyn MaterialSource,
    def: &mut PropertyDefinition,
) -> bool {
    let Some(value) = material.read(&def.name, def.kind()) else {
        log::debug!("Material has no '{}', not seeding", def.name);
        return false;
    };
    match store.set(&def.name, value) {
        Ok(()) => {
            def.value = value;
            true
        }
        Err(e) => {
            log::warn!("Skipping seed of '{}': {}", def.name, e);
            false
        }
    }
}
