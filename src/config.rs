// src/config.rs
//! Authored member configuration.
//!
//! What an inspector would serialize for one member: which group it joins,
//! whether it seeds from its material, and the properties it controls.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{InstanceError, Result};
use crate::property::PropertyDefinition;
use crate::registry::GroupKey;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Group this member shares overrides with
    pub group_key: GroupKey,
    /// Seed the group's store from the renderer's material on first init
    pub initialize_from_material: bool,
    /// Properties this member controls, in authoring order
    pub properties: Vec<PropertyDefinition>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            group_key: GroupKey::default(),
            initialize_from_material: false,
            properties: Vec::new(),
        }
    }
}

impl InstanceConfig {
    pub fn new(group_key: impl Into<GroupKey>) -> Self {
        Self {
            group_key: group_key.into(),
            ..Self::default()
        }
    }

    pub fn with_initialize_from_material(mut self, enabled: bool) -> Self {
        self.initialize_from_material = enabled;
        self
    }

    pub fn with_property(mut self, definition: PropertyDefinition) -> Self {
        self.properties.push(definition);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| InstanceError::from(e).context("parsing instance config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| InstanceError::from(e).context("reading instance config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| InstanceError::from(e).context("writing instance config"))
    }

    /// Every property needs a name. Duplicate (name, kind) pairs are allowed
    /// here; members keep only the first.
    pub fn validate(&self) -> Result<()> {
        if let Some(i) = self.properties.iter().position(|p| p.name.is_empty()) {
            return Err(InstanceError::invalid(format!(
                "property #{i} in group '{}' has an empty name",
                self.group_key
            )));
        }
        Ok(())
    }
}
