// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::DEFAULT_CHANNEL_CAPACITY;
use crate::item::{Item, Metadata};

/// Default bridge name used in logs.
pub const DEFAULT_BRIDGE_NAME: &str = "item-bridge";

/// An item to expose as soon as the bridge starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryConfig {
    /// The item definition.
    pub item: Item,
    /// Accessory metadata; items without metadata can only join a group.
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Configuration for a [`Bridge`](super::Bridge).
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
///
/// # Examples
///
/// ```
/// use item_bridge::bridge::BridgeConfig;
/// use item_bridge::item::{Item, Metadata};
///
/// let config = BridgeConfig::new()
///     .with_name("living-room")
///     .with_event_capacity(64)
///     .with_accessory(Item::new("living_temp"), Some(Metadata::new("TemperatureSensor")));
///
/// assert_eq!(config.name, "living-room");
///
/// let parsed = BridgeConfig::from_json(r#"{ "name": "attic" }"#).unwrap();
/// assert_eq!(parsed.event_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge name, used in logs.
    pub name: String,
    /// Capacity of the item event bus.
    pub event_capacity: usize,
    /// Items registered at start, in order.
    pub accessories: Vec<AccessoryConfig>,
}

impl BridgeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] when a value fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the bridge name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Adds an item to register at start.
    #[must_use]
    pub fn with_accessory(mut self, item: Item, metadata: Option<Metadata>) -> Self {
        self.accessories.push(AccessoryConfig { item, metadata });
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "name",
                message: "must not be empty".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(bad) = self
            .accessories
            .iter()
            .find(|a| a.item.name().trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "accessories",
                message: format!("item with label {:?} has an empty name", bad.item.label()),
            });
        }
        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_BRIDGE_NAME.to_string(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            accessories: Vec::new(),
        }
    }
}
