// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host items, their accessory metadata, and last-known states.
//!
//! An [`Item`] is the host framework's description of an observable or
//! controllable entity. Its ordered group names decide which accessory it is
//! folded into. [`Metadata`] tells the bridge which accessory to build for
//! it, and [`ItemStates`] keeps the latest state so that change callbacks can
//! re-read the current value.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::Value;

/// A host item as seen by the bridge.
///
/// # Examples
///
/// ```
/// use item_bridge::item::Item;
///
/// let item = Item::new("kitchen_temp")
///     .with_label("Kitchen")
///     .with_groups(["kitchen_climate"]);
///
/// assert_eq!(item.name(), "kitchen_temp");
/// assert_eq!(item.group_names(), ["kitchen_climate"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    name: String,
    label: Option<String>,
    #[serde(default)]
    group_names: Vec<String>,
}

impl Item {
    /// Creates an item with no label and no groups.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            group_names: Vec::new(),
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the group names, in priority order.
    #[must_use]
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_names = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the label, falling back to the name.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Returns the group names in declared order.
    #[must_use]
    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }
}

/// Accessory metadata attached to an item.
///
/// `value` names the accessory kind (for example `TemperatureSensor`);
/// `configuration` carries free-form options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    value: String,
    #[serde(default)]
    configuration: BTreeMap<String, String>,
}

impl Metadata {
    /// Creates metadata with the given value and no configuration.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            configuration: BTreeMap::new(),
        }
    }

    /// Adds a configuration entry.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }

    /// Returns the metadata value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns a configuration entry.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&str> {
        self.configuration.get(key).map(String::as_str)
    }
}

/// Thread-safe map of the latest known state per item.
#[derive(Debug, Default)]
pub struct ItemStates {
    states: RwLock<HashMap<String, Value>>,
}

impl ItemStates {
    /// Creates an empty state map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state of an item, returning the previous one.
    pub fn update(&self, item_name: &str, state: Value) -> Option<Value> {
        self.states.write().insert(item_name.to_string(), state)
    }

    /// Returns the current state of an item.
    #[must_use]
    pub fn get(&self, item_name: &str) -> Option<Value> {
        self.states.read().get(item_name).cloned()
    }

    /// Forgets the state of an item.
    pub fn remove(&self, item_name: &str) -> Option<Value> {
        self.states.write().remove(item_name)
    }

    /// Moves the state recorded for `old_name` to `new_name`.
    ///
    /// Returns `true` if a state was moved.
    pub fn rename(&self, old_name: &str, new_name: &str) -> bool {
        let mut states = self.states.write();
        match states.remove(old_name) {
            Some(state) => {
                states.insert(new_name.to_string(), state);
                true
            }
            None => false,
        }
    }

    /// Returns the number of items with a known state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Returns `true` if no state is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}
