// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Keyed registry of live accessories.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Accessory, AccessoryFactory, EntryId};
use crate::error::AccessoryError;
use crate::item::{Item, ItemStates, Metadata};

/// Outcome of registering an item with the [`AccessoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new top-level accessory was constructed.
    Created(EntryId),
    /// The item was folded into the named parent accessory.
    FoldedInto(String),
    /// The key already existed; its metadata was forwarded.
    Updated,
    /// The item is already a child of the named parent.
    AlreadyChild(String),
    /// Creation was requested for a key that is already live.
    Conflict,
    /// The factory refused the item; nothing was registered.
    Rejected(AccessoryError),
}

struct Entry {
    id: EntryId,
    accessory: Box<dyn Accessory>,
    metadata: Option<Metadata>,
    children: Vec<String>,
}

impl Entry {
    fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|child| child == name)
    }
}

/// Registry of accessories keyed by item name.
///
/// The registry exclusively owns its accessories. Items that list an
/// existing accessory's key among their groups are folded into that
/// accessory as children instead of getting an entry of their own; the first
/// matching group in declared order wins.
///
/// A registry built [`with_states`](Self::with_states) carries each item's
/// last-known state along when the item is renamed.
///
/// All operations are internally synchronized. Accessory teardown
/// ([`Accessory::removed`]) runs after the entry has left the map and the
/// lock has been released.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use item_bridge::accessory::{AccessoryRegistry, DefaultAccessoryFactory, Registration};
/// use item_bridge::item::{Item, ItemStates, Metadata};
/// use item_bridge::subscription::SubscriptionRegistry;
///
/// let registry = AccessoryRegistry::new(DefaultAccessoryFactory::new(
///     Arc::new(SubscriptionRegistry::new()),
///     Arc::new(ItemStates::new()),
/// ));
///
/// let meta = Metadata::new("TemperatureSensor");
/// registry.add_or_update(&Item::new("climate"), Some(&meta));
///
/// let battery = Item::new("climate_battery").with_groups(["climate"]);
/// let outcome = registry.add_or_update(&battery, None);
///
/// assert_eq!(outcome, Registration::FoldedInto("climate".to_string()));
/// assert_eq!(registry.len(), 1);
/// ```
pub struct AccessoryRegistry {
    factory: Box<dyn AccessoryFactory>,
    entries: RwLock<HashMap<String, Entry>>,
    states: Option<Arc<ItemStates>>,
}

impl AccessoryRegistry {
    /// Creates an empty registry that builds accessories with `factory`.
    #[must_use]
    pub fn new(factory: impl AccessoryFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            entries: RwLock::new(HashMap::new()),
            states: None,
        }
    }

    /// Keeps `states` in step with renames.
    #[must_use]
    pub fn with_states(mut self, states: Arc<ItemStates>) -> Self {
        self.states = Some(states);
        self
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers `item`, or forwards new metadata if it is already known.
    ///
    /// Unknown items join the first existing accessory named in their group
    /// list; otherwise the factory builds a new accessory. A factory error is
    /// logged and leaves the registry unchanged.
    pub fn add_or_update(&self, item: &Item, metadata: Option<&Metadata>) -> Registration {
        let mut entries = self.entries.write();
        let name = item.name();

        if let Some(entry) = entries.get_mut(name) {
            if let Some(new) = metadata {
                entry.accessory.metadata_updated(entry.metadata.as_ref(), new);
                entry.metadata = Some(new.clone());
            }
            tracing::debug!(item = %name, "Updated accessory metadata");
            return Registration::Updated;
        }

        if let Some((parent, _)) = entries.iter().find(|(_, entry)| entry.has_child(name)) {
            return Registration::AlreadyChild(parent.clone());
        }

        let parent = item
            .group_names()
            .iter()
            .find(|group| entries.contains_key(group.as_str()))
            .cloned();

        if let Some(parent) = parent {
            if let Some(entry) = entries.get_mut(&parent) {
                entry.accessory.add_child_item(item, metadata);
                entry.children.push(name.to_string());
            }
            tracing::debug!(item = %name, parent = %parent, "Folded item into accessory");
            return Registration::FoldedInto(parent);
        }

        Self::create_locked(self.factory.as_ref(), &mut entries, item, metadata)
    }

    /// Registers `item` as a new top-level accessory.
    ///
    /// An already live key is left untouched and reported as
    /// [`Registration::Conflict`].
    pub fn add(&self, item: &Item, metadata: Option<&Metadata>) -> Registration {
        let mut entries = self.entries.write();
        let name = item.name();

        if entries.contains_key(name) || entries.values().any(|entry| entry.has_child(name)) {
            tracing::warn!(item = %name, "Accessory already registered, keeping the live entry");
            return Registration::Conflict;
        }

        Self::create_locked(self.factory.as_ref(), &mut entries, item, metadata)
    }

    fn create_locked(
        factory: &dyn AccessoryFactory,
        entries: &mut HashMap<String, Entry>,
        item: &Item,
        metadata: Option<&Metadata>,
    ) -> Registration {
        match factory.create(item, metadata) {
            Ok(accessory) => {
                let id = EntryId::new();
                entries.insert(
                    item.name().to_string(),
                    Entry {
                        id,
                        accessory,
                        metadata: metadata.cloned(),
                        children: Vec::new(),
                    },
                );
                tracing::debug!(item = %item.name(), entry = ?id, "Created accessory");
                Registration::Created(id)
            }
            Err(e) => {
                tracing::warn!(item = %item.name(), error = %e, "Could not create accessory");
                Registration::Rejected(e)
            }
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Forwards changed metadata to the accessory registered under `name`.
    ///
    /// Returns `false` if no top-level accessory has that key.
    pub fn metadata_updated(&self, name: &str, old: Option<&Metadata>, new: &Metadata) -> bool {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(name) else {
            return false;
        };

        entry.accessory.metadata_updated(old, new);
        entry.metadata = Some(new.clone());
        true
    }

    /// Forwards a changed item definition.
    ///
    /// A changed name relocates the entry first. Child items are forwarded to
    /// their parent accessory. Returns `false` if the item is unknown or the
    /// rename was refused.
    pub fn item_updated(&self, old: &Item, new: &Item) -> bool {
        if old.name() != new.name() && !self.rename(old.name(), new.name()) {
            return false;
        }

        let mut entries = self.entries.write();
        let name = new.name();

        if let Some(entry) = entries.get_mut(name) {
            entry.accessory.item_updated(old, new);
            return true;
        }

        match entries.values_mut().find(|entry| entry.has_child(name)) {
            Some(parent) => {
                parent.accessory.item_updated(old, new);
                true
            }
            None => false,
        }
    }

    /// Moves the entry or child registered as `old_name` to `new_name`.
    ///
    /// The move happens under a single lock, so no reader observes both keys
    /// or neither. The item's last-known state moves with it. Returns `false`
    /// if `old_name` is unknown or `new_name` is already taken.
    pub fn rename(&self, old_name: &str, new_name: &str) -> bool {
        let mut entries = self.entries.write();

        if old_name == new_name {
            return entries.contains_key(old_name)
                || entries.values().any(|entry| entry.has_child(old_name));
        }

        if entries.contains_key(new_name) || entries.values().any(|entry| entry.has_child(new_name))
        {
            tracing::warn!(
                old = %old_name,
                new = %new_name,
                "Rename target already registered, keeping the old key"
            );
            return false;
        }

        if let Some(entry) = entries.remove(old_name) {
            entries.insert(new_name.to_string(), entry);
            self.move_state(old_name, new_name);
            tracing::debug!(old = %old_name, new = %new_name, "Renamed accessory");
            return true;
        }

        let child = entries
            .values_mut()
            .find_map(|entry| entry.children.iter_mut().find(|child| child.as_str() == old_name));
        match child {
            Some(child) => {
                *child = new_name.to_string();
                self.move_state(old_name, new_name);
                tracing::debug!(old = %old_name, new = %new_name, "Renamed child item");
                true
            }
            None => false,
        }
    }

    fn move_state(&self, old_name: &str, new_name: &str) {
        if let Some(states) = &self.states {
            states.rename(old_name, new_name);
        }
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Removes the top-level accessory under `key` and tears it down.
    ///
    /// Returns `true` if an accessory was removed. A child key is only
    /// detached from its parent and returns `false`; unknown keys are a
    /// no-op.
    pub fn remove(&self, key: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            match entries.remove(key) {
                Some(entry) => entry,
                None => {
                    if let Some(parent) = entries.values_mut().find(|entry| entry.has_child(key)) {
                        parent.children.retain(|child| child != key);
                        tracing::debug!(item = %key, "Detached child item");
                    }
                    return false;
                }
            }
        };

        Self::tear_down(key, removed);
        true
    }

    /// Removes and tears down every accessory.
    pub fn clear(&self) {
        let drained: Vec<(String, Entry)> = self.entries.write().drain().collect();
        for (key, entry) in drained {
            Self::tear_down(&key, entry);
        }
    }

    fn tear_down(key: &str, mut entry: Entry) {
        entry.accessory.removed();
        tracing::debug!(item = %key, entry = ?entry.id, "Removed accessory");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns `true` if a top-level accessory is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Returns the number of top-level accessories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no accessory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the keys of all top-level accessories.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns the identity of the entry under `key`.
    #[must_use]
    pub fn entry_id(&self, key: &str) -> Option<EntryId> {
        self.entries.read().get(key).map(|entry| entry.id)
    }

    /// Returns the child items folded into the accessory under `key`, in the
    /// order they joined.
    #[must_use]
    pub fn children_of(&self, key: &str) -> Vec<String> {
        self.entries
            .read()
            .get(key)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    /// Returns the key of the accessory that `child` was folded into.
    #[must_use]
    pub fn parent_of(&self, child: &str) -> Option<String> {
        self.entries
            .read()
            .iter()
            .find(|(_, entry)| entry.has_child(child))
            .map(|(key, _)| key.clone())
    }

    /// Runs `f` against the accessory under `key`.
    ///
    /// `f` runs under the registry's read lock and must not call back into
    /// the registry.
    pub fn inspect<R>(&self, key: &str, f: impl FnOnce(&dyn Accessory) -> R) -> Option<R> {
        self.entries
            .read()
            .get(key)
            .map(|entry| f(entry.accessory.as_ref()))
    }

    /// Runs `f` against the accessory under `key` if it is a `T`.
    ///
    /// `f` runs under the registry's read lock and must not call back into
    /// the registry.
    pub fn inspect_as<T: Accessory, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let entries = self.entries.read();
        let accessory: &dyn Any = entries.get(key)?.accessory.as_ref();
        accessory.downcast_ref::<T>().map(f)
    }
}

impl std::fmt::Debug for AccessoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessoryRegistry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
