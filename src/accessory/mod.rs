// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessories and the registry that owns them.
//!
//! An accessory is the protocol-facing representation of one or more host
//! items. The [`AccessoryRegistry`] keeps them by item name, folds items into
//! a parent accessory when they declare membership in its group, follows
//! renames, and tears accessories down on removal.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use item_bridge::accessory::{AccessoryRegistry, DefaultAccessoryFactory, Registration};
//! use item_bridge::item::{Item, ItemStates, Metadata};
//! use item_bridge::subscription::SubscriptionRegistry;
//!
//! let subscriptions = Arc::new(SubscriptionRegistry::new());
//! let states = Arc::new(ItemStates::new());
//! let registry = AccessoryRegistry::new(DefaultAccessoryFactory::new(subscriptions, states));
//!
//! let outcome = registry.add_or_update(
//!     &Item::new("kitchen_temp"),
//!     Some(&Metadata::new("TemperatureSensor")),
//! );
//! assert!(matches!(outcome, Registration::Created(_)));
//! assert!(registry.contains("kitchen_temp"));
//! ```

mod entry_id;
mod factory;
mod registry;
mod temperature_sensor;

pub use entry_id::EntryId;
pub use factory::{AccessoryFactory, DefaultAccessoryFactory};
pub use registry::{AccessoryRegistry, Registration};
pub use temperature_sensor::TemperatureSensor;

use std::any::Any;

use crate::item::{Item, Metadata};

/// A protocol-facing accessory built from host items.
///
/// The registry calls these hooks while it owns the accessory. Only
/// [`removed`](Accessory::removed) is mandatory; it is called exactly once,
/// after the accessory has left the registry.
pub trait Accessory: Any + Send + Sync {
    /// Returns the display label.
    fn label(&self) -> &str;

    /// Folds another item into this accessory.
    fn add_child_item(&mut self, item: &Item, metadata: Option<&Metadata>) {
        let _ = (item, metadata);
    }

    /// Applies changed accessory metadata.
    fn metadata_updated(&mut self, old: Option<&Metadata>, new: &Metadata) {
        let _ = (old, new);
    }

    /// Applies a changed item definition, including a rename.
    fn item_updated(&mut self, old: &Item, new: &Item) {
        let _ = (old, new);
    }

    /// Tears the accessory down.
    fn removed(&mut self);
}
