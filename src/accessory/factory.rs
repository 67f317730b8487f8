// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory construction.

use std::sync::Arc;

use super::{Accessory, TemperatureSensor};
use crate::error::AccessoryError;
use crate::item::{Item, ItemStates, Metadata};
use crate::subscription::SubscriptionRegistry;

/// Builds accessories for newly seen items.
///
/// The registry calls the factory while holding its write lock, so
/// implementations must not call back into the registry.
///
/// Any `Fn(&Item, Option<&Metadata>) -> Result<Box<dyn Accessory>, AccessoryError>`
/// closure is a factory.
pub trait AccessoryFactory: Send + Sync {
    /// Creates the accessory for `item`.
    ///
    /// # Errors
    ///
    /// Returns an [`AccessoryError`] when the item cannot be exposed.
    fn create(
        &self,
        item: &Item,
        metadata: Option<&Metadata>,
    ) -> Result<Box<dyn Accessory>, AccessoryError>;
}

impl<F> AccessoryFactory for F
where
    F: Fn(&Item, Option<&Metadata>) -> Result<Box<dyn Accessory>, AccessoryError> + Send + Sync,
{
    fn create(
        &self,
        item: &Item,
        metadata: Option<&Metadata>,
    ) -> Result<Box<dyn Accessory>, AccessoryError> {
        self(item, metadata)
    }
}

/// Factory for the built-in accessory kinds, selected by metadata value.
#[derive(Debug, Clone)]
pub struct DefaultAccessoryFactory {
    subscriptions: Arc<SubscriptionRegistry>,
    states: Arc<ItemStates>,
}

impl DefaultAccessoryFactory {
    /// Creates a factory whose accessories share the given registry and
    /// state map.
    #[must_use]
    pub fn new(subscriptions: Arc<SubscriptionRegistry>, states: Arc<ItemStates>) -> Self {
        Self {
            subscriptions,
            states,
        }
    }
}

impl AccessoryFactory for DefaultAccessoryFactory {
    fn create(
        &self,
        item: &Item,
        metadata: Option<&Metadata>,
    ) -> Result<Box<dyn Accessory>, AccessoryError> {
        let metadata =
            metadata.ok_or_else(|| AccessoryError::MissingMetadata(item.name().to_string()))?;

        match metadata.value() {
            TemperatureSensor::KIND => Ok(Box::new(TemperatureSensor::new(
                item,
                metadata.clone(),
                Arc::clone(&self.subscriptions),
                Arc::clone(&self.states),
            ))),
            other => Err(AccessoryError::UnsupportedKind {
                item: item.name().to_string(),
                kind: other.to_string(),
            }),
        }
    }
}
