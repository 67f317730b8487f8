// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature sensor accessory.

use std::sync::Arc;

use parking_lot::Mutex;

use super::Accessory;
use crate::item::{Item, ItemStates, Metadata};
use crate::subscription::{ChangeCallback, SubscriptionId, SubscriptionRegistry};
use crate::types::ValueKind;

/// Accessory exposing one item as a current-temperature reading.
///
/// The sensor reads the temperature from [`ItemStates`] on demand and
/// forwards change notifications through the shared
/// [`SubscriptionRegistry`]. It holds at most one change callback.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use item_bridge::accessory::TemperatureSensor;
/// use item_bridge::item::{Item, ItemStates, Metadata};
/// use item_bridge::subscription::SubscriptionRegistry;
/// use item_bridge::types::Value;
///
/// let subscriptions = Arc::new(SubscriptionRegistry::new());
/// let states = Arc::new(ItemStates::new());
/// let sensor = TemperatureSensor::new(
///     &Item::new("kitchen_temp"),
///     Metadata::new("TemperatureSensor"),
///     Arc::clone(&subscriptions),
///     Arc::clone(&states),
/// );
///
/// assert_eq!(sensor.current_temperature(), None);
/// states.update("kitchen_temp", Value::Temperature(21.5));
/// assert_eq!(sensor.current_temperature(), Some(21.5));
/// ```
pub struct TemperatureSensor {
    item_name: String,
    label: String,
    metadata: Metadata,
    subscriptions: Arc<SubscriptionRegistry>,
    states: Arc<ItemStates>,
    listener: Mutex<Option<(SubscriptionId, ChangeCallback)>>,
}

impl TemperatureSensor {
    /// Metadata value that selects this accessory kind.
    pub const KIND: &'static str = "TemperatureSensor";

    /// Creates a sensor for `item`.
    #[must_use]
    pub fn new(
        item: &Item,
        metadata: Metadata,
        subscriptions: Arc<SubscriptionRegistry>,
        states: Arc<ItemStates>,
    ) -> Self {
        Self {
            item_name: item.name().to_string(),
            label: item.label().to_string(),
            metadata,
            subscriptions,
            states,
            listener: Mutex::new(None),
        }
    }

    /// Returns the name of the backing item.
    #[must_use]
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Returns the metadata the sensor was last configured with.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Returns the current temperature in degrees.
    ///
    /// `None` when the item has no known state or the state is not numeric.
    #[must_use]
    pub fn current_temperature(&self) -> Option<f64> {
        self.states
            .get(&self.item_name)
            .and_then(|state| state.as_decimal())
    }

    /// Registers `callback` for temperature changes, replacing any previous
    /// callback.
    pub fn subscribe_current_temperature(&self, callback: ChangeCallback) -> SubscriptionId {
        let mut listener = self.listener.lock();
        if let Some((previous, _)) = listener.take() {
            self.subscriptions.unsubscribe_id(previous);
        }

        let id = self.subscriptions.subscribe(
            self.item_name.clone(),
            ValueKind::Decimal,
            Arc::clone(&callback),
        );
        *listener = Some((id, callback));
        id
    }

    /// Drops the temperature change callback, if any.
    pub fn unsubscribe_current_temperature(&self) {
        if let Some((id, _)) = self.listener.lock().take() {
            self.subscriptions.unsubscribe_id(id);
        }
    }

    /// Returns `true` if a temperature change callback is registered.
    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl Accessory for TemperatureSensor {
    fn label(&self) -> &str {
        &self.label
    }

    fn metadata_updated(&mut self, _old: Option<&Metadata>, new: &Metadata) {
        self.metadata = new.clone();
    }

    fn item_updated(&mut self, old: &Item, new: &Item) {
        self.label = new.label().to_string();
        if old.name() == new.name() {
            return;
        }

        tracing::debug!(old = %old.name(), new = %new.name(), "Temperature sensor item renamed");
        self.item_name = new.name().to_string();

        // Move our own callback; other listeners on the old name stay put
        let listener = self.listener.get_mut();
        if let Some((id, callback)) = listener.take() {
            self.subscriptions.unsubscribe_id(id);
            let id = self.subscriptions.subscribe(
                self.item_name.clone(),
                ValueKind::Decimal,
                Arc::clone(&callback),
            );
            *listener = Some((id, callback));
        }
    }

    fn removed(&mut self) {
        tracing::debug!(item = %self.item_name, "Temperature sensor removed");
        self.unsubscribe_current_temperature();
    }
}

impl std::fmt::Debug for TemperatureSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemperatureSensor")
            .field("item_name", &self.item_name)
            .field("label", &self.label)
            .field("has_listener", &self.has_listener())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OnOff, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn build(item: &Item) -> (TemperatureSensor, Arc<SubscriptionRegistry>, Arc<ItemStates>) {
        let subscriptions = Arc::new(SubscriptionRegistry::new());
        let states = Arc::new(ItemStates::new());
        let sensor = TemperatureSensor::new(
            item,
            Metadata::new(TemperatureSensor::KIND),
            Arc::clone(&subscriptions),
            Arc::clone(&states),
        );
        (sensor, subscriptions, states)
    }

    fn counting_callback() -> (ChangeCallback, Arc<AtomicU32>) {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);
        let callback: ChangeCallback = Arc::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        (callback, counter)
    }

    #[test]
    fn label_falls_back_to_item_name() {
        let (sensor, _, _) = build(&Item::new("t"));
        assert_eq!(sensor.label(), "t");

        let (sensor, _, _) = build(&Item::new("t").with_label("Kitchen"));
        assert_eq!(sensor.label(), "Kitchen");
    }

    #[test]
    fn current_temperature_reads_numeric_states() {
        let (sensor, _, states) = build(&Item::new("t"));

        states.update("t", Value::Decimal(19.0));
        assert_eq!(sensor.current_temperature(), Some(19.0));

        states.update("t", Value::OnOff(OnOff::On));
        assert_eq!(sensor.current_temperature(), None);
    }

    #[test]
    fn subscribe_replaces_previous_callback() {
        let (sensor, subscriptions, _) = build(&Item::new("t"));
        let (first, first_count) = counting_callback();
        let (second, second_count) = counting_callback();

        sensor.subscribe_current_temperature(first);
        sensor.subscribe_current_temperature(second);
        assert_eq!(subscriptions.subscriptions_for("t"), 1);

        subscriptions.dispatch("t", &Value::Temperature(20.0));
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_leaves_other_listeners() {
        let (sensor, subscriptions, _) = build(&Item::new("t"));
        let (callback, _) = counting_callback();
        let (other, other_count) = counting_callback();

        subscriptions.subscribe("t", ValueKind::Decimal, other);
        sensor.subscribe_current_temperature(callback);
        sensor.unsubscribe_current_temperature();

        assert!(!sensor.has_listener());
        assert_eq!(subscriptions.subscriptions_for("t"), 1);
        subscriptions.dispatch("t", &Value::Decimal(1.0));
        assert_eq!(other_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rename_moves_own_callback() {
        let old = Item::new("old_temp");
        let (mut sensor, subscriptions, _) = build(&old);
        let (callback, count) = counting_callback();
        sensor.subscribe_current_temperature(callback);

        sensor.item_updated(&old, &Item::new("new_temp"));

        assert_eq!(sensor.item_name(), "new_temp");
        assert_eq!(subscriptions.subscriptions_for("old_temp"), 0);
        subscriptions.dispatch("new_temp", &Value::Temperature(20.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_drops_subscription() {
        let (mut sensor, subscriptions, _) = build(&Item::new("t"));
        let (callback, _) = counting_callback();
        sensor.subscribe_current_temperature(callback);

        sensor.removed();
        assert!(subscriptions.is_empty());
    }

    #[test]
    fn metadata_update_is_kept() {
        let (mut sensor, _, _) = build(&Item::new("t"));
        let new = Metadata::new(TemperatureSensor::KIND).with_config("unit", "F");

        sensor.metadata_updated(None, &new);
        assert_eq!(sensor.metadata().config("unit"), Some("F"));
    }
}
