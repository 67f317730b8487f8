// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use item_bridge::accessory::{
    Accessory, AccessoryRegistry, DefaultAccessoryFactory, Registration, TemperatureSensor,
};
use item_bridge::item::{Item, ItemStates, Metadata};
use item_bridge::types::{Value, ValueKind};
use item_bridge::{
    AccessoryError, Bridge, BridgeConfig, ChangeCallback, ItemEvent, SubscriptionRegistry,
};

fn counting_callback() -> (ChangeCallback, Arc<AtomicU32>) {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = Arc::clone(&counter);
    let callback: ChangeCallback = Arc::new(move || {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });
    (callback, counter)
}

/// Waits until `counter` reaches `expected`, failing after one second.
async fn wait_for(counter: &AtomicU32, expected: u32) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while counter.load(Ordering::SeqCst) < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("callback count not reached in time");
}

// ============================================================================
// Subscription filtering
// ============================================================================

mod filtering {
    use super::*;

    #[test]
    fn temperature_filter_ignores_humidity() {
        let registry = SubscriptionRegistry::new();
        let (cb1, count) = counting_callback();

        registry.subscribe("temp1", ValueKind::Temperature, cb1);

        registry.dispatch("temp1", &Value::Temperature(21.5));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.dispatch("temp1", &Value::Humidity(40.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert_eq!(registry.unsubscribe("temp1", ValueKind::Temperature), 1);
        registry.dispatch("temp1", &Value::Temperature(22.0));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn filtering_through_the_bridge() {
        let mut bridge = Bridge::start(BridgeConfig::new()).unwrap();
        let (temperature, temperature_count) = counting_callback();
        let (numeric, numeric_count) = counting_callback();

        bridge
            .subscriptions()
            .subscribe("temp1", ValueKind::Temperature, temperature);
        bridge
            .subscriptions()
            .subscribe("temp1", ValueKind::Decimal, numeric);

        bridge
            .publish(ItemEvent::state_changed("temp1", Value::Humidity(40.0)))
            .unwrap();
        bridge
            .publish(ItemEvent::state_changed("temp1", Value::Temperature(21.5)))
            .unwrap();

        wait_for(&numeric_count, 2).await;
        assert_eq!(temperature_count.load(Ordering::SeqCst), 1);

        bridge.stop().await.unwrap();
    }
}

// ============================================================================
// Accessory lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    struct Light {
        label: String,
        teardowns: Arc<AtomicU32>,
    }

    impl Accessory for Light {
        fn label(&self) -> &str {
            &self.label
        }

        fn removed(&mut self) {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn kitchen_light_is_recreated_after_removal() {
        let teardowns = Arc::new(AtomicU32::new(0));
        let factory_teardowns = Arc::clone(&teardowns);
        let registry = AccessoryRegistry::new(
            move |item: &Item, _: Option<&Metadata>| -> Result<Box<dyn Accessory>, AccessoryError> {
                Ok(Box::new(Light {
                    label: item.label().to_string(),
                    teardowns: Arc::clone(&factory_teardowns),
                }))
            },
        );
        let item = Item::new("kitchen-light");

        let Registration::Created(first) =
            registry.add_or_update(&item, Some(&Metadata::new("Lighting")))
        else {
            panic!("first sighting should create an entry");
        };
        assert_eq!(
            registry.add_or_update(
                &item,
                Some(&Metadata::new("Lighting").with_config("dimmable", "true"))
            ),
            Registration::Updated
        );
        assert_eq!(registry.len(), 1);

        assert!(registry.remove("kitchen-light"));
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);

        let Registration::Created(second) =
            registry.add_or_update(&item, Some(&Metadata::new("Lighting")))
        else {
            panic!("sighting after removal should create a fresh entry");
        };
        assert_ne!(first, second);
        assert_eq!(teardowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sensor_follows_rename_and_stops_after_removal() {
        let config = BridgeConfig::new()
            .with_accessory(Item::new("temp_a"), Some(Metadata::new(TemperatureSensor::KIND)));
        let mut bridge = Bridge::start(config).unwrap();
        let (callback, count) = counting_callback();

        bridge
            .accessories()
            .inspect_as::<TemperatureSensor, _>("temp_a", |sensor| {
                sensor.subscribe_current_temperature(callback);
            })
            .expect("sensor registered from config");

        bridge
            .publish(ItemEvent::state_changed("temp_a", Value::Temperature(20.0)))
            .unwrap();
        wait_for(&count, 1).await;

        assert!(
            bridge
                .accessories()
                .item_updated(&Item::new("temp_a"), &Item::new("temp_b"))
        );
        bridge
            .publish(ItemEvent::state_changed("temp_b", Value::Temperature(21.0)))
            .unwrap();
        wait_for(&count, 2).await;

        let reading = bridge
            .accessories()
            .inspect_as::<TemperatureSensor, _>("temp_b", TemperatureSensor::current_temperature);
        assert_eq!(reading, Some(Some(21.0)));

        assert!(bridge.accessories().remove("temp_b"));
        assert!(bridge.subscriptions().is_empty());

        bridge.stop().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn renamed_sensor_keeps_its_last_reading() {
        let config = BridgeConfig::new()
            .with_accessory(Item::new("old_temp"), Some(Metadata::new(TemperatureSensor::KIND)));
        let mut bridge = Bridge::start(config).unwrap();
        let (callback, count) = counting_callback();
        bridge
            .accessories()
            .inspect_as::<TemperatureSensor, _>("old_temp", |sensor| {
                sensor.subscribe_current_temperature(callback);
            })
            .expect("sensor registered from config");

        bridge
            .publish(ItemEvent::state_changed("old_temp", Value::Temperature(21.5)))
            .unwrap();
        wait_for(&count, 1).await;

        assert!(
            bridge
                .accessories()
                .item_updated(&Item::new("old_temp"), &Item::new("new_temp"))
        );

        let reading = bridge
            .accessories()
            .inspect_as::<TemperatureSensor, _>("new_temp", TemperatureSensor::current_temperature);
        assert_eq!(reading, Some(Some(21.5)));
        assert_eq!(bridge.states().get("old_temp"), None);

        bridge.stop().await.unwrap();
    }

    #[test]
    fn grouped_items_share_one_accessory() {
        let registry = AccessoryRegistry::new(DefaultAccessoryFactory::new(
            Arc::new(SubscriptionRegistry::new()),
            Arc::new(ItemStates::new()),
        ));

        registry.add_or_update(
            &Item::new("porch_temp"),
            Some(&Metadata::new(TemperatureSensor::KIND)),
        );
        let outcome =
            registry.add_or_update(&Item::new("porch_battery").with_groups(["porch_temp"]), None);

        assert_eq!(outcome, Registration::FoldedInto("porch_temp".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.parent_of("porch_battery").as_deref(), Some("porch_temp"));
    }
}
