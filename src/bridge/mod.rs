// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge lifecycle.
//!
//! [`Bridge::start`] wires the registries, the event bus and the routing
//! task together and returns a [`BridgeHandle`]. The host adapter publishes
//! item events through the handle and calls [`BridgeHandle::stop`] when it
//! shuts down.

mod config;

pub use config::{AccessoryConfig, BridgeConfig, DEFAULT_BRIDGE_NAME};

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::accessory::{AccessoryRegistry, DefaultAccessoryFactory, Registration};
use crate::error::{Error, Result};
use crate::event::{EventBus, ItemEvent};
use crate::item::ItemStates;
use crate::router::EventRouter;
use crate::subscription::SubscriptionRegistry;

/// Entry point that starts a bridge.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use item_bridge::bridge::{Bridge, BridgeConfig};
/// use item_bridge::event::ItemEvent;
/// use item_bridge::types::{Value, ValueKind};
///
/// #[tokio::main]
/// async fn main() -> item_bridge::Result<()> {
///     let mut bridge = Bridge::start(BridgeConfig::new())?;
///
///     let hits = Arc::new(AtomicU32::new(0));
///     let hits_clone = Arc::clone(&hits);
///     bridge.subscriptions().subscribe("temp1", ValueKind::Temperature, Arc::new(move || {
///         hits_clone.fetch_add(1, Ordering::SeqCst);
///     }));
///
///     bridge.publish(ItemEvent::state_changed("temp1", Value::Temperature(21.5)))?;
///     bridge.stop().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Bridge;

impl Bridge {
    /// Validates `config`, builds the registries and spawns the routing task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn start(config: BridgeConfig) -> Result<BridgeHandle> {
        config.validate()?;

        let subscriptions = Arc::new(SubscriptionRegistry::new());
        let states = Arc::new(ItemStates::new());
        let accessories = Arc::new(AccessoryRegistry::new(DefaultAccessoryFactory::new(
            Arc::clone(&subscriptions),
            Arc::clone(&states),
        ))
        .with_states(Arc::clone(&states)));

        for entry in &config.accessories {
            let outcome = accessories.add_or_update(&entry.item, entry.metadata.as_ref());
            if let Registration::Rejected(e) = outcome {
                tracing::warn!(
                    bridge = %config.name,
                    item = %entry.item.name(),
                    error = %e,
                    "Configured accessory skipped"
                );
            }
        }

        let event_bus = EventBus::with_capacity(config.event_capacity);
        let router = EventRouter::new(Arc::clone(&subscriptions), Arc::clone(&states));
        let receiver = event_bus.subscribe();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let name = config.name.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                () = router.run(receiver) => {}
                _ = shutdown_rx => {
                    tracing::debug!(bridge = %name, "Routing task received shutdown");
                }
            }
        });

        tracing::info!(
            bridge = %config.name,
            accessories = accessories.len(),
            "Bridge started"
        );

        Ok(BridgeHandle {
            name: config.name,
            subscriptions,
            accessories,
            states,
            event_bus,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// Handle to a running bridge.
///
/// Dropping the handle without calling [`stop`](Self::stop) aborts the
/// routing task but does not tear accessories down.
#[derive(Debug)]
pub struct BridgeHandle {
    name: String,
    subscriptions: Arc<SubscriptionRegistry>,
    accessories: Arc<AccessoryRegistry>,
    states: Arc<ItemStates>,
    event_bus: EventBus,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BridgeHandle {
    /// Returns the bridge name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the subscription registry.
    #[must_use]
    pub fn subscriptions(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    /// Returns the accessory registry.
    #[must_use]
    pub fn accessories(&self) -> &Arc<AccessoryRegistry> {
        &self.accessories
    }

    /// Returns the item state map.
    #[must_use]
    pub fn states(&self) -> &Arc<ItemStates> {
        &self.states
    }

    /// Returns the item event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns `true` until [`stop`](Self::stop) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Publishes an item event for routing.
    ///
    /// Returns the number of bus receivers that got the event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] after the bridge was stopped.
    pub fn publish(&self, event: ItemEvent) -> Result<usize> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }
        Ok(self.event_bus.publish(event))
    }

    /// Stops routing and tears down every accessory and subscription.
    ///
    /// Events still queued on the bus are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the bridge was already stopped.
    pub async fn stop(&mut self) -> Result<()> {
        let task = self.task.take().ok_or(Error::NotRunning)?;
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already have ended on its own
            let _ = shutdown.send(());
        }

        if let Err(e) = task.await {
            tracing::warn!(bridge = %self.name, error = %e, "Routing task ended abnormally");
        }

        self.accessories.clear();
        self.subscriptions.clear();
        tracing::info!(bridge = %self.name, "Bridge stopped");
        Ok(())
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
