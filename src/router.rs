// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Routing of inbound item events to subscriptions.
//!
//! The [`EventRouter`] is a pure demultiplexer: it takes the item name and
//! payload out of each event and hands them to the
//! [`SubscriptionRegistry`].
//!
//! # Architecture
//!
//! ```text
//! Host bus: StateChanged { "kitchen_temp", Temperature(21.5) }
//!                     ↓
//!             EventRouter.route()
//!                     ↓
//!       record state in ItemStates (state changes only)
//!                     ↓
//!     registry.dispatch("kitchen_temp", Temperature(21.5))
//!                     ↓
//!     callbacks whose filter accepts Temperature are invoked
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::event::ItemEvent;
use crate::item::ItemStates;
use crate::subscription::SubscriptionRegistry;
use crate::types::Value;

/// Routes item events to the subscription registry.
///
/// Events are processed once per delivery; the router does not deduplicate.
#[derive(Debug, Clone)]
pub struct EventRouter {
    subscriptions: Arc<SubscriptionRegistry>,
    states: Arc<ItemStates>,
}

impl EventRouter {
    /// Creates a router over the given registry and state map.
    #[must_use]
    pub fn new(subscriptions: Arc<SubscriptionRegistry>, states: Arc<ItemStates>) -> Self {
        Self {
            subscriptions,
            states,
        }
    }

    /// Handles a state update for an item.
    ///
    /// The state is recorded before dispatch so callbacks read the new value.
    pub fn receive_update(&self, item_name: &str, state: &Value) -> usize {
        self.states.update(item_name, state.clone());
        self.subscriptions.dispatch(item_name, state)
    }

    /// Handles a command issued to an item.
    pub fn receive_command(&self, item_name: &str, command: &Value) -> usize {
        self.subscriptions.dispatch(item_name, command)
    }

    /// Routes one event and returns how many callbacks completed.
    pub fn route(&self, event: &ItemEvent) -> usize {
        let delivered = match event {
            ItemEvent::StateChanged { item_name, state } => self.receive_update(item_name, state),
            ItemEvent::CommandIssued { item_name, command } => {
                self.receive_command(item_name, command)
            }
        };

        tracing::trace!(
            item = %event.item_name(),
            kind = %event.payload().kind(),
            delivered,
            "Routed item event"
        );
        delivered
    }

    /// Routes events from a bus receiver until the bus closes.
    ///
    /// A lagging receiver logs how many events were skipped and continues.
    pub async fn run(&self, mut receiver: broadcast::Receiver<ItemEvent>) {
        tracing::debug!("Starting item event router");

        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.route(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Item event router lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }

        tracing::debug!("Item event router stopped");
    }

    /// Returns the registry this router dispatches into.
    #[must_use]
    pub fn subscriptions(&self) -> &Arc<SubscriptionRegistry> {
        &self.subscriptions
    }

    /// Returns the state map this router records into.
    #[must_use]
    pub fn states(&self) -> &Arc<ItemStates> {
        &self.states
    }
}
