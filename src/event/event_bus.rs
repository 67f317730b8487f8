// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting item events.

use tokio::sync::broadcast;

use super::ItemEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting item events to multiple receivers.
///
/// Stands in for the host's event bus: the host adapter publishes item
/// state changes and commands here, and the router consumes them.
///
/// # Capacity
///
/// The bus has a fixed capacity (default 256). A receiver that falls behind
/// loses the oldest events and observes `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use item_bridge::event::{EventBus, ItemEvent};
/// use item_bridge::types::Value;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ItemEvent::state_changed("temp1", Value::Temperature(21.5)));
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ItemEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to item events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all receivers.
    ///
    /// Returns the number of receivers that got the event, 0 when nobody is
    /// listening.
    pub fn publish(&self, event: ItemEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
