// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound item events and the bus that carries them.
//!
//! The host publishes [`ItemEvent`]s on an [`EventBus`]; the
//! [`EventRouter`](crate::router::EventRouter) consumes them.
//!
//! # Examples
//!
//! ```
//! use item_bridge::event::{EventBus, ItemEvent};
//! use item_bridge::types::{OnOff, Value};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(ItemEvent::command_issued("hall_light", Value::OnOff(OnOff::On)));
//! ```

mod event_bus;
mod item_event;

pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use item_event::ItemEvent;
