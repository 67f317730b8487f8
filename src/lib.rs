// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item Bridge - plumbing between a home-automation item bus and device
//! protocols.
//!
//! The host publishes item state changes and commands; this library routes
//! them to interested listeners, keeps protocol-facing accessories in sync
//! with the item definitions they are built from, and drives device networks
//! on the other side.
//!
//! # Building Blocks
//!
//! - **Subscriptions**: [`SubscriptionRegistry`] maps item names to change
//!   callbacks filtered by [`ValueKind`]
//! - **Routing**: [`EventRouter`] demultiplexes [`ItemEvent`]s from the
//!   [`EventBus`] into the registry
//! - **Accessories**: [`AccessoryRegistry`] owns accessories keyed by item
//!   name, with grouping, rename and removal teardown
//! - **Devices**: [`NetworkCoordinator`] drives a light mesh once its initial
//!   browse completes
//! - **Discovery**: [`SceneDiscovery`] reports hub scenes on demand or on a
//!   schedule
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use item_bridge::{Bridge, BridgeConfig, ItemEvent, Value};
//! use item_bridge::accessory::TemperatureSensor;
//! use item_bridge::item::{Item, Metadata};
//!
//! #[tokio::main]
//! async fn main() -> item_bridge::Result<()> {
//!     let config = BridgeConfig::new()
//!         .with_accessory(Item::new("kitchen_temp"), Some(Metadata::new("TemperatureSensor")));
//!     let mut bridge = Bridge::start(config)?;
//!
//!     bridge.accessories().inspect_as::<TemperatureSensor, _>("kitchen_temp", |sensor| {
//!         sensor.subscribe_current_temperature(Arc::new(|| println!("temperature changed")));
//!     });
//!
//!     bridge.publish(ItemEvent::state_changed("kitchen_temp", Value::Temperature(21.5)))?;
//!     bridge.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod bridge;
pub mod discovery;
pub mod error;
pub mod event;
pub mod item;
pub mod network;
pub mod router;
pub mod subscription;
pub mod types;

pub use accessory::{Accessory, AccessoryFactory, AccessoryRegistry, EntryId, Registration};
pub use bridge::{Bridge, BridgeConfig, BridgeHandle};
pub use discovery::{DiscoveryResult, SceneDiscovery, SceneSource};
pub use error::{AccessoryError, ConfigError, Error, NetworkError, Result, ValueError};
pub use event::{EventBus, ItemEvent};
pub use item::{Item, ItemStates, Metadata};
pub use network::{BrowseSignal, DeviceNetwork, NetworkCoordinator};
pub use router::EventRouter;
pub use subscription::{ChangeCallback, SubscriptionId, SubscriptionRegistry};
pub use types::{HsbValue, ShadePosition, Value, ValueKind};
