// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for item changes.
//!
//! Accessories register interest in an item together with a
//! [`ValueKind`](crate::types::ValueKind) filter. When the router sees a
//! state or command for that item, every subscription whose filter accepts
//! the payload kind is notified.
//!
//! # Overview
//!
//! - [`SubscriptionId`] - A unique identifier for a subscription
//! - [`ChangeCallback`] - Zero-argument notification handle
//! - [`SubscriptionRegistry`] - Stores subscriptions and dispatches changes
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use item_bridge::subscription::SubscriptionRegistry;
//! use item_bridge::types::{Value, ValueKind};
//!
//! let registry = SubscriptionRegistry::new();
//! let id = registry.subscribe("hall_light", ValueKind::OnOff, Arc::new(|| {
//!     println!("hall light changed");
//! }));
//!
//! registry.dispatch("hall_light", &Value::OnOff(item_bridge::types::OnOff::On));
//! registry.unsubscribe_id(id);
//! ```

mod callback;

pub use callback::{ChangeCallback, SubscriptionId, SubscriptionRegistry};
