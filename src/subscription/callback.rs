// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription registry for item change notifications.
//!
//! This module provides the core types for managing change callbacks:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`ChangeCallback`] - The zero-argument notification handle
//! - [`SubscriptionRegistry`] - Item name to filtered callback set, with dispatch

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::types::{Value, ValueKind};

/// Unique identifier for a subscription.
///
/// Returned when subscribing and usable with
/// [`SubscriptionRegistry::unsubscribe_id`]. IDs are unique within a
/// registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Notification handle invoked when a subscribed item changes.
///
/// Callbacks receive no payload; they re-read the current state themselves.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    filter: ValueKind,
    callback: ChangeCallback,
}

/// Registry mapping item names to value-kind-filtered change callbacks.
///
/// All operations are internally synchronized with a single
/// `parking_lot::RwLock`. Dispatch copies the matching callbacks out of the
/// lock before invoking them, so a callback may subscribe or unsubscribe
/// without deadlocking.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// use item_bridge::subscription::SubscriptionRegistry;
/// use item_bridge::types::{Value, ValueKind};
///
/// let registry = SubscriptionRegistry::new();
/// let hits = Arc::new(AtomicU32::new(0));
/// let counter = Arc::clone(&hits);
///
/// registry.subscribe("temp1", ValueKind::Temperature, Arc::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// }));
///
/// registry.dispatch("temp1", &Value::Temperature(21.5));
/// registry.dispatch("temp1", &Value::Humidity(40.0));
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
pub struct SubscriptionRegistry {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Subscriptions keyed by item name.
    subscriptions: RwLock<HashMap<String, Vec<Subscription>>>,
}

impl SubscriptionRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a callback for changes of `item_name` whose value kind is
    /// compatible with `filter`.
    ///
    /// Registering the same callback (by `Arc` identity) with the same filter
    /// twice stores it once and returns the existing ID.
    pub fn subscribe(
        &self,
        item_name: impl Into<String>,
        filter: ValueKind,
        callback: ChangeCallback,
    ) -> SubscriptionId {
        let item_name = item_name.into();
        let mut subscriptions = self.subscriptions.write();
        let entries = subscriptions.entry(item_name).or_default();

        if let Some(existing) = entries
            .iter()
            .find(|s| s.filter == filter && Arc::ptr_eq(&s.callback, &callback))
        {
            return existing.id;
        }

        let id = self.next_id();
        entries.push(Subscription {
            id,
            filter,
            callback,
        });
        id
    }

    /// Removes every subscription on `item_name` registered with exactly
    /// `filter`.
    ///
    /// Returns how many subscriptions were removed. Unknown items or filters
    /// are a no-op.
    pub fn unsubscribe(&self, item_name: &str, filter: ValueKind) -> usize {
        let mut subscriptions = self.subscriptions.write();
        let Some(entries) = subscriptions.get_mut(item_name) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|s| s.filter != filter);
        let removed = before - entries.len();

        if entries.is_empty() {
            subscriptions.remove(item_name);
        }
        removed
    }

    /// Removes a single subscription by its ID.
    ///
    /// Returns `true` if a subscription was found and removed.
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let mut emptied = None;
        let mut found = false;

        for (item_name, entries) in subscriptions.iter_mut() {
            if let Some(pos) = entries.iter().position(|s| s.id == id) {
                entries.remove(pos);
                found = true;
                if entries.is_empty() {
                    emptied = Some(item_name.clone());
                }
                break;
            }
        }

        if let Some(item_name) = emptied {
            subscriptions.remove(&item_name);
        }
        found
    }

    /// Clears all subscriptions.
    pub fn clear(&self) {
        self.subscriptions.write().clear();
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Notifies every subscription on `item_name` whose filter accepts the
    /// kind of `value`.
    ///
    /// Callbacks run synchronously, in an unspecified order, after the
    /// registry lock has been released. A panicking callback is logged and
    /// does not prevent delivery to the others. Returns the number of
    /// callbacks that completed.
    pub fn dispatch(&self, item_name: &str, value: &Value) -> usize {
        let kind = value.kind();
        let matching: Vec<(SubscriptionId, ChangeCallback)> = {
            let subscriptions = self.subscriptions.read();
            let Some(entries) = subscriptions.get(item_name) else {
                return 0;
            };
            entries
                .iter()
                .filter(|s| kind.is_compatible_with(s.filter))
                .map(|s| (s.id, Arc::clone(&s.callback)))
                .collect()
        };

        let mut delivered = 0;
        for (id, callback) in matching {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!(
                    item = %item_name,
                    subscription = %id,
                    kind = %kind,
                    "Change callback panicked"
                );
            }
        }

        tracing::trace!(item = %item_name, kind = %kind, delivered, "Dispatched change");
        delivered
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns the total number of registered subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().values().map(Vec::len).sum()
    }

    /// Returns the number of subscriptions on one item.
    #[must_use]
    pub fn subscriptions_for(&self, item_name: &str) -> usize {
        self.subscriptions.read().get(item_name).map_or(0, Vec::len)
    }

    /// Returns the names of all items with at least one subscription.
    #[must_use]
    pub fn subjects(&self) -> Vec<String> {
        self.subscriptions.read().keys().cloned().collect()
    }

    /// Returns `true` if there are no registered subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.read().is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscription_count", &self.subscription_count())
            .finish()
    }
}
