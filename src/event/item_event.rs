// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound item event types.

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// Events delivered by the host event bus.
///
/// Both variants carry the item name and a typed payload; the router treats
/// them alike and only the payload kind decides who is notified.
///
/// # Examples
///
/// ```
/// use item_bridge::event::ItemEvent;
/// use item_bridge::types::{OnOff, Value};
///
/// let update = ItemEvent::state_changed("hall_light", Value::OnOff(OnOff::On));
/// assert_eq!(update.item_name(), "hall_light");
/// assert!(update.is_state_change());
///
/// let command = ItemEvent::command_issued("hall_light", Value::OnOff(OnOff::Off));
/// assert!(command.is_command());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemEvent {
    /// The observed state of an item changed.
    StateChanged {
        /// The item whose state changed.
        item_name: String,
        /// The new state.
        state: Value,
    },

    /// A command was issued to an item.
    CommandIssued {
        /// The item receiving the command.
        item_name: String,
        /// The command payload.
        command: Value,
    },
}

impl ItemEvent {
    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(item_name: impl Into<String>, state: Value) -> Self {
        Self::StateChanged {
            item_name: item_name.into(),
            state,
        }
    }

    /// Creates a command issued event.
    #[must_use]
    pub fn command_issued(item_name: impl Into<String>, command: Value) -> Self {
        Self::CommandIssued {
            item_name: item_name.into(),
            command,
        }
    }

    /// Returns the item name this event is about.
    #[must_use]
    pub fn item_name(&self) -> &str {
        match self {
            Self::StateChanged { item_name, .. } | Self::CommandIssued { item_name, .. } => {
                item_name
            }
        }
    }

    /// Returns the payload of this event.
    #[must_use]
    pub fn payload(&self) -> &Value {
        match self {
            Self::StateChanged { state, .. } => state,
            Self::CommandIssued { command, .. } => command,
        }
    }

    /// Returns `true` if this is a state change.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns `true` if this is a command.
    #[must_use]
    pub fn is_command(&self) -> bool {
        matches!(self, Self::CommandIssued { .. })
    }
}
