// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value kind tags and their compatibility relation.
//!
//! Subscriptions filter on a [`ValueKind`]. A payload matches a filter when
//! its kind is the filter kind itself or derives from it, so a `Decimal`
//! subscription also hears `Percent`, `Hsb` and `Temperature` updates.
//!
//! ```text
//! Decimal
//! ├── Percent
//! │   ├── Hsb
//! │   └── Humidity
//! └── Temperature
//! ```

use std::fmt;

/// Discriminator for the kind of a [`Value`](super::Value).
///
/// # Examples
///
/// ```
/// use item_bridge::types::ValueKind;
///
/// assert!(ValueKind::Hsb.is_compatible_with(ValueKind::Decimal));
/// assert!(!ValueKind::Decimal.is_compatible_with(ValueKind::Hsb));
/// assert!(!ValueKind::Humidity.is_compatible_with(ValueKind::Temperature));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ValueKind {
    /// Plain decimal number.
    Decimal,
    /// Percentage 0-100.
    Percent,
    /// Hue/saturation/brightness color.
    Hsb,
    /// Temperature reading.
    Temperature,
    /// Relative humidity reading.
    Humidity,
    /// On/off switch state.
    OnOff,
    /// Open/closed contact state.
    OpenClosed,
    /// Up/down rollershutter command.
    UpDown,
    /// Stop/move rollershutter command.
    StopMove,
    /// Increase/decrease dimmer command.
    IncreaseDecrease,
    /// Free text.
    Text,
    /// Point in time.
    DateTime,
    /// Request to refresh the state.
    Refresh,
    /// State is not known.
    Undefined,
}

impl ValueKind {
    /// Returns the kind this kind directly derives from, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Percent | Self::Temperature => Some(Self::Decimal),
            Self::Hsb | Self::Humidity => Some(Self::Percent),
            _ => None,
        }
    }

    /// Returns `true` if a payload of this kind should be delivered to a
    /// subscription filtering on `filter`.
    #[must_use]
    pub fn is_compatible_with(self, filter: Self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == filter {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Returns `true` for kinds that carry a number.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        self.is_compatible_with(Self::Decimal)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_compatible_with_itself() {
        for kind in [ValueKind::Decimal, ValueKind::OnOff, ValueKind::Refresh] {
            assert!(kind.is_compatible_with(kind));
        }
    }

    #[test]
    fn derived_kinds_reach_base() {
        assert!(ValueKind::Percent.is_compatible_with(ValueKind::Decimal));
        assert!(ValueKind::Hsb.is_compatible_with(ValueKind::Percent));
        assert!(ValueKind::Hsb.is_compatible_with(ValueKind::Decimal));
        assert!(ValueKind::Humidity.is_compatible_with(ValueKind::Decimal));
        assert!(ValueKind::Temperature.is_compatible_with(ValueKind::Decimal));
    }

    #[test]
    fn base_kinds_do_not_reach_derived() {
        assert!(!ValueKind::Decimal.is_compatible_with(ValueKind::Percent));
        assert!(!ValueKind::Percent.is_compatible_with(ValueKind::Hsb));
    }

    #[test]
    fn siblings_are_incompatible() {
        assert!(!ValueKind::Humidity.is_compatible_with(ValueKind::Temperature));
        assert!(!ValueKind::Temperature.is_compatible_with(ValueKind::Percent));
        assert!(!ValueKind::OnOff.is_compatible_with(ValueKind::OpenClosed));
    }

    #[test]
    fn numeric_kinds() {
        assert!(ValueKind::Temperature.is_numeric());
        assert!(ValueKind::Hsb.is_numeric());
        assert!(!ValueKind::OnOff.is_numeric());
        assert!(!ValueKind::Text.is_numeric());
    }
}
