// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed item states and commands.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::{HsbValue, ValueKind};
use crate::error::ValueError;

/// On/off switch value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnOff {
    /// Switched on.
    On,
    /// Switched off.
    Off,
}

/// Open/closed contact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpenClosed {
    /// Contact open.
    Open,
    /// Contact closed.
    Closed,
}

/// Up/down rollershutter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpDown {
    /// Move up.
    Up,
    /// Move down.
    Down,
}

/// Stop/move rollershutter command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopMove {
    /// Stop moving.
    Stop,
    /// Start moving.
    Move,
}

/// Increase/decrease dimmer command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncreaseDecrease {
    /// Step up.
    Increase,
    /// Step down.
    Decrease,
}

/// A typed item state or command payload.
///
/// Every value reports a [`ValueKind`] through [`Value::kind`], which is what
/// subscription filters are matched against.
///
/// # Examples
///
/// ```
/// use item_bridge::types::{Value, ValueKind};
///
/// let reading = Value::Temperature(21.5);
/// assert_eq!(reading.kind(), ValueKind::Temperature);
/// assert_eq!(reading.as_decimal(), Some(21.5));
///
/// let percent = Value::percent(40).unwrap();
/// assert!(percent.kind().is_compatible_with(ValueKind::Decimal));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Plain decimal number.
    Decimal(f64),
    /// Percentage 0-100.
    Percent(#[serde(deserialize_with = "deserialize_percent")] u8),
    /// HSB color.
    Hsb(HsbValue),
    /// Temperature in degrees Celsius.
    Temperature(f64),
    /// Relative humidity in percent.
    Humidity(f64),
    /// Switch state.
    OnOff(OnOff),
    /// Contact state.
    OpenClosed(OpenClosed),
    /// Rollershutter direction.
    UpDown(UpDown),
    /// Rollershutter motion.
    StopMove(StopMove),
    /// Dimmer step.
    IncreaseDecrease(IncreaseDecrease),
    /// Free text.
    Text(String),
    /// Point in time (UTC).
    DateTime(chrono::DateTime<chrono::Utc>),
    /// Refresh request.
    Refresh,
    /// Unknown state.
    Undefined,
}

impl Value {
    /// Creates a percent value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `value` exceeds 100.
    pub fn percent(value: u8) -> Result<Self, ValueError> {
        check_percent(value).map(Self::Percent)
    }

    /// Returns the kind tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Percent(_) => ValueKind::Percent,
            Self::Hsb(_) => ValueKind::Hsb,
            Self::Temperature(_) => ValueKind::Temperature,
            Self::Humidity(_) => ValueKind::Humidity,
            Self::OnOff(_) => ValueKind::OnOff,
            Self::OpenClosed(_) => ValueKind::OpenClosed,
            Self::UpDown(_) => ValueKind::UpDown,
            Self::StopMove(_) => ValueKind::StopMove,
            Self::IncreaseDecrease(_) => ValueKind::IncreaseDecrease,
            Self::Text(_) => ValueKind::Text,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Refresh => ValueKind::Refresh,
            Self::Undefined => ValueKind::Undefined,
        }
    }

    /// Reads a numeric-compatible value as a decimal.
    ///
    /// HSB colors read as their brightness, matching how a color item is
    /// treated when viewed as a dimmer.
    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(v) | Self::Temperature(v) | Self::Humidity(v) => Some(*v),
            Self::Percent(p) => Some(f64::from(*p)),
            Self::Hsb(hsb) => Some(f64::from(hsb.brightness())),
            _ => None,
        }
    }
}

fn check_percent(value: u8) -> Result<u8, ValueError> {
    if value > 100 {
        return Err(ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: u16::from(value),
        });
    }
    Ok(value)
}

fn deserialize_percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = u8::deserialize(deserializer)?;
    check_percent(value).map_err(serde::de::Error::custom)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal(v) | Self::Temperature(v) | Self::Humidity(v) => write!(f, "{v}"),
            Self::Percent(p) => write!(f, "{p}"),
            Self::Hsb(hsb) => write!(f, "{hsb}"),
            Self::OnOff(v) => write!(f, "{}", if *v == OnOff::On { "ON" } else { "OFF" }),
            Self::OpenClosed(v) => {
                write!(f, "{}", if *v == OpenClosed::Open { "OPEN" } else { "CLOSED" })
            }
            Self::UpDown(v) => write!(f, "{}", if *v == UpDown::Up { "UP" } else { "DOWN" }),
            Self::StopMove(v) => write!(f, "{}", if *v == StopMove::Stop { "STOP" } else { "MOVE" }),
            Self::IncreaseDecrease(v) => write!(
                f,
                "{}",
                if *v == IncreaseDecrease::Increase {
                    "INCREASE"
                } else {
                    "DECREASE"
                }
            ),
            Self::Text(s) => write!(f, "{s}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Refresh => write!(f, "REFRESH"),
            Self::Undefined => write!(f, "UNDEF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_validates_range() {
        assert_eq!(Value::percent(40), Ok(Value::Percent(40)));
        assert!(Value::percent(101).is_err());
    }

    #[test]
    fn deserialize_rejects_out_of_range_percent() {
        let value: Value = serde_json::from_str(r#"{"Percent":100}"#).unwrap();
        assert_eq!(value, Value::Percent(100));

        let err = serde_json::from_str::<Value>(r#"{"Percent":200}"#).unwrap_err();
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn deserialize_rejects_invalid_hsb() {
        let value: Value =
            serde_json::from_str(r#"{"Hsb":{"hue":120,"saturation":50,"brightness":75}}"#).unwrap();
        assert_eq!(value, Value::Hsb(HsbValue::new(120, 50, 75).unwrap()));

        let json = r#"{"Hsb":{"hue":999,"saturation":50,"brightness":75}}"#;
        assert!(serde_json::from_str::<Value>(json).is_err());
    }

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Value::Decimal(1.0).kind(), ValueKind::Decimal);
        assert_eq!(Value::Hsb(HsbValue::red()).kind(), ValueKind::Hsb);
        assert_eq!(Value::Humidity(40.0).kind(), ValueKind::Humidity);
        assert_eq!(Value::OnOff(OnOff::On).kind(), ValueKind::OnOff);
        assert_eq!(Value::Refresh.kind(), ValueKind::Refresh);
    }

    #[test]
    fn as_decimal_reads_numeric_values() {
        assert_eq!(Value::Temperature(21.5).as_decimal(), Some(21.5));
        assert_eq!(Value::Percent(30).as_decimal(), Some(30.0));
        assert_eq!(
            Value::Hsb(HsbValue::new(10, 20, 30).unwrap()).as_decimal(),
            Some(30.0)
        );
        assert_eq!(Value::OnOff(OnOff::Off).as_decimal(), None);
        assert_eq!(Value::Undefined.as_decimal(), None);
    }

    #[test]
    fn display_uses_host_notation() {
        assert_eq!(Value::OnOff(OnOff::On).to_string(), "ON");
        assert_eq!(Value::UpDown(UpDown::Down).to_string(), "DOWN");
        assert_eq!(Value::Undefined.to_string(), "UNDEF");
        assert_eq!(Value::Decimal(2.5).to_string(), "2.5");
    }

    #[test]
    fn serde_round_trip_keeps_kind() {
        let value = Value::Temperature(19.0);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), ValueKind::Temperature);
    }
}
