// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shade position as exchanged with a motorized-shade hub.
//!
//! The hub encodes a position as a kind code plus a raw value:
//!
//! ```json
//! { "posKind1": 1, "position1": 32000 }
//! ```
//!
//! Both fields are always serialized, `posKind1` as `null` when unset.

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Which part of the shade a position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ShadePositionKind {
    /// Primary rail position.
    Position,
    /// Vane tilt.
    Vane,
}

impl ShadePositionKind {
    /// Returns the hub's numeric code for this kind.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Position => 1,
            Self::Vane => 3,
        }
    }
}

impl TryFrom<u8> for ShadePositionKind {
    type Error = ValueError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Position),
            3 => Ok(Self::Vane),
            other => Err(ValueError::UnknownPositionKind(other)),
        }
    }
}

impl From<ShadePositionKind> for u8 {
    fn from(kind: ShadePositionKind) -> Self {
        kind.code()
    }
}

/// A shade position in hub units.
///
/// # Examples
///
/// ```
/// use item_bridge::types::ShadePosition;
///
/// let pos = ShadePosition::for_position(32_000);
/// assert_eq!(pos.position(), 32_000);
/// assert_eq!(pos.vane(), 0);
///
/// let json = serde_json::to_string(&pos).unwrap();
/// assert_eq!(json, r#"{"posKind1":1,"position1":32000}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShadePosition {
    #[serde(rename = "posKind1")]
    kind: Option<ShadePositionKind>,
    #[serde(rename = "position1", default)]
    value: i32,
}

impl ShadePosition {
    /// Creates a primary rail position.
    #[must_use]
    pub const fn for_position(position: i32) -> Self {
        Self {
            kind: Some(ShadePositionKind::Position),
            value: position,
        }
    }

    /// Creates a vane tilt position.
    #[must_use]
    pub const fn for_vane(vane: i32) -> Self {
        Self {
            kind: Some(ShadePositionKind::Vane),
            value: vane,
        }
    }

    /// Returns the kind, if the hub reported one.
    #[must_use]
    pub const fn kind(&self) -> Option<ShadePositionKind> {
        self.kind
    }

    /// Returns the rail position, or 0 when this is not a rail position.
    #[must_use]
    pub fn position(&self) -> i32 {
        if self.kind == Some(ShadePositionKind::Position) {
            self.value
        } else {
            0
        }
    }

    /// Returns the vane tilt, or 0 when this is not a vane position.
    #[must_use]
    pub fn vane(&self) -> i32 {
        if self.kind == Some(ShadePositionKind::Vane) {
            self.value
        } else {
            0
        }
    }
}
