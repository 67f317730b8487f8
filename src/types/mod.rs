// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types carried by item events.
//!
//! - [`Value`] and its [`ValueKind`] tag drive subscription filtering
//! - [`HsbValue`] converts colors for light networks
//! - [`ShadePosition`] is the hub wire shape for motorized shades

mod hsb;
mod shade_position;
mod value;
mod value_kind;

pub use hsb::HsbValue;
pub use shade_position::{ShadePosition, ShadePositionKind};
pub use value::{IncreaseDecrease, OnOff, OpenClosed, StopMove, UpDown, Value};
pub use value_kind::ValueKind;
