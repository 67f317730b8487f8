// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HSB color values and their conversions.
//!
//! Items carry colors as hue/saturation/brightness. Light networks usually
//! want either RGB or CIE 1931 xy chromaticity, so both conversions live
//! here next to the type.

use std::fmt;

use crate::error::ValueError;

/// D65 white point, used when a color has no chromaticity (black).
const WHITE_POINT: (f64, f64) = (0.3127, 0.3290);

/// HSB color representation (Hue, Saturation, Brightness).
///
/// # Examples
///
/// ```
/// use item_bridge::types::HsbValue;
///
/// let red = HsbValue::new(0, 100, 100).unwrap();
/// assert_eq!(red.to_rgb(), (255, 0, 0));
///
/// assert!(HsbValue::new(361, 0, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawHsb")]
pub struct HsbValue {
    hue: u16,
    saturation: u8,
    brightness: u8,
}

/// Unchecked wire form, validated through [`HsbValue::new`].
#[derive(serde::Deserialize)]
struct RawHsb {
    hue: u16,
    saturation: u8,
    brightness: u8,
}

impl TryFrom<RawHsb> for HsbValue {
    type Error = ValueError;

    fn try_from(raw: RawHsb) -> Result<Self, Self::Error> {
        Self::new(raw.hue, raw.saturation, raw.brightness)
    }
}

impl HsbValue {
    /// Maximum hue value (wraps at 360).
    pub const MAX_HUE: u16 = 360;

    /// Maximum saturation and brightness value.
    pub const MAX_PERCENT: u8 = 100;

    /// Creates a new HSB color.
    ///
    /// # Errors
    ///
    /// Returns an error if hue exceeds 360 or saturation/brightness exceed 100.
    pub fn new(hue: u16, saturation: u8, brightness: u8) -> Result<Self, ValueError> {
        if hue > Self::MAX_HUE {
            return Err(ValueError::InvalidHue(hue));
        }
        for component in [saturation, brightness] {
            if component > Self::MAX_PERCENT {
                return Err(ValueError::OutOfRange {
                    min: 0,
                    max: u16::from(Self::MAX_PERCENT),
                    actual: u16::from(component),
                });
            }
        }
        Ok(Self {
            hue,
            saturation,
            brightness,
        })
    }

    /// Pure red at full brightness.
    #[must_use]
    pub const fn red() -> Self {
        Self {
            hue: 0,
            saturation: 100,
            brightness: 100,
        }
    }

    /// White at full brightness.
    #[must_use]
    pub const fn white() -> Self {
        Self {
            hue: 0,
            saturation: 0,
            brightness: 100,
        }
    }

    /// Returns the hue value (0-360).
    #[must_use]
    pub const fn hue(&self) -> u16 {
        self.hue
    }

    /// Returns the saturation value (0-100).
    #[must_use]
    pub const fn saturation(&self) -> u8 {
        self.saturation
    }

    /// Returns the brightness value (0-100).
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Converts to 8-bit RGB components.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::many_single_char_names
    )]
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let h = f64::from(self.hue % 360) / 60.0;
        let s = f64::from(self.saturation) / 100.0;
        let v = f64::from(self.brightness) / 100.0;

        let chroma = v * s;
        let x = chroma * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - chroma;

        let (r, g, b) = match h {
            h if h < 1.0 => (chroma, x, 0.0),
            h if h < 2.0 => (x, chroma, 0.0),
            h if h < 3.0 => (0.0, chroma, x),
            h if h < 4.0 => (0.0, x, chroma),
            h if h < 5.0 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let scale = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (scale(r), scale(g), scale(b))
    }

    /// Converts to CIE 1931 xy chromaticity using the sRGB (D65) primaries.
    ///
    /// Black has no chromaticity and maps to the D65 white point.
    #[must_use]
    #[allow(clippy::many_single_char_names)]
    pub fn to_cie_xy(&self) -> (f64, f64) {
        let (r, g, b) = self.to_rgb();
        let linear = |c: u8| {
            let c = f64::from(c) / 255.0;
            if c <= 0.040_45 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let (r, g, b) = (linear(r), linear(g), linear(b));

        let x = 0.4124 * r + 0.3576 * g + 0.1805 * b;
        let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let z = 0.0193 * r + 0.1192 * g + 0.9505 * b;

        let sum = x + y + z;
        if sum <= f64::EPSILON {
            return WHITE_POINT;
        }
        (x / sum, y / sum)
    }
}

impl Default for HsbValue {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for HsbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.hue, self.saturation, self.brightness)
    }
}
