// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `item_bridge` library.
//!
//! Registry and routing failures are contained and logged rather than
//! returned, so most of these errors surface from the adapter edges:
//! value validation, accessory construction, configuration loading and
//! vendor network calls.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// An accessory could not be built for an item.
    #[error("accessory error: {0}")]
    Accessory(#[from] AccessoryError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The underlying device network reported a failure.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The bridge was already stopped.
    #[error("bridge is not running")]
    NotRunning,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A hue value is outside the valid range (0-360).
    #[error("hue value {0} is out of range [0, 360]")]
    InvalidHue(u16),

    /// A shade position kind code is not known to the hub.
    #[error("unknown shade position kind: {0}")]
    UnknownPositionKind(u8),
}

/// Errors raised while constructing an accessory for an item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessoryError {
    /// The item carries no accessory metadata.
    #[error("item {0} has no accessory metadata")]
    MissingMetadata(String),

    /// The metadata names an accessory kind this bridge cannot build.
    #[error("unsupported accessory kind {kind} for item {item}")]
    UnsupportedKind {
        /// The item the accessory was requested for.
        item: String,
        /// The requested accessory kind.
        kind: String,
    },
}

/// Errors related to bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration JSON could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of its allowed range.
    #[error("invalid configuration value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },
}

/// Errors reported by a device network implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The device does not expose the cluster needed for the command.
    #[error("device {address} does not support {capability}")]
    UnsupportedCapability {
        /// Device endpoint address.
        address: String,
        /// The missing capability.
        capability: &'static str,
    },

    /// The device rejected or failed to execute the command.
    #[error("command failed on {address}: {message}")]
    CommandFailed {
        /// Device endpoint address.
        address: String,
        /// Failure description from the network stack.
        message: String,
    },

    /// Fetching data from a hub failed.
    #[error("hub request failed: {0}")]
    Hub(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
