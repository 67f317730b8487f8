// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device network coordination.
//!
//! A [`NetworkCoordinator`] sits between item accessories and a vendor
//! device mesh reached through the [`DeviceNetwork`] trait. Endpoint handlers
//! register a listener per address and are told when the initial browse of
//! the network has finished, which the network wrapper reports through a
//! [`BrowseSignal`]. With a discovery sink attached, every device found is
//! reported as a [`DiscoveryResult`](crate::discovery::DiscoveryResult).

mod coordinator;
mod signal;

pub use coordinator::{
    BASIC_CLUSTER, DEFAULT_TRANSITION, DeviceCommand, DeviceNetwork, Endpoint, EndpointListener,
    MANUFACTURER_ATTRIBUTE, MAX_CHROMATICITY, MAX_LEVEL, MODEL_ATTRIBUTE, NetworkCoordinator,
    NetworkStatus, level_for_percent, scale_chromaticity,
};
pub use signal::BrowseSignal;
