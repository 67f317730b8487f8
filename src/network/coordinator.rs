// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinator for a mesh of light endpoints.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::BrowseSignal;
use crate::discovery::DiscoveryResult;
use crate::error::NetworkError;
use crate::types::{HsbValue, OnOff};

/// Transition time, in tenths of a second, used for level and color moves.
pub const DEFAULT_TRANSITION: u16 = 10;

/// Highest level a level-control cluster accepts.
pub const MAX_LEVEL: u8 = 254;

/// Highest scaled CIE coordinate a color-control cluster accepts.
pub const MAX_CHROMATICITY: u16 = 65279;

/// Basic cluster, which carries the device identification attributes.
pub const BASIC_CLUSTER: u16 = 0;

/// Manufacturer name attribute of the basic cluster.
pub const MANUFACTURER_ATTRIBUTE: u16 = 4;

/// Model identifier attribute of the basic cluster.
pub const MODEL_ATTRIBUTE: u16 = 5;

/// Listener notified when an endpoint becomes known or changes.
pub type EndpointListener = Arc<dyn Fn() + Send + Sync>;

/// A device endpoint reported by the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Endpoint address.
    pub address: String,
    /// Vendor device type, for logging.
    pub device_type: String,
}

impl Endpoint {
    /// Creates an endpoint description.
    #[must_use]
    pub fn new(address: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            device_type: device_type.into(),
        }
    }
}

/// Command sent to a single endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Switch the on/off cluster.
    Power(OnOff),
    /// Move the level-control cluster.
    MoveToLevel {
        /// Target level, `0..=254`.
        level: u8,
        /// Transition time in tenths of a second.
        transition: u16,
    },
    /// Move the color-control cluster.
    MoveToColor {
        /// CIE x scaled by 65536.
        x: u16,
        /// CIE y scaled by 65536.
        y: u16,
        /// Transition time in tenths of a second.
        transition: u16,
    },
}

/// The vendor device network the coordinator drives.
pub trait DeviceNetwork: Send + Sync {
    /// Returns every endpoint currently known to the network.
    fn endpoints(&self) -> Vec<Endpoint>;

    /// Returns `true` if `address` is a known endpoint.
    fn contains(&self, address: &str) -> bool;

    /// Sends `command` to the endpoint at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnsupportedCapability`] when the endpoint
    /// lacks the needed cluster, or another [`NetworkError`] when the send
    /// fails.
    fn send(
        &self,
        address: &str,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;

    /// Reads one attribute of a cluster on the endpoint at `address`.
    ///
    /// Returns `Ok(None)` when the endpoint has no such cluster or attribute.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] when the read fails.
    fn read_attribute(
        &self,
        address: &str,
        cluster: u16,
        attribute: u16,
    ) -> impl Future<Output = Result<Option<String>, NetworkError>> + Send;
}

struct DeviceSink {
    sink: mpsc::Sender<DiscoveryResult>,
    bridge_uid: String,
}

/// Connection status of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// The initial browse has not completed.
    Offline,
    /// The network is browsed and ready for commands.
    Online,
}

/// Coordinates a device network: endpoint listeners, browse completion,
/// device discovery and light control.
///
/// Child things follow the coordinator's [`status`](Self::status); their
/// endpoint listeners run once the network comes online.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use item_bridge::network::{DeviceNetwork, NetworkCoordinator};
///
/// async fn bring_up<N: DeviceNetwork + 'static>(network: N) -> item_bridge::Result<()> {
///     let coordinator = Arc::new(NetworkCoordinator::new(network));
///     coordinator.subscribe_endpoint("00:17:88:01:00:bd:4c:1a/11", Arc::new(|| {
///         println!("endpoint known");
///     }));
///
///     let waiter = coordinator.wait_for_network();
///     coordinator.browse_signal().complete();
///     waiter.await.ok();
///
///     coordinator.light_brightness("00:17:88:01:00:bd:4c:1a/11", 75).await?;
///     Ok(())
/// }
/// ```
pub struct NetworkCoordinator<N> {
    network: N,
    listeners: RwLock<HashMap<String, EndpointListener>>,
    signal: BrowseSignal,
    online: AtomicBool,
    discovery: Option<DeviceSink>,
}

impl<N: DeviceNetwork> NetworkCoordinator<N> {
    /// Creates a coordinator over `network`. The coordinator starts offline.
    #[must_use]
    pub fn new(network: N) -> Self {
        Self {
            network,
            listeners: RwLock::new(HashMap::new()),
            signal: BrowseSignal::new(),
            online: AtomicBool::new(false),
            discovery: None,
        }
    }

    /// Reports every device found on the network into `sink`, on behalf of
    /// the coordinator thing `bridge_uid`.
    #[must_use]
    pub fn with_discovery(
        mut self,
        sink: mpsc::Sender<DiscoveryResult>,
        bridge_uid: impl Into<String>,
    ) -> Self {
        self.discovery = Some(DeviceSink {
            sink,
            bridge_uid: bridge_uid.into(),
        });
        self
    }

    /// Returns the underlying network.
    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Returns the signal the network wrapper raises after its initial
    /// browse.
    #[must_use]
    pub fn browse_signal(&self) -> &BrowseSignal {
        &self.signal
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> NetworkStatus {
        if self.online.load(Ordering::Acquire) {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }

    // =========================================================================
    // Endpoint listeners
    // =========================================================================

    /// Registers the listener for `address`, replacing any previous one.
    pub fn subscribe_endpoint(&self, address: impl Into<String>, listener: EndpointListener) {
        self.listeners.write().insert(address.into(), listener);
    }

    /// Drops the listener for `address`. Returns `true` if one was present.
    pub fn unsubscribe_endpoint(&self, address: &str) -> bool {
        self.listeners.write().remove(address).is_some()
    }

    /// Notifies the listener for `address`, if any.
    ///
    /// Returns `true` if a listener ran.
    pub fn notify_endpoint(&self, address: &str) -> bool {
        let listener = self.listeners.read().get(address).cloned();
        match listener {
            Some(listener) => {
                listener();
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Browsing
    // =========================================================================

    /// Marks the network online, reports every device for discovery and
    /// tells every listening endpoint it is known.
    ///
    /// Returns the number of listeners notified.
    pub async fn browsing_complete(&self) -> usize {
        let endpoints = self.network.endpoints();
        tracing::debug!(nodes = endpoints.len(), "Device network ready");
        self.online.store(true, Ordering::Release);

        let mut notified = 0;
        for endpoint in &endpoints {
            tracing::debug!(
                address = %endpoint.address,
                device_type = %endpoint.device_type,
                "Known endpoint"
            );
            self.report_device(endpoint).await;
            if self.notify_endpoint(&endpoint.address) {
                notified += 1;
            }
        }
        notified
    }

    /// Spawns a task that runs [`browsing_complete`](Self::browsing_complete)
    /// once the browse signal fires.
    pub fn wait_for_network(self: &Arc<Self>) -> JoinHandle<()>
    where
        N: 'static,
    {
        tracing::debug!("Browsing device network");
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.signal.wait().await;
            coordinator.browsing_complete().await;
        })
    }

    // =========================================================================
    // Device discovery
    // =========================================================================

    /// Reports every device currently on the network.
    ///
    /// Returns the number of discovery results emitted.
    pub async fn start_device_discovery(&self) -> usize {
        let mut emitted = 0;
        for endpoint in &self.network.endpoints() {
            if self.report_device(endpoint).await {
                emitted += 1;
            }
        }
        emitted
    }

    /// Reports a device that joined the network after the initial browse.
    ///
    /// Returns `true` if a discovery result was emitted.
    pub async fn device_added(&self, endpoint: &Endpoint) -> bool {
        tracing::debug!(
            address = %endpoint.address,
            device_type = %endpoint.device_type,
            "Device added"
        );
        self.report_device(endpoint).await
    }

    /// Builds the `manufacturer:model` description of the device at
    /// `address` from its basic cluster.
    ///
    /// The model is only consulted when the manufacturer is known. Read
    /// errors are logged and treated as a missing attribute.
    pub async fn describe_device(&self, address: &str) -> Option<String> {
        let manufacturer = self.read_basic(address, MANUFACTURER_ATTRIBUTE).await?;
        match self.read_basic(address, MODEL_ATTRIBUTE).await {
            Some(model) => Some(format!("{manufacturer}:{model}")),
            None => Some(manufacturer),
        }
    }

    async fn read_basic(&self, address: &str, attribute: u16) -> Option<String> {
        match self
            .network
            .read_attribute(address, BASIC_CLUSTER, attribute)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(%address, attribute, error = %e, "Attribute read failed");
                None
            }
        }
    }

    async fn report_device(&self, endpoint: &Endpoint) -> bool {
        let Some(discovery) = &self.discovery else {
            return false;
        };

        let description = self.describe_device(&endpoint.address).await;
        let result =
            DiscoveryResult::for_device(endpoint, description.as_deref(), &discovery.bridge_uid);
        if discovery.sink.send(result).await.is_err() {
            tracing::debug!(bridge = %discovery.bridge_uid, "Discovery sink closed");
            return false;
        }
        true
    }

    // =========================================================================
    // Light control
    // =========================================================================

    /// Switches the light at `address` on or off.
    ///
    /// Returns `Ok(false)` if the address is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the command fails.
    pub async fn light_power(&self, address: &str, state: OnOff) -> Result<bool, NetworkError> {
        self.send_to_light(address, DeviceCommand::Power(state)).await
    }

    /// Moves the light at `address` to `percent` brightness.
    ///
    /// Returns `Ok(false)` if the address is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the command fails.
    pub async fn light_brightness(&self, address: &str, percent: u8) -> Result<bool, NetworkError> {
        let command = DeviceCommand::MoveToLevel {
            level: level_for_percent(percent),
            transition: DEFAULT_TRANSITION,
        };
        self.send_to_light(address, command).await
    }

    /// Moves the light at `address` to `color`.
    ///
    /// Returns `Ok(false)` if the address is unknown or the light has no
    /// color control.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError`] if the command fails.
    pub async fn light_color(&self, address: &str, color: HsbValue) -> Result<bool, NetworkError> {
        let (x, y) = color.to_cie_xy();
        let command = DeviceCommand::MoveToColor {
            x: scale_chromaticity(x),
            y: scale_chromaticity(y),
            transition: DEFAULT_TRANSITION,
        };
        self.send_to_light(address, command).await
    }

    async fn send_to_light(
        &self,
        address: &str,
        command: DeviceCommand,
    ) -> Result<bool, NetworkError> {
        if !self.network.contains(address) {
            tracing::debug!(%address, "No device with that address");
            return Ok(false);
        }

        match self.network.send(address, command).await {
            Ok(()) => Ok(true),
            Err(NetworkError::UnsupportedCapability { capability, .. }) => {
                tracing::debug!(%address, capability, "Device does not support command");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl<N> std::fmt::Debug for NetworkCoordinator<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkCoordinator")
            .field("listeners", &self.listeners.read().len())
            .field("online", &self.online.load(Ordering::Relaxed))
            .field("discovery", &self.discovery.is_some())
            .finish_non_exhaustive()
    }
}

/// Maps a percentage to a level-control level.
#[must_use]
pub fn level_for_percent(percent: u8) -> u8 {
    let level = (u32::from(percent) * 256 / 100).min(u32::from(MAX_LEVEL));
    u8::try_from(level).unwrap_or(MAX_LEVEL)
}

/// Scales a CIE chromaticity coordinate to the cluster's fixed-point range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_chromaticity(value: f64) -> u16 {
    (value * 65536.0).clamp(0.0, f64::from(MAX_CHROMATICITY)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;

    #[derive(Default)]
    struct FakeNetwork {
        endpoints: Vec<Endpoint>,
        no_color: Vec<String>,
        failing: bool,
        attributes: HashMap<(String, u16), String>,
        sent: Mutex<Vec<(String, DeviceCommand)>>,
    }

    impl FakeNetwork {
        fn with_endpoints(addresses: &[&str]) -> Self {
            Self {
                endpoints: addresses
                    .iter()
                    .map(|a| Endpoint::new(*a, "ColorDimmableLight"))
                    .collect(),
                ..Self::default()
            }
        }

        fn with_attribute(mut self, address: &str, attribute: u16, value: &str) -> Self {
            self.attributes
                .insert((address.to_string(), attribute), value.to_string());
            self
        }
    }

    impl DeviceNetwork for FakeNetwork {
        fn endpoints(&self) -> Vec<Endpoint> {
            self.endpoints.clone()
        }

        fn contains(&self, address: &str) -> bool {
            self.endpoints.iter().any(|e| e.address == address)
        }

        async fn send(&self, address: &str, command: DeviceCommand) -> Result<(), NetworkError> {
            if self.failing {
                return Err(NetworkError::CommandFailed {
                    address: address.to_string(),
                    message: "timeout".to_string(),
                });
            }
            if matches!(command, DeviceCommand::MoveToColor { .. })
                && self.no_color.iter().any(|a| a == address)
            {
                return Err(NetworkError::UnsupportedCapability {
                    address: address.to_string(),
                    capability: "color control",
                });
            }
            self.sent.lock().push((address.to_string(), command));
            Ok(())
        }

        async fn read_attribute(
            &self,
            address: &str,
            cluster: u16,
            attribute: u16,
        ) -> Result<Option<String>, NetworkError> {
            if self.failing {
                return Err(NetworkError::CommandFailed {
                    address: address.to_string(),
                    message: "timeout".to_string(),
                });
            }
            if cluster != BASIC_CLUSTER {
                return Ok(None);
            }
            Ok(self
                .attributes
                .get(&(address.to_string(), attribute))
                .cloned())
        }
    }

    fn counter_listener() -> (EndpointListener, Arc<AtomicU32>) {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);
        let listener: EndpointListener = Arc::new(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        (listener, counter)
    }

    #[test]
    fn level_scaling() {
        assert_eq!(level_for_percent(0), 0);
        assert_eq!(level_for_percent(50), 128);
        assert_eq!(level_for_percent(99), 253);
        assert_eq!(level_for_percent(100), 254);
        assert_eq!(level_for_percent(255), 254);
    }

    #[test]
    fn chromaticity_scaling() {
        assert_eq!(scale_chromaticity(0.0), 0);
        assert_eq!(scale_chromaticity(0.5), 32768);
        assert_eq!(scale_chromaticity(1.0), MAX_CHROMATICITY);
        assert_eq!(scale_chromaticity(-0.1), 0);
    }

    #[tokio::test]
    async fn browsing_complete_notifies_known_endpoints() {
        let coordinator = NetworkCoordinator::new(FakeNetwork::with_endpoints(&["a", "b"]));
        let (known, known_count) = counter_listener();
        let (unknown, unknown_count) = counter_listener();
        coordinator.subscribe_endpoint("a", known);
        coordinator.subscribe_endpoint("zz", unknown);

        assert_eq!(coordinator.status(), NetworkStatus::Offline);
        assert_eq!(coordinator.browsing_complete().await, 1);

        assert_eq!(coordinator.status(), NetworkStatus::Online);
        assert_eq!(known_count.load(Ordering::SeqCst), 1);
        assert_eq!(unknown_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_is_replaced_per_endpoint() {
        let coordinator = NetworkCoordinator::new(FakeNetwork::with_endpoints(&["a"]));
        let (first, first_count) = counter_listener();
        let (second, second_count) = counter_listener();

        coordinator.subscribe_endpoint("a", first);
        coordinator.subscribe_endpoint("a", second);
        coordinator.notify_endpoint("a");

        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);

        assert!(coordinator.unsubscribe_endpoint("a"));
        assert!(!coordinator.notify_endpoint("a"));
    }

    #[tokio::test]
    async fn wait_for_network_runs_after_signal() {
        let coordinator = Arc::new(NetworkCoordinator::new(FakeNetwork::with_endpoints(&["a"])));
        let (listener, count) = counter_listener();
        coordinator.subscribe_endpoint("a", listener);

        let waiter = coordinator.wait_for_network();
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.status(), NetworkStatus::Offline);

        coordinator.browse_signal().complete();
        waiter.await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.status(), NetworkStatus::Online);
    }

    #[tokio::test]
    async fn light_commands_reach_the_device() {
        let coordinator = NetworkCoordinator::new(FakeNetwork::with_endpoints(&["lamp"]));

        assert!(coordinator.light_power("lamp", OnOff::On).await.unwrap());
        assert!(coordinator.light_brightness("lamp", 100).await.unwrap());
        assert!(
            coordinator
                .light_color("lamp", HsbValue::new(0, 100, 100).unwrap())
                .await
                .unwrap()
        );

        let sent = coordinator.network().sent.lock().clone();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].1, DeviceCommand::Power(OnOff::On));
        assert_eq!(
            sent[1].1,
            DeviceCommand::MoveToLevel {
                level: 254,
                transition: DEFAULT_TRANSITION,
            }
        );
        let DeviceCommand::MoveToColor { x, y, transition } = sent[2].1 else {
            panic!("expected a color move, got {:?}", sent[2].1);
        };
        // Pure red sits near (0.64, 0.33)
        assert!((41_000..=42_500).contains(&x), "x = {x}");
        assert!((21_000..=22_000).contains(&y), "y = {y}");
        assert_eq!(transition, DEFAULT_TRANSITION);
    }

    #[tokio::test]
    async fn unknown_address_is_not_an_error() {
        let coordinator = NetworkCoordinator::new(FakeNetwork::with_endpoints(&["lamp"]));
        assert!(!coordinator.light_power("ghost", OnOff::Off).await.unwrap());
        assert!(coordinator.network().sent.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_color_cluster_returns_false() {
        let mut network = FakeNetwork::with_endpoints(&["plain"]);
        network.no_color.push("plain".to_string());
        let coordinator = NetworkCoordinator::new(network);

        let sent = coordinator
            .light_color("plain", HsbValue::new(120, 100, 100).unwrap())
            .await
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn send_failure_propagates() {
        let mut network = FakeNetwork::with_endpoints(&["lamp"]);
        network.failing = true;
        let coordinator = NetworkCoordinator::new(network);

        let err = coordinator.light_power("lamp", OnOff::On).await.unwrap_err();
        assert!(matches!(err, NetworkError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn browsing_complete_reports_devices_with_description() {
        let network = FakeNetwork::with_endpoints(&["a", "b"])
            .with_attribute("a", MANUFACTURER_ATTRIBUTE, "Philips")
            .with_attribute("a", MODEL_ATTRIBUTE, "LCT001");
        let (tx, mut rx) = mpsc::channel(8);
        let coordinator = NetworkCoordinator::new(network).with_discovery(tx, "zigbee:coordinator");

        coordinator.browsing_complete().await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.property("address"), Some("a"));
        assert_eq!(first.property("description"), Some("Philips:LCT001"));
        assert_eq!(first.bridge_uid, "zigbee:coordinator");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.property("address"), Some("b"));
        assert_eq!(second.property("description"), None);
    }

    #[tokio::test]
    async fn description_needs_a_manufacturer() {
        let network = FakeNetwork::with_endpoints(&["a", "b"])
            .with_attribute("a", MANUFACTURER_ATTRIBUTE, "IKEA")
            .with_attribute("b", MODEL_ATTRIBUTE, "orphan-model");
        let coordinator = NetworkCoordinator::new(network);

        assert_eq!(coordinator.describe_device("a").await.as_deref(), Some("IKEA"));
        assert_eq!(coordinator.describe_device("b").await, None);
    }

    #[tokio::test]
    async fn read_failure_leaves_device_undescribed() {
        let mut network = FakeNetwork::with_endpoints(&["a"]);
        network.failing = true;
        let (tx, mut rx) = mpsc::channel(8);
        let coordinator = NetworkCoordinator::new(network).with_discovery(tx, "zigbee:coordinator");

        assert_eq!(coordinator.start_device_discovery().await, 1);
        assert_eq!(rx.recv().await.unwrap().property("description"), None);
    }

    #[tokio::test]
    async fn device_added_emits_one_result() {
        let (tx, mut rx) = mpsc::channel(8);
        let coordinator =
            NetworkCoordinator::new(FakeNetwork::default()).with_discovery(tx, "zigbee:coordinator");
        let endpoint = Endpoint::new("00:17:88:01:00:bd:4c:1a/11", "OnOffLight");

        assert!(coordinator.device_added(&endpoint).await);
        let result = rx.recv().await.unwrap();
        assert_eq!(result.thing_uid, "device:00:17:88:01:00:bd:4c:1a/11");
        assert_eq!(result.label, "OnOffLight");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn device_added_without_sink_reports_nothing() {
        let coordinator = NetworkCoordinator::new(FakeNetwork::default());
        assert!(!coordinator.device_added(&Endpoint::new("a", "OnOffLight")).await);
    }

    fn spawn_power<N: DeviceNetwork + 'static>(
        coordinator: Arc<NetworkCoordinator<N>>,
        address: &'static str,
    ) -> JoinHandle<Result<bool, NetworkError>> {
        tokio::spawn(async move { coordinator.light_power(address, OnOff::On).await })
    }

    #[tokio::test]
    async fn light_commands_run_on_spawned_tasks() {
        let coordinator = Arc::new(NetworkCoordinator::new(FakeNetwork::with_endpoints(&["lamp"])));

        assert!(spawn_power(Arc::clone(&coordinator), "lamp").await.unwrap().unwrap());
        assert_eq!(coordinator.network().sent.lock().len(), 1);
    }
}
