// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery results, and scene discovery for a shade hub.
//!
//! A [`SceneDiscovery`] asks a [`SceneSource`] (the hub's web API) for its
//! scenes and emits one [`DiscoveryResult`] per scene into an mpsc sink.
//! Scans run on demand or on a fixed-rate background schedule. Device
//! networks report their devices through the same result type.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use item_bridge::discovery::{SceneDiscovery, SceneSource};
//!
//! async fn discover<S: SceneSource + 'static>(hub: S) {
//!     let (tx, mut rx) = tokio::sync::mpsc::channel(32);
//!     let discovery = SceneDiscovery::new(hub, "hub:living_room", tx);
//!
//!     discovery.start_background(Duration::from_secs(60));
//!     while let Some(result) = rx.recv().await {
//!         println!("Found {} ({})", result.label, result.thing_uid);
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::NetworkError;
use crate::network::Endpoint;

/// Default period between background scans.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Property key carrying the scene id on a discovery result.
pub const SCENE_ID_PROPERTY: &str = "id";

/// Property key carrying a device's network address.
pub const DEVICE_ADDRESS_PROPERTY: &str = "address";

/// Property key carrying a device's `manufacturer:model` description.
pub const DEVICE_DESCRIPTION_PROPERTY: &str = "description";

/// A scene stored on the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Hub-assigned scene id.
    pub id: i32,
    /// Display name.
    pub name: String,
}

/// Scene list as returned by the hub.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenes {
    /// The scenes, in hub order.
    #[serde(rename = "sceneData", default)]
    pub scene_data: Vec<Scene>,
}

impl Scenes {
    /// Parses a hub scene list.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Hub`] if the body is not a valid scene list.
    pub fn from_json(body: &str) -> Result<Self, NetworkError> {
        serde_json::from_str(body).map_err(|e| NetworkError::Hub(e.to_string()))
    }
}

/// A thing found by a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    /// Unique id of the discovered thing, `scene:<id>` or `device:<address>`.
    pub thing_uid: String,
    /// Display label.
    pub label: String,
    /// Configuration properties for the thing.
    pub properties: BTreeMap<String, String>,
    /// Uid of the bridge the thing belongs to.
    pub bridge_uid: String,
    /// When the thing was seen.
    pub timestamp: DateTime<Utc>,
}

impl DiscoveryResult {
    /// Builds the result for `scene` behind `bridge_uid`.
    #[must_use]
    pub fn for_scene(scene: &Scene, bridge_uid: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(SCENE_ID_PROPERTY.to_string(), scene.id.to_string());

        Self {
            thing_uid: format!("scene:{}", scene.id),
            label: scene.name.clone(),
            properties,
            bridge_uid: bridge_uid.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Builds the result for a device endpoint behind `bridge_uid`.
    ///
    /// The description is only recorded when the device provided one.
    #[must_use]
    pub fn for_device(endpoint: &Endpoint, description: Option<&str>, bridge_uid: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(
            DEVICE_ADDRESS_PROPERTY.to_string(),
            endpoint.address.clone(),
        );
        if let Some(description) = description {
            properties.insert(
                DEVICE_DESCRIPTION_PROPERTY.to_string(),
                description.to_string(),
            );
        }

        Self {
            thing_uid: format!("device:{}", endpoint.address),
            label: endpoint.device_type.clone(),
            properties,
            bridge_uid: bridge_uid.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Source of hub scenes.
pub trait SceneSource: Send + Sync {
    /// Fetches the hub's current scene list.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] when the hub cannot be reached or answers
    /// with something that is not a scene list.
    fn scenes(&self) -> impl Future<Output = Result<Scenes, NetworkError>> + Send;
}

struct Scanner<S> {
    source: Arc<S>,
    bridge_uid: String,
    sink: mpsc::Sender<DiscoveryResult>,
}

impl<S> Clone for Scanner<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            bridge_uid: self.bridge_uid.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<S: SceneSource> Scanner<S> {
    async fn scan(&self) -> usize {
        let scenes = match self.source.scenes().await {
            Ok(scenes) => scenes,
            Err(e) => {
                tracing::error!(bridge = %self.bridge_uid, error = %e, "Scene scan failed");
                return 0;
            }
        };

        let mut emitted = 0;
        for scene in &scenes.scene_data {
            let result = DiscoveryResult::for_scene(scene, &self.bridge_uid);
            if self.sink.send(result).await.is_err() {
                tracing::debug!(bridge = %self.bridge_uid, "Discovery sink closed");
                break;
            }
            emitted += 1;
        }

        tracing::debug!(bridge = %self.bridge_uid, emitted, "Scene scan completed");
        emitted
    }
}

/// Discovers hub scenes, once or periodically.
///
/// Dropping the discovery stops any background scanning.
pub struct SceneDiscovery<S> {
    scanner: Scanner<S>,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl<S: SceneSource + 'static> SceneDiscovery<S> {
    /// Creates a discovery for the hub `bridge_uid` that reports into `sink`.
    #[must_use]
    pub fn new(
        source: S,
        bridge_uid: impl Into<String>,
        sink: mpsc::Sender<DiscoveryResult>,
    ) -> Self {
        Self {
            scanner: Scanner {
                source: Arc::new(source),
                bridge_uid: bridge_uid.into(),
                sink,
            },
            background: Mutex::new(None),
        }
    }

    /// Returns the scene source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.scanner.source
    }

    /// Runs one scan and returns how many results were emitted.
    ///
    /// A source error is logged and ends the scan with nothing emitted.
    pub async fn scan(&self) -> usize {
        self.scanner.scan().await
    }

    /// Starts scanning every `interval`, beginning immediately.
    ///
    /// A background scan that is already running is cancelled first. A zero
    /// `interval` is replaced by [`DEFAULT_SCAN_INTERVAL`].
    pub fn start_background(&self, interval: Duration) {
        let interval = if interval.is_zero() {
            tracing::warn!(
                bridge = %self.scanner.bridge_uid,
                "Zero scan interval, using the default"
            );
            DEFAULT_SCAN_INTERVAL
        } else {
            interval
        };
        let scanner = self.scanner.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                scanner.scan().await;
                if scanner.sink.is_closed() {
                    break;
                }
            }
        });

        if let Some(previous) = self.background.lock().replace(task) {
            previous.abort();
        }
        tracing::debug!(
            bridge = %self.scanner.bridge_uid,
            ?interval,
            "Started background scene discovery"
        );
    }

    /// Stops background scanning. Returns `true` if a scan schedule was
    /// running.
    pub fn stop_background(&self) -> bool {
        match self.background.lock().take() {
            Some(task) => {
                task.abort();
                tracing::debug!(
                    bridge = %self.scanner.bridge_uid,
                    "Stopped background scene discovery"
                );
                true
            }
            None => false,
        }
    }

    /// Returns `true` while a background schedule is active.
    #[must_use]
    pub fn is_background_running(&self) -> bool {
        self.background
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<S> Drop for SceneDiscovery<S> {
    fn drop(&mut self) {
        if let Some(task) = self.background.get_mut().take() {
            task.abort();
        }
    }
}

impl<S> std::fmt::Debug for SceneDiscovery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDiscovery")
            .field("bridge_uid", &self.scanner.bridge_uid)
            .finish_non_exhaustive()
    }
}
