// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot completion signal for the initial network browse.

use std::sync::Arc;

use tokio::sync::watch;

/// Completion flag raised once the device network finished its initial
/// browse.
///
/// Clones share the same flag. Completing is idempotent; waiters that arrive
/// after completion return immediately.
///
/// # Examples
///
/// ```
/// use item_bridge::network::BrowseSignal;
///
/// #[tokio::main]
/// async fn main() {
///     let signal = BrowseSignal::new();
///     let waiter = signal.clone();
///
///     signal.complete();
///     waiter.wait().await;
///     assert!(waiter.is_complete());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BrowseSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl BrowseSignal {
    /// Creates an incomplete signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Marks the browse as complete and wakes every waiter.
    pub fn complete(&self) {
        self.sender.send_replace(true);
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        *self.sender.borrow()
    }

    /// Waits until the browse is complete.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let _ = receiver.wait_for(|complete| *complete).await;
    }
}

impl Default for BrowseSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_incomplete() {
        assert!(!BrowseSignal::new().is_complete());
    }

    #[test]
    fn complete_is_shared_by_clones() {
        let signal = BrowseSignal::new();
        let clone = signal.clone();

        clone.complete();
        clone.complete();
        assert!(signal.is_complete());
    }

    #[tokio::test]
    async fn wait_returns_after_completion() {
        let signal = BrowseSignal::new();
        signal.complete();

        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .expect("wait should return immediately");
    }

    #[tokio::test]
    async fn wait_wakes_on_completion() {
        let signal = BrowseSignal::new();
        let waiter = signal.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        signal.complete();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
