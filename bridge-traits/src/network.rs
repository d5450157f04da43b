//! Network Monitoring Abstraction
//!
//! Provides two-state connectivity information. No intermediate or "flaky"
//! state is modeled: a single monitor event defines each transition, and the
//! offline-to-online transition is what triggers queue draining.

use async_trait::async_trait;

use crate::error::Result;

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to a network
    Connected,
    /// Not connected to any network
    Disconnected,
}

impl NetworkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Network monitor trait
///
/// Provides connectivity information to allow the core to:
/// - Serve cached responses when offline
/// - Queue mutations locally and replay them on reconnect
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn should_replay(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.current_status().await.is_connected()
/// }
/// ```
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get the current connectivity status
    async fn current_status(&self) -> NetworkStatus;

    /// Subscribe to connectivity changes
    ///
    /// Implementations should emit a status only when it differs from the
    /// previously emitted one.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of connectivity changes
#[async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next status change
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkStatus>;
}
