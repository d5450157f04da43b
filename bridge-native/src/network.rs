//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkMonitor, NetworkStatus},
};
use std::time::Duration;
use tracing::debug;

/// Network monitor that probes a well-known TCP endpoint
///
/// A platform integration with real connectivity events (netlink,
/// SystemConfiguration, browser online/offline) can replace this; the probe
/// keeps the native build dependency-free.
pub struct ProbeNetworkMonitor {
    probe_addr: String,
    probe_timeout: Duration,
    poll_interval: Duration,
}

impl ProbeNetworkMonitor {
    /// Create a monitor probing a public DNS resolver
    pub fn new() -> Self {
        Self {
            probe_addr: "8.8.8.8:53".to_string(),
            probe_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Create a monitor probing a custom address
    pub fn with_probe_addr(probe_addr: impl Into<String>) -> Self {
        Self {
            probe_addr: probe_addr.into(),
            ..Self::new()
        }
    }

    /// Set how often the change stream re-probes
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn probe(&self) -> NetworkStatus {
        match tokio::time::timeout(
            self.probe_timeout,
            tokio::net::TcpStream::connect(&self.probe_addr),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) | Err(_) => NetworkStatus::Disconnected,
        }
    }

    fn clone_config(&self) -> Self {
        Self {
            probe_addr: self.probe_addr.clone(),
            probe_timeout: self.probe_timeout,
            poll_interval: self.poll_interval,
        }
    }
}

impl Default for ProbeNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for ProbeNetworkMonitor {
    async fn current_status(&self) -> NetworkStatus {
        let status = self.probe().await;
        debug!(status = ?status, addr = %self.probe_addr, "Network probe");
        status
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(ProbeChangeStream {
            monitor: self.clone_config(),
            last_status: None,
        }))
    }
}

/// Change stream that polls the probe and emits only on transitions
struct ProbeChangeStream {
    monitor: ProbeNetworkMonitor,
    last_status: Option<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for ProbeChangeStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        loop {
            tokio::time::sleep(self.monitor.poll_interval).await;

            let status = self.monitor.probe().await;
            if self.last_status != Some(status) {
                self.last_status = Some(status);
                return Some(status);
            }
        }
    }
}
