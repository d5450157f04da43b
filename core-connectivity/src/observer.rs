//! Observer task and status bookkeeping

use bridge_traits::network::{NetworkMonitor, NetworkStatus};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_outbox::OfflineActionQueue;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::event::ConnectivityEvent;

/// Broadcast buffer; a lagging subscriber misses old events, never new ones
const EVENT_BUFFER: usize = 32;

#[derive(Debug)]
struct ObserverState {
    status: NetworkStatus,
    last_sync: Option<DateTime<Utc>>,
}

/// Connectivity watcher driving queue replay.
///
/// Holds the last observed status, a timestamp of the last completed replay
/// pass, and a broadcast channel of [`ConnectivityEvent`]s. The background
/// task runs until [`shutdown`](Self::shutdown) or drop.
pub struct ConnectivityObserver {
    state: Arc<RwLock<ObserverState>>,
    events: broadcast::Sender<ConnectivityEvent>,
    task: JoinHandle<()>,
}

impl ConnectivityObserver {
    /// Read the initial status from the monitor and start watching.
    ///
    /// When the process starts online with actions left over from a previous
    /// run, a catch-up drain runs immediately; afterwards drains happen
    /// exactly on the offline-to-online transition.
    pub async fn start(
        monitor: Arc<dyn NetworkMonitor>,
        queue: Arc<OfflineActionQueue>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let initial = monitor.current_status().await;
        let stream = monitor.subscribe_changes().await?;

        let state = Arc::new(RwLock::new(ObserverState {
            status: initial,
            last_sync: None,
        }));
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        info!(status = ?initial, "Connectivity observer started");

        if initial.is_connected() {
            Self::drain(&queue, &clock, &state, &events).await;
        }

        let task = tokio::spawn(Self::watch(
            stream,
            queue,
            clock,
            Arc::clone(&state),
            events.clone(),
        ));

        Ok(Self {
            state,
            events,
            task,
        })
    }

    /// Last observed connectivity status.
    pub async fn status(&self) -> NetworkStatus {
        self.state.read().await.status
    }

    pub async fn is_online(&self) -> bool {
        self.status().await.is_connected()
    }

    /// When the last replay pass completed, if one has.
    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_sync
    }

    /// Subscribe to connectivity events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.events.subscribe()
    }

    /// Stop the background task.
    pub fn shutdown(&self) {
        self.task.abort();
    }

    async fn watch(
        mut stream: Box<dyn bridge_traits::network::NetworkChangeStream>,
        queue: Arc<OfflineActionQueue>,
        clock: Arc<dyn Clock>,
        state: Arc<RwLock<ObserverState>>,
        events: broadcast::Sender<ConnectivityEvent>,
    ) {
        while let Some(status) = stream.next().await {
            let previous = {
                let mut state = state.write().await;
                let previous = state.status;
                state.status = status;
                previous
            };
            if previous == status {
                continue;
            }

            let at = clock.now();
            match status {
                NetworkStatus::Connected => {
                    info!("Connectivity restored");
                    events.send(ConnectivityEvent::Online { at }).ok();
                    Self::drain(&queue, &clock, &state, &events).await;
                }
                NetworkStatus::Disconnected => {
                    info!("Connectivity lost");
                    events.send(ConnectivityEvent::Offline { at }).ok();
                }
            }
        }
        debug!("Network change stream closed, observer stopping");
    }

    async fn drain(
        queue: &OfflineActionQueue,
        clock: &Arc<dyn Clock>,
        state: &Arc<RwLock<ObserverState>>,
        events: &broadcast::Sender<ConnectivityEvent>,
    ) {
        match queue.drain().await {
            Ok(report) => {
                let at = clock.now();
                state.write().await.last_sync = Some(at);
                events
                    .send(ConnectivityEvent::DrainCompleted {
                        replayed: report.replayed,
                        dropped: report.dropped,
                        retained: report.retained,
                        at,
                    })
                    .ok();
            }
            Err(e) => {
                // Pending actions stay queued for the next transition
                warn!(error = %e, "Replay pass failed");
            }
        }
    }
}

impl Drop for ConnectivityObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
