//! Queue persistence and replay
//!
//! The whole queue lives as one JSON array under a single storage key and is
//! rewritten atomically per mutation. Replay walks the array front to back so
//! actions reach the backend in the order the user performed them.

use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::action::{ActionId, ActionType, QueuedAction};
use crate::config::OutboxConfig;
use crate::error::{OutboxError, Result};

/// Storage key holding the pending-action array
const QUEUE_KEY: &str = "outbox:pending";

/// Outcome of enqueueing one action.
///
/// Capture never fails: when the backing store rejects the write the action
/// is lost, and `persisted` tells the caller so the UI can say so.
#[derive(Debug, Clone, Copy)]
pub struct EnqueueReceipt {
    pub id: ActionId,
    pub persisted: bool,
}

/// Summary of one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Actions acknowledged by the backend and removed
    pub replayed: usize,
    /// Actions discarded as unreplayable or over the attempt cap
    pub dropped: usize,
    /// Actions kept for the next pass after a transient failure
    pub retained: usize,
}

enum ReplayOutcome {
    Delivered,
    Poison(String),
    Transient(String),
}

/// Durable FIFO queue of deferred user actions.
pub struct OfflineActionQueue {
    config: OutboxConfig,
    store: Arc<dyn KeyValueStore>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    /// Single-flight guard for replay passes
    drain_lock: Mutex<()>,
    /// Guards every read-modify-write of the stored array, so a capture
    /// landing while a drain is replaying survives the drain's rewrite
    write_lock: Mutex<()>,
}

impl OfflineActionQueue {
    /// Create a new queue.
    ///
    /// Fails only on invalid configuration.
    pub fn new(
        config: OutboxConfig,
        store: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            http,
            clock,
            drain_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
        })
    }

    /// Capture an action at the back of the queue.
    ///
    /// Never returns an error: a failed persist is reported through the
    /// receipt's `persisted` flag instead.
    #[instrument(skip(self, payload), fields(action_type = %action_type))]
    pub async fn enqueue(
        &self,
        action_type: ActionType,
        payload: serde_json::Value,
    ) -> EnqueueReceipt {
        let action = QueuedAction::new(action_type, payload, self.clock.now());
        let id = action.id;

        let _guard = self.write_lock.lock().await;
        let mut pending = match self.load().await {
            Ok(pending) => pending,
            Err(e) => {
                // Leave the stored array alone; rewriting from an empty
                // snapshot would wipe everything already pending
                warn!(id = %id, error = %e, "Could not load queue, action not persisted");
                return EnqueueReceipt {
                    id,
                    persisted: false,
                };
            }
        };
        pending.push(action);

        let persisted = match self.persist(&pending).await {
            Ok(()) => {
                debug!(id = %id, pending = pending.len(), "Captured action");
                true
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to persist captured action");
                false
            }
        };

        EnqueueReceipt { id, persisted }
    }

    /// Pending actions in capture order.
    pub async fn list(&self) -> Result<Vec<QueuedAction>> {
        self.load().await
    }

    /// Number of pending actions.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Replay pending actions front to back.
    ///
    /// Only one drain runs at a time; a concurrent call waits and then
    /// operates on whatever the first pass left behind. Each action is
    /// posted to its type's endpoint: acknowledged actions are removed,
    /// permanently rejected ones are dropped, transient failures are
    /// retained in order for the next pass. Actions captured while the pass
    /// was replaying are merged into the final rewrite, behind the retained
    /// ones, and replay on the next pass.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> Result<DrainReport> {
        let _flight = self.drain_lock.lock().await;

        let pending = self.load().await?;
        if pending.is_empty() {
            return Ok(DrainReport::default());
        }
        let snapshot: HashSet<ActionId> = pending.iter().map(|a| a.id).collect();

        let mut report = DrainReport::default();
        let mut retained = Vec::new();

        for mut action in pending {
            match self.replay_one(&action).await {
                ReplayOutcome::Delivered => {
                    debug!(id = %action.id, action_type = %action.action_type, "Action replayed");
                    report.replayed += 1;
                }
                ReplayOutcome::Poison(reason) => {
                    warn!(id = %action.id, action_type = %action.action_type, reason, "Dropping rejected action");
                    report.dropped += 1;
                }
                ReplayOutcome::Transient(reason) => {
                    action.attempts += 1;
                    if action.attempts >= self.config.max_replay_attempts {
                        warn!(
                            id = %action.id,
                            attempts = action.attempts,
                            reason,
                            "Giving up on action after repeated failures"
                        );
                        report.dropped += 1;
                    } else {
                        debug!(id = %action.id, attempts = action.attempts, reason, "Retaining action");
                        retained.push(action);
                    }
                }
            }
        }

        report.retained = retained.len();

        // The final rewrite must not clobber captures that landed during the
        // replays above; everything not in the start-of-pass snapshot is
        // appended behind the retained actions, preserving capture order
        {
            let _guard = self.write_lock.lock().await;
            let mut next = retained;
            let captured_mid_drain = self
                .load()
                .await?
                .into_iter()
                .filter(|a| !snapshot.contains(&a.id));
            next.extend(captured_mid_drain);
            self.persist(&next).await?;
        }

        info!(
            replayed = report.replayed,
            dropped = report.dropped,
            retained = report.retained,
            "Drain complete"
        );
        Ok(report)
    }

    /// Discard every pending action.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete(QUEUE_KEY).await?;
        Ok(())
    }

    // --- plumbing ---

    async fn load(&self) -> Result<Vec<QueuedAction>> {
        let Some(raw) = self.store.get(QUEUE_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&raw) {
            Ok(pending) => Ok(pending),
            Err(e) => {
                warn!(error = %e, "Dropping unreadable queue");
                self.store.delete(QUEUE_KEY).await.ok();
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, pending: &[QueuedAction]) -> Result<()> {
        if pending.is_empty() {
            self.store.delete(QUEUE_KEY).await?;
            return Ok(());
        }
        let bytes = serde_json::to_vec(pending)
            .map_err(|e| OutboxError::Storage(format!("queue serialization failed: {}", e)))?;
        self.store.put(QUEUE_KEY, Bytes::from(bytes)).await?;
        Ok(())
    }

    /// One replay attempt for one action.
    ///
    /// 2xx acknowledges the action. Other 4xx means the backend will never
    /// accept it, except 408 and 429 which are transient by definition.
    /// Everything else, including transport errors and timeout expiry, is
    /// transient.
    async fn replay_one(&self, action: &QueuedAction) -> ReplayOutcome {
        let endpoint = self.config.endpoint(action.action_type);
        let request = match HttpRequest::post(endpoint).json(&action.payload) {
            Ok(request) => request,
            Err(e) => return ReplayOutcome::Poison(format!("unserializable payload: {}", e)),
        };

        match timeout(self.config.replay_timeout, self.http.execute(request)).await {
            Ok(Ok(response)) if response.is_success() => ReplayOutcome::Delivered,
            Ok(Ok(response)) if response.status == 408 || response.status == 429 => {
                ReplayOutcome::Transient(format!("status {}", response.status))
            }
            Ok(Ok(response)) if response.is_client_error() => {
                ReplayOutcome::Poison(format!("status {}", response.status))
            }
            Ok(Ok(response)) => ReplayOutcome::Transient(format!("status {}", response.status)),
            Ok(Err(e)) => ReplayOutcome::Transient(e.to_string()),
            Err(_) => ReplayOutcome::Transient("request timed out".to_string()),
        }
    }
}
