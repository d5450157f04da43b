//! Replay behavior tests
//!
//! Drive the queue with a scripted HTTP backend and verify ordering,
//! retention, and the poison-action policy.

use bridge_native::MemoryKeyValueStore;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::{Clock, ManualClock};
use bytes::Bytes;
use chrono::Utc;
use core_outbox::{ActionType, DrainReport, OfflineActionQueue, OutboxConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// Backend that records replayed payloads and answers with a scripted status
/// per request, falling back to 200 when the script runs out.
#[derive(Default)]
struct ScriptedBackend {
    statuses: Mutex<Vec<u16>>,
    received: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ScriptedBackend {
    fn with_statuses(statuses: Vec<u16>) -> Self {
        Self {
            statuses: Mutex::new(statuses),
            received: Mutex::new(Vec::new()),
        }
    }

    async fn received(&self) -> Vec<(String, serde_json::Value)> {
        self.received.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedBackend {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let status = {
            let mut statuses = self.statuses.lock().await;
            if statuses.is_empty() {
                200
            } else {
                statuses.remove(0)
            }
        };

        if status == 0 {
            return Err(BridgeError::Network("scripted transport error".to_string()));
        }

        let payload = request
            .body
            .as_ref()
            .map(|b| serde_json::from_slice(b).unwrap())
            .unwrap_or(serde_json::Value::Null);
        self.received.lock().await.push((request.url, payload));

        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        })
    }
}

fn queue(backend: Arc<ScriptedBackend>, config: OutboxConfig) -> OfflineActionQueue {
    OfflineActionQueue::new(
        config,
        Arc::new(MemoryKeyValueStore::new()) as Arc<dyn KeyValueStore>,
        backend as Arc<dyn HttpClient>,
        Arc::new(ManualClock::new(Utc::now())) as Arc<dyn Clock>,
    )
    .unwrap()
}

#[tokio::test]
async fn replay_preserves_capture_order_across_types() {
    let backend = Arc::new(ScriptedBackend::default());
    let q = queue(Arc::clone(&backend), OutboxConfig::default());

    q.enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 1}))
        .await;
    q.enqueue(ActionType::Progress, serde_json::json!({"surah": 2, "ayah": 5}))
        .await;
    q.enqueue(ActionType::Preference, serde_json::json!({"theme": "dark"}))
        .await;

    let report = q.drain().await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            replayed: 3,
            dropped: 0,
            retained: 0
        }
    );
    assert!(q.is_empty().await.unwrap());

    let received = backend.received().await;
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].0, "/api/bookmark");
    assert_eq!(received[0].1["content_id"], 1);
    assert_eq!(received[1].0, "/api/progress");
    assert_eq!(received[2].0, "/api/preferences");
}

#[tokio::test]
async fn transient_failure_retains_only_the_failed_action() {
    // Second request hits a 503; first and third succeed
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![200, 503, 200]));
    let q = queue(Arc::clone(&backend), OutboxConfig::default());

    q.enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 1}))
        .await;
    let failed = q
        .enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 2}))
        .await;
    q.enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 3}))
        .await;

    let report = q.drain().await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            replayed: 2,
            dropped: 0,
            retained: 1
        }
    );

    let pending = q.list().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, failed.id);
    assert_eq!(pending[0].attempts, 1);

    // Next pass, the backend recovered
    let report = q.drain().await.unwrap();
    assert_eq!(report.replayed, 1);
    assert!(q.is_empty().await.unwrap());
}

#[tokio::test]
async fn transport_errors_are_retained_like_server_errors() {
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![0]));
    let q = queue(Arc::clone(&backend), OutboxConfig::default());

    q.enqueue(ActionType::Progress, serde_json::json!({"surah": 1}))
        .await;
    let report = q.drain().await.unwrap();
    assert_eq!(report.retained, 1);
    assert_eq!(q.len().await.unwrap(), 1);
}

#[tokio::test]
async fn rejected_actions_are_dropped_not_retried() {
    // 400 means the backend will never accept this payload
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![400]));
    let q = queue(Arc::clone(&backend), OutboxConfig::default());

    q.enqueue(ActionType::Bookmark, serde_json::json!({"bad": true}))
        .await;
    let report = q.drain().await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            replayed: 0,
            dropped: 1,
            retained: 0
        }
    );
    assert!(q.is_empty().await.unwrap());
}

#[tokio::test]
async fn rate_limiting_is_treated_as_transient() {
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![429]));
    let q = queue(Arc::clone(&backend), OutboxConfig::default());

    q.enqueue(ActionType::Preference, serde_json::json!({"lang": "id"}))
        .await;
    let report = q.drain().await.unwrap();
    assert_eq!(report.retained, 1);
}

#[tokio::test]
async fn actions_over_the_attempt_cap_are_given_up_on() {
    let backend = Arc::new(ScriptedBackend::with_statuses(vec![503, 503]));
    let q = queue(
        Arc::clone(&backend),
        OutboxConfig::default().with_max_replay_attempts(2),
    );

    q.enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 9}))
        .await;

    let report = q.drain().await.unwrap();
    assert_eq!(report.retained, 1);

    let report = q.drain().await.unwrap();
    assert_eq!(report.dropped, 1);
    assert!(q.is_empty().await.unwrap());
}

/// Backend whose replies are held back until the test opens the gate,
/// keeping a drain pass in flight for as long as needed.
struct GatedBackend {
    started: Semaphore,
    gate: Semaphore,
}

impl GatedBackend {
    fn new() -> Self {
        Self {
            started: Semaphore::new(0),
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for GatedBackend {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.started.add_permits(1);
        self.gate.acquire().await.expect("gate closed").forget();
        Ok(HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::new(),
        })
    }
}

#[tokio::test]
async fn capture_during_drain_survives_the_final_rewrite() {
    let backend = Arc::new(GatedBackend::new());
    let q = Arc::new(
        OfflineActionQueue::new(
            OutboxConfig::default(),
            Arc::new(MemoryKeyValueStore::new()) as Arc<dyn KeyValueStore>,
            Arc::clone(&backend) as Arc<dyn HttpClient>,
            Arc::new(ManualClock::new(Utc::now())) as Arc<dyn Clock>,
        )
        .unwrap(),
    );

    q.enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 1}))
        .await;
    let drain = tokio::spawn({
        let q = Arc::clone(&q);
        async move { q.drain().await.unwrap() }
    });

    // The first action's replay is now in flight and blocked on the gate
    backend.started.acquire().await.unwrap().forget();
    let captured = q
        .enqueue(ActionType::Bookmark, serde_json::json!({"content_id": 2}))
        .await;
    assert!(captured.persisted);
    assert_eq!(q.len().await.unwrap(), 2);

    backend.gate.add_permits(1);
    let report = drain.await.unwrap();
    assert_eq!(
        report,
        DrainReport {
            replayed: 1,
            dropped: 0,
            retained: 0
        }
    );

    // The mid-drain capture was not clobbered by the drain's rewrite
    let pending = q.list().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, captured.id);

    // The next pass delivers it
    backend.gate.add_permits(1);
    let report = q.drain().await.unwrap();
    assert_eq!(report.replayed, 1);
    assert!(q.is_empty().await.unwrap());
}

#[tokio::test]
async fn queue_survives_across_instances_sharing_a_store() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let backend = Arc::new(ScriptedBackend::default());

    let writer = OfflineActionQueue::new(
        OutboxConfig::default(),
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        Arc::clone(&backend) as Arc<dyn HttpClient>,
        Arc::new(ManualClock::new(Utc::now())) as Arc<dyn Clock>,
    )
    .unwrap();
    writer
        .enqueue(ActionType::Progress, serde_json::json!({"surah": 18}))
        .await;
    drop(writer);

    let reader = OfflineActionQueue::new(
        OutboxConfig::default(),
        Arc::clone(&store) as Arc<dyn KeyValueStore>,
        backend as Arc<dyn HttpClient>,
        Arc::new(ManualClock::new(Utc::now())) as Arc<dyn Clock>,
    )
    .unwrap();
    let pending = reader.list().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].payload["surah"], 18);
}
