//! Control-message surface exposed to the host page
//!
//! The host can activate the router, push extra URLs into the precache, clear
//! partitions, and inspect cache contents. This is the only structured API
//! surface intended for page-side introspection and testing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::partition::Partition;

/// Inbound control message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Take over request handling immediately (skip-waiting equivalent)
    Activate,
    /// Fetch and store the given URLs into the `static` partition
    Precache(Vec<String>),
    /// Clear one named partition
    ClearPartition(Partition),
    /// Clear every partition
    ClearAll,
    /// Report stored keys per partition
    ReportContents,
}

/// Reply to a control message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlResponse {
    /// Message handled, nothing to report
    Ack,
    /// Precache outcome, counted per URL
    Precached { succeeded: usize, failed: usize },
    /// Number of entries removed
    Cleared { entries: u64 },
    /// Map of partition name to stored URLs
    Contents(BTreeMap<String, Vec<String>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format() {
        let msg = ControlMessage::ClearPartition(Partition::Api);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "clear_partition");
        assert_eq!(json["payload"], "api");

        let parsed: ControlMessage =
            serde_json::from_str(r#"{"type":"precache","payload":["/","/offline"]}"#).unwrap();
        assert!(matches!(parsed, ControlMessage::Precache(urls) if urls.len() == 2));
    }

    #[test]
    fn test_response_wire_format() {
        let response = ControlResponse::Precached {
            succeeded: 3,
            failed: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["payload"]["succeeded"], 3);
        assert_eq!(json["payload"]["failed"], 1);
    }
}
