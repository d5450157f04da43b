//! Queued action model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OutboxError, Result};

/// Type-safe queued action identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Create a new random action ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an action ID from a string
    pub fn from_string(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| OutboxError::InvalidActionId(e.to_string()))
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of deferred user action, selecting the replay endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Save or remove a content bookmark
    Bookmark,
    /// Record reading/listening progress
    Progress,
    /// Change a user preference
    Preference,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::Progress => "progress",
            Self::Preference => "preference",
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = OutboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bookmark" => Ok(Self::Bookmark),
            "progress" => Ok(Self::Progress),
            "preference" => Ok(Self::Preference),
            _ => Err(OutboxError::InvalidActionType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured user action waiting for replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Unique identifier, assigned at capture time
    pub id: ActionId,
    /// Kind of action
    pub action_type: ActionType,
    /// Opaque request body forwarded verbatim to the backend
    pub payload: serde_json::Value,
    /// Capture timestamp
    pub created_at: DateTime<Utc>,
    /// Number of replay attempts that ended in a transient failure
    #[serde(default)]
    pub attempts: u32,
}

impl QueuedAction {
    pub fn new(action_type: ActionType, payload: serde_json::Value, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::new(),
            action_type,
            payload,
            created_at,
            attempts: 0,
        }
    }
}
