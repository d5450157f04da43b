//! Outbox configuration

use std::time::Duration;

use crate::action::ActionType;
use crate::error::{OutboxError, Result};

/// Configuration for the offline action queue.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Endpoint receiving replayed bookmark actions
    pub bookmark_endpoint: String,

    /// Endpoint receiving replayed progress actions
    pub progress_endpoint: String,

    /// Endpoint receiving replayed preference actions
    pub preference_endpoint: String,

    /// Timeout applied to each replay request (default: 10s)
    pub replay_timeout: Duration,

    /// Transient-failure attempts before an action is given up on
    /// (default: 25)
    pub max_replay_attempts: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            bookmark_endpoint: "/api/bookmark".to_string(),
            progress_endpoint: "/api/progress".to_string(),
            preference_endpoint: "/api/preferences".to_string(),
            replay_timeout: Duration::from_secs(10),
            max_replay_attempts: 25,
        }
    }
}

impl OutboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replay endpoint for one action type.
    pub fn with_endpoint(mut self, action_type: ActionType, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        match action_type {
            ActionType::Bookmark => self.bookmark_endpoint = endpoint,
            ActionType::Progress => self.progress_endpoint = endpoint,
            ActionType::Preference => self.preference_endpoint = endpoint,
        }
        self
    }

    /// Set the per-request replay timeout.
    pub fn with_replay_timeout(mut self, timeout: Duration) -> Self {
        self.replay_timeout = timeout;
        self
    }

    /// Set the transient-failure attempt cap.
    pub fn with_max_replay_attempts(mut self, attempts: u32) -> Self {
        self.max_replay_attempts = attempts;
        self
    }

    /// Replay endpoint for an action type.
    pub fn endpoint(&self, action_type: ActionType) -> &str {
        match action_type {
            ActionType::Bookmark => &self.bookmark_endpoint,
            ActionType::Progress => &self.progress_endpoint,
            ActionType::Preference => &self.preference_endpoint,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.replay_timeout.is_zero() {
            return Err(OutboxError::Config(
                "replay_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_replay_attempts == 0 {
            return Err(OutboxError::Config(
                "max_replay_attempts must be at least 1".to_string(),
            ));
        }
        for (name, endpoint) in [
            ("bookmark_endpoint", &self.bookmark_endpoint),
            ("progress_endpoint", &self.progress_endpoint),
            ("preference_endpoint", &self.preference_endpoint),
        ] {
            if endpoint.is_empty() {
                return Err(OutboxError::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OutboxConfig::default();
        assert_eq!(config.endpoint(ActionType::Bookmark), "/api/bookmark");
        assert_eq!(config.max_replay_attempts, 25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_validation() {
        let config = OutboxConfig::new()
            .with_endpoint(ActionType::Progress, "https://app.example/api/v2/progress")
            .with_max_replay_attempts(3);
        assert_eq!(
            config.endpoint(ActionType::Progress),
            "https://app.example/api/v2/progress"
        );
        assert_eq!(config.max_replay_attempts, 3);

        let bad = OutboxConfig::new().with_replay_timeout(Duration::ZERO);
        assert!(bad.validate().is_err());

        let empty = OutboxConfig::new().with_endpoint(ActionType::Bookmark, "");
        assert!(empty.validate().is_err());
    }
}
