//! Connectivity events published to subscribers

use chrono::{DateTime, Utc};

/// Event emitted by the connectivity observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// Connectivity returned
    Online { at: DateTime<Utc> },
    /// Connectivity lost
    Offline { at: DateTime<Utc> },
    /// A reconnect-triggered replay pass finished
    DrainCompleted {
        replayed: usize,
        dropped: usize,
        retained: usize,
        at: DateTime<Utc>,
    },
}
