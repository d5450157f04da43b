//! # Offline Action Queue
//!
//! Durable outbox for user actions performed while disconnected. Bookmarks,
//! reading progress, and preference changes are captured locally the moment
//! they happen and replayed to the backend in original order once
//! connectivity returns.
//!
//! The queue is a single JSON array under one storage key, rewritten as a
//! whole on every mutation. Capture must never lose an action: enqueue
//! reports a failed persist instead of returning an error, and replay keeps
//! anything that did not reach the backend for the next attempt.

pub mod action;
pub mod config;
pub mod error;
pub mod queue;

pub use action::{ActionId, ActionType, QueuedAction};
pub use config::OutboxConfig;
pub use error::{OutboxError, Result};
pub use queue::{DrainReport, EnqueueReceipt, OfflineActionQueue};
