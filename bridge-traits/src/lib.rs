//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline core and
//! platform-specific implementations. Each trait represents a capability that
//! the core requires but that must be provided differently per host (native
//! process, test harness, embedded runtime).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP request execution
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable byte-oriented key-value storage
//! - [`NetworkMonitor`](network::NetworkMonitor) - Two-state connectivity detection
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and provide actionable error messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.
//!
//! ## Mocks
//!
//! The `mocks` feature generates `mockall` mocks (`MockHttpClient`,
//! `MockKeyValueStore`, `MockNetworkMonitor`) for consumers' test suites.

pub mod error;
pub mod http;
pub mod network;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
pub use storage::KeyValueStore;
pub use time::{Clock, ManualClock, SystemClock};
