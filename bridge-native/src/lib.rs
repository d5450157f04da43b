//! # Native Bridge Implementations
//!
//! Production implementations of the [`bridge-traits`](bridge_traits)
//! contracts for hosts running as a regular native process:
//!
//! - [`ReqwestHttpClient`] - HTTP via reqwest with connection pooling
//! - [`SqliteKeyValueStore`] - durable key-value storage on SQLite
//! - [`MemoryKeyValueStore`] - in-memory storage for tests and tooling
//! - [`ProbeNetworkMonitor`] - connectivity detection via TCP probe

pub mod http;
pub mod network;
pub mod storage;

pub use http::ReqwestHttpClient;
pub use network::ProbeNetworkMonitor;
pub use storage::{MemoryKeyValueStore, SqliteKeyValueStore};
