//! # Cache Router Module
//!
//! Intercepts outbound requests and resolves them against named cache
//! partitions, each with its own strategy and max-age policy.
//!
//! ## Overview
//!
//! Every request the host hands to [`CacheRouter::handle`] is classified by
//! URL shape into one of four partitions:
//!
//! | Partition | Strategy | Max age |
//! |-----------|----------|---------|
//! | `static`  | cache-first | none (version-replaced) |
//! | `api`     | network-first | 24 h |
//! | `image`   | cache-first | 7 d |
//! | `dynamic` | stale-while-revalidate | 30 d |
//!
//! Page navigations get a dedicated network-first handler whose final
//! fallback is the offline page rather than a JSON error. Classification is
//! deterministic: a given URL always maps to the same (strategy, partition)
//! pair, and only GET requests ever touch a partition.
//!
//! `handle` never returns an error. Network and storage failures degrade to
//! cached entries, the offline page, or a synthetic HTTP 408 response with a
//! `{error, offline: true}` JSON body.

pub mod config;
pub mod control;
pub mod error;
pub mod partition;
pub mod router;
pub mod store;
pub mod types;

pub use config::RouterConfig;
pub use control::{ControlMessage, ControlResponse};
pub use error::{CacheError, Result};
pub use partition::{Classifier, Partition, Strategy};
pub use router::CacheRouter;
pub use store::{CacheEntry, PartitionStore};
pub use types::{FetchRequest, FetchResponse, ResponseSource};
