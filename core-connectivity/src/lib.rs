//! # Connectivity Observer
//!
//! Watches the injected network monitor, keeps the current two-state
//! connectivity status, and turns the offline-to-online transition into a
//! queue drain. Status changes and drain outcomes are published on a
//! broadcast channel so the UI layer can react without polling.

pub mod error;
pub mod event;
pub mod observer;

pub use error::{ConnectivityError, Result};
pub use event::ConnectivityEvent;
pub use observer::ConnectivityObserver;
