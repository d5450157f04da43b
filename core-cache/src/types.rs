//! Request and response types handled by the cache router

use bridge_traits::http::{HttpMethod, HttpResponse};
use bytes::Bytes;
use serde::Serialize;

/// Outbound request descriptor as seen by the router.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Top-level document load (navigation) rather than a subresource fetch
    pub navigation: bool,
}

impl FetchRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            navigation: false,
        }
    }

    /// A plain GET subresource request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// A top-level page navigation.
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            navigation: true,
            ..Self::get(url)
        }
    }
}

/// Where the bytes of a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from a cache partition
    Cache,
    /// Fresh from the network
    Network,
    /// The reserved offline fallback page
    OfflinePage,
    /// Synthesized error response, no cache or network involved
    Synthetic,
}

/// Response returned by the router. Never an error: failures degrade into a
/// synthetic response or the offline page.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: ResponseSource,
}

#[derive(Serialize)]
struct OfflineErrorBody<'a> {
    error: &'a str,
    offline: bool,
}

impl FetchResponse {
    /// Wrap a network response.
    pub fn from_network(response: &HttpResponse) -> Self {
        Self {
            status: response.status,
            content_type: response.header("content-type").map(str::to_string),
            body: response.body.clone(),
            source: ResponseSource::Network,
        }
    }

    /// Synthetic HTTP-408-equivalent returned when both cache and network
    /// fail for a non-navigation request.
    pub fn offline_error() -> Self {
        let body = OfflineErrorBody {
            error: "Network unavailable",
            offline: true,
        };
        Self {
            status: 408,
            content_type: Some("application/json".to_string()),
            // Serializing a two-field struct of literals cannot fail
            body: Bytes::from(serde_json::to_vec(&body).unwrap_or_default()),
            source: ResponseSource::Synthetic,
        }
    }

    /// Built-in offline page used when the reserved path was never precached.
    pub fn builtin_offline_page() -> Self {
        Self {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: Bytes::from_static(
                b"<!doctype html><html><head><title>Offline</title></head>\
                  <body><h1>You are offline</h1>\
                  <p>This page is not available without a connection.</p></body></html>",
            ),
            source: ResponseSource::OfflinePage,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
