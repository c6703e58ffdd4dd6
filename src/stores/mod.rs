//! Upstream store search clients
//!
//! One client per store behind the [`StoreClient`] trait, plus the icon URL
//! sizing helpers. Both clients share the engine's `reqwest::Client` and are
//! pointed at configurable base URLs so tests can run against a local mock.

pub mod appstore;
pub mod googleplay;

pub use appstore::AppStoreClient;
pub use googleplay::GooglePlayClient;

use crate::error::Result;
use crate::types::{AppRecord, Store};
use async_trait::async_trait;

/// Parameters for a store search
#[derive(Clone, Debug)]
pub struct SearchQuery {
    /// Search term
    pub term: String,
    /// Two-letter country code; `None` uses the store's configured default
    pub country: Option<String>,
    /// Maximum number of records to return
    pub limit: u32,
}

/// A search backend for one app store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Which store this client talks to
    fn store(&self) -> Store;

    /// Search for apps, most-relevant-first per upstream ordering
    ///
    /// Zero matches is an empty vec, not an error. The result length never
    /// exceeds `query.limit`.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<AppRecord>>;
}

/// Rewrite an icon URL to request a specific pixel size from the store CDN
///
/// Falls back to the original URL when the store's size pattern is absent.
pub fn sized_icon_url(store: Store, icon_url: &str, size: u32) -> String {
    match store {
        Store::Appstore => appstore::sized_artwork_url(icon_url, size),
        Store::Googleplay => googleplay::sized_play_url(icon_url, size),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sized_icon_url_dispatches_per_store() {
        let itunes = "https://is1-ssl.mzstatic.com/image/thumb/abc/100x100bb.jpg";
        assert_eq!(
            sized_icon_url(Store::Appstore, itunes, 256),
            "https://is1-ssl.mzstatic.com/image/thumb/abc/256x256bb.jpg"
        );

        let play = "https://play-lh.googleusercontent.com/sn_abc=s64";
        assert_eq!(
            sized_icon_url(Store::Googleplay, play, 256),
            "https://play-lh.googleusercontent.com/sn_abc=s256"
        );
    }
}
