//! Apple App Store search via the iTunes Search API
//!
//! The iTunes Search API is a public JSON endpoint; a software search looks
//! like `GET /search?term=signal&country=us&limit=5&media=software&entity=software`
//! and returns `{"resultCount": N, "results": [...]}`.

use super::{SearchQuery, StoreClient};
use crate::config::AppStoreConfig;
use crate::error::{Result, StoreError};
use crate::types::{AppRecord, Store};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Search client for the Apple App Store
#[derive(Clone)]
pub struct AppStoreClient {
    http: reqwest::Client,
    config: AppStoreConfig,
}

impl AppStoreClient {
    /// Create a client sharing the given HTTP client
    pub fn new(http: reqwest::Client, config: AppStoreConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl StoreClient for AppStoreClient {
    fn store(&self) -> Store {
        Store::Appstore
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<AppRecord>> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let country = query.country.as_deref().unwrap_or(&self.config.country);

        tracing::debug!(term = %query.term, country, limit = query.limit, "App Store search");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("term", query.term.as_str()),
                ("country", country),
                ("limit", &query.limit.to_string()),
                ("media", "software"),
                ("entity", "software"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                store: Store::Appstore,
                status: status.as_u16(),
            }
            .into());
        }

        let body: ItunesSearchResponse =
            response.json().await.map_err(|e| StoreError::MalformedResponse {
                store: Store::Appstore,
                reason: e.to_string(),
            })?;

        let records = body
            .results
            .into_iter()
            .filter_map(ItunesApp::into_record)
            .take(query.limit as usize)
            .collect();

        Ok(records)
    }
}

/// Rewrite an iTunes artwork URL to a specific square size
///
/// Artwork URLs end in a dimension segment like `.../100x100bb.jpg`; the CDN
/// serves any requested dimensions. URLs without that segment are returned
/// unchanged.
pub fn sized_artwork_url(icon_url: &str, size: u32) -> String {
    static DIMENSIONS: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let re = DIMENSIONS.get_or_init(|| {
        Regex::new(r"/\d+x\d+[a-z]*\.(png|jpg|jpeg|webp)$").expect("static regex must compile")
    });

    match re.captures(icon_url) {
        Some(caps) => {
            let ext = &caps[1];
            let prefix = &icon_url[..icon_url.len() - caps[0].len()];
            format!("{prefix}/{size}x{size}bb.{ext}")
        }
        None => icon_url.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ItunesSearchResponse {
    #[serde(default)]
    results: Vec<ItunesApp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesApp {
    track_name: Option<String>,
    formatted_price: Option<String>,
    price: Option<f64>,
    average_user_rating: Option<f32>,
    artwork_url512: Option<String>,
    artwork_url100: Option<String>,
    artwork_url60: Option<String>,
    artist_name: Option<String>,
    bundle_id: Option<String>,
}

impl ItunesApp {
    /// Map one upstream result into an [`AppRecord`], skipping entries with
    /// no name or no artwork (nothing to download for those).
    fn into_record(self) -> Option<AppRecord> {
        let name = self.track_name?;
        let icon_url = self
            .artwork_url512
            .or(self.artwork_url100)
            .or(self.artwork_url60)?;

        let price = match (self.formatted_price, self.price) {
            (Some(formatted), _) => formatted,
            (None, Some(p)) if p > 0.0 => format!("${p:.2}"),
            _ => "Free".to_string(),
        };

        Some(AppRecord {
            name,
            store: Store::Appstore,
            price,
            rating: self.average_user_rating,
            icon_url,
            developer: self.artist_name,
            bundle_id: self.bundle_id,
        })
    }
}
