//! Google Play search via the Play web frontend
//!
//! Play has no public search API; the client fetches the web search page and
//! extracts result cards (package id, icon URL, title) from the HTML. The
//! extraction targets the stable parts of the markup: detail-page links and
//! `play-lh.googleusercontent.com` icon URLs.

use super::{SearchQuery, StoreClient};
use crate::config::GooglePlayConfig;
use crate::error::{Result, StoreError};
use crate::types::{AppRecord, Store};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Search client for Google Play
#[derive(Clone)]
pub struct GooglePlayClient {
    http: reqwest::Client,
    config: GooglePlayConfig,
}

impl GooglePlayClient {
    /// Create a client sharing the given HTTP client
    pub fn new(http: reqwest::Client, config: GooglePlayConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl StoreClient for GooglePlayClient {
    fn store(&self) -> Store {
        Store::Googleplay
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<AppRecord>> {
        let country = query.country.as_deref().unwrap_or(&self.config.country);
        let url = format!(
            "{}/store/search?q={}&c=apps&hl={}&gl={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&query.term),
            self.config.language,
            country,
        );

        tracing::debug!(term = %query.term, country, limit = query.limit, "Google Play search");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::BadStatus {
                store: Store::Googleplay,
                status: status.as_u16(),
            }
            .into());
        }

        let html = response.text().await.map_err(|e| StoreError::MalformedResponse {
            store: Store::Googleplay,
            reason: e.to_string(),
        })?;

        Ok(extract_apps(&html, query.limit as usize))
    }
}

/// Extract app records from Play search-page HTML
///
/// Matches one result card at a time: the detail link carries the package
/// name, the following `play-lh` image is the icon, the next span holds the
/// title. Duplicate package ids (Play repeats cards in carousels) are
/// dropped, keeping the first occurrence.
fn extract_apps(html: &str, limit: usize) -> Vec<AppRecord> {
    static CARD: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let re = CARD.get_or_init(|| {
        Regex::new(concat!(
            r#"(?s)href="/store/apps/details\?id=([^"&]+)""#,
            r#".{0,2000}?src="(https://play-lh\.googleusercontent\.com/[^"]+)""#,
            r#".{0,500}?<span[^>]*>([^<]{1,200})</span>"#,
        ))
        .expect("static regex must compile")
    });

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for caps in re.captures_iter(html) {
        if records.len() >= limit {
            break;
        }

        let package = caps[1].to_string();
        if !seen.insert(package.clone()) {
            continue;
        }

        let icon_url = strip_size_suffix(&caps[2]).to_string();
        let name = unescape_html(caps[3].trim());
        if name.is_empty() {
            continue;
        }

        records.push(AppRecord {
            name,
            store: Store::Googleplay,
            // The search page does not expose prices; paid apps show it only
            // on the detail page
            price: "Free".to_string(),
            rating: None,
            icon_url,
            developer: None,
            bundle_id: Some(package),
        });
    }

    records
}

/// Rewrite a Play CDN icon URL to a specific square size
///
/// Play CDN URLs accept an `=s{size}` suffix; any existing sizing directive
/// is replaced.
pub fn sized_play_url(icon_url: &str, size: u32) -> String {
    format!("{}=s{}", strip_size_suffix(icon_url), size)
}

/// Drop an existing `=...` sizing directive from a Play CDN URL
fn strip_size_suffix(icon_url: &str) -> &str {
    match icon_url.split_once('=') {
        Some((base, _)) => base,
        None => icon_url,
    }
}

/// Minimal entity unescaping for titles pulled out of HTML
fn unescape_html(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Trimmed-down shape of a Play search results page: detail link, icon,
    // title span per card
    const SAMPLE_HTML: &str = r#"
        <html><body>
        <div class="card">
          <a href="/store/apps/details?id=org.thoughtcrime.securesms">
            <img src="https://play-lh.googleusercontent.com/aBcD123=s64" alt="">
            <span class="title">Signal Private Messenger</span>
          </a>
        </div>
        <div class="card">
          <a href="/store/apps/details?id=com.whatsapp">
            <img src="https://play-lh.googleusercontent.com/eFgH456=s64" alt="">
            <span class="title">WhatsApp Messenger &amp; Video Calls</span>
          </a>
        </div>
        <div class="card">
          <a href="/store/apps/details?id=org.thoughtcrime.securesms">
            <img src="https://play-lh.googleusercontent.com/aBcD123=s64" alt="">
            <span class="title">Signal Private Messenger</span>
          </a>
        </div>
        </body></html>
    "#;

    fn client_for(server: &MockServer) -> GooglePlayClient {
        let config = GooglePlayConfig {
            base_url: server.uri(),
            country: "us".to_string(),
            language: "en".to_string(),
        };
        GooglePlayClient::new(reqwest::Client::new(), config)
    }

    fn query(term: &str, limit: u32) -> SearchQuery {
        SearchQuery {
            term: term.to_string(),
            country: None,
            limit,
        }
    }

    #[test]
    fn extract_apps_reads_cards_and_dedupes() {
        let records = extract_apps(SAMPLE_HTML, 10);

        assert_eq!(records.len(), 2, "duplicate card must be dropped");

        let signal = &records[0];
        assert_eq!(signal.name, "Signal Private Messenger");
        assert_eq!(signal.store, Store::Googleplay);
        assert_eq!(
            signal.bundle_id.as_deref(),
            Some("org.thoughtcrime.securesms")
        );
        assert_eq!(
            signal.icon_url,
            "https://play-lh.googleusercontent.com/aBcD123"
        );

        // Entities in titles are unescaped
        assert_eq!(records[1].name, "WhatsApp Messenger & Video Calls");
    }

    #[test]
    fn extract_apps_honors_limit() {
        let records = extract_apps(SAMPLE_HTML, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].bundle_id.as_deref(),
            Some("org.thoughtcrime.securesms")
        );
    }

    #[test]
    fn extract_apps_on_unrelated_html_is_empty() {
        let records = extract_apps("<html><body><p>no apps here</p></body></html>", 10);
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn search_fetches_and_extracts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/search"))
            .and(query_param("q", "Signal"))
            .and(query_param("c", "apps"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_HTML))
            .mount(&server)
            .await;

        let records = client_for(&server).search(&query("Signal", 5)).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn zero_matches_is_empty_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let records = client_for(&server)
            .search(&query("nonexistent-app-xyz", 5))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_bad_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/store/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search(&query("Signal", 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Store(StoreError::BadStatus {
                store: Store::Googleplay,
                status: 429,
            })
        ));
    }

    #[test]
    fn sized_play_url_replaces_existing_directive() {
        assert_eq!(
            sized_play_url("https://play-lh.googleusercontent.com/abc=s64", 256),
            "https://play-lh.googleusercontent.com/abc=s256"
        );
        assert_eq!(
            sized_play_url("https://play-lh.googleusercontent.com/abc", 128),
            "https://play-lh.googleusercontent.com/abc=s128"
        );
    }
}
