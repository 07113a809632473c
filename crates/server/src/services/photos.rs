//! Unsplash photo search proxy for category cover images.
//!
//! The access key never leaves the server. Admins search through
//! [`PhotoSearchClient::search`] and register a chosen photo's download
//! with [`PhotoSearchClient::track_download`], as the Unsplash API
//! guidelines require.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::PhotoSearchConfig;

/// Unsplash search endpoint.
const SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

/// Only download-tracking links on this host are followed.
const API_HOST: &str = "api.unsplash.com";

/// Results per page.
pub const PER_PAGE: u32 = 30;

/// Errors that can occur when talking to Unsplash.
#[derive(Debug, Error)]
pub enum PhotoSearchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status}")]
    Api { status: u16 },

    /// Failed to build the client or a request.
    #[error("Invalid request: {0}")]
    Invalid(String),
}

// =============================================================================
// Response Types
// =============================================================================

/// Photo sizes handed to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
    pub small: String,
    pub regular: String,
}

/// Photographer attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photographer {
    pub name: String,
    pub link: String,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub urls: PhotoUrls,
    pub user: Photographer,
    pub download_location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoSearchResults {
    pub results: Vec<Photo>,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    results: Vec<ApiPhoto>,
}

#[derive(Debug, Deserialize)]
struct ApiPhoto {
    id: String,
    urls: PhotoUrls,
    user: ApiUser,
    links: ApiPhotoLinks,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    name: String,
    links: ApiUserLinks,
}

#[derive(Debug, Deserialize)]
struct ApiUserLinks {
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiPhotoLinks {
    download_location: String,
}

impl From<ApiPhoto> for Photo {
    fn from(photo: ApiPhoto) -> Self {
        Self {
            id: photo.id,
            urls: photo.urls,
            user: Photographer {
                name: photo.user.name,
                link: photo.user.links.html,
            },
            download_location: photo.links.download_location,
        }
    }
}

impl From<ApiSearchResponse> for PhotoSearchResults {
    fn from(response: ApiSearchResponse) -> Self {
        Self {
            results: response.results.into_iter().map(Photo::from).collect(),
            total: response.total,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Authenticated Unsplash API client.
#[derive(Clone)]
pub struct PhotoSearchClient {
    client: reqwest::Client,
}

impl PhotoSearchClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the access key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &PhotoSearchConfig, timeout: Duration) -> Result<Self, PhotoSearchError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Client-ID {}", config.access_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PhotoSearchError::Invalid(format!("Invalid access key format: {e}")))?,
        );
        headers.insert("Accept-Version", HeaderValue::from_static("v1"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Search photos. A blank query returns no results without calling out.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Unsplash answers with an error.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str, page: u32) -> Result<PhotoSearchResults, PhotoSearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(PhotoSearchResults::default());
        }

        let url = search_url(query, page.max(1))?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PhotoSearchError::Api {
                status: status.as_u16(),
            });
        }

        let body: ApiSearchResponse = response.json().await?;
        Ok(body.into())
    }

    /// Register a download with Unsplash.
    ///
    /// Returns `false` without calling out if `download_location` is not an
    /// HTTPS link on the Unsplash API host.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Unsplash answers with an error.
    #[tracing::instrument(skip(self))]
    pub async fn track_download(&self, download_location: &str) -> Result<bool, PhotoSearchError> {
        let Some(url) = trusted_download_url(download_location) else {
            tracing::warn!("Refusing to follow untrusted download location");
            return Ok(false);
        };

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PhotoSearchError::Api {
                status: status.as_u16(),
            });
        }
        Ok(true)
    }
}

fn search_url(query: &str, page: u32) -> Result<Url, PhotoSearchError> {
    let mut url = Url::parse(SEARCH_URL).map_err(|e| PhotoSearchError::Invalid(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("page", &page.to_string())
        .append_pair("per_page", &PER_PAGE.to_string());
    Ok(url)
}

/// Parse a download-tracking link, accepting only `https://api.unsplash.com/...`.
#[must_use]
pub fn trusted_download_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    (url.scheme() == "https" && url.host_str() == Some(API_HOST)).then_some(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_query() {
        let url = search_url("käse & brot", 2).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("query".to_owned(), "käse & brot".to_owned()),
                ("page".to_owned(), "2".to_owned()),
                ("per_page".to_owned(), "30".to_owned()),
            ]
        );
    }

    #[test]
    fn test_api_response_maps_to_photos() {
        let raw = r#"{
            "total": 133,
            "total_pages": 5,
            "results": [{
                "id": "abc123",
                "description": "Bread",
                "urls": {
                    "raw": "https://images.unsplash.com/raw",
                    "small": "https://images.unsplash.com/small",
                    "regular": "https://images.unsplash.com/regular"
                },
                "user": {
                    "name": "Ada Baker",
                    "links": { "html": "https://unsplash.com/@ada" }
                },
                "links": {
                    "download_location": "https://api.unsplash.com/photos/abc123/download"
                }
            }]
        }"#;

        let parsed: ApiSearchResponse = serde_json::from_str(raw).unwrap();
        let results = PhotoSearchResults::from(parsed);
        assert_eq!(results.total, 133);
        assert_eq!(results.results.len(), 1);

        let json = serde_json::to_value(&results.results[0]).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["urls"]["small"], "https://images.unsplash.com/small");
        assert_eq!(json["user"]["name"], "Ada Baker");
        assert_eq!(json["user"]["link"], "https://unsplash.com/@ada");
        assert_eq!(
            json["downloadLocation"],
            "https://api.unsplash.com/photos/abc123/download"
        );
    }

    #[test]
    fn test_trusted_download_url() {
        assert!(trusted_download_url("https://api.unsplash.com/photos/x/download?ixid=1").is_some());
        assert!(trusted_download_url("http://api.unsplash.com/photos/x/download").is_none());
        assert!(trusted_download_url("https://evil.example/photos/x/download").is_none());
        assert!(trusted_download_url("https://api.unsplash.com.evil.example/x").is_none());
        assert!(trusted_download_url("not a url").is_none());
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        let config = PhotoSearchConfig {
            access_key: "k3y-Abc123".to_owned().into(),
        };
        let client = PhotoSearchClient::new(&config, Duration::from_secs(1)).unwrap();
        let results = client.search("   ", 1).await.unwrap();
        assert!(results.results.is_empty());
        assert_eq!(results.total, 0);
    }
}
