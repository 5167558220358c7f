//! Destination image lookup for promo artwork.
//!
//! Tries Unsplash, then Pexels, then falls back to a placeholder. Upstream
//! failures are logged and skipped; a lookup always yields an image.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::ImageSearchConfig;
use crate::errors::AppError;

const PLACEHOLDER_URL: &str = "https://placehold.co/1080x1080";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    Unsplash,
    Pexels,
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub url: String,
    pub source: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit: Option<String>,
}

#[derive(Deserialize)]
struct UnsplashResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    user: UnsplashUser,
}

#[derive(Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Deserialize)]
struct UnsplashUser {
    name: String,
}

#[derive(Deserialize)]
struct PexelsResponse {
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
    photographer: String,
}

#[derive(Deserialize)]
struct PexelsSrc {
    large: String,
}

pub struct ImageSearch {
    client: Client,
    config: ImageSearchConfig,
}

impl ImageSearch {
    pub fn new(config: ImageSearchConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub async fn search(&self, query: &str) -> ImageResult {
        if let Some(key) = &self.config.unsplash_access_key {
            match self.unsplash(query, key).await {
                Ok(Some(found)) => return found,
                Ok(None) => tracing::debug!(query, "Unsplash returned no results"),
                Err(e) => tracing::warn!(query, "Unsplash lookup failed: {}", e),
            }
        }

        if let Some(key) = &self.config.pexels_api_key {
            match self.pexels(query, key).await {
                Ok(Some(found)) => return found,
                Ok(None) => tracing::debug!(query, "Pexels returned no results"),
                Err(e) => tracing::warn!(query, "Pexels lookup failed: {}", e),
            }
        }

        placeholder(query)
    }

    async fn unsplash(&self, query: &str, key: &str) -> Result<Option<ImageResult>, AppError> {
        let url = endpoint(
            &self.config.unsplash_url,
            "/search/photos",
            &[("query", query), ("per_page", "1"), ("orientation", "squarish")],
        )?;

        let response: UnsplashResponse = self
            .client
            .get(url)
            .header("Authorization", format!("Client-ID {}", key))
            .header("Accept-Version", "v1")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(response.results.into_iter().next().map(|photo| ImageResult {
            url: photo.urls.regular,
            source: ImageSource::Unsplash,
            credit: Some(photo.user.name),
        }))
    }

    async fn pexels(&self, query: &str, key: &str) -> Result<Option<ImageResult>, AppError> {
        let url = endpoint(
            &self.config.pexels_url,
            "/v1/search",
            &[("query", query), ("per_page", "1")],
        )?;

        let response: PexelsResponse = self
            .client
            .get(url)
            .header("Authorization", key)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        Ok(response.photos.into_iter().next().map(|photo| ImageResult {
            url: photo.src.large,
            source: ImageSource::Pexels,
            credit: Some(photo.photographer),
        }))
    }
}

fn upstream(err: reqwest::Error) -> AppError {
    AppError::Upstream(format!("Image provider error: {}", err))
}

fn endpoint(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, AppError> {
    let joined = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse_with_params(&joined, params)
        .map_err(|e| AppError::Internal(format!("Invalid image provider URL {}: {}", joined, e)))
}

pub fn placeholder(query: &str) -> ImageResult {
    let url = Url::parse_with_params(PLACEHOLDER_URL, &[("text", query)])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| PLACEHOLDER_URL.to_string());

    ImageResult {
        url,
        source: ImageSource::Placeholder,
        credit: None,
    }
}
