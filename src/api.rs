// API client module: typed response models for the category-management
// server, the `CategoryApi` seam the validator talks through, and a small
// blocking HTTP client implementing it.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Base URL used when neither `--base-url` nor `CATEGORY_API_URL` is set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// A main category as returned by `/categories/main`. Extra columns the
/// server sends (icon, image url, flags) are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub code: String,
    pub name: String,
}

/// A main category with its nested subcategories, as returned by
/// `/categories/main-with-subcategories`. A missing `children` array is
/// read as empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryWithChildren {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<CategoryChild>,
}

/// One nested entry under a main category. Only the count of these matters
/// to the checks, so every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CategoryChild {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A subcategory as returned by `/categories/sub/{code}`. The server stores
/// `subcategory_id` as an integer; strings are accepted as well.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SubCategory {
    #[serde(deserialize_with = "id")]
    pub subcategory_id: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(String::from))
}

/// Why a single endpoint call did not produce data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// The server could not be reached at all.
    #[error("could not connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    /// The server answered with something other than 200.
    #[error("endpoint returned error status {status}")]
    Status { status: u16, body: String },
    /// Anything else: undecodable body, broken transfer, ...
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// The three read endpoints the validator exercises. `ApiClient` is the
/// real implementation; tests substitute their own.
pub trait CategoryApi {
    fn main_categories(&self) -> Result<Vec<CategorySummary>, ApiError>;
    fn main_with_subcategories(&self) -> Result<Vec<CategoryWithChildren>, ApiError>;
    fn subcategories(&self, code: &str) -> Result<Vec<SubCategory>, ApiError>;
}

/// Blocking client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client for `base_url`. `timeout = None` leaves requests
    /// without a deadline.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL `{}`", base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!("API base URL must use http or https, got `{}`", base_url);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient { client, base_url })
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) URLs always have a path, checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let res = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| classify(&url, e))?;
        let status = res.status();
        debug!(%url, status = status.as_u16(), "response");
        if status != StatusCode::OK {
            let body = res.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = res.text().map_err(|e| classify(&url, e))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::Unexpected(format!("malformed response from {}: {}", url, e)))
    }
}

impl CategoryApi for ApiClient {
    fn main_categories(&self) -> Result<Vec<CategorySummary>, ApiError> {
        self.get_json(self.endpoint(&["categories", "main"]))
    }

    fn main_with_subcategories(&self) -> Result<Vec<CategoryWithChildren>, ApiError> {
        self.get_json(self.endpoint(&["categories", "main-with-subcategories"]))
    }

    fn subcategories(&self, code: &str) -> Result<Vec<SubCategory>, ApiError> {
        self.get_json(self.endpoint(&["categories", "sub", code]))
    }
}

fn classify(url: &Url, err: reqwest::Error) -> ApiError {
    if err.is_connect() {
        ApiError::Connect {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        ApiError::Unexpected(err.to_string())
    }
}
