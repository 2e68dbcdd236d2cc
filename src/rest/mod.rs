//! Client for a hosted project's REST surface and database functions.
//!
//! Tables are exposed PostgREST-style under `rest/v1/{table}` with
//! `Range`-header pagination and `Content-Range` totals; HTTP-invocable
//! database functions live under `functions/v1/{name}`. Every request
//! carries the project key as both `apikey` and bearer token.

pub mod retry;

pub use retry::{RetryPolicy, with_retry};

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::ProjectSection;
use crate::errors::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One page of rows from a Range-paginated table read.
#[derive(Debug)]
pub struct Page {
    pub rows: Vec<Value>,
    /// Total row count parsed from `Content-Range`, when the server
    /// reports one.
    pub total: Option<u64>,
}

/// HTTP client bound to one project's base URL and key.
#[derive(Debug, Clone)]
pub struct ProjectClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
}

impl ProjectClient {
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    /// Client for reads, using the project's anon key.
    pub fn for_reads(project: &ProjectSection) -> Result<Self> {
        Self::new(&project.url, &project.key)
    }

    /// Client for writes, preferring the service-role key.
    pub fn for_writes(project: &ProjectSection) -> Result<Self> {
        Self::new(&project.url, project.write_key())
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    /// Reads one page of `table`, `limit` rows starting at `offset`.
    ///
    /// HTTP 416 means the offset ran past the end: an empty page is
    /// returned so pagination loops can stop. HTTP 404 maps to
    /// [`ApiError::TableMissing`] so callers can skip tables that do
    /// not exist on this project.
    pub async fn fetch_page(
        &self,
        table: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Page, ApiError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let end = offset + limit - 1;
        let response = self
            .auth(self.http.get(&url))
            .query(&[("select", "*")])
            .header("Range", format!("{offset}-{end}"))
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::TableMissing {
                table: table.to_string(),
            });
        }
        if status == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Page {
                rows: Vec::new(),
                total: None,
            });
        }
        if !status.is_success() {
            return Err(self.status_error(status, &url, response).await);
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total);
        let rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;
        Ok(Page { rows, total })
    }

    /// Upserts rows into `table`. Duplicate keys merge instead of
    /// conflicting, so re-running an import is safe.
    pub async fn upsert_rows(&self, table: &str, rows: &[Value]) -> Result<(), ApiError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let response = self
            .auth(self.http.post(&url))
            .header("Content-Type", "application/json")
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, &url, response).await);
        }
        Ok(())
    }

    /// Invokes the database function `name` with a JSON body and
    /// returns its JSON response.
    pub async fn invoke_function(&self, name: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}/functions/v1/{}", self.base_url, name);
        let response = self
            .auth(self.http.post(&url))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Function {
                name: name.to_string(),
                message: format!("HTTP {}: {}", status.as_u16(), truncate(&body)),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|source| ApiError::Transport { url, source })
    }

    /// Connectivity check: GET `path` relative to the base URL and
    /// report the raw status code. Interpretation is the caller's.
    pub async fn probe(&self, path: &str) -> Result<u16, ApiError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .auth(self.http.get(&url))
            .send()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;
        Ok(response.status().as_u16())
    }

    async fn status_error(
        &self,
        status: reqwest::StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> ApiError {
        let body = response.text().await.unwrap_or_default();
        ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body: truncate(&body),
        }
    }
}

/// Whether a probe status means the endpoint accepted the key.
/// PostgREST answers 404 or 406 for relations the key cannot name, so
/// those still prove connectivity; 401 means the key was rejected.
pub fn reachable(status: u16) -> bool {
    matches!(status, 200 | 404 | 406)
}

/// Parses the total from a `Content-Range` value like `0-999/1234`.
/// An unknown total (`0-999/*`) yields `None`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

/// First 200 characters of an error body; enough to diagnose without
/// flooding the console.
fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
