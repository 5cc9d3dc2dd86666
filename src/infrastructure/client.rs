//! Thin REST client for the hosted backend's row API.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::BackendConfig;
use crate::domain::errors::StorefrontError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for StorefrontError {
    fn from(e: reqwest::Error) -> Self {
        StorefrontError::RemoteRequestFailed(e.to_string())
    }
}

// ── Query building ───────────────────────────────────────────────────────────

/// Column filters in the backend's query notation, e.g. `price=lte.200`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(&'static str, String),
    /// Case-insensitive substring match; the needle is wrapped in wildcards.
    ILike(&'static str, String),
    Gt(&'static str, String),
    Gte(&'static str, String),
    Lte(&'static str, String),
}

impl Filter {
    fn as_pair(&self) -> (&'static str, String) {
        match self {
            Filter::Eq(column, value) => (*column, format!("eq.{value}")),
            Filter::ILike(column, needle) => (*column, format!("ilike.*{needle}*")),
            Filter::Gt(column, value) => (*column, format!("gt.{value}")),
            Filter::Gte(column, value) => (*column, format!("gte.{value}")),
            Filter::Lte(column, value) => (*column, format!("lte.{value}")),
        }
    }
}

/// One offset window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

// ── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn relation_url(&self, relation: &str) -> String {
        self.endpoint(&format!("rest/v1/{relation}"))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select_request(
        &self,
        relation: &str,
        filters: &[Filter],
        order: Option<&str>,
        window: Option<Window>,
    ) -> RequestBuilder {
        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        query.extend(filters.iter().map(Filter::as_pair));
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        if let Some(window) = window {
            query.push(("offset", window.offset.to_string()));
            query.push(("limit", window.limit.to_string()));
        }
        let mut builder = self
            .authorize(self.http.get(self.relation_url(relation)))
            .query(&query);
        if window.is_some() {
            builder = builder.header("Prefer", "count=exact");
        }
        builder
    }

    /// All rows matching the filters.
    pub async fn select<T: DeserializeOwned>(
        &self,
        relation: &str,
        filters: &[Filter],
        order: Option<&str>,
    ) -> Result<Vec<T>, StorefrontError> {
        let response = self
            .select_request(relation, filters, order, None)
            .send()
            .await?;
        let response = check(relation, response).await?;
        Ok(response.json().await?)
    }

    /// One offset window of rows plus the exact total from `Content-Range`.
    pub async fn select_window<T: DeserializeOwned>(
        &self,
        relation: &str,
        filters: &[Filter],
        order: Option<&str>,
        window: Window,
    ) -> Result<(Vec<T>, i64), StorefrontError> {
        let response = self
            .select_request(relation, filters, order, Some(window))
            .send()
            .await?;
        let response = check(relation, response).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                StorefrontError::RemoteRequestFailed(format!(
                    "{relation}: missing count in Content-Range"
                ))
            })?;
        Ok((response.json().await?, total))
    }

    /// Inserts rows and returns the stored representations.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        relation: &str,
        rows: &B,
    ) -> Result<Vec<T>, StorefrontError> {
        let response = self
            .authorize(self.http.post(self.relation_url(relation)))
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;
        let response = check(relation, response).await?;
        Ok(response.json().await?)
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        relation: &str,
        filters: &[Filter],
        changes: &B,
    ) -> Result<(), StorefrontError> {
        let query: Vec<_> = filters.iter().map(Filter::as_pair).collect();
        let response = self
            .authorize(self.http.patch(self.relation_url(relation)))
            .query(&query)
            .json(changes)
            .send()
            .await?;
        check(relation, response).await?;
        Ok(())
    }

    pub async fn delete(&self, relation: &str, filters: &[Filter]) -> Result<(), StorefrontError> {
        let query: Vec<_> = filters.iter().map(Filter::as_pair).collect();
        let response = self
            .authorize(self.http.delete(self.relation_url(relation)))
            .query(&query)
            .send()
            .await?;
        check(relation, response).await?;
        Ok(())
    }
}

/// Maps a non-2xx response onto `RemoteRequestFailed`, keeping the body as
/// the cause.
async fn check(relation: &str, response: Response) -> Result<Response, StorefrontError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorefrontError::RemoteRequestFailed(format!(
        "{status} on {relation}: {body}"
    )))
}

/// The exact total from a `Content-Range` value such as `0-9/57` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<i64> {
    value.rsplit('/').next()?.trim().parse().ok()
}
