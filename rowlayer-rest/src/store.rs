//! REST storage backend speaking the PostgREST dialect.

use reqwest::{
    Method, StatusCode,
    blocking::{Client, RequestBuilder, Response as HttpResponse},
    header::{HeaderValue, CONTENT_TYPE},
};
use serde_json::Value;
use tracing::{debug, warn};

use rowlayer_core::{
    backend::{Backend, Row},
    descriptor::Descriptor,
    error::{RowStoreError, RowStoreResult},
};

use crate::query::query_params;

/// Environment variables the default configuration is read from.
const URL_VAR: &str = "SUPABASE_URL";
const KEY_VAR: &str = "SUPABASE_KEY";

#[derive(Debug)]
pub struct RestBackend {
    table: String,
    base_url: String,
    api_key: String,
    http: Client,
}

impl RestBackend {
    /// Creates a backend bound to `table` on an explicit endpoint.
    pub fn new(
        table: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    /// Creates a backend configured from `SUPABASE_URL` and `SUPABASE_KEY`.
    ///
    /// Missing variables default to empty strings; requests will then fail at
    /// dispatch time with a [`RowStoreError::Backend`].
    pub fn from_env(table: impl Into<String>) -> Self {
        let base_url = std::env::var(URL_VAR).unwrap_or_default();
        let api_key = std::env::var(KEY_VAR).unwrap_or_default();
        if base_url.is_empty() || api_key.is_empty() {
            warn!("{URL_VAR} or {KEY_VAR} is unset; requests will fail");
        }
        Self::new(table, base_url, api_key)
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), self.table)
    }

    fn request(&self, method: Method, descriptor: &Descriptor) -> RequestBuilder {
        self.http
            .request(method, self.endpoint())
            .query(&query_params(descriptor))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
    }

    fn send(&self, request: RequestBuilder) -> RowStoreResult<HttpResponse> {
        let response = request
            .send()
            .map_err(|e| RowStoreError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RowStoreError::Backend(format!(
                "{} on {}: {body}",
                status, self.table,
            )));
        }
        Ok(response)
    }

    /// Parses a representation response body into rows. The endpoint returns
    /// a JSON array of objects; anything else breaks the contract.
    fn rows(&self, response: HttpResponse) -> RowStoreResult<Vec<Row>> {
        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        let body: Value = response
            .json()
            .map_err(|e| RowStoreError::Backend(e.to_string()))?;
        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(RowStoreError::Contract(format!(
                        "{} returned a non-object row: {other}",
                        self.table,
                    ))),
                })
                .collect(),
            other => Err(RowStoreError::Contract(format!(
                "{} returned a non-array body: {other}",
                self.table,
            ))),
        }
    }

    /// Extracts the total from a `Content-Range` header shaped `0-24/3573`.
    fn content_range_total(&self, response: &HttpResponse) -> RowStoreResult<usize> {
        let raw = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                RowStoreError::Contract(format!(
                    "{} count response carries no content-range header",
                    self.table,
                ))
            })?;

        raw.rsplit_once('/')
            .and_then(|(_, total)| total.parse().ok())
            .ok_or_else(|| {
                RowStoreError::Contract(format!(
                    "{} returned an unparseable content-range: {raw}",
                    self.table,
                ))
            })
    }

    fn payload<'d>(
        &self,
        payload: Option<&'d Row>,
        operation: &str,
    ) -> RowStoreResult<&'d Row> {
        payload.ok_or_else(|| {
            RowStoreError::Contract(format!(
                "{operation} on {} dispatched without a payload",
                self.table,
            ))
        })
    }
}

impl Backend for RestBackend {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn insert(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let data = self.payload(descriptor.insert_data(), "insert")?;
        debug!(table = %self.table, "insert");

        let response = self.send(
            self.request(Method::POST, descriptor)
                .header("Prefer", "return=representation")
                .json(data),
        )?;
        self.rows(response)
    }

    fn update(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        let data = self.payload(descriptor.update_data(), "update")?;
        debug!(table = %self.table, "update");

        let response = self.send(
            self.request(Method::PATCH, descriptor)
                .header("Prefer", "return=representation")
                .json(data),
        )?;
        self.rows(response)
    }

    fn delete(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        debug!(table = %self.table, "delete");

        // return=representation hands back the rows that were removed.
        let response = self.send(
            self.request(Method::DELETE, descriptor)
                .header("Prefer", "return=representation"),
        )?;
        self.rows(response)
    }

    fn filter(&self, descriptor: &Descriptor) -> RowStoreResult<Vec<Row>> {
        debug!(table = %self.table, "filter");

        let response = self.send(self.request(Method::GET, descriptor))?;
        self.rows(response)
    }

    fn count(&self, descriptor: &Descriptor) -> RowStoreResult<usize> {
        debug!(table = %self.table, "count");

        // An empty range keeps the body minimal; the total rides the
        // Content-Range header.
        let response = self.send(
            self.request(Method::GET, descriptor)
                .header("Prefer", "count=exact")
                .header("Range", "0-0"),
        )?;
        self.content_range_total(&response)
    }
}
