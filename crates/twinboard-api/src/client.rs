// Async HTTP client for the digital-twin backend.
//
// Base: `{base_url}` (e.g. `http://localhost:8000/api/v1`), paths are
// appended verbatim; accessors wrap caller-supplied ids in `Segment`.
// No retries and no caching happen here; the fetch state machines in
// twinboard-core own both concerns.

use std::fmt;

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use url::form_urlencoded;

use crate::Error;
use crate::query::QueryParams;
use crate::transport::TransportConfig;

const JSON: &str = "application/json";

// ── Path segments ────────────────────────────────────────────────────

/// One path segment, percent-encoded when formatted.
///
/// Keeps `/`, `?` and `#` inside an id from changing the route.
pub(crate) struct Segment<'a>(pub &'a str);

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in form_urlencoded::byte_serialize(self.0.as_bytes()) {
            // Form encoding turns spaces into `+`; paths need `%20`.
            f.write_str(if chunk == "+" { "%20" } else { chunk })?;
        }
        Ok(())
    }
}

// ── Request options ──────────────────────────────────────────────────

/// Per-request options: verb, optional JSON body, extra headers.
///
/// `Content-Type: application/json` is sent unless `headers` already
/// carries a content type.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub headers: HeaderMap,
    pub query: QueryParams,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            query: QueryParams::new(),
        }
    }

    /// POST with `body` serialized as JSON.
    pub fn post_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, Error> {
        let bytes = serde_json::to_vec(body).map_err(Error::Encode)?;
        Ok(Self {
            method: Method::POST,
            body: Some(bytes),
            ..Self::get()
        })
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the digital-twin REST API.
///
/// Cheap to share behind an `Arc`; `reqwest::Client` pools connections
/// internally.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
        }
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Absolute URL for `path` (which should start with `/`) plus query.
    pub fn url(&self, path: &str, query: &QueryParams) -> Result<Url, Error> {
        let raw = format!("{}{path}{}", self.base_url, query.to_query_string());
        Ok(Url::parse(&raw)?)
    }

    // ── Request entry points ─────────────────────────────────────────

    /// Issue a request and decode the JSON response body as `T`.
    ///
    /// The payload is trusted: there is no shape validation beyond what
    /// `serde` needs to build `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let resp = self.send(path, options).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Issue a request and return the raw body with its content type.
    pub async fn request_bytes(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<(Option<String>, Bytes), Error> {
        let resp = self.send(path, options).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok((content_type, resp.bytes().await?))
    }

    // ── Shorthands used by the accessors ─────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.request(path, RequestOptions::get()).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<T, Error> {
        self.request(path, RequestOptions::get().with_query(query))
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.request(path, RequestOptions::post_json(body)?).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn send(&self, path: &str, options: RequestOptions) -> Result<reqwest::Response, Error> {
        let url = self.url(path, &options.query)?;
        debug!(method = %options.method, "{url}");

        let mut headers = options.headers;
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }

        let mut req = self.http.request(options.method, url).headers(headers);
        if let Some(body) = options.body {
            req = req.body(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "request failed");
            Err(Error::from_status(status.as_u16(), body))
        }
    }
}
