// Fluent request builder for the JSON:API backend.
// Accumulates query parameters, composes the request URL and runs GET/POST/PATCH calls.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::warn;
use url::form_urlencoded;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::connection::Connection;
use crate::error::{Result, SdkError};
use crate::http::headers::{decode_response, default_headers, json_headers};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// Related resources requested with `include=`.
///
/// Built from a single name or an ordered list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes(Vec<String>);

impl Includes {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Includes {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for Includes {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for Includes {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Includes {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Includes {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Includes {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Request builder for the JSON:API backend.
///
/// One builder holds the connection settings (token, base URL, transport,
/// cache) for a session. Each request starts with [`Builder::endpoint`], which
/// clears the per-request parameters, and ends with one terminal call.
///
/// ```ignore
/// let mut api = Builder::new("token", "https://api.example.test/");
/// let page = api
///     .endpoint("properties")
///     .filter("city", "Berlin")
///     .with(["images", "owner"])
///     .sort("-id")
///     .limit(20)
///     .get()
///     .await?;
/// ```
pub struct Builder {
    endpoint: Option<String>,
    id: Option<u64>,
    filter: BTreeMap<String, String>,
    include: Includes,
    sort: Option<String>,
    fields: Vec<String>,
    page_size: Option<u32>,
    page_number: Option<u32>,
    access_token: String,
    api_url: String,
    read_only: bool,
    connection: Connection,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("endpoint", &self.endpoint)
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("include", &self.include)
            .field("sort", &self.sort)
            .field("fields", &self.fields)
            .field("page_size", &self.page_size)
            .field("page_number", &self.page_number)
            .field("api_url", &self.api_url)
            .field("read_only", &self.read_only)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl Builder {
    /// Create a builder for the API at `api_url`, authenticating with `access_token`.
    pub fn new(access_token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            id: None,
            filter: BTreeMap::new(),
            include: Includes::default(),
            sort: None,
            fields: Vec::new(),
            page_size: None,
            page_number: None,
            access_token: access_token.into(),
            api_url: api_url.into(),
            read_only: false,
            connection: Connection::default(),
        }
    }

    /// Create a builder from connection-level configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new(config.access_token.clone(), config.api_url.clone());
        builder.read_only = config.read_only;
        builder.connection.set_use_cache(config.use_cache);
        builder.connection.set_cache_ttl(config.cache_ttl);
        builder
    }

    /// Start a new request against `endpoint`, e.g. `"properties"`.
    ///
    /// Clears filters, includes, id, sort, fields, paging and the last response.
    /// Connection settings are kept.
    pub fn endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.flush();
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Reset every per-request parameter.
    pub fn flush(&mut self) -> &mut Self {
        self.endpoint = None;
        self.id = None;
        self.filter.clear();
        self.include = Includes::default();
        self.sort = None;
        self.fields.clear();
        self.page_size = None;
        self.page_number = None;
        self.connection.clear_response();
        self
    }

    /// Add `filter[name]=value`. Setting the same name again replaces the value.
    pub fn filter(&mut self, name: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        self.filter.insert(name.into(), value.to_string());
        self
    }

    /// Add several filters at once.
    pub fn filters<I, K, V>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        for (name, value) in filters {
            self.filter(name, value);
        }
        self
    }

    /// Include related resources, e.g. `with("comments")` or `with(["comments", "images"])`.
    pub fn with(&mut self, include: impl Into<Includes>) -> &mut Self {
        self.include = include.into();
        self
    }

    /// Sort expression; a leading `-` sorts descending.
    pub fn sort(&mut self, sort: impl Into<String>) -> &mut Self {
        self.sort = Some(sort.into());
        self
    }

    /// Limit fields loaded in the response.
    ///
    /// Stored only: the backend's sparse fieldset syntax is per resource type,
    /// so nothing is added to the query string.
    pub fn fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(&mut self, size: u32) -> &mut Self {
        self.page_size = Some(size);
        self
    }

    /// Alias for [`Builder::page_size`].
    pub fn limit(&mut self, size: u32) -> &mut Self {
        self.page_size(size)
    }

    pub fn set_current_page(&mut self, page: u32) -> &mut Self {
        self.page_number = Some(page);
        self
    }

    pub fn id(&mut self, id: u64) -> &mut Self {
        self.id = Some(id);
        self
    }

    /// Compose the request URL from the accumulated state.
    pub fn build_url(&self) -> String {
        let mut url = join_path(&self.api_url, self.endpoint.as_deref().unwrap_or(""));
        if let Some(id) = self.id.filter(|id| *id != 0) {
            url.push('/');
            url.push_str(&id.to_string());
        }

        let query = self.query_string();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());

        let include: Vec<&str> = self
            .include
            .0
            .iter()
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .collect();
        if !include.is_empty() {
            query.append_pair("include", &include.join(","));
        }
        for (name, value) in &self.filter {
            if name.is_empty() || value.is_empty() {
                continue;
            }
            query.append_pair(&format!("filter[{}]", name), value);
        }
        if let Some(size) = self.page_size {
            query.append_pair("page[size]", &size.to_string());
        }
        if let Some(number) = self.page_number {
            query.append_pair("page[number]", &number.to_string());
        }
        if let Some(sort) = self.sort.as_deref().filter(|sort| !sort.is_empty()) {
            query.append_pair("sort", sort);
        }

        query.finish()
    }

    /// GET the current URL.
    pub async fn get(&mut self) -> Result<Value> {
        let url = self.build_url();
        let headers = default_headers(Some(self.access_token.as_str()));
        self.connection.get(url, headers).await
    }

    /// Set the field selection, then GET.
    pub async fn select<I, S>(&mut self, fields: I) -> Result<Value>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields(fields);
        self.get().await
    }

    /// Set the id and GET the single resource.
    pub async fn find(&mut self, id: u64) -> Result<Value> {
        self.id(id);
        self.get().await
    }

    /// GET and return the first element of `data`, or `None` when it is empty or missing.
    pub async fn first(&mut self) -> Result<Option<Value>> {
        let response = self.get().await?;
        Ok(first_item(response))
    }

    /// Whether the current query matches at least one resource.
    pub async fn exists(&mut self) -> Result<bool> {
        Ok(self.first().await?.is_some())
    }

    /// Like [`Builder::first`], but a missing resource is an error.
    pub async fn first_or_fail(&mut self) -> Result<Value> {
        match self.first().await? {
            Some(item) => Ok(item),
            None => Err(SdkError::NotFound(self.build_url())),
        }
    }

    /// POST `body` as JSON to the current URL.
    ///
    /// In read-only mode nothing is sent and an empty object is returned.
    pub async fn post<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<Value> {
        if self.read_only {
            return Ok(self.suppressed(HttpMethod::Post));
        }

        let request = self.json_request(HttpMethod::Post, body)?;
        self.connection.send(request).await
    }

    /// POST without waiting for the response.
    ///
    /// The returned handle resolves to the decoded body.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, read-only mode included.
    pub fn post_async<T: Serialize + ?Sized>(
        &mut self,
        body: &T,
    ) -> Result<JoinHandle<Result<Value>>> {
        if self.read_only {
            let empty = self.suppressed(HttpMethod::Post);
            return Ok(tokio::spawn(async move { Ok(empty) }));
        }

        let request = self.json_request(HttpMethod::Post, body)?;
        let transport = self.connection.transport()?;

        Ok(tokio::spawn(async move {
            let url = request.url.clone();
            let response = transport.send(request).await?;
            decode_response(&url, &response)
        }))
    }

    /// PATCH resource `id` with `body` as JSON.
    ///
    /// In read-only mode nothing is sent and an empty object is returned.
    pub async fn patch<T: Serialize + ?Sized>(&mut self, id: u64, body: &T) -> Result<Value> {
        self.id(id);
        if self.read_only {
            return Ok(self.suppressed(HttpMethod::Patch));
        }

        let request = self.json_request(HttpMethod::Patch, body)?;
        self.connection.send(request).await
    }

    fn json_request<T: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        body: &T,
    ) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method,
            url: self.build_url(),
            headers: json_headers(Some(self.access_token.as_str())),
            body: Some(serde_json::to_string(body)?),
        })
    }

    fn suppressed(&self, method: HttpMethod) -> Value {
        warn!(method = %method, url = %self.build_url(), "read-only mode, request not sent");
        Value::Object(Map::new())
    }

    pub fn get_endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn get_id(&self) -> Option<u64> {
        self.id
    }

    pub fn get_filter(&self) -> &BTreeMap<String, String> {
        &self.filter
    }

    pub fn get_include(&self) -> &[String] {
        self.include.as_slice()
    }

    pub fn get_sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn get_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get_page_size(&self) -> Option<u32> {
        self.page_size
    }

    pub fn get_current_page(&self) -> Option<u32> {
        self.page_number
    }

    pub fn access_token(&mut self, access_token: impl Into<String>) -> &mut Self {
        self.access_token = access_token.into();
        self
    }

    pub fn get_access_token(&self) -> &str {
        &self.access_token
    }

    pub fn set_api_url(&mut self, api_url: impl Into<String>) -> &mut Self {
        self.api_url = api_url.into();
        self
    }

    pub fn get_api_url(&self) -> &str {
        &self.api_url
    }

    /// Suppress POST and PATCH calls.
    pub fn read_only(&mut self, read_only: bool) -> &mut Self {
        self.read_only = read_only;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Replace the transport. Without one, a reqwest transport is created on first call.
    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.connection.set_transport(transport);
        self
    }

    pub fn get_transport(&self) -> Option<&Arc<dyn Transport>> {
        self.connection.transport_ref()
    }

    pub fn set_cache(&mut self, cache: Arc<dyn CacheStore>) -> &mut Self {
        self.connection.set_cache(cache);
        self
    }

    pub fn get_cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.connection.cache()
    }

    /// Enable or disable the cache lookaround for GET calls.
    pub fn use_cache(&mut self, use_cache: bool) -> &mut Self {
        self.connection.set_use_cache(use_cache);
        self
    }

    /// Whether GET calls currently go through the cache.
    pub fn is_using_cache(&self) -> bool {
        self.connection.is_using_cache()
    }

    pub fn with_cache(&mut self) -> &mut Self {
        self.use_cache(true)
    }

    pub fn without_cache(&mut self) -> &mut Self {
        self.use_cache(false)
    }

    /// Seconds a cached response stays valid.
    pub fn cache_ttl(&mut self, seconds: u64) -> &mut Self {
        self.connection.set_cache_ttl(seconds);
        self
    }

    /// Alias for [`Builder::cache_ttl`].
    pub fn set_cache_ttl(&mut self, seconds: u64) -> &mut Self {
        self.cache_ttl(seconds)
    }

    pub fn get_cache_ttl(&self) -> u64 {
        self.connection.cache_ttl()
    }

    /// Raw response of the last call sent over the network.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.connection.response()
    }
}

/// Join a base URL and a path segment with exactly one slash.
fn join_path(base: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if base.is_empty() {
        return endpoint.to_string();
    }
    if endpoint.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

fn first_item(response: Value) -> Option<Value> {
    match response {
        Value::Object(mut body) => match body.remove("data") {
            Some(Value::Array(items)) => items.into_iter().next(),
            _ => None,
        },
        _ => None,
    }
}
