// Request builder for the static content storage API.
// Composes locale- and tenant-scoped file paths and fetches them with the cache lookaround.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::connection::Connection;
use crate::error::{Result, SdkError};
use crate::http::headers::default_headers;
use crate::http::{HttpResponse, Transport};

/// Default extension of storage files.
pub const DEFAULT_EXTENSION: &str = "json";

/// Builder for the read-only storage API.
///
/// Paths take the form
/// `{storage}/websites/{website}/{endpoint}/{id or locale}.{extension}`, with
/// `/marketplaces/{marketplace}` in place of the website prefix for marketplace
/// content. An endpoint starting with `/` is rooted at the storage URL and
/// skips the tenant prefix.
pub struct StorageBuilder {
    endpoint: Option<String>,
    id: Option<u64>,
    locale: Option<String>,
    extension: String,
    website_id: Option<u64>,
    marketplace_id: Option<u64>,
    listing_id: Option<u64>,
    storage_url: String,
    connection: Connection,
}

impl fmt::Debug for StorageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBuilder")
            .field("endpoint", &self.endpoint)
            .field("id", &self.id)
            .field("locale", &self.locale)
            .field("extension", &self.extension)
            .field("website_id", &self.website_id)
            .field("marketplace_id", &self.marketplace_id)
            .field("listing_id", &self.listing_id)
            .field("storage_url", &self.storage_url)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new("")
    }
}

impl StorageBuilder {
    pub fn new(storage_url: impl Into<String>) -> Self {
        Self {
            endpoint: None,
            id: None,
            locale: None,
            extension: DEFAULT_EXTENSION.to_string(),
            website_id: None,
            marketplace_id: None,
            listing_id: None,
            storage_url: storage_url.into(),
            connection: Connection::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new(config.storage_url.clone());
        builder.connection.set_use_cache(config.use_cache);
        builder.connection.set_cache_ttl(config.cache_ttl);
        builder
    }

    /// Start a new request against `endpoint`, e.g. `"menus"` or `"contents/"`.
    ///
    /// Clears the id and the last response; tenant scoping and locale are kept.
    pub fn endpoint(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.flush();
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Unset all call parameters.
    pub fn flush(&mut self) -> &mut Self {
        self.id = None;
        self.endpoint = None;
        self.connection.clear_response();
        self
    }

    /// Get routes for `locale`, or for the locale already set.
    pub async fn get_routes(&mut self, locale: Option<&str>) -> Result<Value> {
        self.endpoint("routes");
        if let Some(locale) = locale.filter(|locale| !locale.is_empty()) {
            self.locale(locale);
        }
        self.get().await
    }

    pub async fn find_content(&mut self, content_id: u64) -> Result<Value> {
        self.endpoint("contents").find(content_id).await
    }

    /// Get an item of the listing set with [`StorageBuilder::listing`].
    pub async fn get_listing_item(&mut self, id: u64) -> Result<Value> {
        let listing_id = self.require_listing()?;
        self.endpoint(format!("listings/{}/items", listing_id))
            .find(id)
            .await
    }

    /// Get a location of the listing set with [`StorageBuilder::listing`].
    pub async fn get_location(&mut self, id: u64) -> Result<Value> {
        let listing_id = self.require_listing()?;
        self.endpoint(format!("listings/{}/locations", listing_id))
            .find(id)
            .await
    }

    pub async fn find_profile(&mut self, profile_id: u64) -> Result<Value> {
        self.endpoint("profiles").find(profile_id).await
    }

    fn require_listing(&self) -> Result<u64> {
        self.listing_id
            .ok_or_else(|| SdkError::MissingConfig("listing id".to_string()))
    }

    /// Compose the storage file URL.
    pub fn build_url(&self) -> String {
        let mut url = self.get_storage_url().to_string();
        let endpoint = self.endpoint.as_deref().unwrap_or("");

        if !endpoint.starts_with('/') {
            if let Some(website_id) = self.website_id {
                url.push_str(&format!("/websites/{}", website_id));
            } else if let Some(marketplace_id) = self.marketplace_id {
                url.push_str(&format!("/marketplaces/{}", marketplace_id));
            }
        }

        let endpoint = endpoint.trim_matches('/');
        if !endpoint.is_empty() {
            url.push('/');
            url.push_str(endpoint);
        }

        match (self.id.filter(|id| *id != 0), self.locale.as_deref()) {
            (Some(id), _) => url.push_str(&format!("/{}", id)),
            (None, Some(locale)) if !locale.is_empty() => {
                url.push('/');
                url.push_str(locale);
            }
            _ => {}
        }

        url.push('.');
        url.push_str(&self.extension);
        url
    }

    pub async fn get(&mut self) -> Result<Value> {
        let url = self.build_url();
        self.connection.get(url, default_headers(None)).await
    }

    pub async fn find(&mut self, id: u64) -> Result<Value> {
        self.id(id);
        self.get().await
    }

    /// Error for a storage file the caller expected to exist.
    pub fn resource_not_found(&self) -> SdkError {
        SdkError::NotFound(self.build_url())
    }

    pub fn id(&mut self, id: u64) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn get_id(&self) -> Option<u64> {
        self.id
    }

    pub fn get_endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn locale(&mut self, locale: impl Into<String>) -> &mut Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn get_locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn website(&mut self, website_id: u64) -> &mut Self {
        self.website_id = Some(website_id);
        self
    }

    pub fn get_website(&self) -> Option<u64> {
        self.website_id
    }

    pub fn marketplace(&mut self, marketplace_id: u64) -> &mut Self {
        self.marketplace_id = Some(marketplace_id);
        self
    }

    pub fn get_marketplace(&self) -> Option<u64> {
        self.marketplace_id
    }

    pub fn listing(&mut self, listing_id: u64) -> &mut Self {
        self.listing_id = Some(listing_id);
        self
    }

    pub fn get_listing(&self) -> Option<u64> {
        self.listing_id
    }

    /// File extension without the dot.
    pub fn extension(&mut self, extension: impl Into<String>) -> &mut Self {
        let extension: String = extension.into();
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn get_extension(&self) -> &str {
        &self.extension
    }

    pub fn set_storage_url(&mut self, storage_url: impl Into<String>) -> &mut Self {
        self.storage_url = storage_url.into();
        self
    }

    /// Storage URL without trailing slashes.
    pub fn get_storage_url(&self) -> &str {
        self.storage_url.trim_end_matches('/')
    }

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

    pub fn use_cache(&mut self, use_cache: bool) -> &mut Self {
        self.connection.set_use_cache(use_cache);
        self
    }

    pub fn is_using_cache(&self) -> bool {
        self.connection.is_using_cache()
    }

    pub fn with_cache(&mut self) -> &mut Self {
        self.use_cache(true)
    }

    pub fn without_cache(&mut self) -> &mut Self {
        self.use_cache(false)
    }

    pub fn cache_ttl(&mut self, seconds: u64) -> &mut Self {
        self.connection.set_cache_ttl(seconds);
        self
    }

    pub fn set_cache_ttl(&mut self, seconds: u64) -> &mut Self {
        self.cache_ttl(seconds)
    }

    pub fn get_cache_ttl(&self) -> u64 {
        self.connection.cache_ttl()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.connection.response()
    }
}
