// Connection-level state shared by both builders.
// Owns the transport and cache handles and runs the cache lookaround for GET calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::CacheStore;
use crate::config::DEFAULT_CACHE_TTL;
use crate::error::Result;
use crate::http::headers::decode_response;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub(crate) struct Connection {
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<dyn CacheStore>>,
    use_cache: bool,
    cache_ttl: u64,
    /// Raw response of the last completed call.
    response: Option<HttpResponse>,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            transport: None,
            cache: None,
            use_cache: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            response: None,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("has_transport", &self.transport.is_some())
            .field("has_cache", &self.cache.is_some())
            .field("use_cache", &self.use_cache)
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Transport in use, creating the default reqwest transport on first call.
    pub(crate) fn transport(&mut self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    pub(crate) fn transport_ref(&self) -> Option<&Arc<dyn Transport>> {
        self.transport.as_ref()
    }

    pub(crate) fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = Some(transport);
    }

    pub(crate) fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.cache.as_ref()
    }

    pub(crate) fn set_cache(&mut self, cache: Arc<dyn CacheStore>) {
        self.cache = Some(cache);
    }

    pub(crate) fn set_use_cache(&mut self, use_cache: bool) {
        self.use_cache = use_cache;
    }

    /// Whether GET calls go through the cache: enabled and a store is present.
    pub(crate) fn is_using_cache(&self) -> bool {
        self.use_cache && self.cache.is_some()
    }

    pub(crate) fn cache_ttl(&self) -> u64 {
        self.cache_ttl
    }

    pub(crate) fn set_cache_ttl(&mut self, seconds: u64) {
        self.cache_ttl = seconds;
    }

    pub(crate) fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub(crate) fn clear_response(&mut self) {
        self.response = None;
    }

    /// GET `url`, consulting the cache first when enabled.
    pub(crate) async fn get(&mut self, url: String, headers: Vec<(String, String)>) -> Result<Value> {
        let cache = if self.use_cache {
            self.cache.clone()
        } else {
            None
        };

        if let Some(cache) = &cache {
            if let Some(value) = cache.get(&url)? {
                debug!(url = %url, "cache hit");
                return Ok(value);
            }
            debug!(url = %url, "cache miss");
        }

        let value = self
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: url.clone(),
                headers,
                body: None,
            })
            .await?;

        if let Some(cache) = cache {
            cache.put(&url, &value, Duration::from_secs(self.cache_ttl))?;
            debug!(url = %url, ttl = self.cache_ttl, "stored response in cache");
        }

        Ok(value)
    }

    /// Send a request without the cache and decode its JSON body.
    pub(crate) async fn send(&mut self, request: HttpRequest) -> Result<Value> {
        let transport = self.transport()?;
        let url = request.url.clone();

        debug!(method = %request.method, url = %url, "request");
        let response = transport.send(request).await?;
        let value = decode_response(&url, &response);
        self.response = Some(response);
        value
    }
}
