// Test doubles for the transport and cache seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::cache::{CacheStore, MemoryStore};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Transport that replays queued responses and records every request.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new<I>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = HttpResponse>,
    {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A transport answering once with `200 OK` and `body`.
    pub(crate) fn json(body: &str) -> Arc<Self> {
        Self::new([HttpResponse::new(200, body)])
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| HttpResponse::new(500, "mock queue exhausted"));
        Ok(response)
    }
}

/// Memory cache that also records every `put`.
#[derive(Debug, Default)]
pub(crate) struct RecordingCache {
    inner: MemoryStore,
    puts: Mutex<Vec<(String, Value, Duration)>>,
}

impl RecordingCache {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn puts(&self) -> Vec<(String, Value, Duration)> {
        self.puts.lock().unwrap().clone()
    }
}

impl CacheStore for RecordingCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone(), ttl));
        self.inner.put(key, value, ttl)
    }

    fn forget(&self, key: &str) -> Result<bool> {
        self.inner.forget(key)
    }
}
