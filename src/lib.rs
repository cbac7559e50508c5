// Fluent request builders for the Monthly Cloud API.
// `Builder` targets the JSON:API backend, `StorageBuilder` the static content storage.

pub mod builder;
pub mod cache;
pub mod config;
mod connection;
pub mod error;
pub mod http;
pub mod storage;

#[cfg(test)]
mod testing;

pub use builder::{Builder, Includes};
pub use cache::{CacheStore, FileStore, MemoryStore};
pub use config::Config;
pub use error::{Result, SdkError};
pub use http::{ReqwestTransport, Transport};
pub use storage::StorageBuilder;
