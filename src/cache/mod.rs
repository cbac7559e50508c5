// Cache module.
// The cache port consulted around GET calls, plus in-memory and filesystem stores.

pub mod file;
pub mod paths;
pub mod store;

pub use file::FileStore;
pub use store::{CacheStore, CachedData, MemoryStore};
