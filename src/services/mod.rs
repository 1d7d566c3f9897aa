//! Service layer modules.
//!
//! Contains the Redis catalog cache, the realtime event hub and the document file storage.

pub mod cache;
pub mod events;
pub mod storage;

pub use cache::RedisCache;
pub use events::EventHub;
pub use storage::DocumentStorage;
