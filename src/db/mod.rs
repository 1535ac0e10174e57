pub mod documents;
pub mod media;
pub mod postgres;
pub mod records;
pub mod redis;

pub use documents::{Document, DocumentStore, InMemoryDocumentStore};
pub use media::{InMemoryMediaStore, LocalMediaStore, MediaStore};
pub use postgres::{create_pool, PgDocumentStore};
pub use records::Records;
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
