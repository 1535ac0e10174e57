use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    models::BookMetadata,
    services::providers::{BibliographicLookup, CapabilityResult, LookupQuery, ParseOutcome},
};

const LOOKUP_CACHE_TTL: u64 = 604800; // 1 week

/// Caches successful lookups of the wrapped provider in Redis
///
/// Only `Parsed` answers are stored: a miss today may be a match once the
/// upstream catalogue is updated.
pub struct CachedLookup {
    inner: Arc<dyn BibliographicLookup>,
    cache: Cache,
}

impl CachedLookup {
    pub fn new(inner: Arc<dyn BibliographicLookup>, cache: Cache) -> Self {
        Self { inner, cache }
    }

    fn cache_key(query: &LookupQuery) -> CacheKey {
        CacheKey::BookLookup {
            title: query.title.clone(),
            author: query.author.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BibliographicLookup for CachedLookup {
    async fn lookup(&self, query: &LookupQuery) -> CapabilityResult<ParseOutcome<BookMetadata>> {
        let key = Self::cache_key(query);
        cached!(
            self.cache,
            key,
            LOOKUP_CACHE_TTL,
            |outcome: &ParseOutcome<BookMetadata>| outcome.is_parsed(),
            async move { self.inner.lookup(query).await }
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
