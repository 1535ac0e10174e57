use std::sync::Arc;

use crate::{
    config::Config,
    db::{
        create_pool, create_redis_client, Cache, CacheWriterHandle, DocumentStore,
        InMemoryDocumentStore, LocalMediaStore, MediaStore, PgDocumentStore, Records,
    },
    services::{
        providers::{
            BibliographicLookup, CachedLookup, ChatCompletionsClient, GoogleBooksLookup,
            LookupChain, OpenLibraryLookup, ReasoningCapability, UnavailableCapability,
            VisionCapability,
        },
        Capabilities, Pipeline, StaticFallback,
    },
};

/// Shared application state
pub struct AppState {
    pub pipeline: Pipeline,
    pub config: Config,
}

impl AppState {
    /// Assembles the state from explicitly supplied collaborators
    pub fn new(
        config: Config,
        capabilities: Capabilities,
        store: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let pipeline = Pipeline::new(
            capabilities,
            Arc::new(StaticFallback),
            Records::new(store),
            media,
            &config,
        );
        Self { pipeline, config }
    }

    /// Wires production collaborators from the configuration
    ///
    /// Returns the cache writer handle when Redis is configured so the caller can
    /// flush it on shutdown.
    pub async fn from_config(config: Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let http_client = reqwest::Client::new();

        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => {
                let pg = PgDocumentStore::new(create_pool(url).await?);
                pg.ensure_schema().await?;
                tracing::info!("Using PostgreSQL document store");
                Arc::new(pg)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, documents are kept in memory");
                Arc::new(InMemoryDocumentStore::new())
            }
        };

        let (reasoning, vision): (Arc<dyn ReasoningCapability>, Arc<dyn VisionCapability>) =
            match &config.llm_api_key {
                Some(key) => {
                    let client = Arc::new(ChatCompletionsClient::new(
                        http_client.clone(),
                        config.llm_base_url.clone(),
                        key.clone(),
                        config.llm_model.clone(),
                        config.vision_model.clone(),
                    ));
                    let reasoning: Arc<dyn ReasoningCapability> = client.clone();
                    let vision: Arc<dyn VisionCapability> = client;
                    (reasoning, vision)
                }
                None => {
                    tracing::warn!("LLM_API_KEY not set, serving fallback recommendations only");
                    let reasoning: Arc<dyn ReasoningCapability> =
                        Arc::new(UnavailableCapability::new("reasoning"));
                    let vision: Arc<dyn VisionCapability> =
                        Arc::new(UnavailableCapability::new("vision"));
                    (reasoning, vision)
                }
            };

        let open_library: Arc<dyn BibliographicLookup> = Arc::new(OpenLibraryLookup::new(
            http_client.clone(),
            config.open_library_url.clone(),
            config.max_subjects,
        ));
        let google_books: Arc<dyn BibliographicLookup> = Arc::new(GoogleBooksLookup::new(
            http_client,
            config.google_books_url.clone(),
            config.google_books_api_key.clone(),
            config.max_subjects,
        ));
        let chain: Arc<dyn BibliographicLookup> =
            Arc::new(LookupChain::new(vec![open_library, google_books]));

        let mut cache_handle = None;
        let lookup: Arc<dyn BibliographicLookup> = match &config.redis_url {
            Some(url) => {
                let (cache, handle) = Cache::new(create_redis_client(url)?).await;
                cache_handle = Some(handle);
                tracing::info!("Caching bibliographic lookups in Redis");
                Arc::new(CachedLookup::new(chain, cache))
            }
            None => chain,
        };

        let media = Arc::new(LocalMediaStore::new(
            &config.media_dir,
            &config.public_base_url,
        ));

        let state = Self::new(
            config,
            Capabilities {
                vision,
                reasoning,
                lookup,
            },
            store,
            media,
        );
        Ok((state, cache_handle))
    }
}
