use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; the in-memory document store is used when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL; bibliographic lookups are not cached when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Affiliate tag appended to every purchase link
    #[serde(default = "default_amazon_tag")]
    pub amazon_tag: String,

    /// Storefront search endpoint used by the link builder
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,

    /// OpenAI-compatible chat completions base URL
    #[serde(default = "default_llm_base_url")]
    pub llm_base_url: String,

    /// Reasoning and vision are unavailable without a key
    #[serde(default)]
    pub llm_api_key: Option<String>,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    #[serde(default = "default_open_library_url")]
    pub open_library_url: String,

    #[serde(default = "default_google_books_url")]
    pub google_books_url: String,

    #[serde(default)]
    pub google_books_api_key: Option<String>,

    /// Upper bound on a single capability call, retries excluded
    #[serde(default = "default_capability_timeout_secs")]
    pub capability_timeout_secs: u64,

    /// Extra attempts after a transient capability failure
    #[serde(default = "default_capability_retries")]
    pub capability_retries: u32,

    /// Concurrent bibliographic lookups per normalization run
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Subjects kept per owned book
    #[serde(default = "default_max_subjects")]
    pub max_subjects: usize,

    #[serde(default = "default_image_max_mb")]
    pub image_max_mb: usize,

    /// Directory for uploaded shelf photos
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Externally reachable base URL, used to build media links. The vision
    /// capability gets stored photos inline, so it does not depend on this.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Salt for requester IP hashing
    #[serde(default = "default_salt_secret")]
    pub salt_secret: String,

    #[serde(default = "default_max_manual_titles")]
    pub max_manual_titles: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_amazon_tag() -> String {
    "shelfscout-20".to_string()
}

fn default_storefront_url() -> String {
    "https://www.amazon.com/s".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_vision_model() -> String {
    "gpt-4o".to_string()
}

fn default_open_library_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_google_books_url() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_capability_timeout_secs() -> u64 {
    20
}

fn default_capability_retries() -> u32 {
    1
}

fn default_lookup_concurrency() -> usize {
    4
}

fn default_max_subjects() -> usize {
    8
}

fn default_image_max_mb() -> usize {
    8
}

fn default_media_dir() -> String {
    "./media".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_salt_secret() -> String {
    "default-salt".to_string()
}

fn default_max_manual_titles() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            amazon_tag: default_amazon_tag(),
            storefront_url: default_storefront_url(),
            llm_base_url: default_llm_base_url(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            vision_model: default_vision_model(),
            open_library_url: default_open_library_url(),
            google_books_url: default_google_books_url(),
            google_books_api_key: None,
            capability_timeout_secs: default_capability_timeout_secs(),
            capability_retries: default_capability_retries(),
            lookup_concurrency: default_lookup_concurrency(),
            max_subjects: default_max_subjects(),
            image_max_mb: default_image_max_mb(),
            media_dir: default_media_dir(),
            public_base_url: default_public_base_url(),
            salt_secret: default_salt_secret(),
            max_manual_titles: default_max_manual_titles(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_secs(self.capability_timeout_secs)
    }

    pub fn image_max_bytes(&self) -> usize {
        self.image_max_mb * 1024 * 1024
    }
}
