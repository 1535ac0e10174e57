/// External capability ports
///
/// The pipeline depends on three remote capabilities: a vision model that reads book
/// spines off a photo, a reasoning model that writes recommendations, and one or more
/// bibliographic lookups. Each is a trait so deployments can plug in a different vendor
/// and tests can substitute doubles. Every call can fail, time out or return garbage;
/// callers wrap calls in a [`CallPolicy`] and own the fallback.
use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::models::BookMetadata;

pub mod cached;
pub mod chain;
pub mod chat_completions;
pub mod google_books;
pub mod open_library;
pub mod unavailable;

pub use cached::CachedLookup;
pub use chain::LookupChain;
pub use chat_completions::ChatCompletionsClient;
pub use google_books::GoogleBooksLookup;
pub use open_library::OpenLibraryLookup;
pub use unavailable::UnavailableCapability;

/// Failure of a remote capability call
#[derive(thiserror::Error, Debug)]
pub enum CapabilityError {
    #[error("{0} capability is not configured")]
    Unavailable(String),

    #[error("capability call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("capability returned status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed capability reply: {0}")]
    Malformed(String),
}

impl CapabilityError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CapabilityError::Timeout(_) | CapabilityError::Transport(_) => true,
            CapabilityError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            CapabilityError::Unavailable(_) | CapabilityError::Malformed(_) => false,
        }
    }
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Result of interpreting a capability reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseOutcome<T> {
    Parsed(T),
    Unparseable,
}

impl<T> ParseOutcome<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(value) => Some(value),
            ParseOutcome::Unparseable => None,
        }
    }
}

impl<T> From<Option<T>> for ParseOutcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => ParseOutcome::Parsed(value),
            None => ParseOutcome::Unparseable,
        }
    }
}

/// What a bibliographic lookup is asked to resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupQuery {
    pub title: String,
    pub author: Option<String>,
}

/// Reads book spines off a shelf photo and replies in free text
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VisionCapability: Send + Sync {
    async fn detect_books(&self, image_url: &str) -> CapabilityResult<String>;
}

/// Answers a text prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReasoningCapability: Send + Sync {
    async fn reason(&self, prompt: &str) -> CapabilityResult<String>;
}

/// Resolves a title (and optional author) to canonical metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BibliographicLookup: Send + Sync {
    /// `Unparseable` means the service answered but had no usable match
    async fn lookup(&self, query: &LookupQuery) -> CapabilityResult<ParseOutcome<BookMetadata>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Timeout and retry budget applied to every capability call
#[derive(Debug, Clone, Copy)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            backoff: Duration::from_millis(250),
        }
    }

    /// Runs `call`, bounding each attempt by the timeout and retrying transient failures
    pub async fn run<T, F, Fut>(&self, capability: &str, mut call: F) -> CapabilityResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CapabilityResult<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(CapabilityError::Timeout(self.timeout)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!(
                        capability = capability,
                        attempt = attempt,
                        error = %e,
                        "Transient capability failure, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                }
                other => return other,
            }
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(20), 1)
    }
}
