pub mod alternates;
pub mod extractor;
pub mod fallback;
pub mod identity;
pub mod isbn;
pub mod links;
pub mod normalizer;
pub mod pipeline;
pub mod providers;
pub mod recommendations;
pub mod reply;

pub use alternates::AlternateService;
pub use extractor::CandidateExtractor;
pub use fallback::{FallbackCatalog, StaticFallback};
pub use links::{build_link, LinkBuilder};
pub use normalizer::BookNormalizer;
pub use pipeline::{AnalyzeInput, Capabilities, Pipeline};
pub use recommendations::RecommendationEngine;
