use serde::{Deserialize, Serialize};

pub mod records;

pub use records::{
    kinds, Click, ClickMetadata, MediaRef, Record, Recommendation, RecommendationMetadata,
    RetiredAlternate, Upload, UploadMetadata, UploadStatus,
};

/// Number of picks in every recommendation
pub const PICK_COUNT: usize = 3;

/// An unverified title/author guess read off a shelf photo or typed by the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleCandidate {
    pub title_candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_candidate: Option<String>,
    /// Quality signal in [0, 1]; never used to filter candidates
    pub confidence: f32,
}

impl TitleCandidate {
    pub fn new(title: impl Into<String>, author: Option<String>, confidence: f32) -> Self {
        Self {
            title_candidate: title.into(),
            author_candidate: author,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// A title the user typed in; asserted truth gets full confidence
    pub fn manual(title: impl Into<String>) -> Self {
        Self::new(title, None, 1.0)
    }
}

/// A book the user owns, after bibliographic normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedBook {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl OwnedBook {
    /// Normalization result when no lookup produced usable metadata
    pub fn from_candidate(candidate: &TitleCandidate) -> Self {
        Self {
            title: candidate.title_candidate.clone(),
            author: candidate.author_candidate.clone(),
            isbn13: None,
            subjects: Vec::new(),
            year: None,
        }
    }
}

/// Canonical metadata returned by a bibliographic lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BookMetadata {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn13: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// A ready-to-swap substitute for a pick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlternatePick {
    pub title: String,
    pub author: String,
    pub reason: String,
    pub amazon_url: String,
}

/// A recommended book shown to the user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookPick {
    pub title: String,
    pub author: String,
    pub reason: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub amazon_url: String,
    pub alt: AlternatePick,
}

/// Case- and whitespace-insensitive title comparison
pub fn same_title(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    };
    normalize(a) == normalize(b)
}
