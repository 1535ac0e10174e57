use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlternatePick, BookPick, OwnedBook, TitleCandidate, PICK_COUNT};

/// A stored document: store-assigned identity plus typed metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<M> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(flatten)]
    pub metadata: M,
}

pub type Upload = Record<UploadMetadata>;
pub type Recommendation = Record<RecommendationMetadata>;
pub type Click = Record<ClickMetadata>;

/// Collection names in the document store
pub mod kinds {
    pub const UPLOADS: &str = "uploads";
    pub const RECOMMENDATIONS: &str = "recommendations";
    pub const CLICKS: &str = "clicks";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Analyzed,
    Failed,
}

/// Where a stored shelf photo lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRef {
    pub id: String,
    pub name: String,
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadMetadata {
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image: Option<MediaRef>,
    #[serde(default)]
    pub parsed_titles: Vec<TitleCandidate>,
    #[serde(default)]
    pub owned_books: Vec<OwnedBook>,
    pub ip_hash: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_source: Option<String>,
}

impl UploadMetadata {
    pub fn pending(ip_hash: String, source_image: Option<MediaRef>) -> Self {
        Self {
            status: UploadStatus::Pending,
            source_image,
            parsed_titles: Vec::new(),
            owned_books: Vec::new(),
            ip_hash,
            notes: String::new(),
            upload_source: None,
        }
    }
}

/// An alternate that a swap replaced, kept so it is not lost
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetiredAlternate {
    pub slot_index: usize,
    pub alt: AlternatePick,
    pub replaced_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationMetadata {
    pub upload_id: String,
    pub picks: [BookPick; PICK_COUNT],
    #[serde(default)]
    pub alt_history: Vec<RetiredAlternate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickMetadata {
    pub rec_id: String,
    pub slot_index: usize,
    pub url: String,
    pub user_agent: String,
    pub ts: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_status_serialization() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Analyzed).unwrap(),
            "\"analyzed\""
        );
        let status: UploadStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, UploadStatus::Pending);
    }

    #[test]
    fn test_record_flattens_metadata() {
        let upload = Upload {
            id: "u1".to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            metadata: UploadMetadata::pending("abc".to_string(), None),
        };
        let json = serde_json::to_value(&upload).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["ip_hash"], "abc");
        assert!(json.get("source_image").is_none());
    }

    #[test]
    fn test_recommendation_rejects_wrong_pick_count() {
        let json = serde_json::json!({
            "upload_id": "u1",
            "picks": []
        });
        assert!(serde_json::from_value::<RecommendationMetadata>(json).is_err());
    }
}
