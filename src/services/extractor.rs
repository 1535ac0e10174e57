use std::sync::Arc;

use serde::Deserialize;

use crate::{
    models::TitleCandidate,
    services::{
        providers::{CallPolicy, CapabilityResult, ParseOutcome, VisionCapability},
        reply::parse_embedded_json,
    },
};

/// Confidence given to detections that do not state one
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// What the extractor reads titles from
#[derive(Debug, Clone, Copy)]
pub enum ExtractionInput<'a> {
    /// Publicly reachable URL of a shelf photo
    Image(&'a str),
    /// Entries typed by the user, each possibly holding several `;`/newline separated titles
    Manual(&'a [String]),
}

#[derive(Debug, Deserialize)]
struct DetectedBook {
    #[serde(default, alias = "title")]
    title_candidate: String,
    #[serde(default, alias = "author")]
    author_candidate: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Splits manual entries on semicolons and newlines, dropping blank segments
pub fn split_manual_titles(entries: &[String]) -> Vec<TitleCandidate> {
    entries
        .iter()
        .flat_map(|entry| entry.split([';', '\n']))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(TitleCandidate::manual)
        .collect()
}

/// Turns a free-text vision reply into candidates; no list means no books
pub fn parse_detections(reply: &str) -> Vec<TitleCandidate> {
    match parse_embedded_json::<Vec<DetectedBook>>(reply) {
        ParseOutcome::Parsed(books) => books
            .into_iter()
            .filter_map(|book| {
                let title = book.title_candidate.trim();
                if title.is_empty() {
                    return None;
                }
                let author = book
                    .author_candidate
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty());
                Some(TitleCandidate::new(
                    title,
                    author,
                    book.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                ))
            })
            .collect(),
        ParseOutcome::Unparseable => {
            tracing::info!("Vision reply contained no book list");
            Vec::new()
        }
    }
}

/// Produces title candidates from a photo or from typed titles
pub struct CandidateExtractor {
    vision: Arc<dyn VisionCapability>,
    policy: CallPolicy,
}

impl CandidateExtractor {
    pub fn new(vision: Arc<dyn VisionCapability>, policy: CallPolicy) -> Self {
        Self { vision, policy }
    }

    /// A vision failure is returned as an error; an unreadable reply is just an empty list
    pub async fn extract(&self, input: ExtractionInput<'_>) -> CapabilityResult<Vec<TitleCandidate>> {
        match input {
            ExtractionInput::Manual(entries) => Ok(split_manual_titles(entries)),
            ExtractionInput::Image(image_url) => {
                let reply = self
                    .policy
                    .run("vision", || self.vision.detect_books(image_url))
                    .await?;
                let candidates = parse_detections(&reply);
                tracing::info!(count = candidates.len(), "Books detected in shelf photo");
                Ok(candidates)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{CapabilityError, MockVisionCapability};
    use std::time::Duration;

    fn extractor(vision: MockVisionCapability) -> CandidateExtractor {
        CandidateExtractor::new(
            Arc::new(vision),
            CallPolicy {
                timeout: Duration::from_secs(1),
                retries: 0,
                backoff: Duration::ZERO,
            },
        )
    }

    #[test]
    fn test_manual_titles_split_on_both_separators() {
        let candidates = split_manual_titles(&["Dune; Sapiens\nPachinko".to_string()]);
        let titles: Vec<&str> = candidates
            .iter()
            .map(|c| c.title_candidate.as_str())
            .collect();
        assert_eq!(titles, vec!["Dune", "Sapiens", "Pachinko"]);
        assert!(candidates.iter().all(|c| c.confidence == 1.0));
    }

    #[test]
    fn test_manual_titles_drop_empty_segments() {
        let entries = vec![" ;Dune;;\n \n".to_string(), "".to_string(), "Sapiens ".to_string()];
        let candidates = split_manual_titles(&entries);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].title_candidate, "Sapiens");
    }

    #[test]
    fn test_parse_detections_accepts_short_keys_and_defaults_confidence() {
        let reply = r#"I can see these:
```json
[
  {"title": "Dune", "author": "Frank Herbert", "confidence": 0.92},
  {"title_candidate": "Sapiens", "author_candidate": ""},
  {"title": "   ", "confidence": 0.3},
  {"title": "Pachinko", "confidence": 4.0}
]
```"#;
        let candidates = parse_detections(reply);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].author_candidate.as_deref(), Some("Frank Herbert"));
        assert_eq!(candidates[1].author_candidate, None);
        assert_eq!(candidates[1].confidence, DEFAULT_CONFIDENCE);
        assert_eq!(candidates[2].confidence, 1.0);
    }

    #[tokio::test]
    async fn test_unparseable_vision_reply_is_empty_not_error() {
        let mut vision = MockVisionCapability::new();
        vision
            .expect_detect_books()
            .returning(|_| Ok("I don't see any books in this picture.".to_string()));

        let candidates = extractor(vision)
            .extract(ExtractionInput::Image("https://cdn.example.com/shelf.jpg"))
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_vision_failure_is_raised() {
        let mut vision = MockVisionCapability::new();
        vision
            .expect_detect_books()
            .returning(|_| Err(CapabilityError::Malformed("no choices".to_string())));

        let result = extractor(vision)
            .extract(ExtractionInput::Image("https://cdn.example.com/shelf.jpg"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_manual_input_skips_vision() {
        let vision = MockVisionCapability::new();
        let entries = vec!["Dune".to_string()];
        let candidates = extractor(vision)
            .extract(ExtractionInput::Manual(&entries))
            .await
            .unwrap();
        assert_eq!(candidates, vec![TitleCandidate::manual("Dune")]);
    }
}
