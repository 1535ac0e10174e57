use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::Config,
    db::{
        media::{data_url, image_extension},
        MediaStore, Records,
    },
    error::{AppError, AppResult},
    models::{
        AlternatePick, MediaRef, OwnedBook, Recommendation, RetiredAlternate, TitleCandidate,
        Upload, UploadMetadata, UploadStatus, PICK_COUNT,
    },
    services::{
        alternates::AlternateService,
        extractor::{split_manual_titles, CandidateExtractor, ExtractionInput},
        fallback::{FallbackCatalog, SWAP_ROTATION},
        links::LinkBuilder,
        normalizer::BookNormalizer,
        providers::{BibliographicLookup, CallPolicy, ReasoningCapability, VisionCapability},
        recommendations::RecommendationEngine,
    },
};

const MANUAL_SOURCE: &str = "manual";
const PHOTO_SOURCE: &str = "photo";

/// Retired alternates kept per slot; older ones are dropped
pub const ALT_HISTORY_PER_SLOT: usize = SWAP_ROTATION.len();

/// The remote capabilities the pipeline consumes
#[derive(Clone)]
pub struct Capabilities {
    pub vision: Arc<dyn VisionCapability>,
    pub reasoning: Arc<dyn ReasoningCapability>,
    pub lookup: Arc<dyn BibliographicLookup>,
}

/// What an analyze call runs on; exactly one source is allowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnalyzeInput<'a> {
    Upload(&'a str),
    Manual(&'a [String]),
}

impl<'a> AnalyzeInput<'a> {
    pub fn from_parts(
        upload_id: Option<&'a str>,
        manual_titles: Option<&'a [String]>,
    ) -> AppResult<Self> {
        let upload_id = upload_id.map(str::trim).filter(|id| !id.is_empty());
        match (upload_id, manual_titles) {
            (Some(id), None) => Ok(AnalyzeInput::Upload(id)),
            (None, Some(titles)) => Ok(AnalyzeInput::Manual(titles)),
            (Some(_), Some(_)) => Err(AppError::InvalidInput(
                "Provide either uploadId or manualTitles, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidInput(
                "Either uploadId or manualTitles is required".to_string(),
            )),
        }
    }
}

/// Runs uploads, analysis, swaps and click tracking against the stores
pub struct Pipeline {
    extractor: CandidateExtractor,
    normalizer: BookNormalizer,
    engine: RecommendationEngine,
    alternates: AlternateService,
    links: LinkBuilder,
    records: Records,
    media: Arc<dyn MediaStore>,
    image_max_bytes: usize,
    max_manual_titles: usize,
}

impl Pipeline {
    pub fn new(
        capabilities: Capabilities,
        fallback: Arc<dyn FallbackCatalog>,
        records: Records,
        media: Arc<dyn MediaStore>,
        config: &Config,
    ) -> Self {
        let policy = CallPolicy::new(config.capability_timeout(), config.capability_retries);

        Self {
            extractor: CandidateExtractor::new(capabilities.vision, policy),
            normalizer: BookNormalizer::new(capabilities.lookup, policy, config.lookup_concurrency),
            engine: RecommendationEngine::new(
                Arc::clone(&capabilities.reasoning),
                Arc::clone(&fallback),
                policy,
            ),
            alternates: AlternateService::new(capabilities.reasoning, fallback, policy),
            links: LinkBuilder::new(config.storefront_url.clone(), config.amazon_tag.clone()),
            records,
            media,
            image_max_bytes: config.image_max_bytes(),
            max_manual_titles: config.max_manual_titles,
        }
    }

    pub fn image_max_bytes(&self) -> usize {
        self.image_max_bytes
    }

    /// Validates and stores a shelf photo, creating a pending upload
    pub async fn submit_upload(
        &self,
        bytes: &[u8],
        content_type: &str,
        ip_hash: String,
    ) -> AppResult<Upload> {
        if image_extension(content_type).is_none() {
            return Err(AppError::UnsupportedMediaType(
                "Only JPEG and PNG images are accepted".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Image is empty".to_string()));
        }
        if bytes.len() > self.image_max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds {} bytes",
                self.image_max_bytes
            )));
        }

        let media = self.media.put(bytes, content_type).await?;
        let mut metadata = UploadMetadata::pending(ip_hash, Some(media));
        metadata.upload_source = Some(PHOTO_SOURCE.to_string());

        let upload = self.records.create_upload(&metadata).await?;
        tracing::info!(upload_id = %upload.id, size = bytes.len(), "Upload created");
        Ok(upload)
    }

    /// Extracts, normalizes and recommends; returns the new recommendation's id
    pub async fn analyze(&self, input: AnalyzeInput<'_>, ip_hash: String) -> AppResult<String> {
        let (upload_id, owned_books) = match input {
            AnalyzeInput::Upload(upload_id) => {
                let owned = self.analyze_upload(upload_id).await?;
                (upload_id.to_string(), owned)
            }
            AnalyzeInput::Manual(entries) => self.analyze_manual(entries, ip_hash).await?,
        };

        let picks = self.engine.recommend(&owned_books, &self.links).await;
        let recommendation = self.records.create_recommendation(&upload_id, picks).await?;

        tracing::info!(
            upload_id = %upload_id,
            recommendation_id = %recommendation.id,
            owned = owned_books.len(),
            "Recommendation created"
        );
        Ok(recommendation.id)
    }

    async fn analyze_upload(&self, upload_id: &str) -> AppResult<Vec<OwnedBook>> {
        let upload = self
            .records
            .get_upload(upload_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Upload not found".to_string()))?;

        // analysis is not repeated, so an analyzed upload never moves to failed
        if upload.metadata.status == UploadStatus::Analyzed {
            return Ok(upload.metadata.owned_books);
        }

        let image = upload
            .metadata
            .source_image
            .ok_or_else(|| AppError::InvalidInput("Upload has no image".to_string()))?;

        let image_url = self.vision_image_url(&image).await;
        let candidates = match self.extractor.extract(ExtractionInput::Image(&image_url)).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(upload_id = %upload_id, error = %e, "Book detection failed");
                if let Err(mark_err) = self
                    .records
                    .mark_upload_failed(upload_id, "Book detection failed")
                    .await
                {
                    tracing::error!(upload_id = %upload_id, error = %mark_err, "Could not mark upload failed");
                }
                return Err(AppError::Capability(e));
            }
        };

        let owned_books = self.normalizer.normalize(&candidates).await;
        self.records
            .mark_upload_analyzed(upload_id, &candidates, &owned_books)
            .await?;
        Ok(owned_books)
    }

    /// Inline bytes when the photo is still stored, so the vision model never has to
    /// reach this host; the public URL otherwise
    async fn vision_image_url(&self, image: &MediaRef) -> String {
        match self.media.get(image).await {
            Ok(Some(bytes)) => data_url(&image.content_type, &bytes),
            Ok(None) => {
                tracing::warn!(media = %image.name, "Stored photo missing, sending its URL");
                image.url.clone()
            }
            Err(e) => {
                tracing::warn!(media = %image.name, error = %e, "Could not read stored photo, sending its URL");
                image.url.clone()
            }
        }
    }

    async fn analyze_manual(
        &self,
        entries: &[String],
        ip_hash: String,
    ) -> AppResult<(String, Vec<OwnedBook>)> {
        let candidates: Vec<TitleCandidate> = split_manual_titles(entries);
        if candidates.is_empty() {
            return Err(AppError::InvalidInput(
                "manualTitles contains no titles".to_string(),
            ));
        }
        if candidates.len() > self.max_manual_titles {
            return Err(AppError::InvalidInput(format!(
                "At most {} titles can be analyzed at once",
                self.max_manual_titles
            )));
        }

        let owned_books = self.normalizer.normalize(&candidates).await;

        let metadata = UploadMetadata {
            status: UploadStatus::Analyzed,
            source_image: None,
            notes: format!("{} books identified", owned_books.len()),
            parsed_titles: candidates,
            owned_books: owned_books.clone(),
            ip_hash,
            upload_source: Some(MANUAL_SOURCE.to_string()),
        };
        let upload = self.records.create_upload(&metadata).await?;
        Ok((upload.id, owned_books))
    }

    pub async fn get_recommendation(&self, id: &str) -> AppResult<Recommendation> {
        self.records
            .get_recommendation(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recommendation not found".to_string()))
    }

    /// Replaces the alternate of one slot and keeps the replaced one in the history
    pub async fn swap_alternate(&self, rec_id: &str, slot_index: usize) -> AppResult<AlternatePick> {
        check_slot(slot_index)?;
        let recommendation = self.get_recommendation(rec_id).await?;
        let mut metadata = recommendation.metadata;

        let retired: Vec<String> = metadata
            .alt_history
            .iter()
            .filter(|entry| entry.slot_index == slot_index)
            .map(|entry| entry.alt.title.clone())
            .collect();

        let owned_books = self.owned_books_for(&metadata.upload_id).await;

        let new_alt = self
            .alternates
            .swap(&metadata.picks, slot_index, &retired, &owned_books, &self.links)
            .await?;

        let previous = std::mem::replace(&mut metadata.picks[slot_index].alt, new_alt.clone());
        retire(
            &mut metadata.alt_history,
            RetiredAlternate {
                slot_index,
                alt: previous,
                replaced_at: Utc::now(),
            },
        );

        self.records
            .update_recommendation_picks(rec_id, &metadata.picks, &metadata.alt_history)
            .await?;

        tracing::info!(
            recommendation_id = %rec_id,
            slot_index,
            alt = %new_alt.title,
            "Alternate swapped"
        );
        Ok(new_alt)
    }

    /// Shelf behind a recommendation; a missing upload only loses the exclusions
    async fn owned_books_for(&self, upload_id: &str) -> Vec<OwnedBook> {
        match self.records.get_upload(upload_id).await {
            Ok(Some(upload)) => upload.metadata.owned_books,
            Ok(None) => {
                tracing::warn!(upload_id = %upload_id, "Upload behind recommendation not found");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(upload_id = %upload_id, error = %e, "Could not load upload for swap");
                Vec::new()
            }
        }
    }

    /// Purchase URL currently stored for a slot
    pub async fn click_target(&self, rec_id: &str, slot_index: usize) -> AppResult<String> {
        check_slot(slot_index)?;
        let recommendation = self.get_recommendation(rec_id).await?;
        Ok(recommendation.metadata.picks[slot_index].amazon_url.clone())
    }

    /// Queues the click write; failures are only logged
    pub fn record_click(&self, rec_id: String, slot_index: usize, url: String, user_agent: String) {
        let records = self.records.clone();
        tokio::spawn(async move {
            match records
                .record_click(&rec_id, slot_index, &url, &user_agent)
                .await
            {
                Ok(click) => {
                    tracing::debug!(click_id = %click.id, recommendation_id = %rec_id, slot_index, "Click recorded")
                }
                Err(e) => {
                    tracing::warn!(recommendation_id = %rec_id, error = %e, "Failed to record click")
                }
            }
        });
    }
}

/// Appends to the swap history, keeping at most `ALT_HISTORY_PER_SLOT` entries per slot
fn retire(history: &mut Vec<RetiredAlternate>, entry: RetiredAlternate) {
    let slot_index = entry.slot_index;
    history.push(entry);

    let mut excess = history
        .iter()
        .filter(|e| e.slot_index == slot_index)
        .count()
        .saturating_sub(ALT_HISTORY_PER_SLOT);
    history.retain(|e| {
        if excess > 0 && e.slot_index == slot_index {
            excess -= 1;
            false
        } else {
            true
        }
    });
}

fn check_slot(slot_index: usize) -> AppResult<()> {
    if slot_index >= PICK_COUNT {
        return Err(AppError::InvalidInput(format!(
            "slotIndex must be between 0 and {}",
            PICK_COUNT - 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryDocumentStore, InMemoryMediaStore};
    use crate::models::BookMetadata;
    use crate::services::fallback::StaticFallback;
    use crate::services::providers::{
        CapabilityError, MockBibliographicLookup, MockReasoningCapability, MockVisionCapability,
        ParseOutcome, UnavailableCapability,
    };

    struct Harness {
        pipeline: Pipeline,
        records: Records,
    }

    fn unreachable_lookup() -> MockBibliographicLookup {
        let mut lookup = MockBibliographicLookup::new();
        lookup.expect_name().return_const("mock");
        lookup
            .expect_lookup()
            .returning(|_| Err(CapabilityError::Unavailable("lookup".to_string())));
        lookup
    }

    fn harness(vision: Arc<dyn VisionCapability>, lookup: MockBibliographicLookup) -> Harness {
        let records = Records::new(Arc::new(InMemoryDocumentStore::new()));
        let config = Config {
            amazon_tag: "test-tag".to_string(),
            capability_timeout_secs: 1,
            capability_retries: 0,
            ..Config::default()
        };
        let pipeline = Pipeline::new(
            Capabilities {
                vision,
                reasoning: Arc::new(UnavailableCapability::new("reasoning")),
                lookup: Arc::new(lookup),
            },
            Arc::new(StaticFallback),
            records.clone(),
            Arc::new(InMemoryMediaStore::new()),
            &config,
        );
        Harness { pipeline, records }
    }

    fn no_vision() -> Arc<dyn VisionCapability> {
        Arc::new(UnavailableCapability::new("vision"))
    }

    #[test]
    fn test_analyze_input_requires_exactly_one_source() {
        let titles = vec!["Dune".to_string()];
        assert!(matches!(
            AnalyzeInput::from_parts(Some("u1"), None),
            Ok(AnalyzeInput::Upload("u1"))
        ));
        assert!(AnalyzeInput::from_parts(None, Some(titles.as_slice())).is_ok());
        assert!(AnalyzeInput::from_parts(Some(" "), Some(titles.as_slice())).is_ok());
        assert!(AnalyzeInput::from_parts(Some("u1"), Some(titles.as_slice())).is_err());
        assert!(matches!(
            AnalyzeInput::from_parts(None, None),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_manual_analysis_creates_analyzed_upload_and_fallback_picks() {
        let h = harness(no_vision(), unreachable_lookup());
        let titles = vec!["Dune".to_string(), "Sapiens".to_string()];

        let rec_id = h
            .pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await
            .unwrap();

        let rec = h.pipeline.get_recommendation(&rec_id).await.unwrap();
        assert_eq!(rec.metadata.picks.len(), PICK_COUNT);
        assert!(rec.metadata.picks.iter().all(|p| p.amazon_url.contains("tag=test-tag")));

        let upload = h
            .records
            .get_upload(&rec.metadata.upload_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(upload.metadata.status, UploadStatus::Analyzed);
        assert_eq!(upload.metadata.owned_books.len(), 2);
        assert_eq!(upload.metadata.upload_source.as_deref(), Some("manual"));
    }

    #[tokio::test]
    async fn test_manual_analysis_rejects_blank_titles() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        let titles = vec![" ; \n".to_string()];
        let result = h
            .pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unknown_upload_is_not_found() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        let result = h
            .pipeline
            .analyze(AnalyzeInput::Upload("missing"), "hash".to_string())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_without_image_is_bad_request() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        let upload = h
            .records
            .create_upload(&UploadMetadata::pending("hash".to_string(), None))
            .await
            .unwrap();

        let result = h
            .pipeline
            .analyze(AnalyzeInput::Upload(&upload.id), "hash".to_string())
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_image_analysis_marks_upload_analyzed() {
        let mut vision = MockVisionCapability::new();
        vision
            .expect_detect_books()
            .withf(|url| url.starts_with("data:image/jpeg;base64,"))
            .times(1)
            .returning(|_| {
                Ok(r#"[{"title": "dune", "author": "Frank Herbert", "confidence": 0.9}]"#.to_string())
            });
        let mut lookup = MockBibliographicLookup::new();
        lookup.expect_name().return_const("mock");
        lookup.expect_lookup().returning(|_| {
            Ok(ParseOutcome::Parsed(BookMetadata {
                title: "Dune".to_string(),
                author: Some("Frank Herbert".to_string()),
                subjects: vec!["Science fiction".to_string()],
                ..Default::default()
            }))
        });
        let h = harness(Arc::new(vision), lookup);

        let upload = h
            .pipeline
            .submit_upload(b"\xff\xd8\xff", "image/jpeg", "hash".to_string())
            .await
            .unwrap();
        let rec_id = h
            .pipeline
            .analyze(AnalyzeInput::Upload(&upload.id), "other".to_string())
            .await
            .unwrap();

        let stored = h.records.get_upload(&upload.id).await.unwrap().unwrap();
        assert_eq!(stored.metadata.status, UploadStatus::Analyzed);
        assert_eq!(stored.metadata.owned_books[0].title, "Dune");
        assert_eq!(stored.metadata.parsed_titles[0].title_candidate, "dune");

        // a second analysis reuses the stored books instead of calling vision again
        let again = h
            .pipeline
            .analyze(AnalyzeInput::Upload(&upload.id), "other".to_string())
            .await
            .unwrap();
        assert_ne!(rec_id, again);
    }

    #[tokio::test]
    async fn test_vision_failure_marks_upload_failed() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        let upload = h
            .pipeline
            .submit_upload(b"png", "image/png", "hash".to_string())
            .await
            .unwrap();

        let result = h
            .pipeline
            .analyze(AnalyzeInput::Upload(&upload.id), "hash".to_string())
            .await;
        assert!(matches!(result, Err(AppError::Capability(_))));

        let stored = h.records.get_upload(&upload.id).await.unwrap().unwrap();
        assert_eq!(stored.metadata.status, UploadStatus::Failed);
    }

    #[tokio::test]
    async fn test_submit_upload_validation() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        assert!(matches!(
            h.pipeline.submit_upload(b"gif", "image/gif", String::new()).await,
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            h.pipeline.submit_upload(b"", "image/png", String::new()).await,
            Err(AppError::InvalidInput(_))
        ));
        let too_big = vec![0u8; h.pipeline.image_max_bytes() + 1];
        assert!(matches!(
            h.pipeline.submit_upload(&too_big, "image/png", String::new()).await,
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_swap_persists_new_alternate_and_history() {
        let h = harness(no_vision(), unreachable_lookup());
        let titles = vec!["Dune".to_string()];
        let rec_id = h
            .pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await
            .unwrap();
        let before = h.pipeline.get_recommendation(&rec_id).await.unwrap();

        let first = h.pipeline.swap_alternate(&rec_id, 1).await.unwrap();
        let second = h.pipeline.swap_alternate(&rec_id, 1).await.unwrap();
        assert_ne!(first.title, second.title);

        let after = h.pipeline.get_recommendation(&rec_id).await.unwrap();
        assert_eq!(after.metadata.picks[1].alt, second);
        assert_eq!(after.metadata.picks[0], before.metadata.picks[0]);
        assert_eq!(after.metadata.alt_history.len(), 2);
        assert_eq!(after.metadata.alt_history[0].alt, before.metadata.picks[1].alt);
        assert_eq!(after.metadata.alt_history[1].alt, first);
    }

    #[tokio::test]
    async fn test_repeated_swaps_always_replace_the_alternate() {
        let h = harness(no_vision(), unreachable_lookup());
        let titles = vec!["Dune".to_string()];
        let rec_id = h
            .pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await
            .unwrap();

        for round in 0..10 {
            let current = h.pipeline.get_recommendation(&rec_id).await.unwrap().metadata.picks[1]
                .alt
                .clone();
            let swapped = h.pipeline.swap_alternate(&rec_id, 1).await.unwrap();
            assert_ne!(swapped.title, current.title, "round {} kept the alternate", round);
        }

        let rec = h.pipeline.get_recommendation(&rec_id).await.unwrap();
        assert_eq!(rec.metadata.alt_history.len(), ALT_HISTORY_PER_SLOT);
        assert!(rec.metadata.alt_history.iter().all(|e| e.slot_index == 1));
    }

    #[tokio::test]
    async fn test_swap_avoids_books_on_the_shelf() {
        let h = harness(no_vision(), unreachable_lookup());
        let titles = vec!["The Martian".to_string()];
        let rec_id = h
            .pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await
            .unwrap();

        // slot 1 would otherwise start its rotation at The Martian
        let alt = h.pipeline.swap_alternate(&rec_id, 1).await.unwrap();
        assert_eq!(alt.title, "21 Lessons for the 21st Century");
    }

    #[test]
    fn test_history_is_capped_per_slot() {
        let entry = |slot_index: usize, title: &str| RetiredAlternate {
            slot_index,
            alt: AlternatePick {
                title: title.to_string(),
                author: "a".to_string(),
                reason: "r".to_string(),
                amazon_url: String::new(),
            },
            replaced_at: Utc::now(),
        };

        let mut history = vec![entry(0, "keep")];
        for i in 0..ALT_HISTORY_PER_SLOT + 3 {
            retire(&mut history, entry(2, &i.to_string()));
        }

        assert_eq!(history.len(), ALT_HISTORY_PER_SLOT + 1);
        assert_eq!(history[0].alt.title, "keep");
        assert_eq!(history[1].alt.title, "3");
        assert_eq!(
            history.last().unwrap().alt.title,
            (ALT_HISTORY_PER_SLOT + 2).to_string()
        );
    }

    #[tokio::test]
    async fn test_swap_validates_slot_and_recommendation() {
        let h = harness(no_vision(), MockBibliographicLookup::new());
        assert!(matches!(
            h.pipeline.swap_alternate("missing", 5).await,
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            h.pipeline.swap_alternate("missing", 0).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reasoning_reply_is_persisted() {
        let mut reasoning = MockReasoningCapability::new();
        reasoning.expect_reason().returning(|_| {
            Ok(r#"[
                {"title": "A", "author": "a", "reason": "r", "alt": {"title": "A2", "author": "a"}},
                {"title": "B", "author": "b", "reason": "r", "alt": {"title": "B2", "author": "b"}},
                {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
            ]"#
            .to_string())
        });
        let records = Records::new(Arc::new(InMemoryDocumentStore::new()));
        let pipeline = Pipeline::new(
            Capabilities {
                vision: no_vision(),
                reasoning: Arc::new(reasoning),
                lookup: Arc::new(unreachable_lookup()),
            },
            Arc::new(StaticFallback),
            records,
            Arc::new(InMemoryMediaStore::new()),
            &Config::default(),
        );

        let titles = vec!["Dune".to_string()];
        let rec_id = pipeline
            .analyze(AnalyzeInput::Manual(&titles), "hash".to_string())
            .await
            .unwrap();
        let rec = pipeline.get_recommendation(&rec_id).await.unwrap();
        assert_eq!(rec.metadata.picks[2].title, "C");
    }
}
