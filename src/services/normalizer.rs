use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{
    models::{BookMetadata, OwnedBook, TitleCandidate},
    services::providers::{BibliographicLookup, CallPolicy, LookupQuery, ParseOutcome},
};

/// Resolves title candidates into owned books
///
/// Candidates are looked up concurrently (bounded by `concurrency`), each inside its own
/// failure boundary, and the output keeps input order one-to-one.
pub struct BookNormalizer {
    lookup: Arc<dyn BibliographicLookup>,
    policy: CallPolicy,
    concurrency: usize,
}

impl BookNormalizer {
    pub fn new(lookup: Arc<dyn BibliographicLookup>, policy: CallPolicy, concurrency: usize) -> Self {
        Self {
            lookup,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn normalize(&self, candidates: &[TitleCandidate]) -> Vec<OwnedBook> {
        let permits = Arc::new(Semaphore::new(self.concurrency));

        let handles: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|candidate| {
                let lookup = Arc::clone(&self.lookup);
                let permits = Arc::clone(&permits);
                let policy = self.policy;
                tokio::spawn(async move {
                    // the semaphore is never closed
                    let _permit = permits.acquire_owned().await.ok();
                    resolve(lookup.as_ref(), &policy, &candidate).await
                })
            })
            .collect();

        let mut owned = Vec::with_capacity(candidates.len());
        for (handle, candidate) in handles.into_iter().zip(candidates) {
            match handle.await {
                Ok(book) => owned.push(book),
                Err(e) => {
                    tracing::error!(title = %candidate.title_candidate, error = %e, "Lookup task failed");
                    owned.push(OwnedBook::from_candidate(candidate));
                }
            }
        }

        let resolved = owned.iter().filter(|b| b.isbn13.is_some() || !b.subjects.is_empty()).count();
        tracing::info!(candidates = candidates.len(), resolved, "Normalization finished");
        owned
    }
}

async fn resolve(
    lookup: &dyn BibliographicLookup,
    policy: &CallPolicy,
    candidate: &TitleCandidate,
) -> OwnedBook {
    let title = candidate.title_candidate.trim();
    if title.is_empty() {
        return OwnedBook::from_candidate(candidate);
    }

    let query = LookupQuery {
        title: title.to_string(),
        author: candidate.author_candidate.clone(),
    };

    match policy.run(lookup.name(), || lookup.lookup(&query)).await {
        Ok(ParseOutcome::Parsed(metadata)) => merge(candidate, metadata),
        Ok(ParseOutcome::Unparseable) => {
            tracing::debug!(title = %query.title, "No bibliographic match");
            OwnedBook::from_candidate(candidate)
        }
        Err(e) => {
            tracing::warn!(title = %query.title, error = %e, "Bibliographic lookup failed");
            OwnedBook::from_candidate(candidate)
        }
    }
}

/// The lookup's title and author win; the candidate's author fills a gap
fn merge(candidate: &TitleCandidate, metadata: BookMetadata) -> OwnedBook {
    let title = if metadata.title.trim().is_empty() {
        candidate.title_candidate.clone()
    } else {
        metadata.title
    };

    OwnedBook {
        title,
        author: metadata.author.or_else(|| candidate.author_candidate.clone()),
        isbn13: metadata.isbn13,
        subjects: metadata.subjects,
        year: metadata.year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{CapabilityError, MockBibliographicLookup};
    use std::time::Duration;

    fn policy() -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(200),
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn normalizer(lookup: MockBibliographicLookup) -> BookNormalizer {
        BookNormalizer::new(Arc::new(lookup), policy(), 2)
    }

    fn metadata(title: &str) -> BookMetadata {
        BookMetadata {
            title: title.to_string(),
            author: Some("Canonical Author".to_string()),
            isbn13: Some("9780441013593".to_string()),
            subjects: vec!["Science fiction".to_string()],
            year: Some(1965),
        }
    }

    #[tokio::test]
    async fn test_output_matches_input_order_despite_failures() {
        let mut lookup = MockBibliographicLookup::new();
        lookup.expect_name().return_const("mock");
        lookup.expect_lookup().returning(|query| match query.title.as_str() {
            "dune" => Ok(ParseOutcome::Parsed(metadata("Dune"))),
            "Broken" => Err(CapabilityError::Malformed("bad json".to_string())),
            "Missing" => Ok(ParseOutcome::Unparseable),
            other => Ok(ParseOutcome::Parsed(metadata(&other.to_uppercase()))),
        });

        let candidates = vec![
            TitleCandidate::manual("dune"),
            TitleCandidate::manual("Broken"),
            TitleCandidate::new("Missing", Some("Someone".to_string()), 0.4),
            TitleCandidate::manual("sapiens"),
            TitleCandidate::manual("Broken"),
        ];
        let owned = normalizer(lookup).normalize(&candidates).await;

        let titles: Vec<&str> = owned.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Broken", "Missing", "SAPIENS", "Broken"]);
        assert_eq!(owned[0].isbn13.as_deref(), Some("9780441013593"));
        assert_eq!(owned[1], OwnedBook::from_candidate(&candidates[1]));
        assert_eq!(owned[2].author.as_deref(), Some("Someone"));
        assert!(owned[2].subjects.is_empty());
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_without_affecting_siblings() {
        struct SlowForOne;

        #[async_trait::async_trait]
        impl BibliographicLookup for SlowForOne {
            async fn lookup(
                &self,
                query: &LookupQuery,
            ) -> crate::services::providers::CapabilityResult<ParseOutcome<BookMetadata>> {
                if query.title == "Slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok(ParseOutcome::Parsed(metadata(&query.title)))
            }

            fn name(&self) -> &'static str {
                "slow"
            }
        }

        let normalizer = BookNormalizer::new(Arc::new(SlowForOne), policy(), 4);
        let candidates = vec![
            TitleCandidate::manual("Fast"),
            TitleCandidate::manual("Slow"),
            TitleCandidate::manual("Also fast"),
        ];
        let owned = normalizer.normalize(&candidates).await;

        assert_eq!(owned.len(), 3);
        assert!(owned[0].isbn13.is_some());
        assert_eq!(owned[1].isbn13, None);
        assert!(owned[2].isbn13.is_some());
    }

    #[tokio::test]
    async fn test_lookup_author_falls_back_to_candidate() {
        let mut lookup = MockBibliographicLookup::new();
        lookup.expect_name().return_const("mock");
        lookup.expect_lookup().returning(|_| {
            Ok(ParseOutcome::Parsed(BookMetadata {
                title: "Pachinko".to_string(),
                ..Default::default()
            }))
        });

        let candidates = vec![TitleCandidate::new(
            "pachinko",
            Some("Min Jin Lee".to_string()),
            0.8,
        )];
        let owned = normalizer(lookup).normalize(&candidates).await;
        assert_eq!(owned[0].title, "Pachinko");
        assert_eq!(owned[0].author.as_deref(), Some("Min Jin Lee"));
    }

    #[tokio::test]
    async fn test_blank_title_is_not_looked_up() {
        let mut lookup = MockBibliographicLookup::new();
        lookup.expect_lookup().never();

        let candidates = vec![TitleCandidate::manual("  ")];
        let owned = normalizer(lookup).normalize(&candidates).await;
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let lookup = MockBibliographicLookup::new();
        assert!(normalizer(lookup).normalize(&[]).await.is_empty());
    }
}
