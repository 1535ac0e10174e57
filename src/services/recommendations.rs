use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::{
    models::{same_title, AlternatePick, BookPick, OwnedBook, PICK_COUNT},
    services::{
        fallback::{BookSeed, FallbackCatalog, PickSeed},
        links::LinkBuilder,
        providers::{CallPolicy, ParseOutcome, ReasoningCapability},
        reply::parse_embedded_json,
    },
};

const DEFAULT_REASON: &str = "Picked to complement the books already on your shelf.";

/// Pick as the reasoning capability writes it
#[derive(Debug, Deserialize)]
pub(crate) struct RawPick {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default, alias = "alternate")]
    alt: Option<RawAlternate>,
}

/// Alternate as the reasoning capability writes it
#[derive(Debug, Deserialize)]
pub(crate) struct RawAlternate {
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) author: String,
    #[serde(default)]
    pub(crate) reason: String,
}

impl RawAlternate {
    pub(crate) fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.author.trim().is_empty()
    }

    pub(crate) fn into_alternate(self, links: &LinkBuilder) -> AlternatePick {
        let title = self.title.trim().to_string();
        let author = self.author.trim().to_string();
        AlternatePick {
            amazon_url: links.link(&title, &author),
            reason: non_empty_reason(self.reason),
            title,
            author,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPicks {
    List(Vec<RawPick>),
    Wrapped { picks: Vec<RawPick> },
}

fn non_empty_reason(reason: String) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        DEFAULT_REASON.to_string()
    } else {
        reason.to_string()
    }
}

/// Subjects across the collection, most common first
pub fn genre_profile(owned_books: &[OwnedBook]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (String, usize)> = HashMap::new();
    for subject in owned_books.iter().flat_map(|book| &book.subjects) {
        let entry = counts
            .entry(subject.trim().to_lowercase())
            .or_insert_with(|| (subject.trim().to_string(), 0));
        entry.1 += 1;
    }

    let mut profile: Vec<(String, usize)> = counts.into_values().collect();
    profile.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    profile
}

/// One line per owned book for the prompt
pub fn describe_collection(owned_books: &[OwnedBook]) -> String {
    if owned_books.is_empty() {
        return "(no books could be identified)".to_string();
    }

    owned_books
        .iter()
        .map(|book| {
            let mut line = format!("- {}", book.title);
            if let Some(author) = &book.author {
                line.push_str(&format!(" by {}", author));
            }
            if !book.subjects.is_empty() {
                line.push_str(&format!(" (subjects: {})", book.subjects.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(owned_books: &[OwnedBook]) -> String {
    let profile = genre_profile(owned_books);
    let genres = if profile.is_empty() {
        "unknown".to_string()
    } else {
        profile
            .iter()
            .take(10)
            .map(|(genre, count)| format!("{} ({})", genre, count))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "A reader owns these books:\n{}\n\n\
         Genres on the shelf, most common first: {}\n\n\
         Recommend exactly {} books they do not already own. Spread the picks across \
         different genres from the shelf rather than three of the same kind. For each pick \
         give one alternate book that could replace it; alternates must not repeat any pick \
         or a book they own.\n\n\
         Reply with only a JSON array of {} objects with keys \"title\", \"author\", \
         \"reason\" (one or two sentences tied to their shelf), \"genres\" (array of strings) \
         and \"alt\" (object with \"title\", \"author\", \"reason\").",
        describe_collection(owned_books),
        genres,
        PICK_COUNT,
        PICK_COUNT
    )
}

pub(crate) fn seed_alternate(seed: &BookSeed, links: &LinkBuilder) -> AlternatePick {
    AlternatePick {
        title: seed.title.to_string(),
        author: seed.author.to_string(),
        reason: seed.reason.to_string(),
        amazon_url: links.link(seed.title, seed.author),
    }
}

fn seed_pick(seed: &PickSeed, links: &LinkBuilder) -> BookPick {
    BookPick {
        title: seed.book.title.to_string(),
        author: seed.book.author.to_string(),
        reason: seed.book.reason.to_string(),
        genres: seed.genres.iter().map(|g| g.to_string()).collect(),
        amazon_url: links.link(seed.book.title, seed.book.author),
        alt: seed_alternate(&seed.alt, links),
    }
}

/// Validates a reasoning reply and turns it into exactly three linked picks
pub(crate) fn interpret_reply(
    reply: &str,
    owned_books: &[OwnedBook],
    links: &LinkBuilder,
) -> ParseOutcome<[BookPick; PICK_COUNT]> {
    let raw = match parse_embedded_json::<RawPicks>(reply) {
        ParseOutcome::Parsed(RawPicks::List(picks)) | ParseOutcome::Parsed(RawPicks::Wrapped { picks }) => picks,
        ParseOutcome::Unparseable => {
            tracing::debug!("Reasoning reply contained no pick list");
            return ParseOutcome::Unparseable;
        }
    };

    if raw.len() < PICK_COUNT {
        tracing::debug!(count = raw.len(), "Reasoning reply returned too few picks");
        return ParseOutcome::Unparseable;
    }

    let raw: Vec<RawPick> = raw.into_iter().take(PICK_COUNT).collect();
    let pick_titles: Vec<String> = raw.iter().map(|p| p.title.trim().to_string()).collect();
    let on_shelf = |title: &str| owned_books.iter().any(|book| same_title(&book.title, title));

    let mut picks: Vec<BookPick> = Vec::with_capacity(PICK_COUNT);
    for pick in raw {
        let title = pick.title.trim().to_string();
        let author = pick.author.trim().to_string();
        if title.is_empty() || author.is_empty() {
            tracing::debug!("Pick without title or author");
            return ParseOutcome::Unparseable;
        }

        if picks.iter().any(|existing| same_title(&existing.title, &title)) {
            tracing::debug!(title = %title, "Duplicate pick");
            return ParseOutcome::Unparseable;
        }
        if on_shelf(&title) {
            tracing::debug!(title = %title, "Pick is already on the shelf");
            return ParseOutcome::Unparseable;
        }

        // an alternate may repeat neither any pick nor a shelf book
        let alt = match pick.alt {
            Some(alt)
                if alt.is_complete()
                    && !pick_titles.iter().any(|t| same_title(t, &alt.title))
                    && !on_shelf(&alt.title) =>
            {
                alt
            }
            _ => {
                tracing::debug!(title = %title, "Pick without a usable alternate");
                return ParseOutcome::Unparseable;
            }
        };

        picks.push(BookPick {
            amazon_url: links.link(&title, &author),
            reason: non_empty_reason(pick.reason),
            genres: pick
                .genres
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            alt: alt.into_alternate(links),
            title,
            author,
        });
    }

    match <[BookPick; PICK_COUNT]>::try_from(picks) {
        Ok(picks) => ParseOutcome::Parsed(picks),
        Err(_) => ParseOutcome::Unparseable,
    }
}

/// Produces the three diversified picks for a shelf
///
/// A batch either comes entirely from the reasoning capability or entirely from the
/// fallback catalogue; capability failures never reach the caller.
pub struct RecommendationEngine {
    reasoning: Arc<dyn ReasoningCapability>,
    fallback: Arc<dyn FallbackCatalog>,
    policy: CallPolicy,
}

impl RecommendationEngine {
    pub fn new(
        reasoning: Arc<dyn ReasoningCapability>,
        fallback: Arc<dyn FallbackCatalog>,
        policy: CallPolicy,
    ) -> Self {
        Self {
            reasoning,
            fallback,
            policy,
        }
    }

    pub async fn recommend(
        &self,
        owned_books: &[OwnedBook],
        links: &LinkBuilder,
    ) -> [BookPick; PICK_COUNT] {
        let prompt = build_prompt(owned_books);

        let reply = self
            .policy
            .run("reasoning", || self.reasoning.reason(&prompt))
            .await;

        match reply {
            Ok(text) => match interpret_reply(&text, owned_books, links) {
                ParseOutcome::Parsed(picks) => {
                    tracing::info!(
                        owned = owned_books.len(),
                        source = "reasoning",
                        "Recommendations generated"
                    );
                    return picks;
                }
                ParseOutcome::Unparseable => {
                    tracing::warn!("Reasoning reply unusable, serving fallback picks");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Reasoning capability failed, serving fallback picks");
            }
        }

        self.fallback_picks(links)
    }

    pub fn fallback_picks(&self, links: &LinkBuilder) -> [BookPick; PICK_COUNT] {
        let seeds = self.fallback.picks();
        std::array::from_fn(|i| seed_pick(&seeds[i], links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fallback::{StaticFallback, FALLBACK_PICKS};
    use crate::services::providers::{CapabilityError, MockReasoningCapability};
    use std::time::Duration;

    fn policy() -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_secs(1),
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn links() -> LinkBuilder {
        LinkBuilder::new("https://www.amazon.com/s", "test-tag")
    }

    fn engine(reasoning: MockReasoningCapability) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(reasoning), Arc::new(StaticFallback), policy())
    }

    fn failing_reasoning() -> MockReasoningCapability {
        let mut reasoning = MockReasoningCapability::new();
        reasoning
            .expect_reason()
            .returning(|_| Err(CapabilityError::Unavailable("reasoning".to_string())));
        reasoning
    }

    fn replying(reply: &'static str) -> MockReasoningCapability {
        let mut reasoning = MockReasoningCapability::new();
        reasoning
            .expect_reason()
            .times(1)
            .returning(move |_| Ok(reply.to_string()));
        reasoning
    }

    fn owned(title: &str, subjects: &[&str]) -> OwnedBook {
        OwnedBook {
            title: title.to_string(),
            author: None,
            isbn13: None,
            subjects: subjects.iter().map(|s| s.to_string()).collect(),
            year: None,
        }
    }

    const GOOD_REPLY: &str = r#"Here are my picks:
```json
[
  {"title": "Hyperion", "author": "Dan Simmons", "reason": "Epic sci-fi like Dune.",
   "genres": ["Science Fiction"],
   "alt": {"title": "Foundation", "author": "Isaac Asimov", "reason": "Galactic scope."}},
  {"title": "The Dispossessed", "author": "Ursula K. Le Guin", "reason": "Political SF.",
   "genres": ["Science Fiction", "Politics"],
   "alt": {"title": "Red Mars", "author": "Kim Stanley Robinson", "reason": "Colonies."}},
  {"title": "Guns, Germs, and Steel", "author": "Jared Diamond", "reason": "Like Sapiens.",
   "genres": ["History"],
   "alt": {"title": "The Dawn of Everything", "author": "David Graeber", "reason": "Rethinks history."}},
  {"title": "Extra", "author": "Someone", "reason": "x",
   "alt": {"title": "Extra Alt", "author": "Someone", "reason": "x"}}
]
```"#;

    #[tokio::test]
    async fn test_reasoning_reply_is_used_and_truncated_to_three() {
        let picks = engine(replying(GOOD_REPLY))
            .recommend(&[owned("Dune", &["Science fiction"])], &links())
            .await;

        assert_eq!(picks.len(), 3);
        assert_eq!(picks[0].title, "Hyperion");
        assert_eq!(picks[2].alt.title, "The Dawn of Everything");
        assert_eq!(
            picks[0].amazon_url,
            "https://www.amazon.com/s?k=Hyperion%20Dan%20Simmons&tag=test-tag"
        );
        assert_eq!(
            picks[0].alt.amazon_url,
            "https://www.amazon.com/s?k=Foundation%20Isaac%20Asimov&tag=test-tag"
        );
    }

    #[tokio::test]
    async fn test_wrapped_pick_list_is_accepted() {
        let reply = r#"{"picks": [
            {"title": "A", "author": "a", "reason": "", "alt": {"title": "A2", "author": "a"}},
            {"title": "B", "author": "b", "reason": "r", "alternate": {"title": "B2", "author": "b"}},
            {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
        ]}"#;
        let picks = engine(replying(reply)).recommend(&[], &links()).await;
        assert_eq!(picks[0].reason, DEFAULT_REASON);
        assert_eq!(picks[1].alt.title, "B2");
    }

    #[tokio::test]
    async fn test_under_count_falls_back() {
        let reply = r#"[{"title": "Hyperion", "author": "Dan Simmons", "reason": "r",
            "alt": {"title": "Foundation", "author": "Isaac Asimov", "reason": "r"}}]"#;
        let picks = engine(replying(reply)).recommend(&[], &links()).await;
        assert_eq!(picks[0].title, FALLBACK_PICKS[0].book.title);
    }

    #[tokio::test]
    async fn test_missing_alternate_falls_back_entirely() {
        let reply = r#"[
            {"title": "A", "author": "a", "reason": "r", "alt": {"title": "A2", "author": "a"}},
            {"title": "B", "author": "b", "reason": "r"},
            {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
        ]"#;
        let picks = engine(replying(reply)).recommend(&[], &links()).await;
        let titles: Vec<&str> = picks.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["The Overstory", "Project Hail Mary", "Educated"]);
    }

    #[tokio::test]
    async fn test_owned_book_pick_falls_back() {
        let reply = r#"[
            {"title": "Dune", "author": "Frank Herbert", "reason": "r", "alt": {"title": "A2", "author": "a"}},
            {"title": "B", "author": "b", "reason": "r", "alt": {"title": "B2", "author": "b"}},
            {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
        ]"#;
        let picks = engine(replying(reply))
            .recommend(&[owned("dune", &[])], &links())
            .await;
        assert_eq!(picks[0].title, "The Overstory");
    }

    #[tokio::test]
    async fn test_alternate_repeating_another_pick_falls_back() {
        let reply = r#"[
            {"title": "A", "author": "a", "reason": "r", "alt": {"title": "b", "author": "b"}},
            {"title": "B", "author": "b", "reason": "r", "alt": {"title": "B2", "author": "b"}},
            {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
        ]"#;
        let picks = engine(replying(reply)).recommend(&[], &links()).await;
        assert_eq!(picks[0].title, "The Overstory");
    }

    #[tokio::test]
    async fn test_owned_book_alternate_falls_back() {
        let reply = r#"[
            {"title": "A", "author": "a", "reason": "r", "alt": {"title": "A2", "author": "a"}},
            {"title": "B", "author": "b", "reason": "r", "alt": {"title": "Dune", "author": "Frank Herbert"}},
            {"title": "C", "author": "c", "reason": "r", "alt": {"title": "C2", "author": "c"}}
        ]"#;
        let picks = engine(replying(reply))
            .recommend(&[owned("Dune", &[])], &links())
            .await;
        assert_eq!(picks[1].title, "Project Hail Mary");
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back() {
        let picks = engine(replying("Sorry, I can't help with that."))
            .recommend(&[], &links())
            .await;
        assert_eq!(picks[1].title, "Project Hail Mary");
    }

    #[tokio::test]
    async fn test_fallback_is_identical_across_inputs() {
        let engine = engine(failing_reasoning());
        let first = engine
            .recommend(&[owned("Dune", &["Science fiction"])], &links())
            .await;
        let second = engine
            .recommend(&[owned("Pachinko", &["Historical fiction"]), owned("Sapiens", &[])], &links())
            .await;

        assert_eq!(first, second);
        for pick in &first {
            assert!(pick.amazon_url.contains("tag=test-tag"));
            assert!(pick.alt.amazon_url.contains("tag=test-tag"));
            assert!(!same_title(&pick.title, &pick.alt.title));
        }
    }

    #[tokio::test]
    async fn test_empty_collection_still_yields_three() {
        let picks = engine(failing_reasoning()).recommend(&[], &links()).await;
        assert_eq!(picks.len(), PICK_COUNT);
    }

    #[test]
    fn test_genre_profile_counts_case_insensitively() {
        let books = vec![
            owned("Dune", &["Science fiction", "Ecology"]),
            owned("Hyperion", &["science fiction"]),
            owned("Sapiens", &["History"]),
        ];
        let profile = genre_profile(&books);
        assert_eq!(profile[0], ("Science fiction".to_string(), 2));
        assert_eq!(profile.len(), 3);
    }

    #[test]
    fn test_describe_collection() {
        let mut book = owned("Dune", &["Science fiction"]);
        book.author = Some("Frank Herbert".to_string());
        assert_eq!(
            describe_collection(&[book]),
            "- Dune by Frank Herbert (subjects: Science fiction)"
        );
        assert_eq!(describe_collection(&[]), "(no books could be identified)");
    }
}
