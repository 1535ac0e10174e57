use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{same_title, AlternatePick, BookPick, OwnedBook, PICK_COUNT},
    services::{
        fallback::FallbackCatalog,
        links::LinkBuilder,
        providers::{CallPolicy, ParseOutcome, ReasoningCapability},
        recommendations::{seed_alternate, RawAlternate},
        reply::parse_embedded_json,
    },
};

/// Titles a new alternate must or should avoid
struct Exclusions<'a> {
    /// Every current pick; never allowed
    picks: Vec<&'a str>,
    /// The alternate being replaced; never allowed
    current: &'a str,
    /// Books already on the shelf; only tolerated when the rotation has nothing else
    owned: Vec<&'a str>,
    /// Alternates this slot had before; avoided when possible
    retired: Vec<&'a str>,
}

impl<'a> Exclusions<'a> {
    fn new(
        picks: &'a [BookPick; PICK_COUNT],
        slot_index: usize,
        retired: &'a [String],
        owned_books: &'a [OwnedBook],
    ) -> Self {
        Self {
            picks: picks.iter().map(|p| p.title.as_str()).collect(),
            current: picks[slot_index].alt.title.as_str(),
            owned: owned_books.iter().map(|b| b.title.as_str()).collect(),
            retired: retired.iter().map(String::as_str).collect(),
        }
    }

    fn allows(&self, title: &str) -> bool {
        !same_title(self.current, title) && !self.picks.iter().any(|t| same_title(t, title))
    }

    fn unowned(&self, title: &str) -> bool {
        self.allows(title) && !self.owned.iter().any(|t| same_title(t, title))
    }

    fn prefers(&self, title: &str) -> bool {
        self.unowned(title) && !self.retired.iter().any(|t| same_title(t, title))
    }

    fn avoided(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.picks
            .iter()
            .copied()
            .chain(std::iter::once(self.current))
            .chain(self.retired.iter().copied())
            .chain(self.owned.iter().copied())
    }
}

/// Generates a fresh alternate for one slot of a recommendation
pub struct AlternateService {
    reasoning: Arc<dyn ReasoningCapability>,
    fallback: Arc<dyn FallbackCatalog>,
    policy: CallPolicy,
}

impl AlternateService {
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

    /// Returns a new alternate for `slot_index`.
    ///
    /// The result is never titled like a current pick or the alternate it replaces.
    /// `retired` holds titles of alternates this slot already had and `owned_books`
    /// the reader's shelf; both are avoided. Only an out-of-range slot is an error;
    /// capability trouble falls back to the fixed rotation.
    pub async fn swap(
        &self,
        picks: &[BookPick; PICK_COUNT],
        slot_index: usize,
        retired: &[String],
        owned_books: &[OwnedBook],
        links: &LinkBuilder,
    ) -> AppResult<AlternatePick> {
        if slot_index >= PICK_COUNT {
            return Err(AppError::InvalidInput(format!(
                "slotIndex must be between 0 and {}",
                PICK_COUNT - 1
            )));
        }

        let exclusions = Exclusions::new(picks, slot_index, retired, owned_books);
        let prompt = build_prompt(picks, slot_index, &exclusions);

        match self
            .policy
            .run("reasoning", || self.reasoning.reason(&prompt))
            .await
        {
            Ok(reply) => match parse_embedded_json::<RawAlternate>(&reply) {
                ParseOutcome::Parsed(alt) if alt.is_complete() && exclusions.prefers(&alt.title) => {
                    tracing::info!(slot_index, source = "reasoning", "Alternate generated");
                    return Ok(alt.into_alternate(links));
                }
                _ => tracing::warn!(slot_index, "Reasoning alternate unusable, using rotation"),
            },
            Err(e) => {
                tracing::warn!(slot_index, error = %e, "Reasoning capability failed, using rotation")
            }
        }

        self.rotation_alternate(slot_index, &exclusions, links)
    }

    /// Walks the rotation from the slot's own entry; once every entry has been used,
    /// continues after the current alternate so repeated swaps keep cycling.
    fn rotation_alternate(
        &self,
        slot_index: usize,
        exclusions: &Exclusions<'_>,
        links: &LinkBuilder,
    ) -> AppResult<AlternatePick> {
        let rotation = self.fallback.swap_rotation();
        let walk = move |start: usize| {
            (0..rotation.len()).map(move |step| &rotation[(start + step) % rotation.len()])
        };
        let after_current = rotation
            .iter()
            .position(|seed| same_title(seed.title, exclusions.current))
            .map_or(slot_index, |i| i + 1);

        walk(slot_index)
            .find(|seed| exclusions.prefers(seed.title))
            .or_else(|| walk(after_current).find(|seed| exclusions.unowned(seed.title)))
            .or_else(|| walk(after_current).find(|seed| exclusions.allows(seed.title)))
            .map(|seed| seed_alternate(seed, links))
            .ok_or_else(|| AppError::Internal("swap rotation exhausted".to_string()))
    }
}

fn build_prompt(picks: &[BookPick; PICK_COUNT], slot_index: usize, exclusions: &Exclusions<'_>) -> String {
    let pick = &picks[slot_index];

    format!(
        "A reader was recommended \"{}\" by {} (genres: {}). Suggest one different book they \
         could read instead.\n\nDo not suggest any of: {}.\n\n\
         Reply with only a JSON object with keys \"title\", \"author\" and \"reason\".",
        pick.title,
        pick.author,
        if pick.genres.is_empty() {
            "unknown".to_string()
        } else {
            pick.genres.join(", ")
        },
        exclusions
            .avoided()
            .map(|t| format!("\"{}\"", t))
            .collect::<Vec<_>>()
            .join(", ")
    )
}
