use std::sync::Arc;

use crate::{
    models::BookMetadata,
    services::providers::{
        BibliographicLookup, CapabilityError, CapabilityResult, LookupQuery, ParseOutcome,
    },
};

/// Ordered fallback chain of bibliographic lookups
///
/// Each link is asked in turn and the first `Parsed` answer wins. A failing link is
/// logged and skipped; the chain only errors when every link errored.
pub struct LookupChain {
    links: Vec<Arc<dyn BibliographicLookup>>,
}

impl LookupChain {
    pub fn new(links: Vec<Arc<dyn BibliographicLookup>>) -> Self {
        Self { links }
    }
}

#[async_trait::async_trait]
impl BibliographicLookup for LookupChain {
    async fn lookup(&self, query: &LookupQuery) -> CapabilityResult<ParseOutcome<BookMetadata>> {
        let mut last_error = None;
        let mut answered = false;

        for link in &self.links {
            match link.lookup(query).await {
                Ok(ParseOutcome::Parsed(book)) => return Ok(ParseOutcome::Parsed(book)),
                Ok(ParseOutcome::Unparseable) => answered = true,
                Err(e) => {
                    tracing::warn!(
                        provider = link.name(),
                        title = %query.title,
                        error = %e,
                        "Lookup failed, trying next provider"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ if self.links.is_empty() => Err(CapabilityError::Unavailable(
                "bibliographic lookup".to_string(),
            )),
            _ => Ok(ParseOutcome::Unparseable),
        }
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
