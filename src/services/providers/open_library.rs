/// Open Library search provider
///
/// Resolves a title/author pair with `/search.json`, asking only for the fields the
/// normalizer needs. The first document is taken as the match.
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    models::BookMetadata,
    services::{
        isbn,
        providers::{
            BibliographicLookup, CapabilityError, CapabilityResult, LookupQuery, ParseOutcome,
        },
    },
};

const SEARCH_FIELDS: &str = "title,author_name,isbn,subject,first_publish_year";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    isbn: Vec<String>,
    #[serde(default)]
    subject: Vec<String>,
    first_publish_year: Option<i32>,
}

#[derive(Clone)]
pub struct OpenLibraryLookup {
    http_client: HttpClient,
    api_url: String,
    max_subjects: usize,
}

impl OpenLibraryLookup {
    pub fn new(http_client: HttpClient, api_url: String, max_subjects: usize) -> Self {
        Self {
            http_client,
            api_url,
            max_subjects,
        }
    }

    fn convert_doc(&self, doc: SearchDoc) -> ParseOutcome<BookMetadata> {
        let title = match doc.title.map(|t| t.trim().to_string()) {
            Some(title) if !title.is_empty() => title,
            _ => return ParseOutcome::Unparseable,
        };

        ParseOutcome::Parsed(BookMetadata {
            title,
            author: doc.author_name.into_iter().next(),
            isbn13: isbn::best_isbn13(doc.isbn.iter().map(String::as_str)),
            subjects: doc.subject.into_iter().take(self.max_subjects).collect(),
            year: doc.first_publish_year,
        })
    }
}

#[async_trait::async_trait]
impl BibliographicLookup for OpenLibraryLookup {
    async fn lookup(&self, query: &LookupQuery) -> CapabilityResult<ParseOutcome<BookMetadata>> {
        let url = format!("{}/search.json", self.api_url.trim_end_matches('/'));

        let mut params = vec![
            ("title", query.title.as_str()),
            ("limit", "1"),
            ("fields", SEARCH_FIELDS),
        ];
        if let Some(author) = query.author.as_deref() {
            params.push(("author", author));
        }

        let response = self.http_client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Status { status, body });
        }

        let response_text = response.text().await?;
        let search: SearchResponse = match serde_json::from_str(&response_text) {
            Ok(search) => search,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    title = %query.title,
                    provider = "open_library",
                    "Failed to deserialize Open Library response"
                );
                return Ok(ParseOutcome::Unparseable);
            }
        };

        let outcome = match search.docs.into_iter().next() {
            Some(doc) => self.convert_doc(doc),
            None => ParseOutcome::Unparseable,
        };

        tracing::debug!(
            title = %query.title,
            matched = outcome.is_parsed(),
            provider = "open_library",
            "Lookup completed"
        );

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "open_library"
    }
}
