/// Google Books volumes provider
///
/// Second link in the lookup chain. Queries `/books/v1/volumes` with `intitle:` and
/// `inauthor:` qualifiers and maps the first volume's `volumeInfo`.
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

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    #[serde(default)]
    categories: Vec<String>,
    published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    id_type: String,
    identifier: String,
}

#[derive(Clone)]
pub struct GoogleBooksLookup {
    http_client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    max_subjects: usize,
}

impl GoogleBooksLookup {
    pub fn new(
        http_client: HttpClient,
        api_url: String,
        api_key: Option<String>,
        max_subjects: usize,
    ) -> Self {
        Self {
            http_client,
            api_url,
            api_key,
            max_subjects,
        }
    }

    fn search_expression(query: &LookupQuery) -> String {
        match query.author.as_deref() {
            Some(author) => format!("intitle:{} inauthor:{}", query.title, author),
            None => format!("intitle:{}", query.title),
        }
    }

    fn convert_volume(&self, info: VolumeInfo) -> ParseOutcome<BookMetadata> {
        let title = match info.title.map(|t| t.trim().to_string()) {
            Some(title) if !title.is_empty() => title,
            _ => return ParseOutcome::Unparseable,
        };

        let isbn13 = isbn::best_isbn13(
            info.industry_identifiers
                .iter()
                .filter(|id| id.id_type.starts_with("ISBN"))
                .map(|id| id.identifier.as_str()),
        );

        // publishedDate is "1965", "1965-08" or "1965-08-01"
        let year = info
            .published_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok());

        ParseOutcome::Parsed(BookMetadata {
            title,
            author: info.authors.into_iter().next(),
            isbn13,
            subjects: info.categories.into_iter().take(self.max_subjects).collect(),
            year,
        })
    }
}

#[async_trait::async_trait]
impl BibliographicLookup for GoogleBooksLookup {
    async fn lookup(&self, query: &LookupQuery) -> CapabilityResult<ParseOutcome<BookMetadata>> {
        let url = format!("{}/books/v1/volumes", self.api_url.trim_end_matches('/'));
        let expression = Self::search_expression(query);

        let mut request = self
            .http_client
            .get(&url)
            .query(&[("q", expression.as_str()), ("maxResults", "1")]);
        if let Some(key) = self.api_key.as_deref() {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::Status { status, body });
        }

        let response_text = response.text().await?;
        let volumes: VolumesResponse = match serde_json::from_str(&response_text) {
            Ok(volumes) => volumes,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    title = %query.title,
                    provider = "google_books",
                    "Failed to deserialize Google Books response"
                );
                return Ok(ParseOutcome::Unparseable);
            }
        };

        let outcome = match volumes.items.into_iter().next() {
            Some(volume) => self.convert_volume(volume.volume_info),
            None => ParseOutcome::Unparseable,
        };

        tracing::debug!(
            title = %query.title,
            matched = outcome.is_parsed(),
            provider = "google_books",
            "Lookup completed"
        );

        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "google_books"
    }
}
