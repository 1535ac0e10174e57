//! Affiliate purchase links.

/// Storefront search endpoint used when none is configured
pub const DEFAULT_STOREFRONT_URL: &str = "https://www.amazon.com/s";

/// Builds the storefront search link for a book, tagged with the affiliate id
pub fn build_link(title: &str, author: &str, tag: &str) -> String {
    build_link_with(DEFAULT_STOREFRONT_URL, title, author, tag)
}

fn build_link_with(storefront_url: &str, title: &str, author: &str, tag: &str) -> String {
    let query = format!("{} {}", title, author);
    format!(
        "{}?k={}&tag={}",
        storefront_url,
        urlencoding::encode(query.trim()),
        urlencoding::encode(tag)
    )
}

/// Link builder bound to one storefront and affiliate tag
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    storefront_url: String,
    tag: String,
}

impl LinkBuilder {
    pub fn new(storefront_url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            storefront_url: storefront_url.into(),
            tag: tag.into(),
        }
    }

    pub fn link(&self, title: &str, author: &str) -> String {
        build_link_with(&self.storefront_url, title, author, &self.tag)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_STOREFRONT_URL, "shelfscout-20")
    }
}
