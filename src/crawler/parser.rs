//! HTML document parsing
//!
//! Parsing is pluggable through [`DocumentParser`]; the default
//! [`HtmlParser`] builds a `scraper::Html` document that callers can query
//! with CSS selectors.

use scraper::{Html, Selector};

/// Turns page text into a queryable document
pub trait DocumentParser: Send + Sync {
    /// Parses `text`, returning a description of the problem on failure
    fn parse(&self, text: &str) -> Result<Html, String>;
}

/// `scraper`-backed parser
///
/// The HTML5 algorithm recovers from any input, so the lenient parser never
/// fails. In strict mode, any error reported by the tokenizer or tree
/// builder fails the parse instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser {
    strict: bool,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser that rejects documents with parse errors
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

impl DocumentParser for HtmlParser {
    fn parse(&self, text: &str) -> Result<Html, String> {
        let document = Html::parse_document(text);

        if self.strict && !document.errors.is_empty() {
            return Err(document.errors.join("; "));
        }

        Ok(document)
    }
}

/// Extracts the page title from a parsed document
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use sumi_courier::crawler::extract_title;
///
/// let html = Html::parse_document("<html><head><title> Test </title></head></html>");
/// assert_eq!(extract_title(&html), Some("Test".to_string()));
/// ```
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}
