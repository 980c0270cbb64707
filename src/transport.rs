//! Transport collaborator contracts.
//!
//! The pager never talks HTTP or walks markup itself. It hands a
//! `FetchRequest` to a `Transport` and asks an `ItemExtractor` for the
//! item-selector matches inside whatever markup comes back.

use futures::future::BoxFuture;

use crate::config::DataFormat;
use crate::error::TransportResult;

/// One opaque unit of fetched content, typically an item's markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnit(String);

impl ContentUnit {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for ContentUnit {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl From<&str> for ContentUnit {
    fn from(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

/// Data handed over without automatic insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Item matches from a full html page
    Items(Vec<ContentUnit>),
    /// Parsed json body
    Json(serde_json::Value),
}

/// How a page is fetched and interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Html, only the item-selector subtree is of interest; auto-appended
    HtmlFragment,
    /// Html, full body returned to the caller
    HtmlText,
    /// Structured data
    Json,
}

impl FetchStrategy {
    pub fn select(format: DataFormat, auto_append: bool) -> Self {
        match (format, auto_append) {
            (DataFormat::Html, true) => FetchStrategy::HtmlFragment,
            (DataFormat::Html, false) => FetchStrategy::HtmlText,
            (DataFormat::Json, _) => FetchStrategy::Json,
        }
    }
}

/// Request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub strategy: FetchStrategy,
    /// Item selector, for transports able to fetch a partial document
    pub item_selector: String,
}

/// Raw transport response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 response with the given body
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// 2xx, or 304 not modified
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) || self.status == 304
    }
}

/// Asynchronous fetcher for page locations.
pub trait Transport: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, TransportResult<Response>>;
}

/// Selector query over fetched markup.
pub trait ItemExtractor: Send + Sync {
    /// All elements of `markup` matching `selector`, in document order.
    fn extract(&self, markup: &str, selector: &str) -> Vec<ContentUnit>;
}

impl<F> ItemExtractor for F
where
    F: Fn(&str, &str) -> Vec<ContentUnit> + Send + Sync,
{
    fn extract(&self, markup: &str, selector: &str) -> Vec<ContentUnit> {
        self(markup, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(FetchStrategy::select(DataFormat::Html, true), FetchStrategy::HtmlFragment);
        assert_eq!(FetchStrategy::select(DataFormat::Html, false), FetchStrategy::HtmlText);
        assert_eq!(FetchStrategy::select(DataFormat::Json, true), FetchStrategy::Json);
        assert_eq!(FetchStrategy::select(DataFormat::Json, false), FetchStrategy::Json);
    }

    #[test]
    fn test_success_statuses() {
        assert!(Response::ok("").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(Response::new(304, "").is_success());
        assert!(!Response::new(301, "").is_success());
        assert!(!Response::new(404, "").is_success());
        assert!(!Response::new(500, "").is_success());
    }
}
