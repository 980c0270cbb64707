//! Next-page location sequencing.
//!
//! A `PathTemplate` splits a paginated URL around its page number so any page
//! can be addressed as `prefix + page + suffix`. Templates come from explicit
//! configuration or are parsed out of the "next page" href.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

/// Explicit path option as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathConfig {
    /// A concrete page URL, parsed for its page number
    Url(String),
    /// A ready-made `[prefix, suffix]` pair, used verbatim
    Parts(String, String),
}

/// URL split around the page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    pub prefix: String,
    pub suffix: String,
}

impl PathTemplate {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Location of the given page.
    pub fn location(&self, page: u32) -> String {
        format!("{}{}{}", self.prefix, page, self.suffix)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{page}}{}", self.prefix, self.suffix)
    }
}

/// Result of resolving a raw path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResolution {
    Template(PathTemplate),
    Unrecognized,
}

/// User-supplied parser: receives the raw href and the page about to be requested.
pub type PathParser = Arc<dyn Fn(&str, u32) -> PathTemplate + Send + Sync>;

/// Parse a pagination href into a template.
///
/// Recognizes, in order, `...?page=N...` (or `&page=N`) and `.../page/N...`.
/// `N` is the whole run of digits, not a single digit, so `/page/12` splits
/// around `12` rather than leaving `2` in the suffix.
pub fn parse_pagination_href(href: &str) -> Option<PathTemplate> {
    split_after_marker(href, "page=", |before| matches!(before, Some('?') | Some('&')))
        .or_else(|| split_after_marker(href, "/page/", |_| true))
}

/// Find the first `marker` accepted by `accept` (given the preceding char) and
/// directly followed by digits; split the href around those digits.
fn split_after_marker(
    href: &str,
    marker: &str,
    accept: impl Fn(Option<char>) -> bool,
) -> Option<PathTemplate> {
    for (idx, _) in href.match_indices(marker) {
        if !accept(href[..idx].chars().next_back()) {
            continue;
        }

        let digits_start = idx + marker.len();
        let rest = &href[digits_start..];
        let digits_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());

        if digits_len == 0 {
            continue;
        }

        return Some(PathTemplate::new(
            &href[..digits_start],
            &rest[digits_len..],
        ));
    }

    None
}
