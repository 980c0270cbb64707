//! Reduces a transport result to a `FetchOutcome`.

use std::sync::Arc;

use crate::error::{PagerError, TransportError, TransportResult};
use crate::log;
use crate::transport::{ContentUnit, FetchStrategy, ItemExtractor, Payload, Response};

/// Renders a json page into markup for auto-append.
pub type Template = Arc<dyn Fn(&serde_json::Value) -> String + Send + Sync>;

/// What a single fetch produced.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Items to append, in document order
    Appended(Vec<ContentUnit>),
    /// Data for the caller to handle, nothing inserted
    RawPayload(Payload),
    /// The server has no further pages
    Exhausted,
    Failed(PagerError),
}

impl FetchOutcome {
    /// Whether this outcome ends the sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchOutcome::Exhausted | FetchOutcome::Failed(_))
    }
}

/// Normalization inputs borrowed from the pager for one response.
pub struct Normalizer<'a> {
    pub item_selector: &'a str,
    pub extractor: &'a dyn ItemExtractor,
    pub template: Option<&'a Template>,
    pub auto_append: bool,
    /// Instance to log diagnostics for, when debugging is on
    pub debug_instance: Option<u32>,
}

impl Normalizer<'_> {
    pub fn normalize(
        &self,
        strategy: FetchStrategy,
        result: TransportResult<Response>,
    ) -> FetchOutcome {
        let response = match result {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                return FetchOutcome::Failed(TransportError::Status(response.status).into());
            }
            Err(e) => return FetchOutcome::Failed(e.into()),
        };

        match strategy {
            FetchStrategy::HtmlFragment => {
                self.debug("Using HTML via partial document load");
                self.append_matches(&response.body)
            }
            FetchStrategy::HtmlText => {
                self.debug("Using HTML via full body");
                let wrapped = format!("<div>{}</div>", response.body);
                FetchOutcome::RawPayload(Payload::Items(
                    self.extractor.extract(&wrapped, self.item_selector),
                ))
            }
            FetchStrategy::Json => {
                self.debug("Using JSON");
                self.normalize_json(&response.body)
            }
        }
    }

    fn normalize_json(&self, body: &str) -> FetchOutcome {
        let data: serde_json::Value = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(e) => {
                self.debug("JSON request failed to decode");
                return FetchOutcome::Failed(PagerError::Decode(e.to_string()));
            }
        };

        if !self.auto_append {
            return FetchOutcome::RawPayload(Payload::Json(data));
        }

        match self.template {
            Some(template) => {
                let markup = template(&data);
                self.append_matches(&markup)
            }
            None => {
                self.debug(&PagerError::TemplateMissing.to_string());
                FetchOutcome::Exhausted
            }
        }
    }

    /// An empty page is the end-of-data signal.
    fn append_matches(&self, markup: &str) -> FetchOutcome {
        let items = self.extractor.extract(markup, self.item_selector);
        if items.is_empty() {
            self.debug("Fetched page has no items");
            FetchOutcome::Exhausted
        } else {
            FetchOutcome::Appended(items)
        }
    }

    fn debug(&self, msg: &str) {
        if let Some(instance_id) = self.debug_instance {
            log::log_diagnostic(instance_id, msg);
        }
    }
}
