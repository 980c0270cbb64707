//! Host page and rendering collaborator contracts.

use futures::future::BoxFuture;

use crate::config::Config;
use crate::distance::Geometry;
use crate::transport::{ContentUnit, Payload};

/// Read access to the host document, plus the one mutation the pager makes
/// (hiding the pagination block once it takes over).
pub trait Page: Send {
    fn geometry(&self) -> Geometry;

    /// Whether `selector` matches at least one element.
    fn contains(&self, selector: &str) -> bool;

    /// Top offset of the first element matching `selector`.
    fn offset_top(&self, selector: &str) -> Option<f64>;

    /// Attribute of the first element matching `selector`.
    fn attribute(&self, selector: &str, name: &str) -> Option<String>;

    /// `data-*` value set on the pager's root element.
    fn root_data(&self, key: &str) -> Option<String>;

    fn hide(&mut self, _selector: &str) {}
}

/// Successfully normalized result, as seen by completion callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Appended(Vec<ContentUnit>),
    Raw(Payload),
}

impl Delivery {
    /// Number of content units carried, if any.
    pub fn len(&self) -> usize {
        match self {
            Delivery::Appended(items) | Delivery::Raw(Payload::Items(items)) => items.len(),
            Delivery::Raw(Payload::Json(_)) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inserts content and presents loading state. May be called zero times.
pub trait Renderer: Send {
    fn loading_started(&mut self, _page: u32, _config: &Config) {}

    /// Take ownership of fetched items and insert them into the fragment root.
    fn append(&mut self, items: Vec<ContentUnit>, config: &Config);

    /// Receive data fetched without auto-append.
    fn deliver(&mut self, _payload: Payload, _config: &Config) {}

    fn loading_finished(&mut self, _config: &Config) {}

    /// One-time notice that no further pages will load.
    fn finished(&mut self, _config: &Config) {}

    /// Ease the viewport towards `target`. The pager stays in its fetching
    /// state until the returned future completes.
    fn smooth_scroll(&mut self, _target: f64) -> Option<BoxFuture<'static, ()>> {
        None
    }
}
