//! Scroll-driven pagination.
//!
//! A [`Pager`] watches a scrolling page, and when the viewport gets close to
//! the pagination block it fetches the next page and appends the matching
//! items. The host supplies the page, transport, item extractor and renderer
//! through the traits in [`page`] and [`transport`].

pub mod behavior;
pub mod config;
pub mod distance;
pub mod error;
pub mod handle;
pub mod log;
pub mod normalize;
pub mod page;
pub mod pager;
pub mod path;
pub mod scroll;
pub mod state;
pub mod transport;

#[cfg(test)]
mod testing;

pub use behavior::{Behavior, Intercept};
pub use config::{Config, ConfigPatch, DataFormat, LoadingText};
pub use distance::Geometry;
pub use error::{ConfigError, PagerError, TransportError};
pub use handle::{Command, PagerHandle};
pub use normalize::FetchOutcome;
pub use page::{Delivery, Page, Renderer};
pub use pager::{Pager, PagerBuilder};
pub use path::{PathConfig, PathTemplate};
pub use scroll::ScrollSignal;
pub use state::{PagerState, Phase, StopReason};
pub use transport::{ContentUnit, FetchRequest, FetchStrategy, ItemExtractor, Payload, Response, Transport};
