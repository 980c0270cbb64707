//! Behavior extensions.
//!
//! A `Behavior` can take over any step of the pager. Every method has a
//! default that declines (`None` / `Intercept::Pass`), in which case the
//! pager runs its own implementation. Behaviors are registered on the builder
//! under their `name()`, and `Config::behavior` picks the active one.
//!
//! While an override runs the behavior is detached from the pager, so pager
//! methods called from inside it run their defaults.

use crate::config::Config;
use crate::distance::Geometry;
use crate::error::TransportResult;
use crate::normalize::FetchOutcome;
use crate::page::Delivery;
use crate::pager::Pager;
use crate::path::PathResolution;
use crate::state::{Binding, PauseAction, StopReason};
use crate::transport::{FetchStrategy, Response};

/// Result of an override that consumes its input.
#[derive(Debug)]
pub enum Intercept<T> {
    /// The behavior handled the step
    Handled,
    /// Fall through to the default, handing the input back
    Pass(T),
}

pub trait Behavior: Send {
    fn name(&self) -> &str;

    fn setup(&mut self, _pager: &mut Pager) -> Option<()> {
        None
    }

    fn binding(&mut self, _pager: &mut Pager, _binding: Binding) -> Option<()> {
        None
    }

    fn pausing(&mut self, _pager: &mut Pager, _action: PauseAction) -> Option<bool> {
        None
    }

    /// Replaces the scroll check as a whole.
    fn scroll(&mut self, _pager: &mut Pager) -> Option<()> {
        None
    }

    fn retrieve(&mut self, _pager: &mut Pager, _page: Option<u32>) -> Option<bool> {
        None
    }

    fn near_bottom(&mut self, _pager: &mut Pager, _geometry: &Geometry) -> Option<bool> {
        None
    }

    fn parse_path(&mut self, _pager: &mut Pager, _raw: &str) -> Option<PathResolution> {
        None
    }

    fn normalize(
        &mut self,
        _pager: &mut Pager,
        _strategy: FetchStrategy,
        _result: &TransportResult<Response>,
    ) -> Option<FetchOutcome> {
        None
    }

    /// Applies a normalized outcome.
    fn loaded(&mut self, _pager: &mut Pager, outcome: FetchOutcome) -> Intercept<FetchOutcome> {
        Intercept::Pass(outcome)
    }

    fn show_done(&mut self, _pager: &mut Pager) -> Option<()> {
        None
    }

    fn stop(&mut self, _pager: &mut Pager, _reason: &StopReason) -> Option<()> {
        None
    }

    /// Runs before the user callback on every delivery. Not an override.
    fn on_loaded(&mut self, _delivery: &Delivery, _config: &Config) {}
}
