//! Pagination controller.
//!
//! A `Pager` owns the pagination state of one scrolling container. It listens
//! for debounced scroll checks, decides whether the next page is due, issues
//! the fetch through the transport and applies the normalized outcome.
//!
//! All state changes happen in `Pager::process`, one event at a time. A
//! fetch is the only suspension point: it runs as a spawned task and reports
//! back as a `PagerEvent::Fetched` on the same queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::behavior::{Behavior, Intercept};
use crate::config::{Config, ConfigPatch};
use crate::distance::{self, Geometry};
use crate::error::{ConfigError, ConfigResult, PagerError, TransportResult};
use crate::handle::{Command, FetchTicket, PagerEvent, PagerHandle};
use crate::log;
use crate::normalize::{FetchOutcome, Normalizer, Template};
use crate::page::{Delivery, Page, Renderer};
use crate::path::{self, PathConfig, PathParser, PathResolution, PathTemplate};
use crate::scroll::ScrollSignal;
use crate::state::{Binding, PagerState, PauseAction, Phase, StopReason};
use crate::transport::{FetchRequest, FetchStrategy, ItemExtractor, Response, Transport};

/// Root data key holding a fallback pagination path
pub const PATH_DATA_KEY: &str = "infinitescroll-path";

/// Called with every successful delivery
pub type LoadedCallback = Box<dyn FnMut(&Delivery, &Config) + Send>;

/// Closure options that don't fit in `Config`
#[derive(Default)]
pub struct Hooks {
    pub path_parser: Option<PathParser>,
    pub template: Option<Template>,
    pub on_loaded: Option<LoadedCallback>,
}

/// Builder for a `Pager`. `page`, `transport`, `extractor` and `renderer`
/// are required.
pub struct PagerBuilder {
    config: Config,
    page: Option<Box<dyn Page>>,
    transport: Option<Arc<dyn Transport>>,
    extractor: Option<Arc<dyn ItemExtractor>>,
    renderer: Option<Box<dyn Renderer>>,
    signals: Option<ScrollSignal>,
    hooks: Hooks,
    behaviors: HashMap<String, Box<dyn Behavior>>,
}

impl PagerBuilder {
    pub fn page(mut self, page: impl Page + 'static) -> Self {
        self.page = Some(Box::new(page));
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ItemExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Share a scroll signal with other pagers. A private one is created otherwise.
    pub fn signals(mut self, signals: ScrollSignal) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn path_parser(
        mut self,
        parser: impl Fn(&str, u32) -> PathTemplate + Send + Sync + 'static,
    ) -> Self {
        self.hooks.path_parser = Some(Arc::new(parser));
        self
    }

    pub fn template(
        mut self,
        template: impl Fn(&serde_json::Value) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.template = Some(Arc::new(template));
        self
    }

    pub fn on_loaded(mut self, callback: impl FnMut(&Delivery, &Config) + Send + 'static) -> Self {
        self.hooks.on_loaded = Some(Box::new(callback));
        self
    }

    /// Register a behavior under its name
    pub fn behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behaviors
            .insert(behavior.name().to_string(), Box::new(behavior));
        self
    }

    /// Validate the configuration and bind the pager.
    ///
    /// Fails if the pagination selectors match nothing or no path can be
    /// found, unless `force_create` is set. A path that is found but can't be
    /// parsed still builds, as an invalid pager that never auto-fetches.
    pub fn build(self) -> ConfigResult<Pager> {
        let page = self.page.ok_or(ConfigError::MissingCollaborator("page"))?;
        let transport = self
            .transport
            .ok_or(ConfigError::MissingCollaborator("transport"))?;
        let extractor = self
            .extractor
            .ok_or(ConfigError::MissingCollaborator("extractor"))?;
        let renderer = self
            .renderer
            .ok_or(ConfigError::MissingCollaborator("renderer"))?;

        let config = self.config;
        let signals = self.signals.unwrap_or_else(|| {
            ScrollSignal::new(Duration::from_millis(config.quiet_period_ms))
        });

        if let Err(e) = check_selectors(page.as_ref(), &config) {
            if config.debug {
                log::log_diagnostic(config.instance_id, &e.to_string());
            }
            if !config.force_create {
                return Err(e);
            }
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut pager = Pager {
            config,
            state: PagerState::default(),
            path: None,
            nav_distance: 0.0,
            generation: 0,
            finished_notified: false,
            page,
            transport,
            extractor,
            renderer,
            signals,
            hooks: self.hooks,
            behaviors: self.behaviors,
            events_tx,
            events_rx,
        };

        pager.derive_initial_path()?;
        pager.nav_distance = pager.measure_nav_distance();

        let nav_selector = pager.config.nav_selector.clone();
        if pager.page.contains(&nav_selector) {
            pager.page.hide(&nav_selector);
        }

        pager.setup();

        Ok(pager)
    }
}

/// Both pagination selectors must match something on the page
fn check_selectors(page: &dyn Page, config: &Config) -> ConfigResult<()> {
    for (option, selector) in [
        ("nav_selector", &config.nav_selector),
        ("next_selector", &config.next_selector),
    ] {
        if !page.contains(selector) {
            return Err(ConfigError::SelectorNotFound {
                option,
                selector: selector.clone(),
            });
        }
    }
    Ok(())
}

pub struct Pager {
    config: Config,
    state: PagerState,
    path: Option<PathTemplate>,
    /// Distance from the pagination anchor to the document end, at setup
    nav_distance: f64,
    generation: u64,
    finished_notified: bool,
    page: Box<dyn Page>,
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn ItemExtractor>,
    renderer: Box<dyn Renderer>,
    signals: ScrollSignal,
    hooks: Hooks,
    behaviors: HashMap<String, Box<dyn Behavior>>,
    events_tx: mpsc::UnboundedSender<PagerEvent>,
    events_rx: mpsc::UnboundedReceiver<PagerEvent>,
}

impl Pager {
    pub fn builder(config: Config) -> PagerBuilder {
        PagerBuilder {
            config,
            page: None,
            transport: None,
            extractor: None,
            renderer: None,
            signals: None,
            hooks: Hooks::default(),
            behaviors: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn path(&self) -> Option<&PathTemplate> {
        self.path.as_ref()
    }

    pub fn nav_distance(&self) -> f64 {
        self.nav_distance
    }

    pub fn signals(&self) -> &ScrollSignal {
        &self.signals
    }

    /// Key this instance registers under on the scroll signal
    pub fn binding_key(&self) -> String {
        format!("smartscroll.infscr.{}", self.config.instance_id)
    }

    /// Handle for queueing commands from other tasks
    pub fn handle(&self) -> PagerHandle {
        PagerHandle::new(self.events_tx.clone())
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Wait for the next queued event.
    pub async fn next_event(&mut self) -> Option<PagerEvent> {
        self.events_rx.recv().await
    }

    /// Wait for the next event and process it.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.process(event);
                true
            }
            None => false,
        }
    }

    /// Process every event already queued, without waiting. Returns the count.
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.process(event);
            processed += 1;
        }
        processed
    }

    /// Process events until the pager is destroyed.
    pub async fn run(mut self) -> PagerState {
        while !self.state.is_destroyed {
            if !self.process_next().await {
                break;
            }
        }
        self.state
    }

    pub fn process(&mut self, event: PagerEvent) {
        match event {
            PagerEvent::Check => self.scroll(),
            PagerEvent::Command(command) => self.apply_command(command),
            PagerEvent::Fetched {
                ticket,
                strategy,
                result,
            } => self.complete_fetch(ticket, strategy, result),
            PagerEvent::ScrollSettled { ticket } => {
                if !self.state.is_destroyed && ticket.generation == self.generation {
                    self.state.is_fetching = false;
                }
            }
        }
    }

    fn apply_command(&mut self, command: Command) {
        match command {
            Command::Bind => self.bind(),
            Command::Unbind => self.unbind(),
            Command::Pause => {
                self.pause();
            }
            Command::Resume => {
                self.resume();
            }
            Command::Toggle => {
                self.toggle();
            }
            Command::Finish => self.finish(),
            Command::Retrieve(page) => {
                self.retrieve(page);
            }
            Command::Update(patch) => {
                self.update(patch);
            }
            Command::Reset(patch) => {
                self.reset(patch);
            }
            Command::Enable => self.enable(),
            Command::Disable => self.disable(),
            Command::Destroy => self.destroy(),
        }
    }

    // ------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------

    pub fn bind(&mut self) {
        self.binding(Binding::Bind);
    }

    pub fn unbind(&mut self) {
        self.binding(Binding::Unbind);
    }

    pub fn pause(&mut self) -> bool {
        self.pausing(PauseAction::Pause)
    }

    pub fn resume(&mut self) -> bool {
        self.pausing(PauseAction::Resume)
    }

    pub fn toggle(&mut self) -> bool {
        self.pausing(PauseAction::Toggle)
    }

    /// Force the end of the sequence.
    pub fn finish(&mut self) {
        self.stop(StopReason::End);
    }

    /// Fetch the next page now, skipping the distance check.
    ///
    /// `page` overrides the page number used in the URL; the counter still
    /// advances. Returns false if nothing was dispatched.
    pub fn retrieve(&mut self, page: Option<u32>) -> bool {
        if let Some(dispatched) = self.with_behavior(|b, p| b.retrieve(p, page)).flatten() {
            return dispatched;
        }

        if self.state.is_destroyed {
            self.debug(|| "Pager has been destroyed".to_string());
            return false;
        }

        if self.state.is_exhausted {
            self.debug(|| "No more pages, request ignored".to_string());
            return false;
        }

        if self.state.is_fetching {
            let current = self.state.current_page;
            self.debug(|| format!("Still fetching page {}, request ignored", current));
            return false;
        }

        let Some(template) = self.path.clone() else {
            self.stop(StopReason::Unknown("Can not determine path option".to_string()));
            return false;
        };

        self.dispatch(&template, page);
        true
    }

    /// Merge an option update, re-deriving the path if it changed.
    pub fn update(&mut self, patch: ConfigPatch) -> &mut Self {
        let path = patch.path.clone();
        let quiet_period_ms = patch.quiet_period_ms;
        self.config.merge(patch);

        if let Some(path) = path {
            self.install_path(path);
        }

        // Retunes every pager sharing the signal
        if let Some(ms) = quiet_period_ms {
            self.signals.set_quiet_period(Duration::from_millis(ms));
        }

        if let Some(name) = self.config.behavior.clone() {
            if !self.behaviors.contains_key(&name) {
                self.debug(|| format!("Behavior '{}' is not registered, using defaults", name));
            }
        }

        self
    }

    /// Update a single option by name.
    pub fn update_key(&mut self, key: &str, value: serde_json::Value) -> ConfigResult<&mut Self> {
        let patch = ConfigPatch::from_key(key, value)?;
        Ok(self.update(patch))
    }

    /// Apply `patch`, then start over from page 1 and rebind.
    ///
    /// Returns false, leaving the run state alone, if the pager is invalid.
    pub fn reset(&mut self, patch: Option<ConfigPatch>) -> bool {
        if let Some(patch) = patch {
            self.update(patch);
        }

        if self.state.is_invalid_page {
            self.debug(|| "Reset refused, pagination path is invalid".to_string());
            return false;
        }

        self.state.restart();
        self.generation += 1;
        self.finished_notified = false;
        self.nav_distance = self.measure_nav_distance();
        self.binding(Binding::Bind);
        true
    }

    pub fn enable(&mut self) {
        self.state.is_fetching = false;
        self.state.is_paused = false;
        self.state.is_exhausted = false;
        self.generation += 1;
        self.finished_notified = false;
        self.binding(Binding::Bind);
    }

    /// Stop auto-fetching. A fetch in flight keeps the pager fetching until
    /// its result comes back.
    pub fn disable(&mut self) {
        self.state.is_paused = false;
        self.state.is_exhausted = true;
        self.binding(Binding::Unbind);
    }

    /// Tear down. Results of fetches still in flight are dropped.
    pub fn destroy(&mut self) {
        self.state.is_destroyed = true;
        self.stop(StopReason::Destroy);
    }

    // ------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------

    fn setup(&mut self) {
        if self.with_behavior(|b, p| b.setup(p)).flatten().is_some() {
            return;
        }
        self.binding(Binding::Bind);
    }

    fn binding(&mut self, binding: Binding) {
        if self.with_behavior(|b, p| b.binding(p, binding)).flatten().is_some() {
            return;
        }

        self.debug(|| format!("Binding state {:?}", binding));

        let key = self.binding_key();
        match binding {
            Binding::Bind => {
                let tx = self.events_tx.clone();
                self.signals.bind(
                    key,
                    Arc::new(move || {
                        let _ = tx.send(PagerEvent::Check);
                    }),
                );
            }
            Binding::Unbind => {
                self.signals.unbind(&key);
            }
        }
    }

    fn pausing(&mut self, action: PauseAction) -> bool {
        if let Some(paused) = self.with_behavior(|b, p| b.pausing(p, action)).flatten() {
            return paused;
        }

        let was_paused = self.state.is_paused;
        self.debug(|| format!("Pausing state {} -> {:?}", was_paused, action));
        self.state.apply_pause(action)
    }

    /// Debounced scroll check.
    fn scroll(&mut self) {
        if self.with_behavior(|b, p| b.scroll(p)).flatten().is_some() {
            return;
        }

        if !self.state.can_auto_trigger() || !self.near_bottom() {
            return;
        }

        self.retrieve(None);
    }

    fn near_bottom(&mut self) -> bool {
        let geometry = self.page.geometry();

        if let Some(near) = self.with_behavior(|b, p| b.near_bottom(p, &geometry)).flatten() {
            return near;
        }

        let nav_distance = self.nav_distance;
        let buffer = self.config.buffer_px;
        self.debug(|| {
            format!(
                "Calc page scroll nav={} remaining={} buffer={}",
                nav_distance,
                geometry.remaining(),
                buffer
            )
        });

        distance::near_bottom(&geometry, nav_distance, buffer)
    }

    fn dispatch(&mut self, template: &PathTemplate, page: Option<u32>) {
        self.state.is_fetching = true;
        self.state.current_page += 1;

        let page_number = page.unwrap_or(self.state.current_page);
        let url = template.location(page_number);
        if self.config.debug {
            log::log_fetch(self.config.instance_id, &url);
        }

        self.renderer.loading_started(page_number, &self.config);

        let strategy = FetchStrategy::select(self.config.data_format, self.config.auto_append);
        let ticket = FetchTicket {
            generation: self.generation,
            page: page_number,
        };
        let request = FetchRequest {
            url,
            strategy,
            item_selector: self.config.item_selector.clone(),
        };

        let fetch = self.transport.fetch(request);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = fetch.await;
            let _ = tx.send(PagerEvent::Fetched {
                ticket,
                strategy,
                result,
            });
        });
    }

    fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        strategy: FetchStrategy,
        result: TransportResult<Response>,
    ) {
        if self.state.is_destroyed {
            self.debug(|| format!("Dropping page {} result, pager destroyed", ticket.page));
            return;
        }

        if ticket.generation != self.generation {
            self.debug(|| format!("Dropping stale page {} result", ticket.page));
            return;
        }

        let outcome = self.normalize(strategy, result);
        self.loaded(ticket, outcome);
    }

    fn normalize(
        &mut self,
        strategy: FetchStrategy,
        result: TransportResult<Response>,
    ) -> FetchOutcome {
        if let Some(outcome) = self
            .with_behavior(|b, p| b.normalize(p, strategy, &result))
            .flatten()
        {
            return outcome;
        }

        Normalizer {
            item_selector: &self.config.item_selector,
            extractor: self.extractor.as_ref(),
            template: self.hooks.template.as_ref(),
            auto_append: self.config.auto_append,
            debug_instance: self.config.debug.then_some(self.config.instance_id),
        }
        .normalize(strategy, result)
    }

    fn loaded(&mut self, ticket: FetchTicket, outcome: FetchOutcome) {
        let outcome = match self.take_behavior() {
            Some((name, mut behavior)) => {
                let step = behavior.loaded(self, outcome);
                self.restore_behavior(name, behavior);
                match step {
                    Intercept::Handled => {
                        if !self.state.is_destroyed {
                            self.state.is_fetching = false;
                        }
                        return;
                    }
                    Intercept::Pass(outcome) => outcome,
                }
            }
            None => outcome,
        };

        // Finished while the request was in flight
        if self.state.is_exhausted {
            self.state.is_fetching = false;
            self.show_done();
            return;
        }

        match outcome {
            FetchOutcome::Appended(items) => self.deliver(ticket, Delivery::Appended(items)),
            FetchOutcome::RawPayload(payload) => self.deliver(ticket, Delivery::Raw(payload)),
            FetchOutcome::Exhausted => {
                self.debug(|| format!("Page {} is empty, no more pages", ticket.page));
                self.state.is_fetching = false;
                self.finish();
            }
            FetchOutcome::Failed(e) => {
                self.debug(|| format!("Page {} failed: {}", ticket.page, e));
                self.state.is_fetching = false;
                self.finish();
            }
        }
    }

    fn deliver(&mut self, ticket: FetchTicket, delivery: Delivery) {
        if let Some((name, mut behavior)) = self.take_behavior() {
            behavior.on_loaded(&delivery, &self.config);
            self.restore_behavior(name, behavior);
        }
        if let Some(callback) = self.hooks.on_loaded.as_mut() {
            callback(&delivery, &self.config);
        }

        match delivery {
            Delivery::Appended(items) => self.renderer.append(items, &self.config),
            Delivery::Raw(payload) => self.renderer.deliver(payload, &self.config),
        }
        self.renderer.loading_finished(&self.config);

        if self.config.animate {
            let target = self.page.geometry().scroll_offset + self.config.extra_scroll_px;
            if let Some(scroll) = self.renderer.smooth_scroll(target) {
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    scroll.await;
                    let _ = tx.send(PagerEvent::ScrollSettled { ticket });
                });
                return;
            }
        }

        self.state.is_fetching = false;
    }

    fn show_done(&mut self) {
        if self.with_behavior(|b, p| b.show_done(p)).flatten().is_some() {
            return;
        }

        if !self.finished_notified {
            self.finished_notified = true;
            self.renderer.finished(&self.config);
        }
    }

    fn stop(&mut self, reason: StopReason) {
        if self.with_behavior(|b, p| b.stop(p, &reason)).flatten().is_some() {
            return;
        }

        self.debug(|| format!("Stopping while {}: {}", self.phase().display(), reason));

        if reason == StopReason::End {
            self.show_done();
        }

        self.disable();
    }

    // ------------------------------------------------------------------
    // Path derivation
    // ------------------------------------------------------------------

    fn derive_initial_path(&mut self) -> ConfigResult<()> {
        let raw = match self.config.path.clone() {
            Some(PathConfig::Parts(prefix, suffix)) => {
                self.path = Some(PathTemplate::new(prefix, suffix));
                return Ok(());
            }
            Some(PathConfig::Url(url)) => Some(url),
            None => self
                .page
                .attribute(&self.config.next_selector, "href")
                .or_else(|| self.page.root_data(PATH_DATA_KEY)),
        };

        match raw {
            Some(raw) => {
                self.path = self.resolve_path(&raw);
                Ok(())
            }
            None => {
                self.debug(|| "No element found for next_selector".to_string());
                if self.config.force_create {
                    self.state.is_invalid_page = true;
                    Ok(())
                } else {
                    Err(ConfigError::PathUndetermined)
                }
            }
        }
    }

    fn install_path(&mut self, path: PathConfig) {
        let template = match path {
            PathConfig::Parts(prefix, suffix) => Some(PathTemplate::new(prefix, suffix)),
            PathConfig::Url(raw) => self.resolve_path(&raw),
        };

        if template.is_some() {
            self.state.is_invalid_page = false;
        }
        self.path = template;
    }

    /// Parse a raw href into a template, marking the pager invalid on failure.
    fn resolve_path(&mut self, raw: &str) -> Option<PathTemplate> {
        let resolution = match self.with_behavior(|b, p| b.parse_path(p, raw)).flatten() {
            Some(resolution) => resolution,
            None => self.parse_path(raw),
        };

        match resolution {
            PathResolution::Template(template) => Some(template),
            PathResolution::Unrecognized => {
                self.state.is_invalid_page = true;
                None
            }
        }
    }

    fn parse_path(&self, raw: &str) -> PathResolution {
        self.debug(|| format!("Determine root path {}", raw));

        if let Some(parser) = &self.hooks.path_parser {
            return PathResolution::Template(parser(raw, self.state.current_page + 1));
        }

        match path::parse_pagination_href(raw) {
            Some(template) => PathResolution::Template(template),
            None => {
                self.debug(|| {
                    format!(
                        "{}; check that next_selector points at the right anchor",
                        PagerError::PathDerivation(raw.to_string())
                    )
                });
                PathResolution::Unrecognized
            }
        }
    }

    fn measure_nav_distance(&self) -> f64 {
        let geometry: Geometry = self.page.geometry();
        distance::nav_distance(
            geometry.document_height,
            self.page.offset_top(&self.config.nav_selector),
        )
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn take_behavior(&mut self) -> Option<(String, Box<dyn Behavior>)> {
        let name = self.config.behavior.clone()?;
        let behavior = self.behaviors.remove(&name)?;
        Some((name, behavior))
    }

    fn restore_behavior(&mut self, name: String, behavior: Box<dyn Behavior>) {
        self.behaviors.insert(name, behavior);
    }

    /// Run `f` against the active behavior, if one is registered.
    fn with_behavior<R>(
        &mut self,
        f: impl FnOnce(&mut Box<dyn Behavior>, &mut Pager) -> R,
    ) -> Option<R> {
        let (name, mut behavior) = self.take_behavior()?;
        let result = f(&mut behavior, self);
        self.restore_behavior(name, behavior);
        Some(result)
    }

    fn debug(&self, msg: impl FnOnce() -> String) {
        if self.config.debug {
            log::log_diagnostic(self.config.instance_id, &msg());
        }
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("instance_id", &self.config.instance_id)
            .field("state", &self.state)
            .field("path", &self.path)
            .field("nav_distance", &self.nav_distance)
            .field("generation", &self.generation)
            .finish()
    }
}
