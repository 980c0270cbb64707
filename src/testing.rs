//! Test doubles for the pager's collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Notify;

use crate::config::Config;
use crate::distance::Geometry;
use crate::error::TransportResult;
use crate::page::{Page, Renderer};
use crate::transport::{ContentUnit, FetchRequest, ItemExtractor, Payload, Response, Transport};

/// Treats every line containing the selector text as one item.
pub fn line_extractor() -> Arc<dyn ItemExtractor> {
    Arc::new(|markup: &str, selector: &str| {
        markup
            .lines()
            .map(str::trim)
            .filter(|line| line.contains(selector))
            .map(ContentUnit::from)
            .collect::<Vec<_>>()
    })
}

/// Transport replaying canned responses; an empty script yields empty pages.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResult<Response>>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = TransportResult<Response>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn dispatches(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, TransportResult<Response>> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Response::ok("")));
        async move { next }.boxed()
    }
}

/// Everything a `RecordingRenderer` was asked to do.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub started: Vec<u32>,
    pub appended: Vec<Vec<ContentUnit>>,
    pub delivered: Vec<Payload>,
    pub loading_finished: usize,
    pub finished: usize,
    pub scroll_targets: Vec<f64>,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub log: Arc<Mutex<RenderLog>>,
    /// When set, smooth scrolls complete only once this is notified
    pub scroll_gate: Option<Arc<Notify>>,
}

impl RecordingRenderer {
    pub fn appended_items(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .appended
            .iter()
            .flatten()
            .map(|item| item.as_str().to_string())
            .collect()
    }

    pub fn finished(&self) -> usize {
        self.log.lock().unwrap().finished
    }
}

impl Renderer for RecordingRenderer {
    fn loading_started(&mut self, page: u32, _config: &Config) {
        self.log.lock().unwrap().started.push(page);
    }

    fn append(&mut self, items: Vec<ContentUnit>, _config: &Config) {
        self.log.lock().unwrap().appended.push(items);
    }

    fn deliver(&mut self, payload: Payload, _config: &Config) {
        self.log.lock().unwrap().delivered.push(payload);
    }

    fn loading_finished(&mut self, _config: &Config) {
        self.log.lock().unwrap().loading_finished += 1;
    }

    fn finished(&mut self, _config: &Config) {
        self.log.lock().unwrap().finished += 1;
    }

    fn smooth_scroll(&mut self, target: f64) -> Option<BoxFuture<'static, ()>> {
        self.log.lock().unwrap().scroll_targets.push(target);
        let gate = self.scroll_gate.clone()?;
        Some(async move { gate.notified().await }.boxed())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageModel {
    pub geometry: Geometry,
    /// Elements present on the page, by selector, with their top offset
    pub offsets: HashMap<String, f64>,
    pub attributes: HashMap<(String, String), String>,
    pub root_data: HashMap<String, String>,
    pub hidden: Vec<String>,
}

/// In-memory page shared between the test and the pager.
#[derive(Clone, Default)]
pub struct FakePage {
    pub model: Arc<Mutex<PageModel>>,
}

impl FakePage {
    pub const NAV: &'static str = "div.navigation";
    pub const NEXT: &'static str = "div.navigation a:first";

    /// 3000px document with the default pagination selectors near the end.
    pub fn blog(next_href: Option<&str>) -> Self {
        let mut model = PageModel {
            geometry: Geometry {
                document_height: 3000.0,
                viewport_height: 800.0,
                scroll_offset: 0.0,
            },
            ..Default::default()
        };
        model.offsets.insert(Self::NAV.to_string(), 2900.0);
        model.offsets.insert(Self::NEXT.to_string(), 2900.0);
        if let Some(href) = next_href {
            model
                .attributes
                .insert((Self::NEXT.to_string(), "href".to_string()), href.to_string());
        }
        Self {
            model: Arc::new(Mutex::new(model)),
        }
    }

    pub fn scroll_to(&self, offset: f64) {
        self.model.lock().unwrap().geometry.scroll_offset = offset;
    }

    pub fn scroll_to_bottom(&self) {
        let mut model = self.model.lock().unwrap();
        model.geometry.scroll_offset =
            model.geometry.document_height - model.geometry.viewport_height;
    }

    pub fn set_root_data(&self, key: &str, value: &str) {
        self.model
            .lock()
            .unwrap()
            .root_data
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, selector: &str) {
        self.model.lock().unwrap().offsets.remove(selector);
    }

    pub fn is_hidden(&self, selector: &str) -> bool {
        self.model.lock().unwrap().hidden.iter().any(|s| s == selector)
    }
}

impl Page for FakePage {
    fn geometry(&self) -> Geometry {
        self.model.lock().unwrap().geometry
    }

    fn contains(&self, selector: &str) -> bool {
        self.model.lock().unwrap().offsets.contains_key(selector)
    }

    fn offset_top(&self, selector: &str) -> Option<f64> {
        self.model.lock().unwrap().offsets.get(selector).copied()
    }

    fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.model
            .lock()
            .unwrap()
            .attributes
            .get(&(selector.to_string(), name.to_string()))
            .cloned()
    }

    fn root_data(&self, key: &str) -> Option<String> {
        self.model.lock().unwrap().root_data.get(key).cloned()
    }

    fn hide(&mut self, selector: &str) {
        self.model.lock().unwrap().hidden.push(selector.to_string());
    }
}
