//! Demo driver: pages through a directory of static HTML files.
//!
//! `index.html` in the directory is the starting page. Each fetched URL maps
//! to a file under the same directory (`/blog/page/2` -> `blog/page/2.html`).
//! The simulated viewport is scrolled to the bottom until the pager reports
//! that no more pages are left.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::FutureExt;
use futures::future::BoxFuture;

use infiniscroll::error::TransportResult;
use infiniscroll::log;
use infiniscroll::{
    Config, ContentUnit, FetchRequest, Geometry, Page, Pager, Payload, Renderer, Response,
    ScrollSignal, Transport, TransportError,
};

/// Height every rendered item adds to the simulated document
const ITEM_HEIGHT: f64 = 120.0;
const NAV_HEIGHT: f64 = 60.0;
const DEFAULT_VIEWPORT: f64 = 800.0;
const DEFAULT_MAX_ROUNDS: usize = 200;

struct Args {
    pages_dir: PathBuf,
    config: Option<PathBuf>,
    viewport: f64,
    max_rounds: usize,
}

fn usage() -> &'static str {
    "usage: infiniscroll <pages-dir> [--config <file>] [--viewport <px>] [--max-rounds <n>]"
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut pages_dir = None;
    let mut config = None;
    let mut viewport = DEFAULT_VIEWPORT;
    let mut max_rounds = DEFAULT_MAX_ROUNDS;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().context("--config needs a file")?;
                config = Some(PathBuf::from(value));
            }
            "--viewport" => {
                let value = args.next().context("--viewport needs a height")?;
                viewport = value
                    .parse()
                    .with_context(|| format!("invalid viewport height '{}'", value))?;
            }
            "--max-rounds" => {
                let value = args.next().context("--max-rounds needs a count")?;
                max_rounds = value
                    .parse()
                    .with_context(|| format!("invalid round count '{}'", value))?;
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            _ if arg.starts_with("--") => bail!("unknown flag {}\n{}", arg, usage()),
            _ => pages_dir = Some(PathBuf::from(arg)),
        }
    }

    let Some(pages_dir) = pages_dir else {
        bail!("{}", usage());
    };

    Ok(Args {
        pages_dir,
        config,
        viewport,
        max_rounds,
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Serves fetch URLs from files under `root`.
struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    fn file_for(&self, url: &str) -> PathBuf {
        let mut path = self.root.join(url.trim_start_matches('/'));
        if path.extension().is_none() {
            path.set_extension("html");
        }
        path
    }
}

impl Transport for FileTransport {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, TransportResult<Response>> {
        let path = self.file_for(&request.url);
        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => Ok(Response::ok(body)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(Response::new(404, ""))
                }
                Err(e) => Err(TransportError::Network(format!("{}: {}", path.display(), e))),
            }
        }
        .boxed()
    }
}

/// Understands `tag.class` selectors against one-element-per-line markup.
fn extract_items(markup: &str, selector: &str) -> Vec<ContentUnit> {
    let (tag, class) = selector.split_once('.').unwrap_or((selector, ""));
    let open = format!("<{}", tag);
    let class_attr = format!("class=\"{}\"", class);

    markup
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(&open) && (class.is_empty() || line.contains(&class_attr)))
        .map(ContentUnit::from)
        .collect()
}

/// First `href` inside the navigation block of `markup`.
fn next_href(markup: &str) -> Option<String> {
    let nav = markup.find("class=\"navigation\"")?;
    let rest = &markup[nav..];
    let start = rest.find("href=\"")? + "href=\"".len();
    let len = rest[start..].find('"')?;
    Some(rest[start..start + len].to_string())
}

/// Document whose height grows as the renderer appends items.
struct SimulatedPage {
    geometry: Arc<Mutex<Geometry>>,
    nav_selector: String,
    next_selector: String,
    nav_offset: Option<f64>,
    next_href: Option<String>,
}

impl Page for SimulatedPage {
    fn geometry(&self) -> Geometry {
        *lock(&self.geometry)
    }

    fn contains(&self, selector: &str) -> bool {
        self.nav_offset.is_some() && (selector == self.nav_selector || selector == self.next_selector)
    }

    fn offset_top(&self, selector: &str) -> Option<f64> {
        if self.contains(selector) {
            self.nav_offset
        } else {
            None
        }
    }

    fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        if selector == self.next_selector && name == "href" {
            self.next_href.clone()
        } else {
            None
        }
    }

    fn root_data(&self, _key: &str) -> Option<String> {
        None
    }

    fn hide(&mut self, selector: &str) {
        log::log_event(&format!("hiding {}", selector));
    }
}

struct StdoutRenderer {
    geometry: Arc<Mutex<Geometry>>,
    finished: Arc<AtomicBool>,
}

impl Renderer for StdoutRenderer {
    fn loading_started(&mut self, page: u32, config: &Config) {
        println!("[page {}] {}", page, config.loading.message);
    }

    fn append(&mut self, items: Vec<ContentUnit>, config: &Config) {
        lock(&self.geometry).document_height += ITEM_HEIGHT * items.len() as f64;
        let root = config.fragment_selector.as_deref().unwrap_or("body");
        println!("  appending {} items into {}", items.len(), root);
        for item in items {
            println!("  {}", item.as_str());
        }
    }

    fn deliver(&mut self, payload: Payload, _config: &Config) {
        match payload {
            Payload::Items(items) => println!("  ({} items delivered)", items.len()),
            Payload::Json(data) => println!("  {}", data),
        }
    }

    fn finished(&mut self, config: &Config) {
        println!("{}", config.loading.finished_message);
        self.finished.store(true, Ordering::SeqCst);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load_from(path)?),
        None => Ok(Config::load()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    if let Err(e) = log::init() {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let config = load_config(args.config.as_deref())?;
    let index_path = args.pages_dir.join("index.html");
    let index = tokio::fs::read_to_string(&index_path)
        .await
        .with_context(|| format!("reading {}", index_path.display()))?;

    let initial_items = extract_items(&index, &config.item_selector).len() as f64;
    let nav_offset = index
        .contains("class=\"navigation\"")
        .then_some(initial_items * ITEM_HEIGHT);
    let geometry = Arc::new(Mutex::new(Geometry {
        document_height: initial_items * ITEM_HEIGHT + NAV_HEIGHT,
        viewport_height: args.viewport,
        scroll_offset: 0.0,
    }));
    let finished = Arc::new(AtomicBool::new(false));

    let quiet_period = Duration::from_millis(config.quiet_period_ms);
    let signals = ScrollSignal::new(quiet_period);

    let page = SimulatedPage {
        geometry: geometry.clone(),
        nav_selector: config.nav_selector.clone(),
        next_selector: config.next_selector.clone(),
        nav_offset,
        next_href: next_href(&index),
    };
    let pager = Pager::builder(config)
        .page(page)
        .transport(Arc::new(FileTransport {
            root: args.pages_dir.clone(),
        }))
        .extractor(Arc::new(extract_items))
        .renderer(StdoutRenderer {
            geometry: geometry.clone(),
            finished: finished.clone(),
        })
        .signals(signals.clone())
        .build()
        .context("setting up the pager")?;

    if let Some(path) = pager.path() {
        log::log_event(&format!("paging through {}", path));
    }

    let handle = pager.handle();
    let runner = tokio::spawn(pager.run());

    signals.trigger_now();
    for _ in 0..args.max_rounds {
        if finished.load(Ordering::SeqCst) {
            break;
        }
        {
            let mut geometry = lock(&geometry);
            geometry.scroll_offset = (geometry.document_height - geometry.viewport_height).max(0.0);
        }
        signals.raw();
        tokio::time::sleep(quiet_period * 2).await;
    }

    handle.destroy();
    let state = runner.await.context("pager task failed")?;
    println!(
        "stopped after page {} ({})",
        state.current_page,
        if finished.load(Ordering::SeqCst) {
            "no more pages"
        } else {
            "round limit reached"
        }
    );

    Ok(())
}
