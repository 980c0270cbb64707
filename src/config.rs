//! Configuration support for infiniscroll.
//!
//! A `Config` is fixed when a pager is built and only changes through
//! `ConfigPatch` merges. Files are TOML and may be partial; every missing key
//! falls back to its default.
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.config/infiniscroll/config.toml
//! item_selector = "article.post"
//! nav_selector = "nav.pagination"
//! next_selector = "nav.pagination a.next"
//! path = ["/blog/page/", "/"]
//! data_format = "html"
//! buffer_px = 60
//!
//! [loading]
//! message = "Loading more..."
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::path::PathConfig;

/// Declared format of the paged resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Html,
    Json,
}

/// Texts handed to the renderer for the loading indicator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadingText {
    /// Shown while a page is being fetched
    pub message: String,
    /// Shown once no further pages exist
    pub finished_message: String,
}

impl Default for LoadingText {
    fn default() -> Self {
        Self {
            message: "<em>Loading the next set of posts...</em>".to_string(),
            finished_message: "<em>Congratulations, you've reached the end of the internet.</em>"
                .to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instance id, used to scope the scroll binding key
    pub instance_id: u32,

    /// Selector of the content units inside a fetched page
    pub item_selector: String,

    /// Selector of the fragment root new items are appended to. The pager
    /// never reads it; `Renderer` implementations get it through `&Config`.
    pub fragment_selector: Option<String>,

    /// Selector of the pagination block
    pub nav_selector: String,

    /// Selector of the "next page" anchor
    pub next_selector: String,

    /// Explicit path template, either a URL to parse or a `[prefix, suffix]` pair
    pub path: Option<PathConfig>,

    pub data_format: DataFormat,

    /// Whether fetched items are appended automatically
    pub auto_append: bool,

    /// Safety buffer subtracted from the remaining scroll distance (px)
    pub buffer_px: f64,

    /// Extra distance scrolled past new content when animating (px)
    pub extra_scroll_px: f64,

    /// Name of the registered behavior overriding default steps
    pub behavior: Option<String>,

    /// Enable diagnostic logging
    pub debug: bool,

    /// Create the instance even if selectors or path can't be resolved
    pub force_create: bool,

    /// Smooth-scroll to new content after an append
    pub animate: bool,

    /// Debounce window for scroll signals (ms)
    pub quiet_period_ms: u64,

    pub loading: LoadingText,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_id: 0,
            item_selector: "div.post".to_string(),
            fragment_selector: None,
            nav_selector: "div.navigation".to_string(),
            next_selector: "div.navigation a:first".to_string(),
            path: None,
            data_format: DataFormat::Html,
            auto_append: true,
            buffer_px: 40.0,
            extra_scroll_px: 150.0,
            behavior: None,
            debug: false,
            force_create: false,
            animate: false,
            quiet_period_ms: 100,
            loading: LoadingText::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from the default config file path.
    ///
    /// Returns default configuration if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}", e);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("infiniscroll")
            .join("config.toml")
    }

    /// Merge a partial update. Only fields present in the patch are replaced.
    pub fn merge(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            item_selector,
            fragment_selector,
            nav_selector,
            next_selector,
            path,
            data_format,
            auto_append,
            buffer_px,
            extra_scroll_px,
            behavior,
            debug,
            force_create,
            animate,
            quiet_period_ms,
            loading,
        } = patch;

        if let Some(v) = item_selector {
            self.item_selector = v;
        }
        if fragment_selector.is_some() {
            self.fragment_selector = fragment_selector;
        }
        if let Some(v) = nav_selector {
            self.nav_selector = v;
        }
        if let Some(v) = next_selector {
            self.next_selector = v;
        }
        if path.is_some() {
            self.path = path;
        }
        if let Some(v) = data_format {
            self.data_format = v;
        }
        if let Some(v) = auto_append {
            self.auto_append = v;
        }
        if let Some(v) = buffer_px {
            self.buffer_px = v;
        }
        if let Some(v) = extra_scroll_px {
            self.extra_scroll_px = v;
        }
        if behavior.is_some() {
            self.behavior = behavior;
        }
        if let Some(v) = debug {
            self.debug = v;
        }
        if let Some(v) = force_create {
            self.force_create = v;
        }
        if let Some(v) = animate {
            self.animate = v;
        }
        if let Some(v) = quiet_period_ms {
            self.quiet_period_ms = v;
        }
        if let Some(loading) = loading {
            if let Some(v) = loading.message {
                self.loading.message = v;
            }
            if let Some(v) = loading.finished_message {
                self.loading.finished_message = v;
            }
        }
    }
}

/// Option keys accepted by `ConfigPatch::from_key`.
const PATCH_KEYS: &[&str] = &[
    "item_selector",
    "fragment_selector",
    "nav_selector",
    "next_selector",
    "path",
    "data_format",
    "auto_append",
    "buffer_px",
    "extra_scroll_px",
    "behavior",
    "debug",
    "force_create",
    "animate",
    "quiet_period_ms",
    "loading",
];

/// Partial update of the nested loading texts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadingPatch {
    pub message: Option<String>,
    pub finished_message: Option<String>,
}

/// Partial configuration, merged into a `Config` field by field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    pub item_selector: Option<String>,
    pub fragment_selector: Option<String>,
    pub nav_selector: Option<String>,
    pub next_selector: Option<String>,
    pub path: Option<PathConfig>,
    pub data_format: Option<DataFormat>,
    pub auto_append: Option<bool>,
    pub buffer_px: Option<f64>,
    pub extra_scroll_px: Option<f64>,
    pub behavior: Option<String>,
    pub debug: Option<bool>,
    pub force_create: Option<bool>,
    pub animate: Option<bool>,
    pub quiet_period_ms: Option<u64>,
    pub loading: Option<LoadingPatch>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a patch from a single named option.
    pub fn from_key(key: &str, value: serde_json::Value) -> ConfigResult<Self> {
        if !PATCH_KEYS.contains(&key) {
            return Err(ConfigError::UnknownOption(key.to_string()));
        }

        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value);

        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Build a patch from a JSON object of options.
    pub fn from_json(value: serde_json::Value) -> ConfigResult<Self> {
        if let Some(unknown) = value
            .as_object()
            .and_then(|o| o.keys().find(|k| !PATCH_KEYS.contains(&k.as_str())))
        {
            return Err(ConfigError::UnknownOption(unknown.clone()));
        }

        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            key: "<object>".to_string(),
            message: e.to_string(),
        })
    }

    pub fn item_selector(mut self, selector: impl Into<String>) -> Self {
        self.item_selector = Some(selector.into());
        self
    }

    pub fn fragment_selector(mut self, selector: impl Into<String>) -> Self {
        self.fragment_selector = Some(selector.into());
        self
    }

    pub fn nav_selector(mut self, selector: impl Into<String>) -> Self {
        self.nav_selector = Some(selector.into());
        self
    }

    pub fn next_selector(mut self, selector: impl Into<String>) -> Self {
        self.next_selector = Some(selector.into());
        self
    }

    pub fn path(mut self, path: PathConfig) -> Self {
        self.path = Some(path);
        self
    }

    pub fn data_format(mut self, format: DataFormat) -> Self {
        self.data_format = Some(format);
        self
    }

    pub fn auto_append(mut self, auto_append: bool) -> Self {
        self.auto_append = Some(auto_append);
        self
    }

    pub fn buffer_px(mut self, px: f64) -> Self {
        self.buffer_px = Some(px);
        self
    }

    pub fn extra_scroll_px(mut self, px: f64) -> Self {
        self.extra_scroll_px = Some(px);
        self
    }

    pub fn behavior(mut self, name: impl Into<String>) -> Self {
        self.behavior = Some(name.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn force_create(mut self, force: bool) -> Self {
        self.force_create = Some(force);
        self
    }

    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = Some(animate);
        self
    }

    pub fn quiet_period_ms(mut self, ms: u64) -> Self {
        self.quiet_period_ms = Some(ms);
        self
    }

    pub fn loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading.get_or_insert_with(LoadingPatch::default).message = Some(message.into());
        self
    }

    pub fn finished_message(mut self, message: impl Into<String>) -> Self {
        self.loading
            .get_or_insert_with(LoadingPatch::default)
            .finished_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.item_selector, "div.post");
        assert_eq!(config.buffer_px, 40.0);
        assert_eq!(config.extra_scroll_px, 150.0);
        assert_eq!(config.data_format, DataFormat::Html);
        assert!(config.auto_append);
        assert!(config.path.is_none());
        assert_eq!(config.quiet_period_ms, 100);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            item_selector = "li.entry"
            data_format = "json"
            auto_append = false
            path = ["/api/items?page=", "&limit=10"]

            [loading]
            message = "hold on"
        "#;

        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.item_selector, "li.entry");
        assert_eq!(config.data_format, DataFormat::Json);
        assert!(!config.auto_append);
        assert_eq!(
            config.path,
            Some(PathConfig::Parts("/api/items?page=".to_string(), "&limit=10".to_string()))
        );
        assert_eq!(config.loading.message, "hold on");
        // Untouched nested field keeps its default
        assert_eq!(config.loading.finished_message, LoadingText::default().finished_message);
    }

    #[test]
    fn test_parse_config_rejects_bad_format() {
        let result = Config::from_toml_str(r#"data_format = "xml""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_merge_only_overwrites_present_fields() {
        let mut config = Config::default();
        config.merge(
            ConfigPatch::new()
                .buffer_px(120.0)
                .finished_message("all done"),
        );

        assert_eq!(config.buffer_px, 120.0);
        assert_eq!(config.item_selector, "div.post");
        assert_eq!(config.loading.finished_message, "all done");
        assert_eq!(config.loading.message, LoadingText::default().message);
    }

    #[test]
    fn test_patch_from_key() {
        let patch = ConfigPatch::from_key("path", json!("/blog?page=2")).unwrap();
        assert_eq!(patch.path, Some(PathConfig::Url("/blog?page=2".to_string())));

        let patch = ConfigPatch::from_key("path", json!(["/blog/page/", "/"])).unwrap();
        assert_eq!(
            patch.path,
            Some(PathConfig::Parts("/blog/page/".to_string(), "/".to_string()))
        );
    }

    #[test]
    fn test_patch_from_key_errors() {
        assert!(matches!(
            ConfigPatch::from_key("bogus", json!(1)),
            Err(ConfigError::UnknownOption(k)) if k == "bogus"
        ));
        assert!(matches!(
            ConfigPatch::from_key("buffer_px", json!("wide")),
            Err(ConfigError::InvalidValue { key, .. }) if key == "buffer_px"
        ));
    }

    #[test]
    fn test_patch_from_json_object() {
        let patch = ConfigPatch::from_json(json!({
            "debug": true,
            "loading": { "message": "more" }
        }))
        .unwrap();
        assert_eq!(patch.debug, Some(true));
        assert_eq!(patch.loading.unwrap().message, Some("more".to_string()));

        assert!(matches!(
            ConfigPatch::from_json(json!({ "debug": true, "nope": 1 })),
            Err(ConfigError::UnknownOption(k)) if k == "nope"
        ));
    }
}
