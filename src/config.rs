//! Loader configuration.
//!
//! Handles loading, validating, and merging `picstory.toml`. Stock defaults
//! reproduce the served tier ladder; a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [tiers]
//! sizes = [800, 600, 400, 300, 200]  # Rendered widths, largest first
//! footprint_ratio = [4, 3]           # Box each tier was rendered into (w:h)
//!
//! [viewport]
//! padding = 10                       # CSS px kept clear on every side
//! fallback = [800, 600]              # Used when the page reports no size
//!
//! [polling]
//! interval_ms = 100                  # Viewport check period
//!
//! [page]
//! story_class = "story"              # Root class that activates the loader
//! image_extension = "jpg"            # Extension of tiered image files
//! script_src = ""                    # <script src> for rendered pages (empty = none)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::sizing::{TierError, TierList};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Largest padding whose doubled value still fits a `u32`.
pub const MAX_PADDING: u32 = u32::MAX / 2;

/// Configuration loaded from `picstory.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Rendered tier widths and their footprint box.
    pub tiers: TiersConfig,
    /// Viewport padding and fallback size.
    pub viewport: ViewportConfig,
    /// Poll timer settings.
    pub polling: PollingConfig,
    /// Page markup settings shared by rendering and discovery.
    pub page: PageConfig,
}

impl LoaderConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "tiers.sizes must not be empty".into(),
            ));
        }
        self.tier_list()
            .map_err(|e| ConfigError::Validation(format!("tiers: {e}")))?;
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "polling.interval_ms must be greater than zero".into(),
            ));
        }
        if self.viewport.padding > MAX_PADDING {
            return Err(ConfigError::Validation(format!(
                "viewport.padding must be at most {MAX_PADDING}"
            )));
        }
        if self.viewport.fallback[0] == 0 || self.viewport.fallback[1] == 0 {
            return Err(ConfigError::Validation(
                "viewport.fallback values must be non-zero".into(),
            ));
        }
        if self.page.story_class.split_ascii_whitespace().count() != 1 {
            return Err(ConfigError::Validation(
                "page.story_class must be a single class name".into(),
            ));
        }
        if self.page.image_extension.is_empty() || self.page.image_extension.contains('.') {
            return Err(ConfigError::Validation(
                "page.image_extension must be a bare extension like \"jpg\"".into(),
            ));
        }
        Ok(())
    }

    /// The configured tiers as a validated list.
    pub fn tier_list(&self) -> Result<TierList, TierError> {
        let [ratio_w, ratio_h] = self.tiers.footprint_ratio;
        TierList::new(&self.tiers.sizes, (ratio_w, ratio_h))
    }
}

/// Tier ladder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TiersConfig {
    /// Rendered widths, strictly descending.
    pub sizes: Vec<u32>,
    /// Footprint box as `[width, height]`; `[4, 3]` means a w800 file fits 800x600.
    pub footprint_ratio: [u32; 2],
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            sizes: vec![800, 600, 400, 300, 200],
            footprint_ratio: [4, 3],
        }
    }
}

/// Viewport handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    /// CSS pixels kept clear on each side of a picture.
    pub padding: u32,
    /// `[width, height]` assumed when the page reports no viewport size.
    pub fallback: [u32; 2],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            fallback: [800, 600],
        }
    }
}

/// Poll timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

/// Markup settings shared by the page renderer and discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Root class that marks a story page.
    pub story_class: String,
    /// Extension of the tiered image files, without the dot.
    pub image_extension: String,
    /// Script to reference from rendered pages. Empty means none.
    pub script_src: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            story_class: "story".to_string(),
            image_extension: "jpg".to_string(),
            script_src: String::new(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(LoaderConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<LoaderConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LoaderConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, or stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<LoaderConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `picstory.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# picstory configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Tiers
# ---------------------------------------------------------------------------
[tiers]
# Widths the image host serves, largest first. A picture URL ends in
# w<size>.<extension>; the page links the largest one.
sizes = [800, 600, 400, 300, 200]

# Box each tier was rendered into, as [width, height]. [4, 3] means the
# w800 file fits inside 800x600.
footprint_ratio = [4, 3]

# ---------------------------------------------------------------------------
# Viewport
# ---------------------------------------------------------------------------
[viewport]
# CSS pixels kept clear around each picture on every side.
padding = 10

# Viewport assumed when the page cannot report one.
fallback = [800, 600]

# ---------------------------------------------------------------------------
# Polling
# ---------------------------------------------------------------------------
[polling]
# How often the viewport is checked for changes, in milliseconds.
interval_ms = 100

# ---------------------------------------------------------------------------
# Page markup
# ---------------------------------------------------------------------------
[page]
# Root (body) class that switches the loader on.
story_class = "story"

# Extension of the tiered image files.
image_extension = "jpg"

# Script to reference from rendered story pages. Empty means none.
script_src = ""
"##
}
