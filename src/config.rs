//! Pipeline configuration module.
//!
//! Two files configure a project:
//!
//! - `projectConfig.json`: the project manifest (see [`crate::manifest`]).
//!   It describes *what* gets built.
//! - `bemkit.toml`: optional pipeline settings described here. They control
//!   *how* it gets built: which external programs are invoked, where the
//!   generated style aggregator lives, and how the dev server behaves.
//!
//! ## Settings File Location
//!
//! `bemkit.toml` sits next to the manifest, in the project root:
//!
//! ```text
//! project/
//! ├── projectConfig.json       # Manifest
//! ├── bemkit.toml              # Pipeline settings (optional)
//! └── src/
//!     ├── scss/style.scss      # Generated aggregator
//!     └── blocks/
//! ```
//!
//! ## Partial Configuration
//!
//! The file is sparse: user values are merged key-by-key on top of the stock
//! defaults, so overriding one program name is a two-line file:
//!
//! ```toml
//! [tools]
//! sass = "/opt/dart-sass/sass"
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! ## Build Mode
//!
//! The `NODE_ENV` environment variable selects the [`Mode`]. Absent or `dev`
//! means development (source maps, readable output); any other value means
//! production (minified, no source maps).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the pipeline settings file within the project root.
pub const SETTINGS_FILENAME: &str = "bemkit.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build mode, selected once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Interpret the value of `NODE_ENV`.
    ///
    /// - `None`, `""` or `"dev"` → [`Mode::Development`]
    /// - anything else → [`Mode::Production`]
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some("dev") => Mode::Development,
            Some(_) => Mode::Production,
        }
    }

    pub fn is_dev(self) -> bool {
        self == Mode::Development
    }
}

/// Pipeline settings loaded from `bemkit.toml`.
///
/// All fields have defaults; user files only list what they override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Programs invoked for each external collaborator.
    pub tools: ToolsConfig,
    /// Style aggregator settings.
    pub style: StyleConfig,
    /// Image copy / sprite settings.
    pub images: ImagesConfig,
    /// Dev server and watcher settings.
    pub serve: ServeConfig,
}

impl PipelineConfig {
    /// Validate values that the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("tools.sass", &self.tools.sass),
            ("tools.imagemin", &self.tools.imagemin),
            ("tools.svgstore", &self.tools.svgstore),
            ("tools.spritesmith", &self.tools.spritesmith),
            ("tools.server", &self.tools.server),
            ("tools.deploy", &self.tools.deploy),
            ("style.aggregator", &self.style.aggregator),
            ("style.output_name", &self.style.output_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        if self.images.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "images.extensions must not be empty".into(),
            ));
        }
        if self.serve.port == 0 {
            return Err(ConfigError::Validation("serve.port must be non-zero".into()));
        }
        if self.serve.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "serve.poll_interval_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Program names for the external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Style preprocessor (dart-sass CLI compatible).
    pub sass: String,
    /// Post-processor run on every emitted stylesheet. Empty disables it.
    pub postcss: String,
    /// Image optimizer (imagemin-cli compatible).
    pub imagemin: String,
    /// SVG sprite packer (svgstore-cli compatible).
    pub svgstore: String,
    /// PNG sprite packer (spritesmith-cli compatible).
    pub spritesmith: String,
    /// Dev server with live reload (browser-sync compatible).
    pub server: String,
    /// Publisher for the build directory (gh-pages compatible).
    pub deploy: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sass: "sass".to_string(),
            postcss: "postcss".to_string(),
            imagemin: "imagemin".to_string(),
            svgstore: "svgstore".to_string(),
            spritesmith: "spritesmith".to_string(),
            server: "browser-sync".to_string(),
            deploy: "gh-pages".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// Aggregator path, relative to `dirs.srcPath`.
    pub aggregator: String,
    /// File name of the compiled aggregator under `{buildPath}/css/`.
    pub output_name: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            aggregator: "scss/style.scss".to_string(),
            output_name: "style.min.css".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Extensions picked up from each block's `img/` folder.
    pub extensions: Vec<String>,
    /// Gap between packed PNG sprite tiles, in pixels.
    pub png_sprite_padding: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "gif", "png", "svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            png_sprite_padding: 4,
        }
    }
}

impl ImagesConfig {
    /// Brace group matching every configured extension, e.g. `{jpg,png}`.
    pub fn extension_group(&self) -> String {
        format!("{{{}}}", self.extensions.join(","))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub port: u16,
    /// Page opened first by the dev server.
    pub start_path: String,
    /// Watcher polling interval.
    pub poll_interval_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            start_path: "index.html".to_string(),
            poll_interval_ms: 300,
        }
    }
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock defaults as a TOML table, the base layer for user overrides.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PipelineConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
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

/// Load `bemkit.toml` from the project root, falling back to stock defaults
/// when the file does not exist.
pub fn load_pipeline_config(project_root: &Path) -> Result<PipelineConfig, ConfigError> {
    let path = project_root.join(SETTINGS_FILENAME);
    let base = stock_defaults_value()?;
    let merged = if path.exists() {
        let content = fs::read_to_string(&path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        log::debug!("merging pipeline settings from {}", path.display());
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Fully commented stock `bemkit.toml`, printed by `bemkit gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# bemkit pipeline settings
# ========================
# All settings are optional. Values shown are the defaults.
# Place this file next to projectConfig.json. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# External programs
# ---------------------------------------------------------------------------
[tools]
# Style preprocessor, dart-sass command line interface.
sass = "sass"
# Post-processor run on every emitted stylesheet (autoprefixer, media query
# packing, inlining). Set to "" to skip post-processing.
postcss = "postcss"
# Image optimizer, imagemin-cli interface.
imagemin = "imagemin"
# SVG sprite packer, svgstore-cli interface.
svgstore = "svgstore"
# PNG sprite packer, spritesmith-cli interface.
spritesmith = "spritesmith"
# Dev server with live reload, browser-sync interface.
server = "browser-sync"
# Publisher for the build directory, gh-pages interface.
deploy = "gh-pages"

# ---------------------------------------------------------------------------
# Styles
# ---------------------------------------------------------------------------
[style]
# Generated aggregator, relative to dirs.srcPath. Rewritten on every build.
aggregator = "scss/style.scss"
# Compiled aggregator name under <buildPath>/css/.
output_name = "style.min.css"

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
[images]
# Extensions copied from every block's img/ folder.
extensions = ["jpg", "jpeg", "gif", "png", "svg"]
# Gap between PNG sprite tiles, in pixels.
png_sprite_padding = 4

# ---------------------------------------------------------------------------
# Dev server
# ---------------------------------------------------------------------------
[serve]
port = 8080
start_path = "index.html"
# How often watched sources are checked for changes.
poll_interval_ms = 300
"##
}
