//! Project manifest: data model and persistence.
//!
//! The manifest (`projectConfig.json`) is the single source of truth for what
//! a build contains. It is read once per invocation and rewritten only when
//! the scaffolder registers a new block.
//!
//! ```json
//! {
//!   "dirs": { "srcPath": "src/", "buildPath": "build", "blocksDirName": "blocks" },
//!   "blocks": { "page": [], "header": ["__logo", "__nav"] },
//!   "addCssBefore": ["src/scss/variables.scss"],
//!   "addCssAfter": [],
//!   "addJsBefore": [],
//!   "addJsAfter": [],
//!   "addImages": [],
//!   "singleCompiled": [],
//!   "copiedCss": [],
//!   "copiedJs": []
//! }
//! ```
//!
//! ## Block Order
//!
//! The order of keys in `blocks` is the stylesheet cascade order, so
//! [`BlockRegistry`] keeps insertion order through load → resolve → save.
//! A plain map type would silently sort the keys.
//!
//! ## Paths
//!
//! Every path in the manifest is relative to the directory containing the
//! manifest file (the *project root*). `srcPath` is concatenated verbatim, so
//! it conventionally ends with a slash.

use crate::config::ConfigError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up in the working directory.
pub const MANIFEST_FILENAME: &str = "projectConfig.json";

/// The persisted project manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectManifest {
    pub dirs: Dirs,
    pub blocks: BlockRegistry,
    #[serde(default)]
    pub add_css_before: Vec<String>,
    #[serde(default)]
    pub add_css_after: Vec<String>,
    #[serde(default)]
    pub add_js_before: Vec<String>,
    #[serde(default)]
    pub add_js_after: Vec<String>,
    #[serde(default)]
    pub add_images: Vec<String>,
    #[serde(default)]
    pub single_compiled: Vec<String>,
    #[serde(default)]
    pub copied_css: Vec<String>,
    #[serde(default)]
    pub copied_js: Vec<String>,
}

impl ProjectManifest {
    /// An empty manifest over the given directory layout.
    pub fn new(dirs: Dirs) -> Self {
        Self {
            dirs,
            blocks: BlockRegistry::default(),
            add_css_before: Vec::new(),
            add_css_after: Vec::new(),
            add_js_before: Vec::new(),
            add_js_after: Vec::new(),
            add_images: Vec::new(),
            single_compiled: Vec::new(),
            copied_css: Vec::new(),
            copied_js: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dirs.validate()?;
        if let Some(block) = self.blocks.iter().find(|b| b.name.is_empty()) {
            return Err(ConfigError::Validation(format!(
                "blocks contains an empty block name (elements: {:?})",
                block.elements
            )));
        }
        Ok(())
    }
}

/// Root locations of the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Dirs {
    /// Source root, e.g. `"src/"`. Concatenated verbatim with `blocksDirName`.
    pub src_path: String,
    /// Build output root, e.g. `"build"`.
    pub build_path: String,
    /// Name of the blocks directory under `srcPath`, e.g. `"blocks"`.
    pub blocks_dir_name: String,
}

impl Dirs {
    /// All three fields must be non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("dirs.srcPath", &self.src_path),
            ("dirs.buildPath", &self.build_path),
            ("dirs.blocksDirName", &self.blocks_dir_name),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// `{srcPath}{blocksDirName}`, the directory holding every block.
    pub fn blocks_root(&self) -> String {
        format!("{}{}", self.src_path, self.blocks_dir_name)
    }

    /// `{srcPath}{blocksDirName}/{block}/`, with the trailing slash.
    pub fn block_dir(&self, block: &str) -> String {
        format!("{}/{}/", self.blocks_root(), block)
    }
}

/// A registered block and its element suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Element suffixes such as `"__logo"`, in registration order.
    pub elements: Vec<String>,
}

/// Insertion-ordered mapping from block name to element suffixes.
///
/// Serializes as a JSON object. When a manifest repeats a key, the entry keeps
/// the position of its first occurrence and the value of its last one, the
/// same result a JavaScript object literal would give.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRegistry {
    blocks: Vec<Block>,
}

impl BlockRegistry {
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Insert or replace a block. Replacing keeps the existing position.
    pub fn insert(&mut self, name: impl Into<String>, elements: Vec<String>) {
        let name = name.into();
        match self.blocks.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.elements = elements,
            None => self.blocks.push(Block { name, elements }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Vec<String>)> for BlockRegistry {
    fn from_iter<I: IntoIterator<Item = (N, Vec<String>)>>(iter: I) -> Self {
        let mut registry = BlockRegistry::default();
        for (name, elements) in iter {
            registry.insert(name, elements);
        }
        registry
    }
}

impl Serialize for BlockRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.blocks.len()))?;
        for block in &self.blocks {
            map.serialize_entry(&block.name, &block.elements)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BlockRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = BlockRegistry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping block names to element suffix arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut registry = BlockRegistry::default();
                while let Some((name, elements)) = access.next_entry::<String, Vec<String>>()? {
                    registry.insert(name, elements);
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// Load and validate a manifest file.
///
/// A missing file is reported as [`ConfigError::NotFound`] rather than a bare
/// IO error; nothing else in the pipeline can run without it.
pub fn load(path: &Path) -> Result<ProjectManifest, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let manifest: ProjectManifest = serde_json::from_str(&content)?;
    manifest.validate()?;
    log::debug!(
        "loaded manifest {} ({} blocks)",
        path.display(),
        manifest.blocks.len()
    );
    Ok(manifest)
}

/// Rewrite the whole manifest file, pretty-printed with 2-space indentation.
pub fn save(path: &Path, manifest: &ProjectManifest) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json)?;
    log::debug!("saved manifest {}", path.display());
    Ok(())
}

/// Where a manifest is read from and written back to.
pub trait ManifestStore {
    fn load(&self) -> Result<ProjectManifest, ConfigError>;
    fn save(&self, manifest: &ProjectManifest) -> Result<(), ConfigError>;
}

/// A manifest stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory every manifest path is relative to.
    pub fn project_root(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl ManifestStore for ManifestFile {
    fn load(&self) -> Result<ProjectManifest, ConfigError> {
        load(&self.path)
    }

    fn save(&self, manifest: &ProjectManifest) -> Result<(), ConfigError> {
        save(&self.path, manifest)
    }
}
