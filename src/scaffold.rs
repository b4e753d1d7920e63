//! Block scaffolding.
//!
//! Creates a block's directory and starter files, and registers the block in
//! the manifest the first time it is scaffolded.
//!
//! ```text
//! bemkit scaffold card js
//!
//! src/blocks/card/
//! ├── card.scss      # style stub      (default)
//! ├── card.html      # markup stub     (default)
//! ├── img/           # image folder    (default)
//! └── card.js        # script stub     (requested)
//! ```
//!
//! ## Rules
//!
//! - Existing files are never overwritten; they are reported as already present.
//! - Block names are single path components: no `/`, no `\`, not `.` or
//!   `..`. Anything else is rejected before the filesystem is touched.
//! - Failing to create the block directory aborts the whole run with a
//!   [`ScaffoldError`]. Any other failure is recorded against its own entry and
//!   does not stop the remaining entries.
//! - Entries are created in parallel and independently of each other.
//! - A block missing from `manifest.blocks` is appended with an empty element
//!   list. The updated manifest is returned to the caller, who persists it;
//!   [`scaffold_and_register`] does exactly that.

use crate::config::ConfigError;
use crate::manifest::{Dirs, ManifestStore, ProjectManifest};
use rayon::prelude::*;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Invalid block name {0:?}: must be a single folder name")]
    InvalidBlockName(String),
    #[error("Cannot create block directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What a scaffold entry produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `{block}.scss`; also triggers manifest registration.
    Style,
    /// `{block}.html` include snippet.
    Markup,
    /// `img/` subdirectory, never populated.
    ImageFolder,
    /// `{block}.js` stub.
    Script,
    /// Any other tag: an empty `{block}.{tag}` file.
    Other(String),
}

/// Kinds every scaffold run creates, in creation order.
pub const DEFAULT_KINDS: [FileKind; 3] = [FileKind::Style, FileKind::Markup, FileKind::ImageFolder];

impl FileKind {
    /// Map a command-line tag to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "scss" => FileKind::Style,
            "html" => FileKind::Markup,
            "img" => FileKind::ImageFolder,
            "js" => FileKind::Script,
            other => FileKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            FileKind::Style => "scss",
            FileKind::Markup => "html",
            FileKind::ImageFolder => "img",
            FileKind::Script => "js",
            FileKind::Other(tag) => tag,
        }
    }
}

/// Merge caller tags into the default set.
///
/// Defaults come first; duplicates keep their first position. Empty tags and
/// tags containing path separators are dropped.
pub fn requested_kinds(extra_tags: &[String]) -> Vec<FileKind> {
    let mut kinds: Vec<FileKind> = DEFAULT_KINDS.to_vec();
    for tag in extra_tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.contains(['/', '\\']) {
            log::warn!("ignoring extension tag {tag:?}");
            continue;
        }
        let kind = FileKind::from_tag(tag);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Result of one scaffold entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Created,
    AlreadyExists,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldEntry {
    pub kind: FileKind,
    /// Path relative to the project root, as printed.
    pub path: String,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub block: String,
    /// Block directory relative to the project root, with trailing slash.
    pub dir: String,
    /// `Created` or `AlreadyExists`.
    pub dir_status: EntryStatus,
    /// One entry per requested kind, in request order.
    pub entries: Vec<ScaffoldEntry>,
    /// The block was added to the manifest by this run.
    pub registered: bool,
}

impl ScaffoldReport {
    /// True when the run touched neither the filesystem nor the manifest.
    pub fn is_noop(&self) -> bool {
        !self.registered
            && self.dir_status == EntryStatus::AlreadyExists
            && self
                .entries
                .iter()
                .all(|e| e.status == EntryStatus::AlreadyExists)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScaffoldEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, EntryStatus::Failed(_)))
    }
}

#[derive(Debug)]
pub enum ScaffoldOutcome {
    /// No block name was given; nothing was done.
    Cancelled,
    Completed {
        report: ScaffoldReport,
        /// The manifest with the new block appended, when it was unregistered.
        updated_manifest: Option<ProjectManifest>,
    },
}

/// Scaffold `block` below `project_root`.
///
/// `block` of `None` (or blank) yields [`ScaffoldOutcome::Cancelled`] without
/// touching the filesystem. The manifest is only read; a registration comes
/// back as `updated_manifest`.
pub fn scaffold(
    manifest: &ProjectManifest,
    project_root: &Path,
    block: Option<&str>,
    extra_tags: &[String],
) -> Result<ScaffoldOutcome, ScaffoldError> {
    let Some(block) = block.map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(ScaffoldOutcome::Cancelled);
    };
    validate_block_name(block)?;
    let kinds = requested_kinds(extra_tags);

    let dir = manifest.dirs.block_dir(block);
    let dir_path = project_root.join(&dir);
    let dir_status = ensure_dir(&dir_path).map_err(|source| ScaffoldError::CreateDir {
        path: dir_path.clone(),
        source,
    })?;

    let updated_manifest = if kinds.contains(&FileKind::Style) && !manifest.blocks.contains(block)
    {
        let mut updated = manifest.clone();
        updated.blocks.insert(block, Vec::new());
        Some(updated)
    } else {
        None
    };

    let entries: Vec<ScaffoldEntry> = kinds
        .par_iter()
        .map(|kind| create_entry(&manifest.dirs, project_root, block, kind))
        .collect();

    let report = ScaffoldReport {
        block: block.to_string(),
        dir,
        dir_status,
        entries,
        registered: updated_manifest.is_some(),
    };
    log::debug!(
        "scaffolded {} ({} entries, registered: {})",
        report.block,
        report.entries.len(),
        report.registered
    );
    Ok(ScaffoldOutcome::Completed {
        report,
        updated_manifest,
    })
}

/// Load the manifest from `store`, scaffold, and save the manifest once if
/// the block was newly registered.
pub fn scaffold_and_register(
    store: &impl ManifestStore,
    project_root: &Path,
    block: Option<&str>,
    extra_tags: &[String],
) -> Result<ScaffoldOutcome, ScaffoldError> {
    if block.map(str::trim).filter(|b| !b.is_empty()).is_none() {
        return Ok(ScaffoldOutcome::Cancelled);
    }
    let manifest = store.load()?;
    let outcome = scaffold(&manifest, project_root, block, extra_tags)?;
    if let ScaffoldOutcome::Completed {
        updated_manifest: Some(updated),
        ..
    } = &outcome
    {
        store.save(updated)?;
    }
    Ok(outcome)
}

fn validate_block_name(block: &str) -> Result<(), ScaffoldError> {
    if block.contains(['/', '\\']) || block == "." || block == ".." {
        return Err(ScaffoldError::InvalidBlockName(block.to_string()));
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> io::Result<EntryStatus> {
    if path.is_dir() {
        return Ok(EntryStatus::AlreadyExists);
    }
    fs::create_dir_all(path)?;
    Ok(EntryStatus::Created)
}

fn create_entry(dirs: &Dirs, project_root: &Path, block: &str, kind: &FileKind) -> ScaffoldEntry {
    let block_dir = dirs.block_dir(block);
    let (path, result) = match kind {
        FileKind::ImageFolder => {
            let path = format!("{block_dir}img/");
            let result = ensure_dir(&project_root.join(&path));
            (path, result)
        }
        _ => {
            let path = format!("{block_dir}{block}.{}", kind.tag());
            let content = stub_content(dirs, block, kind);
            let result = write_new_file(&project_root.join(&path), &content);
            (path, result)
        }
    };
    let status = match result {
        Ok(status) => status,
        Err(e) => EntryStatus::Failed(e.to_string()),
    };
    ScaffoldEntry {
        kind: kind.clone(),
        path,
        status,
    }
}

/// Create `path` with `content` unless it already exists.
fn write_new_file(path: &Path, content: &str) -> io::Result<EntryStatus> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Ok(EntryStatus::AlreadyExists);
        }
        Err(e) => return Err(e),
    };
    fill_new_file(file, path, content)?;
    Ok(EntryStatus::Created)
}

/// Write `content` into a file this run just created. On failure the file is
/// removed again, so the next run retries instead of seeing it as present.
fn fill_new_file(mut file: impl Write, path: &Path, content: &str) -> io::Result<()> {
    if let Err(e) = file.write_all(content.as_bytes()) {
        drop(file);
        if let Err(remove) = fs::remove_file(path) {
            log::warn!("cannot remove partial {}: {remove}", path.display());
        }
        return Err(e);
    }
    Ok(())
}

// =============================================================================
// Stub templates
// =============================================================================

fn stub_content(dirs: &Dirs, block: &str, kind: &FileKind) -> String {
    match kind {
        FileKind::Style => style_stub(block),
        FileKind::Markup => markup_stub(dirs, block),
        FileKind::Script => SCRIPT_STUB.to_string(),
        FileKind::ImageFolder | FileKind::Other(_) => String::new(),
    }
}

pub fn style_stub(block: &str) -> String {
    format!(
        "// Styles for the BEM block {block}: its elements, modifiers,\n\
         // pseudo-selectors, pseudo-elements, @media conditions...\n\
         // Order: http://nicothin.github.io/idiomatic-pre-CSS/#priority\n\
         \n\
         .{block} {{\n\
         \n  $block-name:                &; // #{{$block-name}}__element {{}}\n\
         \n\
         }}\n"
    )
}

/// The `@ @include` line is split so the includer leaves the stub alone.
pub fn markup_stub(dirs: &Dirs, block: &str) -> String {
    let blocks = &dirs.blocks_dir_name;
    format!(
        "<!--DEV\n\
         \n\
         To use this file as a template:\n\
         \n\
         @ @include('{blocks}/{block}/{block}.html')\n\
         \n\
         (Remove the space between the @ characters)\n\
         More: https://www.npmjs.com/package/gulp-file-include\n\
         \n\
         -->\n\
         \n\
         <div class=\"{block}\">content</div>\n"
    )
}

pub const SCRIPT_STUB: &str = "// document.addEventListener('DOMContentLoaded', function(){});\n// (function(){\n// code\n// }());\n";
