//! Shared test utilities for the bemkit test suite.
//!
//! Provides a sample manifest, throwaway project directories, and small
//! filesystem helpers.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, store) = setup_project(&sample_manifest());
//! touch(tmp.path(), "src/blocks/header/header.scss", ".header {}");
//! let manifest = store.load().unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::manifest::{self, ManifestFile, ProjectManifest};

/// A manifest exercising every list field.
pub const SAMPLE_MANIFEST_JSON: &str = r#"{
  "dirs": {
    "srcPath": "src/",
    "buildPath": "build",
    "blocksDirName": "blocks"
  },
  "blocks": {
    "page": [],
    "header": ["__logo", "__nav"],
    "footer": []
  },
  "addCssBefore": ["src/scss/variables.scss"],
  "addCssAfter": ["src/scss/print.scss"],
  "addJsBefore": ["src/js/polyfills.js"],
  "addJsAfter": ["src/js/script.js"],
  "addImages": ["src/img/*.{jpg,jpeg,gif,png,svg}"],
  "singleCompiled": [],
  "copiedCss": [],
  "copiedJs": []
}"#;

// =========================================================================
// Fixture setup
// =========================================================================

pub fn sample_manifest() -> ProjectManifest {
    serde_json::from_str(SAMPLE_MANIFEST_JSON).unwrap()
}

/// Write `manifest` into a fresh temp project and return the store for it.
pub fn setup_project(manifest: &ProjectManifest) -> (TempDir, ManifestFile) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(manifest::MANIFEST_FILENAME);
    manifest::save(&path, manifest).unwrap();
    (tmp, ManifestFile::new(path))
}

/// Write a file below `root`, creating parent directories.
pub fn touch(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Read a file below `root`. Panics with the path on failure.
pub fn read(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Sorted file names directly inside `root/relative`.
pub fn file_names(root: &Path, relative: &str) -> Vec<String> {
    let dir = root.join(relative);
    let mut names: Vec<String> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
