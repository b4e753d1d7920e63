//! Glob patterns over the project tree.
//!
//! Manifest entries and block image folders are written as shell-style globs
//! (`src/blocks/card/img/*.{jpg,png}`). Every task that reads sources expands
//! them here, relative to the project root.
//!
//! Supported syntax:
//!
//! | Token | Matches |
//! |---|---|
//! | `*` | any run of characters except `/` |
//! | `?` | one character except `/` |
//! | `**/` | zero or more whole directories |
//! | `{a,b}` | either alternative (no nesting) |
//!
//! A match remembers its path relative to the pattern's *base*, the literal
//! directory prefix before the first wildcard. Copy tasks mirror that
//! relative path into the destination, so `src/img/**/*.png` keeps its
//! subdirectories while `src/blocks/card/img/*.png` lands flat.

use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GlobError {
    #[error("Invalid glob {pattern:?}: {reason}")]
    Invalid { pattern: String, reason: String },
    #[error("Glob regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A file found by expanding a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    /// Full path (project root joined).
    pub path: PathBuf,
    /// Path below the pattern's base directory.
    pub relative: PathBuf,
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    normalized: String,
    base: String,
    regex: Option<Regex>,
    max_depth: Option<usize>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let normalized = normalize(pattern);
        let segments: Vec<&str> = normalized.split('/').collect();
        let literal_count = segments
            .iter()
            .take_while(|s| !has_wildcard(s))
            .count();

        if literal_count == segments.len() {
            // No wildcard at all: the base is the parent directory.
            let base = match normalized.rfind('/') {
                Some(pos) => normalized[..pos].to_string(),
                None => String::new(),
            };
            return Ok(Self {
                normalized,
                base,
                regex: None,
                max_depth: None,
            });
        }

        let base = segments[..literal_count].join("/");
        let rest = &segments[literal_count..];
        let max_depth = if rest.iter().any(|s| s.contains("**")) {
            None
        } else {
            Some(rest.len())
        };
        let regex = Regex::new(&format!("^{}$", translate(&normalized, pattern)?))?;
        Ok(Self {
            normalized,
            base,
            regex: Some(regex),
            max_depth,
        })
    }

    /// Literal directory prefix before the first wildcard.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Test a `/`-separated path written the way the pattern is.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = normalize(candidate);
        match &self.regex {
            Some(regex) => regex.is_match(&candidate),
            None => candidate == self.normalized,
        }
    }

    /// Files below `root` matching this pattern, sorted by path.
    pub fn expand(&self, root: &Path) -> Vec<GlobMatch> {
        let Some(regex) = &self.regex else {
            let path = root.join(&self.normalized);
            if !path.is_file() {
                return Vec::new();
            }
            let relative = path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_default();
            return vec![GlobMatch { path, relative }];
        };

        let walk_root = root.join(&self.base);
        if !walk_root.is_dir() {
            return Vec::new();
        }
        let mut walker = WalkDir::new(&walk_root).min_depth(1).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&walk_root).ok()?.to_path_buf();
                let rel_str = to_slash(&relative);
                let candidate = if self.base.is_empty() {
                    rel_str
                } else {
                    format!("{}/{}", self.base, rel_str)
                };
                regex.is_match(&candidate).then(|| GlobMatch {
                    path: e.path().to_path_buf(),
                    relative,
                })
            })
            .collect()
    }
}

/// Expand several patterns in order. A file matched by more than one pattern
/// appears once, at its first position. Invalid patterns are skipped with a
/// warning.
pub fn expand_all<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Vec<GlobMatch> {
    let mut seen = std::collections::HashSet::new();
    let mut matches = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        match Pattern::new(pattern) {
            Ok(compiled) => {
                for m in compiled.expand(root) {
                    if seen.insert(m.path.clone()) {
                        matches.push(m);
                    }
                }
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    matches
}

fn normalize(pattern: &str) -> String {
    let mut out = pattern.replace('\\', "/");
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    match out.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '{'])
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Translate a normalized glob into a regex body.
fn translate(glob: &str, full_pattern: &str) -> Result<String, GlobError> {
    let invalid = |reason: &str| GlobError::Invalid {
        pattern: full_pattern.to_string(),
        reason: reason.to_string(),
    };

    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
            }
            '*' => {
                out.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                out.push_str("[^/]");
                i += 1;
            }
            '{' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == '}')
                    .ok_or_else(|| invalid("unclosed '{'"))?;
                let body: String = chars[i + 1..i + close].iter().collect();
                if body.contains('{') {
                    return Err(invalid("nested braces are not supported"));
                }
                let alternatives = body
                    .split(',')
                    .map(|alt| translate(alt, full_pattern))
                    .collect::<Result<Vec<_>, _>>()?;
                out.push_str(&format!("(?:{})", alternatives.join("|")));
                i += close + 1;
            }
            '}' => return Err(invalid("unmatched '}'")),
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    Ok(out)
}
