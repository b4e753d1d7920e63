//! `@@include` expansion for HTML pages.
//!
//! Pages and block markup compose through one directive:
//!
//! ```html
//! <body>
//!   @@include('blocks/header/header.html')
//! </body>
//! ```
//!
//! Paths are relative to the file containing the directive. Included content
//! is expanded recursively and every line after the first is indented to the
//! directive's column, so nested markup stays readable. Include cycles are an
//! error rather than a stack overflow.

use super::backend::ToolError;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@@include\(\s*['"]([^'"]+)['"]\s*(?:,[^)]*)?\)"#).expect("include regex is valid")
});

/// Read `page` and expand every include it reaches.
pub fn expand_file(page: &Path) -> Result<String, ToolError> {
    let mut stack = Vec::new();
    expand_recursive(page, &mut stack)
}

fn expand_recursive(path: &Path, stack: &mut Vec<PathBuf>) -> Result<String, ToolError> {
    let key = fs::canonicalize(path).map_err(|e| ToolError::Include {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if stack.contains(&key) {
        return Err(ToolError::Include {
            path: path.to_path_buf(),
            reason: "include cycle".to_string(),
        });
    }
    let content = fs::read_to_string(&key)?;
    let dir = key.parent().map(Path::to_path_buf).unwrap_or_default();

    stack.push(key);
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for caps in INCLUDE_RE.captures_iter(&content) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&content[last..whole.start()]);
        let included = expand_recursive(&dir.join(target.as_str()), stack)?;
        let indent = line_indent(&content, whole.start());
        out.push_str(&indent_after_first_line(
            included.trim_end_matches('\n'),
            indent,
        ));
        last = whole.end();
    }
    out.push_str(&content[last..]);
    stack.pop();
    Ok(out)
}

/// Leading whitespace of the line containing `pos`, if only whitespace
/// precedes `pos` on that line.
fn line_indent(content: &str, pos: usize) -> &str {
    let line_start = content[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prefix = &content[line_start..pos];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        ""
    }
}

fn indent_after_first_line(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
