//! Toolchain trait and shared error type.
//!
//! The [`Toolchain`] trait is the only way tasks reach third-party programs,
//! so the orchestrator can be exercised end-to-end with a recording mock.
//! The production implementation is
//! [`CommandToolchain`](super::command_backend::CommandToolchain).

use super::include;
use super::params::{CssJob, ImageJob, PngSpriteJob, ServeJob, StyleJob, SvgSpriteJob};
use std::path::{Path, PathBuf};
use std::process::Child;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} failed ({status}): {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Include error in {path}: {reason}")]
    Include { path: PathBuf, reason: String },
}

/// Third-party collaborators used by the build tasks.
///
/// Implementations must be `Sync`: independent tasks call into the same
/// toolchain from rayon worker threads.
pub trait Toolchain: Sync {
    /// Compile a style entry file to CSS.
    fn compile_style(&self, job: &StyleJob) -> Result<(), ToolError>;

    /// Post-process (prefix, pack media queries, minify) a plain stylesheet.
    fn postprocess_css(&self, job: &CssJob) -> Result<(), ToolError>;

    /// Losslessly shrink images.
    fn optimize_images(&self, job: &ImageJob) -> Result<(), ToolError>;

    fn pack_svg_sprite(&self, job: &SvgSpriteJob) -> Result<(), ToolError>;

    fn pack_png_sprite(&self, job: &PngSpriteJob) -> Result<(), ToolError>;

    /// Render a page with its `@@include` directives expanded.
    fn include_html(&self, page: &Path) -> Result<String, ToolError> {
        include::expand_file(page)
    }

    /// Start the dev server. `None` means there is no process to wait on.
    fn start_server(&self, job: &ServeJob) -> Result<Option<Child>, ToolError>;

    /// Publish the build directory.
    fn deploy(&self, build_dir: &Path) -> Result<(), ToolError>;
}
