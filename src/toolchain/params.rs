//! Job descriptions for toolchain operations.
//!
//! These structs describe *what* a collaborator should produce, never *how*.
//! Tasks fill them in from the manifest and settings; backends turn them into
//! process invocations (or, in tests, into recorded operations).

use std::path::PathBuf;

/// Compile one style entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directories `@import` paths are resolved against.
    pub load_paths: Vec<PathBuf>,
    pub source_map: bool,
    pub minify: bool,
}

/// Run an already-written stylesheet through the post-processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Optimize images into `out_dir` (which may be their own directory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageJob {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
}

/// Pack SVG files into one `<symbol>` sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgSpriteJob {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Pack PNG files into one sheet plus an SCSS file of coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngSpriteJob {
    pub inputs: Vec<PathBuf>,
    pub image_output: PathBuf,
    pub css_output: PathBuf,
    /// URL of the sheet as written into the SCSS, e.g. `../img/sprite-ab12.png`.
    pub image_url: String,
    pub padding: u32,
}

/// Serve the build directory with live reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeJob {
    pub root: PathBuf,
    pub port: u16,
    pub start_path: String,
}
