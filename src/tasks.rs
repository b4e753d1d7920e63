//! Build tasks.
//!
//! One function per orchestrator task. Every task reads a shared
//! [`TaskContext`] and reaches third-party programs only through a
//! [`Toolchain`], so the whole set runs against a recording mock in tests.
//!
//! | Task | Reads | Writes |
//! |---|---|---|
//! | `clean` | | empties `{buildPath}` (keeps `readme.md`) |
//! | `style` | resolved styles | `{srcPath}scss/style.scss`, `{buildPath}/css/style.min.css` |
//! | `style:single` | `singleCompiled` | `{buildPath}/css/{stem}.css` |
//! | `copy:css` | `copiedCss` | `{buildPath}/css/` |
//! | `copy:img` | resolved image globs | `{buildPath}/img/` |
//! | `copy:js` | `copiedJs` | `{buildPath}/js/` |
//! | `copy:fonts` | `{srcPath}fonts/` | `{buildPath}/fonts/` |
//! | `sprite:svg` | `{blocks}/sprite-svg/svg/*.svg` | `{blocks}/sprite-svg/img/sprite-svg.svg` |
//! | `sprite:png` | `{blocks}/sprite-png/png/*.png` | `{blocks}/sprite-png/img/sprite-{hash}.png` + `sprite-png.scss` |
//! | `html` | `{srcPath}*.html` | `{buildPath}/*.html` |
//! | `js` | resolved scripts | `{buildPath}/js/script.min.js` |
//! | `img:opt` | `{folder}/*.{ext}` | same files, optimized |
//! | `deploy` | `{buildPath}` | |
//!
//! A task that has nothing to do returns [`TaskStatus::Skipped`] with the
//! reason instead of failing.

use crate::config::{ConfigError, Mode, PipelineConfig};
use crate::glob::{self, GlobError, GlobMatch, Pattern};
use crate::manifest::ProjectManifest;
use crate::resolve::{self, ResolvedFileLists};
use crate::toolchain::{
    CssJob, ImageJob, PngSpriteJob, StyleJob, SvgSpriteJob, ToolError, Toolchain,
};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;
use thiserror::Error;

/// Block whose `svg/` folder feeds the SVG sprite.
pub const SVG_SPRITE_BLOCK: &str = "sprite-svg";
/// Block whose `png/` folder feeds the PNG sprite.
pub const PNG_SPRITE_BLOCK: &str = "sprite-png";
/// Kept by `clean` at the top of the build directory.
pub const CLEAN_KEEP: &str = "readme.md";
/// Fonts picked up from `{srcPath}fonts/`.
pub const FONT_GLOB: &str = "fonts/*.{ttf,woff,woff2,eot,svg}";
/// Concatenated script bundle under `{buildPath}/js/`.
pub const SCRIPT_BUNDLE: &str = "script.min.js";

static DEV_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*<!--DEV(?s:.+?)-->").expect("DEV comment regex is valid"));

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Glob(#[from] GlobError),
}

/// How a task finished when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Work was done; the string summarizes it.
    Done(String),
    /// Nothing to do; the string says why.
    Skipped(String),
}

pub type TaskResult = Result<TaskStatus, TaskError>;

/// Everything a task needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Directory containing the manifest. Manifest paths are relative to it.
    pub project_root: PathBuf,
    pub manifest: ProjectManifest,
    pub config: PipelineConfig,
    pub mode: Mode,
    pub lists: ResolvedFileLists,
    /// Target of `img:opt`.
    pub folder: Option<PathBuf>,
}

impl TaskContext {
    /// Resolve file lists using the configured image extensions.
    pub fn new(
        project_root: impl Into<PathBuf>,
        manifest: ProjectManifest,
        config: PipelineConfig,
        mode: Mode,
    ) -> Result<Self, ConfigError> {
        let image_glob = format!("*.{}", config.images.extension_group());
        let lists = resolve::resolve_with_image_glob(&manifest, &image_glob)?;
        Ok(Self {
            project_root: project_root.into(),
            manifest,
            config,
            mode,
            lists,
            folder: None,
        })
    }

    pub fn with_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.folder = folder;
        self
    }

    pub fn build_dir(&self) -> PathBuf {
        self.project_root.join(&self.manifest.dirs.build_path)
    }

    /// `{srcPath}{relative}` below the project root.
    pub fn src_path(&self, relative: &str) -> PathBuf {
        self.project_root
            .join(format!("{}{relative}", self.manifest.dirs.src_path))
    }

    /// Manifest-relative block directory, e.g. `src/blocks/sprite-svg/`.
    pub fn block_dir(&self, block: &str) -> String {
        self.manifest.dirs.block_dir(block)
    }

    pub fn aggregator_path(&self) -> PathBuf {
        self.src_path(&self.config.style.aggregator)
    }

    fn style_job(&self, input: PathBuf, output: PathBuf) -> StyleJob {
        StyleJob {
            input,
            output,
            load_paths: vec![self.project_root.clone()],
            source_map: self.mode.is_dev(),
            minify: !self.mode.is_dev(),
        }
    }
}

// =============================================================================
// clean
// =============================================================================

/// Delete everything below the build directory except a top-level `readme.md`.
pub fn clean(ctx: &TaskContext) -> TaskResult {
    let build = ctx.build_dir();
    if !build.is_dir() {
        return Ok(TaskStatus::Skipped(format!(
            "{} does not exist",
            ctx.manifest.dirs.build_path
        )));
    }
    let mut removed = 0;
    for entry in fs::read_dir(&build)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else if entry.file_name() == CLEAN_KEEP {
            continue;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(TaskStatus::Done(format!("removed {removed} entries")))
}

// =============================================================================
// Styles
// =============================================================================

/// Regenerate the style aggregator and compile it.
///
/// The aggregator always ends up holding exactly the rendered import list,
/// but the file is only written when that differs from what is on disk. A
/// rewrite with identical content would bump its mtime and make `serve` run
/// `style` again on its own output.
pub fn style(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let aggregator = ctx.aggregator_path();
    for path in &ctx.lists.styles {
        if !ctx.project_root.join(path).is_file() {
            log::warn!("style source {path} does not exist");
        }
    }
    write_if_changed(
        &aggregator,
        &resolve::render_style_aggregator(&ctx.lists.styles),
    )?;

    let css_dir = ctx.build_dir().join("css");
    fs::create_dir_all(&css_dir)?;
    let output = css_dir.join(&ctx.config.style.output_name);
    toolchain.compile_style(&ctx.style_job(aggregator, output))?;
    Ok(TaskStatus::Done(format!(
        "{} imports -> css/{}",
        ctx.lists.styles.len(),
        ctx.config.style.output_name
    )))
}

/// Compile each `singleCompiled` entry to its own stylesheet.
pub fn style_single(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    if ctx.manifest.single_compiled.is_empty() {
        return Ok(TaskStatus::Skipped("singleCompiled is empty".into()));
    }
    let sources = glob::expand_all(&ctx.project_root, &ctx.manifest.single_compiled);
    let css_dir = ctx.build_dir().join("css");
    fs::create_dir_all(&css_dir)?;
    for source in &sources {
        let stem = source.path.file_stem().unwrap_or_default().to_string_lossy();
        let output = css_dir.join(format!("{stem}.css"));
        toolchain.compile_style(&ctx.style_job(source.path.clone(), output))?;
    }
    Ok(TaskStatus::Done(format!("{} stylesheets", sources.len())))
}

/// Post-process `copiedCss` files into the build's `css/` folder.
pub fn copy_css(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    if ctx.manifest.copied_css.is_empty() {
        return Ok(TaskStatus::Skipped("copiedCss is empty".into()));
    }
    let sources = glob::expand_all(&ctx.project_root, &ctx.manifest.copied_css);
    let css_dir = ctx.build_dir().join("css");
    for source in &sources {
        let output = css_dir.join(&source.relative);
        ensure_parent(&output)?;
        toolchain.postprocess_css(&CssJob {
            input: source.path.clone(),
            output,
        })?;
    }
    Ok(TaskStatus::Done(format!("{} stylesheets", sources.len())))
}

// =============================================================================
// Copies
// =============================================================================

/// Counts from a copy pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    /// Destination was already at least as new as the source.
    pub up_to_date: usize,
}

impl fmt::Display for CopyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} copied, {} up to date", self.copied, self.up_to_date)
    }
}

/// Copy matches into `dest_dir`, mirroring their path below the glob base.
///
/// With `only_newer`, a file is copied only when the destination is missing
/// or older than the source.
pub fn copy_matches(
    matches: &[GlobMatch],
    dest_dir: &Path,
    only_newer: bool,
) -> Result<CopyStats, TaskError> {
    let mut stats = CopyStats::default();
    for m in matches {
        let dest = dest_dir.join(&m.relative);
        if only_newer && !is_newer(&m.path, &dest) {
            stats.up_to_date += 1;
            continue;
        }
        ensure_parent(&dest)?;
        fs::copy(&m.path, &dest)?;
        stats.copied += 1;
    }
    Ok(stats)
}

fn is_newer(source: &Path, dest: &Path) -> bool {
    match (modified(source), modified(dest)) {
        (Some(src), Some(dst)) => src > dst,
        _ => true,
    }
}

pub fn copy_img(ctx: &TaskContext) -> TaskResult {
    let matches = glob::expand_all(&ctx.project_root, &ctx.lists.images);
    let stats = copy_matches(&matches, &ctx.build_dir().join("img"), true)?;
    Ok(TaskStatus::Done(stats.to_string()))
}

pub fn copy_js(ctx: &TaskContext) -> TaskResult {
    if ctx.manifest.copied_js.is_empty() {
        return Ok(TaskStatus::Skipped("copiedJs is empty".into()));
    }
    let matches = glob::expand_all(&ctx.project_root, &ctx.manifest.copied_js);
    let stats = copy_matches(&matches, &ctx.build_dir().join("js"), false)?;
    Ok(TaskStatus::Done(stats.to_string()))
}

pub fn copy_fonts(ctx: &TaskContext) -> TaskResult {
    let pattern = format!("{}{FONT_GLOB}", ctx.manifest.dirs.src_path);
    let matches = Pattern::new(&pattern)?.expand(&ctx.project_root);
    let stats = copy_matches(&matches, &ctx.build_dir().join("fonts"), true)?;
    Ok(TaskStatus::Done(stats.to_string()))
}

// =============================================================================
// Sprites
// =============================================================================

/// Pack the `sprite-svg` block's icons into one symbol sprite.
pub fn sprite_svg(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let block_dir = match sprite_block_dir(ctx, SVG_SPRITE_BLOCK, "svg") {
        Ok(dir) => dir,
        Err(reason) => return Ok(TaskStatus::Skipped(reason)),
    };
    let inputs = paths(Pattern::new(&format!("{block_dir}svg/*.svg"))?.expand(&ctx.project_root));
    if inputs.is_empty() {
        return Ok(TaskStatus::Skipped(format!("no icons in {block_dir}svg/")));
    }
    let output = ctx
        .project_root
        .join(format!("{block_dir}img/{SVG_SPRITE_BLOCK}.svg"));
    ensure_parent(&output)?;
    let count = inputs.len();
    toolchain.pack_svg_sprite(&SvgSpriteJob { inputs, output })?;
    Ok(TaskStatus::Done(format!(
        "{count} icons -> {block_dir}img/{SVG_SPRITE_BLOCK}.svg"
    )))
}

/// Pack the `sprite-png` block's images into a content-hashed sheet plus an
/// SCSS coordinate map, then optimize the sheet.
pub fn sprite_png(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let block_dir = match sprite_block_dir(ctx, PNG_SPRITE_BLOCK, "png") {
        Ok(dir) => dir,
        Err(reason) => return Ok(TaskStatus::Skipped(reason)),
    };
    let inputs = paths(Pattern::new(&format!("{block_dir}png/*.png"))?.expand(&ctx.project_root));
    if inputs.is_empty() {
        return Ok(TaskStatus::Skipped(format!("no images in {block_dir}png/")));
    }

    for old in Pattern::new(&format!("{block_dir}img/*.png"))?.expand(&ctx.project_root) {
        fs::remove_file(&old.path)?;
    }

    let file_name = format!("sprite-{}.png", sprite_hash(&inputs)?);
    let img_dir = ctx.project_root.join(format!("{block_dir}img"));
    fs::create_dir_all(&img_dir)?;
    let image_output = img_dir.join(&file_name);
    let count = inputs.len();
    toolchain.pack_png_sprite(&PngSpriteJob {
        inputs,
        image_output: image_output.clone(),
        css_output: ctx
            .project_root
            .join(format!("{block_dir}{PNG_SPRITE_BLOCK}.scss")),
        image_url: format!("../img/{file_name}"),
        padding: ctx.config.images.png_sprite_padding,
    })?;
    toolchain.optimize_images(&ImageJob {
        inputs: vec![image_output],
        out_dir: img_dir,
    })?;
    Ok(TaskStatus::Done(format!("{count} images -> {file_name}")))
}

/// Block directory of a sprite block, or why the sprite is skipped.
fn sprite_block_dir(ctx: &TaskContext, block: &str, source: &str) -> Result<String, String> {
    if !ctx.manifest.blocks.contains(block) {
        return Err(format!("block {block} is not used in the project"));
    }
    let block_dir = ctx.block_dir(block);
    if !ctx.project_root.join(format!("{block_dir}{source}")).is_dir() {
        return Err(format!("no {block_dir}{source}/ folder"));
    }
    Ok(block_dir)
}

/// First 12 hex chars of SHA-256 over the inputs' contents, in order.
fn sprite_hash(inputs: &[PathBuf]) -> Result<String, TaskError> {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(fs::read(input)?);
    }
    let hex = format!("{:x}", hasher.finalize());
    Ok(hex[..12].to_string())
}

// =============================================================================
// HTML and scripts
// =============================================================================

/// Expand includes in every top-level page and strip `<!--DEV -->` comments.
pub fn html(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let pattern = format!("{}*.html", ctx.manifest.dirs.src_path);
    let pages = Pattern::new(&pattern)?.expand(&ctx.project_root);
    if pages.is_empty() {
        return Ok(TaskStatus::Skipped(format!("no pages match {pattern}")));
    }
    let build = ctx.build_dir();
    fs::create_dir_all(&build)?;
    for page in &pages {
        let rendered = toolchain.include_html(&page.path)?;
        fs::write(build.join(&page.relative), strip_dev_comments(&rendered))?;
    }
    Ok(TaskStatus::Done(format!("{} pages", pages.len())))
}

pub fn strip_dev_comments(html: &str) -> String {
    DEV_COMMENT_RE.replace_all(html, "").into_owned()
}

/// Concatenate the resolved scripts that exist into one bundle.
pub fn js(ctx: &TaskContext) -> TaskResult {
    if ctx.lists.scripts.is_empty() {
        return Ok(TaskStatus::Skipped("no scripts in the build".into()));
    }
    let sources = glob::expand_all(&ctx.project_root, &ctx.lists.scripts);
    log::debug!(
        "{} of {} script entries exist",
        sources.len(),
        ctx.lists.scripts.len()
    );
    let parts = sources
        .iter()
        .map(|s| fs::read_to_string(&s.path))
        .collect::<Result<Vec<_>, _>>()?;

    let js_dir = ctx.build_dir().join("js");
    fs::create_dir_all(&js_dir)?;
    fs::write(js_dir.join(SCRIPT_BUNDLE), parts.join("\n"))?;
    Ok(TaskStatus::Done(format!(
        "{} files -> js/{SCRIPT_BUNDLE}",
        sources.len()
    )))
}

// =============================================================================
// Images and publishing
// =============================================================================

/// Optimize the images of `ctx.folder` in place.
pub fn img_opt(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let Some(folder) = &ctx.folder else {
        return Ok(TaskStatus::Skipped(
            "no folder given. Example: folder=src/blocks/block-name/img bemkit img-opt".into(),
        ));
    };
    let pattern = format!(
        "{}/*.{}",
        folder.to_string_lossy().trim_end_matches(['/', '\\']),
        ctx.config.images.extension_group()
    );
    let inputs = paths(Pattern::new(&pattern)?.expand(&ctx.project_root));
    if inputs.is_empty() {
        return Ok(TaskStatus::Skipped(format!("no images match {pattern}")));
    }
    let count = inputs.len();
    toolchain.optimize_images(&ImageJob {
        inputs,
        out_dir: ctx.project_root.join(folder),
    })?;
    Ok(TaskStatus::Done(format!("{count} images")))
}

pub fn deploy(ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskResult {
    let build = ctx.build_dir();
    if !build.is_dir() {
        return Ok(TaskStatus::Skipped(format!(
            "{} does not exist, run build first",
            ctx.manifest.dirs.build_path
        )));
    }
    toolchain.deploy(&build)?;
    Ok(TaskStatus::Done(format!(
        "published {}",
        ctx.manifest.dirs.build_path
    )))
}

// =============================================================================
// Helpers
// =============================================================================

fn paths(matches: Vec<GlobMatch>) -> Vec<PathBuf> {
    matches.into_iter().map(|m| m.path).collect()
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Write unless the file already holds `content`, leaving its mtime alone
/// so the watcher does not see a change.
fn write_if_changed(path: &Path, content: &str) -> std::io::Result<()> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(());
    }
    ensure_parent(path)?;
    fs::write(path, content)
}

/// Modification time, when the filesystem reports one.
pub fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
