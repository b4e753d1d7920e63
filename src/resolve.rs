//! File-list resolution.
//!
//! Expands a [`ProjectManifest`] into the ordered source lists the build
//! tasks feed to their compilers. This is a pure computation: no file is
//! opened or checked for existence here. Consumers decide what to do with
//! paths that are missing on disk.
//!
//! ## Ordering
//!
//! For styles and scripts:
//!
//! ```text
//! addCssBefore…
//! {blocks}/page/page.scss
//! {blocks}/header/header.scss
//! {blocks}/header/header__logo.scss     ← elements follow their block
//! {blocks}/header/header__nav.scss
//! addCssAfter…
//! ```
//!
//! Images get one glob per block (`{blocks}/{block}/img/*.{ext,…}`) with
//! `addImages` prepended. Elements never contribute images.
//!
//! Nothing is de-duplicated. A suffix listed twice yields two entries; the
//! style compiler tolerates repeated imports.

use crate::config::ConfigError;
use crate::manifest::{Dirs, ProjectManifest};
use serde::Serialize;

/// Extensions matched by a block's image glob unless configured otherwise.
pub const DEFAULT_IMAGE_GLOB: &str = "*.{jpg,jpeg,gif,png,svg}";

/// Header written at the top of the generated style aggregator.
pub const AGGREGATOR_HEADER: &str = "/*!*\n * WARNING! This file is generated automatically.\n * Do not edit it by hand: every change here is lost on the next build.\n * Register blocks in projectConfig.json instead.\n */\n\n";

/// Source lists for one build, in compiler order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolvedFileLists {
    pub styles: Vec<String>,
    pub scripts: Vec<String>,
    pub images: Vec<String>,
}

/// Which per-block file a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Style,
    Script,
}

impl SourceKind {
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Style => "scss",
            SourceKind::Script => "js",
        }
    }
}

/// `{srcPath}{blocksDirName}/{block}/{block}{suffix}.{ext}`
pub fn block_file(dirs: &Dirs, block: &str, suffix: &str, ext: &str) -> String {
    format!("{}{block}{suffix}.{ext}", dirs.block_dir(block))
}

/// `{srcPath}{blocksDirName}/{block}/img/{pattern}`
pub fn block_image_glob(dirs: &Dirs, block: &str, pattern: &str) -> String {
    format!("{}img/{pattern}", dirs.block_dir(block))
}

/// Resolve with the default image extensions.
pub fn resolve(manifest: &ProjectManifest) -> Result<ResolvedFileLists, ConfigError> {
    resolve_with_image_glob(manifest, DEFAULT_IMAGE_GLOB)
}

/// Resolve, using `image_glob` as the file pattern inside every block's
/// `img/` folder.
pub fn resolve_with_image_glob(
    manifest: &ProjectManifest,
    image_glob: &str,
) -> Result<ResolvedFileLists, ConfigError> {
    manifest.dirs.validate()?;

    let styles = with_extras(
        &manifest.add_css_before,
        block_sources(manifest, SourceKind::Style),
        &manifest.add_css_after,
    );
    let scripts = with_extras(
        &manifest.add_js_before,
        block_sources(manifest, SourceKind::Script),
        &manifest.add_js_after,
    );
    let block_images = manifest
        .blocks
        .names()
        .map(|block| block_image_glob(&manifest.dirs, block, image_glob));
    let images = manifest.add_images.iter().cloned().chain(block_images).collect();

    let lists = ResolvedFileLists {
        styles,
        scripts,
        images,
    };
    log::debug!(
        "resolved {} styles, {} scripts, {} image globs",
        lists.styles.len(),
        lists.scripts.len(),
        lists.images.len()
    );
    Ok(lists)
}

/// Base file then element files for every block, in registration order.
fn block_sources(manifest: &ProjectManifest, kind: SourceKind) -> Vec<String> {
    let ext = kind.extension();
    let mut paths = Vec::new();
    for block in manifest.blocks.iter() {
        paths.push(block_file(&manifest.dirs, &block.name, "", ext));
        for element in &block.elements {
            paths.push(block_file(&manifest.dirs, &block.name, element, ext));
        }
    }
    paths
}

fn with_extras(before: &[String], middle: Vec<String>, after: &[String]) -> Vec<String> {
    before
        .iter()
        .cloned()
        .chain(middle)
        .chain(after.iter().cloned())
        .collect()
}

/// Render the style aggregator: header, then one `@import` per style path.
pub fn render_style_aggregator(styles: &[String]) -> String {
    let mut out = String::from(AGGREGATOR_HEADER);
    for path in styles {
        out.push_str(&format!("@import '{path}';\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::BlockRegistry;
    use crate::test_helpers::*;

    fn manifest_with_blocks(blocks: &[(&str, &[&str])]) -> ProjectManifest {
        let mut manifest = sample_manifest();
        manifest.blocks = blocks
            .iter()
            .map(|(name, els)| {
                let elements: Vec<String> = els.iter().map(|e| e.to_string()).collect();
                (*name, elements)
            })
            .collect::<BlockRegistry>();
        manifest.add_css_before.clear();
        manifest.add_css_after.clear();
        manifest.add_js_before.clear();
        manifest.add_js_after.clear();
        manifest.add_images.clear();
        manifest
    }

    #[test]
    fn header_example_resolves_exactly() {
        let json = r#"{
            "dirs": {"srcPath": "src/", "blocksDirName": "blocks", "buildPath": "build"},
            "blocks": {"header": ["__logo"]},
            "addCssBefore": ["vars.scss"],
            "addCssAfter": [],
            "addJsBefore": [],
            "addJsAfter": [],
            "addImages": []
        }"#;
        let manifest: ProjectManifest = serde_json::from_str(json).unwrap();

        let lists = resolve(&manifest).unwrap();

        assert_eq!(
            lists.styles,
            vec![
                "vars.scss",
                "src/blocks/header/header.scss",
                "src/blocks/header/header__logo.scss",
            ]
        );
        assert_eq!(
            lists.scripts,
            vec![
                "src/blocks/header/header.js",
                "src/blocks/header/header__logo.js",
            ]
        );
        assert_eq!(
            lists.images,
            vec!["src/blocks/header/img/*.{jpg,jpeg,gif,png,svg}"]
        );
    }

    #[test]
    fn blocks_and_elements_keep_registration_order() {
        let mut manifest = manifest_with_blocks(&[
            ("a", &["__one", "__two"]),
            ("b", &["__x"]),
            ("c", &[]),
        ]);
        manifest.add_css_before = vec!["first.scss".into()];
        manifest.add_css_after = vec!["last.scss".into()];

        let styles = resolve(&manifest).unwrap().styles;

        assert_eq!(
            styles,
            vec![
                "first.scss",
                "src/blocks/a/a.scss",
                "src/blocks/a/a__one.scss",
                "src/blocks/a/a__two.scss",
                "src/blocks/b/b.scss",
                "src/blocks/b/b__x.scss",
                "src/blocks/c/c.scss",
                "last.scss",
            ]
        );
    }

    #[test]
    fn repeated_suffix_is_not_deduplicated() {
        let manifest = manifest_with_blocks(&[("x", &["__el", "__el"])]);
        let styles = resolve(&manifest).unwrap().styles;
        assert_eq!(
            styles,
            vec![
                "src/blocks/x/x.scss",
                "src/blocks/x/x__el.scss",
                "src/blocks/x/x__el.scss",
            ]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let manifest = sample_manifest();
        assert_eq!(resolve(&manifest).unwrap(), resolve(&manifest).unwrap());
    }

    #[test]
    fn script_extras_wrap_block_scripts() {
        let lists = resolve(&sample_manifest()).unwrap();
        assert_eq!(lists.scripts.first().unwrap(), "src/js/polyfills.js");
        assert_eq!(lists.scripts.last().unwrap(), "src/js/script.js");
        assert_eq!(lists.scripts[1], "src/blocks/page/page.js");
    }

    #[test]
    fn add_images_are_prepended_and_elements_ignored() {
        let lists = resolve(&sample_manifest()).unwrap();
        assert_eq!(
            lists.images,
            vec![
                "src/img/*.{jpg,jpeg,gif,png,svg}",
                "src/blocks/page/img/*.{jpg,jpeg,gif,png,svg}",
                "src/blocks/header/img/*.{jpg,jpeg,gif,png,svg}",
                "src/blocks/footer/img/*.{jpg,jpeg,gif,png,svg}",
            ]
        );
    }

    #[test]
    fn empty_element_list_contributes_only_base_file() {
        let manifest = manifest_with_blocks(&[("solo", &[])]);
        let lists = resolve(&manifest).unwrap();
        assert_eq!(lists.styles, vec!["src/blocks/solo/solo.scss"]);
        assert_eq!(lists.scripts, vec!["src/blocks/solo/solo.js"]);
    }

    #[test]
    fn custom_image_glob_is_used() {
        let manifest = manifest_with_blocks(&[("logo", &[])]);
        let lists = resolve_with_image_glob(&manifest, "*.{png,webp}").unwrap();
        assert_eq!(lists.images, vec!["src/blocks/logo/img/*.{png,webp}"]);
    }

    #[test]
    fn empty_dirs_field_fails_resolution() {
        let mut manifest = sample_manifest();
        manifest.dirs.blocks_dir_name.clear();
        assert!(matches!(
            resolve(&manifest),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn aggregator_lists_imports_in_order() {
        let rendered =
            render_style_aggregator(&["vars.scss".into(), "src/blocks/a/a.scss".into()]);
        assert!(rendered.starts_with(AGGREGATOR_HEADER));
        assert!(rendered.ends_with("@import 'vars.scss';\n@import 'src/blocks/a/a.scss';\n"));
    }
}
