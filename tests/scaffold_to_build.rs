//! End-to-end test of the library: scaffold blocks into a fresh project,
//! resolve the manifest, then run the full build against an in-memory
//! toolchain. A second part drives the compiled binary for the commands that
//! need no external programs.
//!
//! Run with: cargo test --test scaffold_to_build

use bemkit::config::{Mode, PipelineConfig};
use bemkit::manifest::{self, Dirs, ManifestFile, ManifestStore, ProjectManifest};
use bemkit::pipeline::{self, Task, TaskReport};
use bemkit::resolve;
use bemkit::scaffold::{self, EntryStatus, ScaffoldOutcome};
use bemkit::tasks::{TaskContext, TaskStatus};
use bemkit::toolchain::{
    CssJob, ImageJob, PngSpriteJob, ServeJob, StyleJob, SvgSpriteJob, ToolError, Toolchain,
};
use std::fs;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::Mutex;
use tempfile::TempDir;

/// Toolchain that writes the smallest plausible output for each job.
#[derive(Default)]
struct StubToolchain {
    calls: Mutex<Vec<String>>,
}

impl StubToolchain {
    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

impl Toolchain for StubToolchain {
    fn compile_style(&self, job: &StyleJob) -> Result<(), ToolError> {
        self.log("compile_style");
        let source = fs::read_to_string(&job.input)?;
        fs::write(&job.output, format!("/* {} lines */", source.lines().count()))?;
        Ok(())
    }

    fn postprocess_css(&self, job: &CssJob) -> Result<(), ToolError> {
        self.log("postprocess_css");
        fs::copy(&job.input, &job.output)?;
        Ok(())
    }

    fn optimize_images(&self, _job: &ImageJob) -> Result<(), ToolError> {
        self.log("optimize_images");
        Ok(())
    }

    fn pack_svg_sprite(&self, job: &SvgSpriteJob) -> Result<(), ToolError> {
        self.log("pack_svg_sprite");
        fs::write(&job.output, "<svg></svg>")?;
        Ok(())
    }

    fn pack_png_sprite(&self, _job: &PngSpriteJob) -> Result<(), ToolError> {
        self.log("pack_png_sprite");
        Ok(())
    }

    fn start_server(&self, _job: &ServeJob) -> Result<Option<Child>, ToolError> {
        self.log("start_server");
        Ok(None)
    }

    fn deploy(&self, _build_dir: &Path) -> Result<(), ToolError> {
        self.log("deploy");
        Ok(())
    }
}

fn new_project() -> (TempDir, ManifestFile) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(manifest::MANIFEST_FILENAME);
    let manifest = ProjectManifest::new(Dirs {
        src_path: "src/".into(),
        build_path: "build".into(),
        blocks_dir_name: "blocks".into(),
    });
    manifest::save(&path, &manifest).unwrap();
    (tmp, ManifestFile::new(path))
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn scaffolded_blocks_flow_through_resolve_and_build() {
    let (tmp, store) = new_project();
    let root = tmp.path();

    for (block, extras) in [("page", vec![]), ("card", vec!["js".to_string()])] {
        let outcome = scaffold::scaffold_and_register(&store, root, Some(block), &extras).unwrap();
        let ScaffoldOutcome::Completed { report, .. } = outcome else {
            panic!("scaffold of {block} was cancelled");
        };
        assert!(report.registered);
        assert!(report.entries.iter().all(|e| e.status == EntryStatus::Created));
    }

    let manifest = store.load().unwrap();
    let names: Vec<&str> = manifest.blocks.names().collect();
    assert_eq!(names, vec!["page", "card"]);

    let lists = resolve::resolve(&manifest).unwrap();
    assert_eq!(
        lists.styles,
        vec!["src/blocks/page/page.scss", "src/blocks/card/card.scss"]
    );

    write(root, "src/index.html", "<body>\n  @@include('blocks/card/card.html')\n</body>\n");
    write(root, "src/blocks/card/img/photo.jpg", "jpg");

    let ctx = TaskContext::new(root, manifest, PipelineConfig::default(), Mode::Production).unwrap();
    let toolchain = StubToolchain::default();
    let reports = pipeline::build(&ctx, &toolchain, &|_: &TaskReport| {});

    let failed: Vec<Task> = reports.iter().filter(|r| r.failed()).map(|r| r.task).collect();
    assert!(failed.is_empty(), "failed tasks: {failed:?}");

    let aggregator = fs::read_to_string(root.join("src/scss/style.scss")).unwrap();
    assert!(aggregator.ends_with(
        "@import 'src/blocks/page/page.scss';\n@import 'src/blocks/card/card.scss';\n"
    ));
    assert!(root.join("build/css/style.min.css").is_file());
    assert_eq!(fs::read_to_string(root.join("build/img/photo.jpg")).unwrap(), "jpg");

    let index = fs::read_to_string(root.join("build/index.html")).unwrap();
    assert_eq!(index, "<body>\n\n  <div class=\"card\">content</div>\n</body>\n");

    let bundle = fs::read_to_string(root.join("build/js/script.min.js")).unwrap();
    assert!(bundle.contains("DOMContentLoaded"));

    assert_eq!(toolchain.calls(), vec!["compile_style"]);
}

#[test]
fn second_scaffold_changes_nothing() {
    let (tmp, store) = new_project();
    let extras = vec!["js".to_string()];
    scaffold::scaffold_and_register(&store, tmp.path(), Some("card"), &extras).unwrap();
    let manifest_before = fs::read_to_string(store.path()).unwrap();
    let stub = tmp.path().join("src/blocks/card/card.scss");
    fs::write(&stub, ".card { color: red }").unwrap();

    let outcome = scaffold::scaffold_and_register(&store, tmp.path(), Some("card"), &extras).unwrap();

    let ScaffoldOutcome::Completed { report, updated_manifest } = outcome else {
        panic!("expected a completed scaffold");
    };
    assert!(report.is_noop());
    assert!(updated_manifest.is_none());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), manifest_before);
    assert_eq!(fs::read_to_string(stub).unwrap(), ".card { color: red }");
}

#[test]
fn single_task_reports_skip_without_sources() {
    let (tmp, store) = new_project();
    let ctx = TaskContext::new(
        tmp.path(),
        store.load().unwrap(),
        PipelineConfig::default(),
        Mode::Development,
    )
    .unwrap();

    let report = pipeline::run_task(Task::SpriteSvg, &ctx, &StubToolchain::default());

    assert!(matches!(report.outcome, Ok(TaskStatus::Skipped(_))));
}

// =========================================================================
// Binary
// =========================================================================

fn bemkit(dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_bemkit"))
        .args(args)
        .current_dir(dir)
        .env_remove("NODE_ENV")
        .output()
        .unwrap()
}

#[test]
fn cli_scaffold_then_resolve_json() {
    let (tmp, _store) = new_project();

    let out = bemkit(tmp.path(), &["scaffold", "header", "js"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[bemkit] Created: src/blocks/header/header.js"));
    assert!(stdout.contains("[bemkit] Registered header in projectConfig.json"));

    let out = bemkit(tmp.path(), &["resolve", "--json"]);
    assert!(out.status.success());
    let lists: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(lists["styles"][0], "src/blocks/header/header.scss");
    assert_eq!(lists["scripts"][0], "src/blocks/header/header.js");
    assert_eq!(
        lists["images"][0],
        "src/blocks/header/img/*.{jpg,jpeg,gif,png,svg}"
    );
}

#[test]
fn cli_scaffold_without_block_is_cancelled_not_failed() {
    let (tmp, store) = new_project();
    let before = fs::read_to_string(store.path()).unwrap();

    let out = bemkit(tmp.path(), &["scaffold"]);

    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Cancelled"));
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    assert!(!tmp.path().join("src").exists());
}

#[test]
fn cli_rejects_unknown_task() {
    let (tmp, _store) = new_project();
    let out = bemkit(tmp.path(), &["run", "styles"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("style:single"));
}

#[test]
fn cli_gen_config_parses_as_settings() {
    let tmp = TempDir::new().unwrap();
    let out = bemkit(tmp.path(), &["gen-config"]);
    assert!(out.status.success());
    let parsed: PipelineConfig = toml::from_str(&String::from_utf8_lossy(&out.stdout)).unwrap();
    assert_eq!(parsed, PipelineConfig::default());
}
