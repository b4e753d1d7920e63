//! Task orchestration: single tasks, the full build, and the dev server.
//!
//! # Build Sequence
//!
//! ```text
//! clean
//!   → sprite:svg ‖ sprite:png
//!   → style ‖ style:single ‖ js ‖ copy:css ‖ copy:img ‖ copy:js ‖ copy:fonts
//!   → html
//! ```
//!
//! Tasks inside a phase run in parallel on the rayon pool. A failed task is
//! captured in its [`TaskReport`] and never stops its siblings or the phases
//! after it; callers decide the exit status from the reports.
//!
//! # Serve
//!
//! `serve` runs the build, hands the build directory to the dev server, then
//! polls the [`watch`](crate::watch) groups and re-runs the task of every
//! group that changed.

use crate::tasks::{self, TaskContext, TaskResult, TaskStatus};
use crate::toolchain::{ServeJob, ToolError, Toolchain};
use crate::watch::{self, Watcher};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Every task addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Clean,
    Style,
    StyleSingle,
    CopyCss,
    CopyImg,
    CopyJs,
    CopyFonts,
    SpriteSvg,
    SpritePng,
    Html,
    Js,
    ImgOpt,
    Deploy,
}

impl Task {
    pub const ALL: [Task; 13] = [
        Task::Clean,
        Task::Style,
        Task::StyleSingle,
        Task::CopyCss,
        Task::CopyImg,
        Task::CopyJs,
        Task::CopyFonts,
        Task::SpriteSvg,
        Task::SpritePng,
        Task::Html,
        Task::Js,
        Task::ImgOpt,
        Task::Deploy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Task::Clean => "clean",
            Task::Style => "style",
            Task::StyleSingle => "style:single",
            Task::CopyCss => "copy:css",
            Task::CopyImg => "copy:img",
            Task::CopyJs => "copy:js",
            Task::CopyFonts => "copy:fonts",
            Task::SpriteSvg => "sprite:svg",
            Task::SpritePng => "sprite:png",
            Task::Html => "html",
            Task::Js => "js",
            Task::ImgOpt => "img:opt",
            Task::Deploy => "deploy",
        }
    }

    /// Banner text shown when the task reports.
    pub fn title(self) -> &'static str {
        match self {
            Task::Clean => "Cleaning the build folder",
            Task::Style => "Compiling styles",
            Task::StyleSingle => "Compiling standalone styles",
            Task::CopyCss => "Copying stylesheets",
            Task::CopyImg => "Copying images",
            Task::CopyJs => "Copying scripts",
            Task::CopyFonts => "Copying fonts",
            Task::SpriteSvg => "Building the SVG sprite",
            Task::SpritePng => "Building the PNG sprite",
            Task::Html => "Building HTML",
            Task::Js => "Bundling JS",
            Task::ImgOpt => "Optimizing images",
            Task::Deploy => "Publishing the build folder",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown task {0:?} (expected one of: {names})", names = task_names())]
pub struct UnknownTask(pub String);

fn task_names() -> String {
    Task::ALL.map(Task::name).join(", ")
}

impl FromStr for Task {
    type Err = UnknownTask;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| UnknownTask(s.to_string()))
    }
}

/// What one task run produced. Failures are values here, not errors.
#[derive(Debug)]
pub struct TaskReport {
    pub task: Task,
    pub outcome: TaskResult,
}

impl TaskReport {
    pub fn failed(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Build phases in order. Tasks within a phase are independent.
pub const BUILD_PHASES: [&[Task]; 4] = [
    &[Task::Clean],
    &[Task::SpriteSvg, Task::SpritePng],
    &[
        Task::Style,
        Task::StyleSingle,
        Task::Js,
        Task::CopyCss,
        Task::CopyImg,
        Task::CopyJs,
        Task::CopyFonts,
    ],
    &[Task::Html],
];

/// Run one task and capture its outcome.
pub fn run_task(task: Task, ctx: &TaskContext, toolchain: &dyn Toolchain) -> TaskReport {
    log::debug!("running task {task}");
    let outcome = match task {
        Task::Clean => tasks::clean(ctx),
        Task::Style => tasks::style(ctx, toolchain),
        Task::StyleSingle => tasks::style_single(ctx, toolchain),
        Task::CopyCss => tasks::copy_css(ctx, toolchain),
        Task::CopyImg => tasks::copy_img(ctx),
        Task::CopyJs => tasks::copy_js(ctx),
        Task::CopyFonts => tasks::copy_fonts(ctx),
        Task::SpriteSvg => tasks::sprite_svg(ctx, toolchain),
        Task::SpritePng => tasks::sprite_png(ctx, toolchain),
        Task::Html => tasks::html(ctx, toolchain),
        Task::Js => tasks::js(ctx),
        Task::ImgOpt => tasks::img_opt(ctx, toolchain),
        Task::Deploy => tasks::deploy(ctx, toolchain),
    };
    if let Ok(TaskStatus::Skipped(reason)) = &outcome {
        log::warn!("{task} skipped: {reason}");
    }
    TaskReport { task, outcome }
}

/// Run the full build. `on_report` sees each report as its task finishes,
/// possibly from a worker thread.
pub fn build(
    ctx: &TaskContext,
    toolchain: &dyn Toolchain,
    on_report: &(dyn Fn(&TaskReport) + Sync),
) -> Vec<TaskReport> {
    let mut reports = Vec::new();
    for phase in BUILD_PHASES {
        let phase_reports: Vec<TaskReport> = phase
            .par_iter()
            .map(|&task| {
                let report = run_task(task, ctx, toolchain);
                on_report(&report);
                report
            })
            .collect();
        reports.extend(phase_reports);
    }
    reports
}

/// Build, start the dev server, and rebuild on change until `keep_going`
/// returns false or the server exits.
pub fn serve(
    ctx: &TaskContext,
    toolchain: &dyn Toolchain,
    on_report: &(dyn Fn(&TaskReport) + Sync),
    mut keep_going: impl FnMut() -> bool,
) -> Result<Vec<TaskReport>, ToolError> {
    let mut reports = build(ctx, toolchain, on_report);

    let mut server = toolchain.start_server(&ServeJob {
        root: ctx.build_dir(),
        port: ctx.config.serve.port,
        start_path: ctx.config.serve.start_path.clone(),
    })?;

    let mut watcher = Watcher::new(&ctx.project_root, watch::watch_groups(ctx));
    let interval = Duration::from_millis(ctx.config.serve.poll_interval_ms);
    while keep_going() {
        thread::sleep(interval);
        if let Some(child) = server.as_mut() {
            if let Some(status) = child.try_wait()? {
                log::warn!("dev server exited ({status})");
                break;
            }
        }
        for task in watcher.poll() {
            let report = run_task(task, ctx, toolchain);
            on_report(&report);
            reports.push(report);
        }
    }
    Ok(reports)
}
