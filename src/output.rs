//! CLI output formatting.
//!
//! Every user-facing event is one line. Scaffold events carry a `[bemkit]`
//! prefix; build tasks report under a `----------` banner.
//!
//! ## Scaffold
//!
//! ```text
//! [bemkit] Created directory: src/blocks/card/
//! [bemkit] Created: src/blocks/card/card.scss
//! [bemkit] Already exists: src/blocks/card/card.html
//! [bemkit] Created: src/blocks/card/img/
//! [bemkit] FAILED src/blocks/card/card.js: permission denied
//! [bemkit] Registered card in projectConfig.json
//! ```
//!
//! ## Tasks
//!
//! ```text
//! ---------- Compiling styles (style): 12 imports -> css/style.min.css
//! ---------- Building the SVG sprite (sprite:svg): CANCELLED, block sprite-svg is not used in the project
//! ---------- Bundling JS (js): FAILED, IO error: permission denied
//! ```
//!
//! # Architecture
//!
//! Each event has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::pipeline::TaskReport;
use crate::resolve::ResolvedFileLists;
use crate::scaffold::{EntryStatus, ScaffoldOutcome, ScaffoldReport};
use crate::tasks::TaskStatus;

const PREFIX: &str = "[bemkit]";
const BANNER: &str = "----------";

// ============================================================================
// Scaffold
// ============================================================================

pub fn format_scaffold_outcome(outcome: &ScaffoldOutcome, manifest_name: &str) -> Vec<String> {
    match outcome {
        ScaffoldOutcome::Cancelled => vec![format!(
            "{PREFIX} Cancelled: no block name given. Usage: bemkit scaffold <block> [ext...]"
        )],
        ScaffoldOutcome::Completed { report, .. } => format_scaffold_report(report, manifest_name),
    }
}

pub fn format_scaffold_report(report: &ScaffoldReport, manifest_name: &str) -> Vec<String> {
    let mut lines = vec![match &report.dir_status {
        EntryStatus::Created => format!("{PREFIX} Created directory: {}", report.dir),
        _ => format!("{PREFIX} Directory already exists: {}", report.dir),
    }];
    for entry in &report.entries {
        lines.push(match &entry.status {
            EntryStatus::Created => format!("{PREFIX} Created: {}", entry.path),
            EntryStatus::AlreadyExists => format!("{PREFIX} Already exists: {}", entry.path),
            EntryStatus::Failed(reason) => format!("{PREFIX} FAILED {}: {reason}", entry.path),
        });
    }
    if report.registered {
        lines.push(format!(
            "{PREFIX} Registered {} in {manifest_name}",
            report.block
        ));
    }
    if report.is_noop() {
        lines.push(format!("{PREFIX} Nothing to do for {}", report.block));
    }
    lines
}

pub fn print_scaffold_outcome(outcome: &ScaffoldOutcome, manifest_name: &str) {
    for line in format_scaffold_outcome(outcome, manifest_name) {
        println!("{}", line);
    }
}

// ============================================================================
// Tasks
// ============================================================================

pub fn format_task_report(report: &TaskReport) -> String {
    let task = report.task;
    let detail = match &report.outcome {
        Ok(TaskStatus::Done(summary)) => summary.clone(),
        Ok(TaskStatus::Skipped(reason)) => format!("CANCELLED, {reason}"),
        Err(e) => format!("FAILED, {e}"),
    };
    format!("{BANNER} {} ({}): {detail}", task.title(), task.name())
}

pub fn print_task_report(report: &TaskReport) {
    println!("{}", format_task_report(report));
}

/// Closing line of a build: counts of finished and failed tasks.
pub fn format_build_summary(reports: &[TaskReport]) -> String {
    let failed: Vec<&str> = reports
        .iter()
        .filter(|r| r.failed())
        .map(|r| r.task.name())
        .collect();
    if failed.is_empty() {
        format!("{BANNER} Build complete: {} tasks", reports.len())
    } else {
        format!(
            "{BANNER} Build finished with {} failed of {} tasks: {}",
            failed.len(),
            reports.len(),
            failed.join(", ")
        )
    }
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolved_lists(lists: &ResolvedFileLists) -> Vec<String> {
    let mut lines = Vec::new();
    for (title, paths) in [
        ("Styles", &lists.styles),
        ("Scripts", &lists.scripts),
        ("Images", &lists.images),
    ] {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{title} ({})", paths.len()));
        lines.extend(paths.iter().map(|p| format!("    {p}")));
    }
    lines
}

pub fn print_resolved_lists(lists: &ResolvedFileLists) {
    for line in format_resolved_lists(lists) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Task;
    use crate::scaffold::{FileKind, ScaffoldEntry};
    use crate::tasks::TaskError;

    fn report(dir_status: EntryStatus, statuses: &[EntryStatus], registered: bool) -> ScaffoldReport {
        let kinds = [FileKind::Style, FileKind::Markup, FileKind::ImageFolder];
        let paths = [
            "src/blocks/card/card.scss",
            "src/blocks/card/card.html",
            "src/blocks/card/img/",
        ];
        ScaffoldReport {
            block: "card".into(),
            dir: "src/blocks/card/".into(),
            dir_status,
            entries: statuses
                .iter()
                .zip(kinds.iter().zip(paths))
                .map(|(status, (kind, path))| ScaffoldEntry {
                    kind: kind.clone(),
                    path: path.into(),
                    status: status.clone(),
                })
                .collect(),
            registered,
        }
    }

    #[test]
    fn fresh_scaffold_lists_every_creation_and_registration() {
        let r = report(
            EntryStatus::Created,
            &[EntryStatus::Created, EntryStatus::Created, EntryStatus::Created],
            true,
        );
        let lines = format_scaffold_report(&r, "projectConfig.json");
        assert_eq!(
            lines,
            vec![
                "[bemkit] Created directory: src/blocks/card/",
                "[bemkit] Created: src/blocks/card/card.scss",
                "[bemkit] Created: src/blocks/card/card.html",
                "[bemkit] Created: src/blocks/card/img/",
                "[bemkit] Registered card in projectConfig.json",
            ]
        );
    }

    #[test]
    fn repeated_scaffold_reports_existing_and_nothing_to_do() {
        let r = report(
            EntryStatus::AlreadyExists,
            &[
                EntryStatus::AlreadyExists,
                EntryStatus::AlreadyExists,
                EntryStatus::AlreadyExists,
            ],
            false,
        );
        let lines = format_scaffold_report(&r, "projectConfig.json");
        assert_eq!(lines[0], "[bemkit] Directory already exists: src/blocks/card/");
        assert_eq!(lines[1], "[bemkit] Already exists: src/blocks/card/card.scss");
        assert_eq!(lines.last().unwrap(), "[bemkit] Nothing to do for card");
    }

    #[test]
    fn failed_entry_names_path_and_reason() {
        let r = report(
            EntryStatus::AlreadyExists,
            &[
                EntryStatus::Failed("permission denied".into()),
                EntryStatus::Created,
                EntryStatus::Created,
            ],
            false,
        );
        let lines = format_scaffold_report(&r, "projectConfig.json");
        assert_eq!(
            lines[1],
            "[bemkit] FAILED src/blocks/card/card.scss: permission denied"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn cancelled_scaffold_is_one_line() {
        let lines = format_scaffold_outcome(&ScaffoldOutcome::Cancelled, "projectConfig.json");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[bemkit] Cancelled"));
    }

    #[test]
    fn task_report_lines() {
        let done = TaskReport {
            task: Task::Style,
            outcome: Ok(TaskStatus::Done("3 imports -> css/style.min.css".into())),
        };
        assert_eq!(
            format_task_report(&done),
            "---------- Compiling styles (style): 3 imports -> css/style.min.css"
        );

        let skipped = TaskReport {
            task: Task::Js,
            outcome: Ok(TaskStatus::Skipped("no scripts in the build".into())),
        };
        assert_eq!(
            format_task_report(&skipped),
            "---------- Bundling JS (js): CANCELLED, no scripts in the build"
        );

        let failed = TaskReport {
            task: Task::CopyImg,
            outcome: Err(TaskError::Io(std::io::Error::other("disk full"))),
        };
        assert_eq!(
            format_task_report(&failed),
            "---------- Copying images (copy:img): FAILED, IO error: disk full"
        );
    }

    #[test]
    fn build_summary_names_failed_tasks() {
        let reports = vec![
            TaskReport {
                task: Task::Clean,
                outcome: Ok(TaskStatus::Done("removed 0 entries".into())),
            },
            TaskReport {
                task: Task::Style,
                outcome: Err(TaskError::Io(std::io::Error::other("x"))),
            },
        ];
        assert_eq!(
            format_build_summary(&reports),
            "---------- Build finished with 1 failed of 2 tasks: style"
        );
        assert_eq!(
            format_build_summary(&reports[..1]),
            "---------- Build complete: 1 tasks"
        );
    }

    #[test]
    fn resolved_lists_are_grouped() {
        let lists = ResolvedFileLists {
            styles: vec!["a.scss".into()],
            scripts: vec![],
            images: vec!["img/*.png".into()],
        };
        assert_eq!(
            format_resolved_lists(&lists),
            vec![
                "Styles (1)",
                "    a.scss",
                "",
                "Scripts (0)",
                "",
                "Images (1)",
                "    img/*.png",
            ]
        );
    }
}
