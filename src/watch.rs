//! Polling file watcher for `serve`.
//!
//! Each [`WatchGroup`] ties a set of glob patterns to the task that rebuilds
//! them. A [`Watcher`] keeps one snapshot (path → mtime and size) per group;
//! [`Watcher::poll`] re-expands the patterns and returns the tasks whose
//! snapshot differs. Added and removed files count as changes.

use crate::glob;
use crate::pipeline::Task;
use crate::tasks::{self, FONT_GLOB, PNG_SPRITE_BLOCK, SVG_SPRITE_BLOCK, TaskContext};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchGroup {
    pub task: Task,
    pub patterns: Vec<String>,
}

/// File state at one poll.
pub type Snapshot = BTreeMap<PathBuf, (Option<SystemTime>, u64)>;

/// Watch groups for a project. Groups with no patterns are left out.
pub fn watch_groups(ctx: &TaskContext) -> Vec<WatchGroup> {
    let dirs = &ctx.manifest.dirs;
    let src = &dirs.src_path;
    let blocks = dirs.blocks_root();
    let manifest = &ctx.manifest;

    let mut styles = vec![
        format!("{src}{}", ctx.config.style.aggregator),
        format!("{blocks}/**/*.scss"),
    ];
    styles.extend(manifest.add_css_before.iter().cloned());
    styles.extend(manifest.add_css_after.iter().cloned());

    let mut groups = vec![
        WatchGroup {
            task: Task::Style,
            patterns: styles,
        },
        WatchGroup {
            task: Task::StyleSingle,
            patterns: manifest.single_compiled.clone(),
        },
        WatchGroup {
            task: Task::CopyCss,
            patterns: manifest.copied_css.clone(),
        },
        WatchGroup {
            task: Task::CopyImg,
            patterns: ctx.lists.images.clone(),
        },
        WatchGroup {
            task: Task::CopyJs,
            patterns: manifest.copied_js.clone(),
        },
        WatchGroup {
            task: Task::CopyFonts,
            patterns: vec![format!("{src}{FONT_GLOB}")],
        },
        WatchGroup {
            task: Task::Html,
            patterns: vec![
                format!("{src}*.html"),
                format!("{src}_include/*.html"),
                format!("{blocks}/**/*.html"),
            ],
        },
        WatchGroup {
            task: Task::Js,
            patterns: ctx.lists.scripts.clone(),
        },
    ];
    if manifest.blocks.contains(SVG_SPRITE_BLOCK) {
        groups.push(WatchGroup {
            task: Task::SpriteSvg,
            patterns: vec![format!("{}svg/*.svg", ctx.block_dir(SVG_SPRITE_BLOCK))],
        });
    }
    if manifest.blocks.contains(PNG_SPRITE_BLOCK) {
        groups.push(WatchGroup {
            task: Task::SpritePng,
            patterns: vec![format!("{}png/*.png", ctx.block_dir(PNG_SPRITE_BLOCK))],
        });
    }
    groups.retain(|g| !g.patterns.is_empty());
    groups
}

/// Current state of every file matched by `patterns`.
pub fn snapshot(root: &Path, patterns: &[String]) -> Snapshot {
    glob::expand_all(root, patterns)
        .into_iter()
        .map(|m| {
            let len = fs::metadata(&m.path).map(|meta| meta.len()).unwrap_or(0);
            let state = (tasks::modified(&m.path), len);
            (m.path, state)
        })
        .collect()
}

pub struct Watcher {
    root: PathBuf,
    groups: Vec<(WatchGroup, Snapshot)>,
}

impl Watcher {
    /// Take the initial snapshot of every group.
    pub fn new(root: &Path, groups: Vec<WatchGroup>) -> Self {
        let groups = groups
            .into_iter()
            .map(|g| {
                let snap = snapshot(root, &g.patterns);
                (g, snap)
            })
            .collect();
        Self {
            root: root.to_path_buf(),
            groups,
        }
    }

    /// Tasks whose files changed since the last poll, in group order, each
    /// at most once.
    pub fn poll(&mut self) -> Vec<Task> {
        let mut changed = Vec::new();
        for (group, previous) in &mut self.groups {
            let current = snapshot(&self.root, &group.patterns);
            if current != *previous {
                log::debug!("change detected for {}", group.task);
                *previous = current;
                if !changed.contains(&group.task) {
                    changed.push(group.task);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Mode, PipelineConfig};
    use crate::test_helpers::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn context(tmp: &TempDir) -> TaskContext {
        TaskContext::new(
            tmp.path(),
            sample_manifest(),
            PipelineConfig::default(),
            Mode::Development,
        )
        .unwrap()
    }

    fn group_tasks(groups: &[WatchGroup]) -> Vec<Task> {
        groups.iter().map(|g| g.task).collect()
    }

    #[test]
    fn empty_manifest_lists_drop_their_groups() {
        let tmp = TempDir::new().unwrap();
        let groups = watch_groups(&context(&tmp));
        assert_eq!(
            group_tasks(&groups),
            vec![Task::Style, Task::CopyImg, Task::CopyFonts, Task::Html, Task::Js]
        );
    }

    #[test]
    fn style_group_covers_aggregator_blocks_and_extras() {
        let tmp = TempDir::new().unwrap();
        let groups = watch_groups(&context(&tmp));
        assert_eq!(
            groups[0].patterns,
            vec![
                "src/scss/style.scss",
                "src/blocks/**/*.scss",
                "src/scss/variables.scss",
                "src/scss/print.scss",
            ]
        );
    }

    #[test]
    fn sprite_groups_follow_registered_blocks() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(&tmp);
        ctx.manifest.blocks.insert("sprite-png", Vec::new());

        let groups = watch_groups(&ctx);
        let last = groups.last().unwrap();
        assert_eq!(last.task, Task::SpritePng);
        assert_eq!(last.patterns, vec!["src/blocks/sprite-png/png/*.png"]);
        assert!(!group_tasks(&groups).contains(&Task::SpriteSvg));
    }

    #[test]
    fn poll_reports_modified_added_and_removed_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/blocks/page/page.scss", ".page {}");
        let mut watcher = Watcher::new(tmp.path(), watch_groups(&context(&tmp)));
        assert!(watcher.poll().is_empty());

        std::thread::sleep(Duration::from_millis(20));
        touch(tmp.path(), "src/blocks/page/page.scss", ".page { color: red }");
        assert_eq!(watcher.poll(), vec![Task::Style]);
        assert!(watcher.poll().is_empty());

        touch(tmp.path(), "src/about.html", "");
        assert_eq!(watcher.poll(), vec![Task::Html]);

        fs::remove_file(tmp.path().join("src/about.html")).unwrap();
        assert_eq!(watcher.poll(), vec![Task::Html]);
    }

    #[test]
    fn one_change_can_trigger_several_groups() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), watch_groups(&context(&tmp)));

        touch(tmp.path(), "src/blocks/header/img/logo.svg", "<svg/>");
        touch(tmp.path(), "src/blocks/header/header.js", "");

        assert_eq!(watcher.poll(), vec![Task::CopyImg, Task::Js]);
    }
}
