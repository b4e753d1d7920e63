//! # bemkit
//!
//! A manifest-driven asset pipeline for BEM-style static sites. One JSON file
//! lists the project's blocks; everything else (which stylesheets get
//! imported, which scripts get bundled, which images get copied) is derived
//! from it.
//!
//! # Architecture
//!
//! ```text
//! projectConfig.json ──► resolve ──► ResolvedFileLists ──► tasks ──► build/
//!         ▲                                                  │
//!         └──────────── scaffold (registers new blocks)      └──► Toolchain
//! ```
//!
//! - **Manifest** (`projectConfig.json`): directories plus an ordered block
//!   registry. Block order is import order.
//! - **Resolver**: a pure function from manifest to ordered style, script and
//!   image lists.
//! - **Scaffolder**: creates a block's folder and stub files, never
//!   overwriting, and returns the manifest with the block registered.
//! - **Tasks**: each build step is a function over a [`tasks::TaskContext`].
//!   Third-party compilers sit behind the [`toolchain::Toolchain`] trait.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | `projectConfig.json` model, insertion-ordered block registry, load/save |
//! | [`config`] | `bemkit.toml` pipeline settings, build mode, shared `ConfigError` |
//! | [`resolve`] | Manifest → ordered file lists; style aggregator rendering |
//! | [`scaffold`] | Block folder and stub creation, manifest registration |
//! | [`glob`] | `*`, `?`, `**`, `{a,b}` patterns expanded over the project tree |
//! | [`toolchain`] | External collaborators: trait, process-spawning backend, `@@include` expander |
//! | [`tasks`] | One function per build task |
//! | [`pipeline`] | Task names, parallel build phases, `serve` loop |
//! | [`watch`] | Polling watcher mapping changed files to tasks |
//! | [`output`] | One-line console events for every stage |
//!
//! # Design Decisions
//!
//! ## Registration Is a Value
//!
//! [`scaffold::scaffold`] never writes the manifest. It returns the updated
//! manifest and the caller saves it once, so the in-memory registry and the
//! file on disk cannot drift apart within one invocation.
//!
//! ## Failures Stop at the Task Boundary
//!
//! A broken stylesheet must not kill a running dev server. Every task's
//! result is captured in a [`pipeline::TaskReport`]; sibling tasks and later
//! build phases run regardless, and the CLI decides the exit status from the
//! collected reports.

pub mod config;
pub mod glob;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod scaffold;
pub mod tasks;
pub mod toolchain;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
