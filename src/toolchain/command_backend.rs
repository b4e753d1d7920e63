//! Toolchain backed by external programs.
//!
//! Each collaborator is a program name from `[tools]` in `bemkit.toml`. A
//! value with spaces is split into program + leading arguments, so
//! `sass = "npx sass"` works.
//!
//! ## Argument conventions
//!
//! | Operation | Invocation |
//! |---|---|
//! | Compile style | `sass [--load-path=DIR]… --source-map\|--no-source-map [--style=compressed] IN OUT` |
//! | Post-process | `postcss IN -o OUT --map\|--no-map` (skipped when `postcss = ""`) |
//! | Optimize images | `imagemin FILE… --out-dir=DIR` |
//! | SVG sprite | `svgstore --inline -o OUT FILE…` |
//! | PNG sprite | `spritesmith --padding N --img OUT --css SCSS --img-path URL FILE…` |
//! | Dev server | `browser-sync start --server DIR --port N --startPath P --files DIR --no-open` |
//! | Deploy | `gh-pages -d DIR` |
//!
//! Programs run with the project root as working directory and inherit the
//! environment, so `NODE_ENV` reaches PostCSS plugins unchanged.

use super::backend::{ToolError, Toolchain};
use super::params::{CssJob, ImageJob, PngSpriteJob, ServeJob, StyleJob, SvgSpriteJob};
use crate::config::ToolsConfig;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

pub struct CommandToolchain {
    tools: ToolsConfig,
    project_root: PathBuf,
}

impl CommandToolchain {
    pub fn new(tools: ToolsConfig, project_root: impl Into<PathBuf>) -> Self {
        Self {
            tools,
            project_root: project_root.into(),
        }
    }

    fn command(&self, tool: &str, args: Vec<OsString>) -> (String, Command) {
        let mut parts = tool.split_whitespace();
        let program = parts.next().unwrap_or_default().to_string();
        let mut command = Command::new(&program);
        command
            .args(parts)
            .args(&args)
            .current_dir(&self.project_root);
        log::debug!("running {tool} {}", display_args(&args));
        (program, command)
    }

    /// Run to completion; non-zero exit becomes [`ToolError::Failed`].
    fn run(&self, tool: &str, args: Vec<OsString>) -> Result<(), ToolError> {
        let (program, mut command) = self.command(tool, args);
        let output = command.output().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn postcss_enabled(&self) -> bool {
        !self.tools.postcss.trim().is_empty()
    }
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn arg(value: impl Into<OsString>) -> OsString {
    value.into()
}

fn flag_with_path(flag: &str, path: &Path) -> OsString {
    let mut out = OsString::from(flag);
    out.push(path.as_os_str());
    out
}

impl Toolchain for CommandToolchain {
    fn compile_style(&self, job: &StyleJob) -> Result<(), ToolError> {
        let mut args: Vec<OsString> = job
            .load_paths
            .iter()
            .map(|p| flag_with_path("--load-path=", p))
            .collect();
        args.push(arg(if job.source_map {
            "--source-map"
        } else {
            "--no-source-map"
        }));
        if job.minify {
            args.push(arg("--style=compressed"));
        }
        args.push(arg(&job.input));
        args.push(arg(&job.output));
        self.run(&self.tools.sass, args)?;

        if self.postcss_enabled() {
            let map = if job.source_map { "--map" } else { "--no-map" };
            self.run(
                &self.tools.postcss,
                vec![arg("--replace"), arg(map), arg(&job.output)],
            )?;
        }
        Ok(())
    }

    fn postprocess_css(&self, job: &CssJob) -> Result<(), ToolError> {
        if !self.postcss_enabled() {
            fs::copy(&job.input, &job.output)?;
            return Ok(());
        }
        self.run(
            &self.tools.postcss,
            vec![
                arg(&job.input),
                arg("-o"),
                arg(&job.output),
                arg("--no-map"),
            ],
        )
    }

    fn optimize_images(&self, job: &ImageJob) -> Result<(), ToolError> {
        if job.inputs.is_empty() {
            return Ok(());
        }
        let mut args: Vec<OsString> = job.inputs.iter().map(arg).collect();
        args.push(flag_with_path("--out-dir=", &job.out_dir));
        self.run(&self.tools.imagemin, args)
    }

    fn pack_svg_sprite(&self, job: &SvgSpriteJob) -> Result<(), ToolError> {
        let mut args = vec![arg("--inline"), arg("-o"), arg(&job.output)];
        args.extend(job.inputs.iter().map(arg));
        self.run(&self.tools.svgstore, args)
    }

    fn pack_png_sprite(&self, job: &PngSpriteJob) -> Result<(), ToolError> {
        let mut args = vec![
            arg("--padding"),
            arg(job.padding.to_string()),
            arg("--img"),
            arg(&job.image_output),
            arg("--css"),
            arg(&job.css_output),
            arg("--img-path"),
            arg(&job.image_url),
        ];
        args.extend(job.inputs.iter().map(arg));
        self.run(&self.tools.spritesmith, args)
    }

    fn start_server(&self, job: &ServeJob) -> Result<Option<Child>, ToolError> {
        let args = vec![
            arg("start"),
            arg("--server"),
            arg(&job.root),
            arg("--port"),
            arg(job.port.to_string()),
            arg("--startPath"),
            arg(&job.start_path),
            arg("--files"),
            arg(&job.root),
            arg("--no-open"),
        ];
        let (program, mut command) = self.command(&self.tools.server, args);
        let child = command
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ToolError::Spawn { program, source })?;
        Ok(Some(child))
    }

    fn deploy(&self, build_dir: &Path) -> Result<(), ToolError> {
        self.run(&self.tools.deploy, vec![arg("-d"), arg(build_dir)])
    }
}
