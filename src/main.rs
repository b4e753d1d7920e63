use bemkit::config::{self, Mode};
use bemkit::manifest::{ManifestFile, ManifestStore};
use bemkit::pipeline::{self, Task, TaskReport};
use bemkit::tasks::TaskContext;
use bemkit::toolchain::CommandToolchain;
use bemkit::{output, resolve, scaffold};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bemkit")]
#[command(about = "Asset pipeline and block scaffolder for BEM-style static sites")]
#[command(long_about = "\
Asset pipeline and block scaffolder for BEM-style static sites

projectConfig.json is the single source of truth. Registered blocks decide
which stylesheets are imported, which scripts are bundled and which images
are copied, in registration order.

Project structure:

  project/
  ├── projectConfig.json           # Manifest: dirs + ordered block registry
  ├── bemkit.toml                  # Pipeline settings (optional)
  ├── src/
  │   ├── index.html               # Pages, @@include('blocks/...') to compose
  │   ├── scss/style.scss          # Generated import list, do not edit
  │   ├── fonts/
  │   ├── img/
  │   └── blocks/
  │       └── card/
  │           ├── card.scss        # Block styles
  │           ├── card__title.scss # Element styles (registered as \"__title\")
  │           ├── card.html        # Markup snippet
  │           ├── card.js
  │           └── img/             # Copied to build/img/
  └── build/                       # Output

Build mode comes from NODE_ENV: unset or \"dev\" keeps source maps, anything
else minifies.

Run 'bemkit gen-config' to print a documented bemkit.toml.")]
#[command(version)]
struct Cli {
    /// Project manifest; its directory is the project root
    #[arg(long, default_value = bemkit::manifest::MANIFEST_FILENAME, global = true)]
    manifest: PathBuf,

    /// Build mode ("dev" for development, anything else for production)
    #[arg(long, env = "NODE_ENV", global = true)]
    mode: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a block folder with stub files and register the block
    Scaffold {
        /// Block name, e.g. "card"
        block: Option<String>,
        /// Extra files to create besides scss, html and img (e.g. js, md)
        extensions: Vec<String>,
    },
    /// Print the style, script and image lists derived from the manifest
    Resolve {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the full build: clean → sprites → styles/scripts/copies → html
    Build,
    /// Build, start the dev server and rebuild on change
    Serve,
    /// Run a single task by name (e.g. style, copy:img, sprite:png)
    Run {
        task: Task,
        /// Folder for img:opt
        #[arg(long, env = "folder")]
        folder: Option<PathBuf>,
    },
    /// Optimize the images of one folder in place
    ImgOpt {
        #[arg(long, env = "folder")]
        folder: Option<PathBuf>,
    },
    /// Publish the build folder
    Deploy,
    /// Print a stock bemkit.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let store = ManifestFile::new(&cli.manifest);
    let mode = Mode::from_env_value(cli.mode.as_deref());

    match cli.command {
        Command::Scaffold { block, extensions } => {
            let outcome = scaffold::scaffold_and_register(
                &store,
                &store.project_root(),
                block.as_deref(),
                &extensions,
            )?;
            output::print_scaffold_outcome(&outcome, &manifest_name(&cli.manifest));
            if let scaffold::ScaffoldOutcome::Completed { report, .. } = &outcome {
                if report.failures().next().is_some() {
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Resolve { json } => {
            let lists = resolve::resolve(&store.load()?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lists)?);
            } else {
                output::print_resolved_lists(&lists);
            }
        }
        Command::Build => {
            let (ctx, toolchain) = setup(&store, mode, None)?;
            println!("==> Building {} ({mode:?})", ctx.manifest.dirs.build_path);
            let reports = pipeline::build(&ctx, &toolchain, &print_report);
            println!("{}", output::format_build_summary(&reports));
            return Ok(exit_code(&reports));
        }
        Command::Serve => {
            let (ctx, toolchain) = setup(&store, mode, None)?;
            println!(
                "==> Serving {} on port {}",
                ctx.manifest.dirs.build_path, ctx.config.serve.port
            );
            pipeline::serve(&ctx, &toolchain, &print_report, || true)?;
        }
        Command::Run { task, folder } => {
            let (ctx, toolchain) = setup(&store, mode, folder)?;
            let report = pipeline::run_task(task, &ctx, &toolchain);
            print_report(&report);
            return Ok(exit_code(std::slice::from_ref(&report)));
        }
        Command::ImgOpt { folder } => {
            let (ctx, toolchain) = setup(&store, mode, folder)?;
            let report = pipeline::run_task(Task::ImgOpt, &ctx, &toolchain);
            print_report(&report);
            return Ok(exit_code(std::slice::from_ref(&report)));
        }
        Command::Deploy => {
            let (ctx, toolchain) = setup(&store, mode, None)?;
            let report = pipeline::run_task(Task::Deploy, &ctx, &toolchain);
            print_report(&report);
            return Ok(exit_code(std::slice::from_ref(&report)));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Load manifest and settings, and build the task context and toolchain.
fn setup(
    store: &ManifestFile,
    mode: Mode,
    folder: Option<PathBuf>,
) -> Result<(TaskContext, CommandToolchain), Box<dyn std::error::Error>> {
    let root = store.project_root();
    let manifest = store.load()?;
    let settings = config::load_pipeline_config(&root)?;
    let toolchain = CommandToolchain::new(settings.tools.clone(), &root);
    let ctx = TaskContext::new(root, manifest, settings, mode)?.with_folder(folder);
    Ok((ctx, toolchain))
}

fn print_report(report: &TaskReport) {
    output::print_task_report(report);
}

fn exit_code(reports: &[TaskReport]) -> ExitCode {
    if reports.iter().any(TaskReport::failed) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn manifest_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
