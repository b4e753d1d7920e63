//! External collaborators: compilers, optimizers, sprite packers, servers.
//!
//! bemkit never compiles Sass or squeezes PNGs itself. Each of those jobs is
//! handed to a third-party program through a small input/output contract:
//!
//! | Operation | Default program | Contract |
//! |---|---|---|
//! | **Compile style** | `sass` (+ `postcss`) | one entry file → one stylesheet |
//! | **Post-process CSS** | `postcss` | one stylesheet → one stylesheet |
//! | **Optimize images** | `imagemin` | files → output directory |
//! | **SVG sprite** | `svgstore` | `*.svg` → one symbol sprite |
//! | **PNG sprite** | `spritesmith` | `*.png` → sheet + SCSS map |
//! | **Include HTML** | built in | page → page with `@@include` expanded |
//! | **Dev server** | `browser-sync` | serve + live-reload the build directory |
//! | **Deploy** | `gh-pages` | publish the build directory |
//!
//! The module is split into:
//! - **Parameters**: job descriptions handed to a toolchain
//! - **Backend**: [`Toolchain`] trait + [`ToolError`]
//! - **Command backend**: [`CommandToolchain`], spawning the configured programs
//! - **Include**: the `@@include` expander used by the HTML step

pub mod backend;
pub mod command_backend;
pub mod include;
mod params;

pub use backend::{ToolError, Toolchain};
pub use command_backend::CommandToolchain;
pub use params::{CssJob, ImageJob, PngSpriteJob, ServeJob, StyleJob, SvgSpriteJob};
