//! # forge CLI Entry Point
//!
//! Parses arguments with clap and routes each subcommand to its handler in
//! [`libforge::commands`].
//!
//! - **Configure**: `configure`, `list`, `tree`
//! - **Build**: `build`, `install`, `clean`
//! - **Project**: `init`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use libforge::build::BuildOptions;
use libforge::commands;
use libforge::config::MANIFEST_FILE;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

/// Box-drawing characters in tables and trees need a UTF-8 console.
#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Builds and installs a project's shared C++ libraries", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the project manifest
    #[arg(long, global = true, default_value = MANIFEST_FILE)]
    manifest_path: PathBuf,

    /// Show detailed build commands and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve libraries, sources and install layout without building
    Configure {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
        /// Only these libraries (and what they depend on)
        #[arg(long = "lib")]
        libs: Vec<String>,
    },
    /// Compile and link every library
    Build {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
        /// Number of parallel compile jobs
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Only these libraries (and what they depend on)
        #[arg(long = "lib")]
        libs: Vec<String>,
    },
    /// Build, then copy artifacts and headers into the install prefix
    Install {
        /// Override the manifest's install prefix
        #[arg(long)]
        prefix: Option<PathBuf>,
        /// Install the release build
        #[arg(long)]
        release: bool,
        /// Show what would be installed without copying
        #[arg(long)]
        dry_run: bool,
        /// Number of parallel compile jobs
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Only these libraries (and what they depend on)
        #[arg(long = "lib")]
        libs: Vec<String>,
    },
    /// Remove build outputs
    Clean {
        /// Also remove all forge state and the install prefix
        #[arg(long)]
        all: bool,
    },
    /// List libraries with their directories and file counts
    List,
    /// Show the library dependency tree
    Tree,
    /// Scaffold a new two-library project
    Init {
        /// Project name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("FORGE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn init_thread_pool(jobs: Option<usize>) -> Result<()> {
    if let Some(jobs) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build_global()
            .context("Failed to configure the compile thread pool")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let manifest = cli.manifest_path.as_path();

    match &cli.command {
        Commands::Configure { json, libs } => commands::project::configure(manifest, libs, *json),
        Commands::Build {
            release,
            dry_run,
            jobs,
            libs,
        } => {
            init_thread_pool(*jobs)?;
            let options = BuildOptions {
                release: *release,
                verbose: cli.verbose,
                dry_run: *dry_run,
            };
            commands::build::build(manifest, libs, &options)
        }
        Commands::Install {
            prefix,
            release,
            dry_run,
            jobs,
            libs,
        } => {
            init_thread_pool(*jobs)?;
            let options = BuildOptions {
                release: *release,
                verbose: cli.verbose,
                dry_run: *dry_run,
            };
            commands::build::install(manifest, libs, prefix.as_deref(), &options)
        }
        Commands::Clean { all } => commands::build::clean(manifest, *all),
        Commands::List => commands::project::list(manifest),
        Commands::Tree => commands::project::tree(manifest),
        Commands::Init { name } => commands::project::init(manifest, name.as_deref()),
    }
}
