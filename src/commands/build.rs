//! Build-side commands: `build`, `install` and `clean`.

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};

use super::Workspace;
use super::project::load_plan;
use crate::build::{self, BuildOptions, BuildSummary, FeedbackAnalyzer};
use crate::error::BuildError;
use crate::install;
use crate::plan::BuildPlan;
use crate::toolchain;

fn run_build(ws: &Workspace, plan: &BuildPlan, options: &BuildOptions) -> Result<BuildSummary> {
    let toolchain = toolchain::detect_toolchain(ws.config.build.compiler.as_deref())?;
    if options.verbose {
        println!("{} {}", "Toolchain:".blue(), toolchain.describe());
    }

    match build::build_plan(plan, &toolchain, options) {
        Ok(summary) => Ok(summary),
        Err(err) => {
            let output = match &err {
                BuildError::Compile { stderr, .. } | BuildError::Link { stderr, .. } => {
                    Some(stderr.as_str())
                }
                _ => None,
            };
            if let Some(hint) = output.and_then(FeedbackAnalyzer::analyze) {
                eprintln!("\n{} {}", "hint:".cyan().bold(), hint);
            }
            Err(err.into())
        }
    }
}

pub fn build(manifest: &Path, selection: &[String], options: &BuildOptions) -> Result<()> {
    let ws = Workspace::load(manifest)?;
    let plan = load_plan(&ws, selection)?;
    let summary = run_build(&ws, &plan, options)?;
    if options.verbose {
        for artifact in &summary.artifacts {
            println!("   {}", artifact.display());
        }
    }
    Ok(())
}

pub fn install(
    manifest: &Path,
    selection: &[String],
    prefix: Option<&Path>,
    options: &BuildOptions,
) -> Result<()> {
    let ws = Workspace::load(manifest)?;
    let plan = load_plan(&ws, selection)?;
    run_build(&ws, &plan, options)?;

    let prefix = ws.install_prefix(prefix);
    let artifact_dir = build::artifact_dir(&plan.root, options.release);
    println!("{} {}", "Installing".green().bold(), prefix.display());

    let report = install::install(&plan, &artifact_dir, &prefix, options.dry_run)
        .with_context(|| format!("Failed to install into {}", prefix.display()))?;

    if !options.dry_run {
        for removed in &report.removed {
            println!("   {} {}", "-".red(), removed.display());
        }
        println!(
            "{} Installed {} files ({} stale removed)",
            "✓".green(),
            report.installed.len(),
            report.removed.len()
        );
    }
    Ok(())
}

/// `--all` also removes the install prefix named by the manifest, if one loads.
pub fn clean(manifest: &Path, all: bool) -> Result<()> {
    let root = super::project_root(manifest)?;
    let prefix: Option<PathBuf> = if all {
        match Workspace::load(manifest) {
            Ok(ws) => Some(ws.install_prefix(None)),
            Err(err) => {
                tracing::warn!(error = %err, "manifest unavailable, keeping install prefix");
                None
            }
        }
    } else {
        None
    };
    build::clean(&root, all, prefix.as_deref())?;
    Ok(())
}
