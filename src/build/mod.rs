//! Build phase: compile and link every target of a [`BuildPlan`].
//!
//! Targets are processed strictly in plan order (dependencies first) because a
//! dependent links against its dependency's artifact. Sources within a target
//! compile in parallel.

mod clean;
pub mod compile;
mod feedback;
pub mod link;

pub use clean::clean;
pub use feedback::FeedbackAnalyzer;

use crate::error::BuildError;
use crate::plan::BuildPlan;
use crate::toolchain::Toolchain;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use link::LinkOutcome;

/// Hidden per-project state directory.
pub const STATE_DIR: &str = ".forge";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub release: bool,
    pub verbose: bool,
    pub dry_run: bool,
}

impl BuildOptions {
    pub fn profile(&self) -> &'static str {
        if self.release { "release" } else { "debug" }
    }
}

/// `<root>/.forge/build/<profile>`
pub fn build_dir(root: &Path, release: bool) -> PathBuf {
    let profile = if release { "release" } else { "debug" };
    root.join(STATE_DIR).join("build").join(profile)
}

/// Directory holding the linked shared libraries.
pub fn artifact_dir(root: &Path, release: bool) -> PathBuf {
    build_dir(root, release).join("lib")
}

#[derive(Debug, Default)]
pub struct BuildSummary {
    pub artifacts: Vec<PathBuf>,
    pub compiled: usize,
    pub linked: usize,
}

impl BuildSummary {
    pub fn up_to_date(&self) -> bool {
        self.compiled == 0 && self.linked == 0
    }
}

/// Compile and link all targets of `plan`.
pub fn build_plan(
    plan: &BuildPlan,
    toolchain: &Toolchain,
    options: &BuildOptions,
) -> Result<BuildSummary, BuildError> {
    let start_time = Instant::now();
    let build_dir = build_dir(&plan.root, options.release);
    let lib_dir = artifact_dir(&plan.root, options.release);

    let mut summary = BuildSummary::default();
    let mut compile_db = Vec::new();

    for target in &plan.targets {
        println!(
            "{} {} ({} sources)",
            "Building".green().bold(),
            target.name.bold(),
            target.sources.len()
        );

        let obj_dir = build_dir.join("obj").join(&target.name);
        let objects = compile::compile_target(target, toolchain, &obj_dir, &plan.root, options)?;
        summary.compiled += objects.iter().filter(|o| o.recompiled).count();

        let mut object_paths = Vec::with_capacity(objects.len());
        for compiled in objects {
            object_paths.push(compiled.object);
            compile_db.push(compiled.entry);
        }

        let dependencies: Vec<PathBuf> = target
            .link_closure
            .iter()
            .filter_map(|dep| plan.target(dep))
            .map(|dep| lib_dir.join(&dep.artifact))
            .collect();

        let outcome = link::link_target(
            target,
            toolchain,
            &object_paths,
            &lib_dir,
            &obj_dir,
            &dependencies,
            options,
        )?;
        if outcome == LinkOutcome::Linked {
            summary.linked += 1;
        }
        summary.artifacts.push(lib_dir.join(&target.artifact));
    }

    if !options.dry_run {
        let db_path = build_dir.join("compile_commands.json");
        let json = serde_json::to_string_pretty(&compile_db).map_err(|e| BuildError::Io {
            path: db_path.clone(),
            source: std::io::Error::other(e),
        })?;
        fs::write(&db_path, json).map_err(|source| BuildError::Io {
            path: db_path,
            source,
        })?;
    }

    info!(
        compiled = summary.compiled,
        linked = summary.linked,
        "build complete"
    );
    if summary.up_to_date() && !options.dry_run {
        println!("{} Up to date", "*".green());
    } else {
        println!(
            "{} Build finished in {:.2?}",
            "✓".green(),
            start_time.elapsed()
        );
    }
    Ok(summary)
}
