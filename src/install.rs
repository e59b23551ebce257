//! Install phase.
//!
//! Copies each artifact into `<prefix>/<lib_dir>` and each public header into
//! `<prefix>/<include_dir>/<library>/`. Every install writes a per-library
//! record of the files it placed. The next install removes recorded files that
//! a planned library no longer produces, and every file of a library that is
//! no longer declared. Libraries left out of a `--lib` selection keep their
//! files and their record entries.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::InstallError;
use crate::plan::BuildPlan;

/// Install record file name, stored at the root of the prefix.
pub const INSTALL_RECORD: &str = ".forge-install.toml";

#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct InstallRecord {
    pub project: String,
    /// Installed files per library, relative to the prefix, `/`-separated.
    #[serde(default)]
    pub libraries: BTreeMap<String, BTreeSet<String>>,
}

impl InstallRecord {
    /// Every recorded file, across libraries.
    pub fn files(&self) -> BTreeSet<&String> {
        self.libraries.values().flatten().collect()
    }
}

impl InstallRecord {
    pub fn load(prefix: &Path) -> Result<Self, InstallError> {
        let path = prefix.join(INSTALL_RECORD);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| InstallError::Record {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| InstallError::Record {
            path,
            message: e.to_string(),
        })
    }

    pub fn save(&self, prefix: &Path) -> Result<(), InstallError> {
        let path = prefix.join(INSTALL_RECORD);
        let content = toml::to_string_pretty(self).map_err(|e| InstallError::Record {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, content).map_err(|e| InstallError::Record {
            path,
            message: e.to_string(),
        })
    }
}

/// What an install did (or would do, for a dry run).
#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

fn record_key(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}

fn copy_file(from: &Path, to: &Path) -> Result<(), InstallError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| InstallError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(from, to).map_err(|source| InstallError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Remove now-empty directories from `start` up to (not including) `prefix`.
fn prune_empty_dirs(start: Option<&Path>, prefix: &Path) {
    let mut current = start;
    while let Some(dir) = current {
        if dir == prefix || !dir.starts_with(prefix) {
            break;
        }
        // Fails when the directory still has entries, which ends the walk.
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

/// Apply the install rules of `plan`, taking artifacts from `artifact_dir`.
pub fn install(
    plan: &BuildPlan,
    artifact_dir: &Path,
    prefix: &Path,
    dry_run: bool,
) -> Result<InstallReport, InstallError> {
    let mut copies: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut produced: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for rule in &plan.install_rules {
        let artifact = artifact_dir.join(&rule.artifact);
        if !dry_run && !artifact.is_file() {
            return Err(InstallError::MissingArtifact {
                library: rule.library.clone(),
                path: artifact,
            });
        }
        let mut sources = vec![artifact];
        sources.extend(rule.headers.iter().map(|h| h.path.clone()));

        let files = produced.entry(rule.library.clone()).or_default();
        for (from, rel) in sources.into_iter().zip(rule.destinations()) {
            files.insert(record_key(&rel));
            copies.push((from, rel));
        }
    }

    let previous = InstallRecord::load(prefix)?;
    let mut next = previous.libraries.clone();
    next.retain(|library, _| plan.declared.contains(library));
    next.extend(produced);
    let next = InstallRecord {
        project: plan.project.clone(),
        libraries: next,
    };

    let keep = next.files();
    let stale: Vec<&String> = previous
        .files()
        .into_iter()
        .filter(|file| !keep.contains(file))
        .collect();

    let mut report = InstallReport::default();

    if dry_run {
        for (from, rel) in &copies {
            println!("   {} {} -> {}", "+".green(), from.display(), prefix.join(rel).display());
            report.installed.push(prefix.join(rel));
        }
        for rel in stale {
            println!("   {} {}", "-".red(), prefix.join(rel).display());
            report.removed.push(prefix.join(rel));
        }
        return Ok(report);
    }

    fs::create_dir_all(prefix).map_err(|source| InstallError::CreateDir {
        path: prefix.to_path_buf(),
        source,
    })?;

    for (from, rel) in &copies {
        let to = prefix.join(rel);
        debug!(from = %from.display(), to = %to.display(), "install");
        copy_file(from, &to)?;
        report.installed.push(to);
    }

    for rel in stale {
        let path = prefix.join(rel);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| InstallError::RemoveStale {
                path: path.clone(),
                source,
            })?;
            prune_empty_dirs(path.parent(), prefix);
            report.removed.push(path);
        } else {
            warn!(path = %path.display(), "recorded file already gone");
        }
    }

    next.save(prefix)?;

    Ok(report)
}
