//! CLI command handlers.
//!
//! Each handler takes the resolved manifest path and returns `anyhow::Result`;
//! typed errors from the library layers are wrapped with context here.

pub mod build;
pub mod project;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{ForgeConfig, load_config};

/// A loaded manifest and the directory it lives in.
pub struct Workspace {
    pub manifest: PathBuf,
    pub root: PathBuf,
    pub config: ForgeConfig,
}

impl Workspace {
    pub fn load(manifest: &Path) -> Result<Self> {
        let config = load_config(manifest)?;
        let root = project_root(manifest)?;
        Ok(Self {
            manifest: manifest.to_path_buf(),
            root,
            config,
        })
    }

    /// Install prefix, either the override or the manifest's, relative to the root.
    pub fn install_prefix(&self, prefix: Option<&Path>) -> PathBuf {
        let prefix = prefix.unwrap_or(&self.config.install.prefix);
        if prefix.is_absolute() {
            prefix.to_path_buf()
        } else {
            self.root.join(prefix)
        }
    }
}

/// Directory containing `manifest`, made absolute.
pub fn project_root(manifest: &Path) -> Result<PathBuf> {
    let parent = match manifest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parent
        .canonicalize()
        .with_context(|| format!("Failed to resolve project directory {}", parent.display()))
}
