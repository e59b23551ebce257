//! Build artifact cleanup.
//!
//! - `forge clean` - Remove `.forge/build`
//! - `forge clean --all` - Also remove the whole `.forge` directory and the install prefix

use super::STATE_DIR;
use anyhow::{Context, Result};
use colored::*;

use std::fs;
use std::path::Path;

pub fn clean(root: &Path, all: bool, install_prefix: Option<&Path>) -> Result<bool> {
    let mut cleaned = false;

    let build = root.join(STATE_DIR).join("build");
    if build.exists() {
        fs::remove_dir_all(&build)
            .with_context(|| format!("Failed to remove {}", build.display()))?;
        cleaned = true;
    }

    if !all {
        return Ok(report(cleaned));
    }

    let state = root.join(STATE_DIR);
    if state.exists() {
        fs::remove_dir_all(&state)
            .with_context(|| format!("Failed to remove {}", state.display()))?;
        cleaned = true;
    }
    if let Some(prefix) = install_prefix
        && prefix.exists()
    {
        fs::remove_dir_all(prefix)
            .with_context(|| format!("Failed to remove install prefix {}", prefix.display()))?;
        println!("{} Removed {}", "-".red(), prefix.display());
        cleaned = true;
    }

    Ok(report(cleaned))
}

fn report(cleaned: bool) -> bool {
    if cleaned {
        println!("{} Clean complete.", "✓".green());
    } else {
        println!("{} Nothing to clean", "!".yellow());
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_build_dir_only() {
        let tmp = TempDir::new().unwrap();
        let obj = tmp.path().join(".forge/build/debug/obj");
        fs::create_dir_all(&obj).unwrap();
        fs::create_dir_all(tmp.path().join("install/lib")).unwrap();

        assert!(clean(tmp.path(), false, None).unwrap());
        assert!(!tmp.path().join(".forge/build").exists());
        assert!(tmp.path().join("install/lib").exists());
        assert!(!clean(tmp.path(), false, None).unwrap());
    }

    #[test]
    fn test_clean_all_removes_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".forge/build")).unwrap();
        let prefix = tmp.path().join("install");
        fs::create_dir_all(prefix.join("include/moqt_core")).unwrap();

        assert!(clean(tmp.path(), true, Some(&prefix)).unwrap());
        assert!(!prefix.exists());
        assert!(!tmp.path().join(".forge").exists());
    }

    #[test]
    fn test_clean_all_without_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".forge/build")).unwrap();
        assert!(clean(tmp.path(), true, None).unwrap());
        assert!(!tmp.path().join(".forge").exists());
    }
}
