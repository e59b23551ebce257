//! Project-level commands: `configure`, `list`, `tree` and `init`.

use anyhow::{Context, Result, bail};
use colored::*;
use std::fs;
use std::path::Path;

use super::{Workspace, project_root};
use crate::config::MANIFEST_FILE;
use crate::plan::{BuildPlan, configure_selected};
use crate::templates;
use crate::tree;
use crate::ui::Table;

/// Configure the workspace, restricted to `selection` when non-empty.
pub fn load_plan(ws: &Workspace, selection: &[String]) -> Result<BuildPlan> {
    configure_selected(&ws.config, &ws.root, selection)
        .with_context(|| format!("Failed to configure {}", ws.manifest.display()))
}

pub fn configure(manifest: &Path, selection: &[String], json: bool) -> Result<()> {
    let ws = Workspace::load(manifest)?;
    let plan = load_plan(&ws, selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {} v{} ({} libraries)",
        "Configured".green().bold(),
        plan.project.bold(),
        plan.version,
        plan.targets.len()
    );
    let mut table = Table::new(&["Library", "Artifact", "Links", "Sources", "Defines"]);
    for target in &plan.targets {
        table.add_row(vec![
            target.name.clone(),
            target.artifact.clone(),
            join_or_dash(&target.links),
            target.sources.len().to_string(),
            target.defines.join(" "),
        ]);
    }
    table.print();

    let prefix = ws.install_prefix(None);
    println!("{} Install layout under {}:", "->".blue(), prefix.display());
    for path in plan.install_destinations() {
        println!("   {}", path.display());
    }
    Ok(())
}

pub fn list(manifest: &Path) -> Result<()> {
    let ws = Workspace::load(manifest)?;
    let plan = load_plan(&ws, &[])?;

    let mut table = Table::new(&["Library", "Directory", "Depends", "Sources", "Headers"]);
    for target in &plan.targets {
        let dir = target
            .source_dir
            .strip_prefix(&ws.root)
            .unwrap_or(&target.source_dir);
        table.add_row(vec![
            target.name.clone(),
            dir.display().to_string(),
            join_or_dash(&target.links),
            target.sources.len().to_string(),
            target.headers.len().to_string(),
        ]);
    }
    table.print();
    Ok(())
}

pub fn tree(manifest: &Path) -> Result<()> {
    let ws = Workspace::load(manifest)?;
    tree::print_tree(&ws.config)
}

/// Scaffold a two-library project next to `manifest`. Refuses to touch an
/// existing manifest; other existing files are left as they are.
pub fn init(manifest: &Path, name: Option<&str>) -> Result<()> {
    if manifest.exists() {
        bail!(
            "{} already exists. Remove it first or pass a different --manifest-path.",
            manifest.display()
        );
    }
    let parent = manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;
    let root = project_root(manifest)?;

    let name = match name {
        Some(n) => n.to_string(),
        None => default_project_name(&root),
    };

    for (relative, content) in templates::project_template(&name) {
        let path = if relative == Path::new(MANIFEST_FILE) {
            manifest.to_path_buf()
        } else {
            root.join(&relative)
        };
        if path.exists() {
            println!("{} Skipping existing {}", "!".yellow(), relative.display());
            continue;
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("   {} {}", "+".green(), relative.display());
    }

    println!(
        "{} Created project {}. Next: {}",
        "✓".green(),
        name.bold(),
        "forge build".cyan()
    );
    Ok(())
}

fn default_project_name(root: &Path) -> String {
    let raw = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        "project".to_string()
    } else {
        name
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_plan() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE);
        init(&manifest, Some("demo")).unwrap();

        let ws = Workspace::load(&manifest).unwrap();
        let plan = load_plan(&ws, &[]).unwrap();
        let names: Vec<_> = plan.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["demo_core", "demo_gui"]);
        assert!(tmp.path().join("demo_gui/demo_gui.cpp").is_file());
    }

    #[test]
    fn test_init_refuses_existing_manifest() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE);
        fs::write(&manifest, "# mine").unwrap();

        assert!(init(&manifest, Some("demo")).is_err());
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "# mine");
    }

    #[test]
    fn test_default_project_name() {
        assert_eq!(default_project_name(Path::new("/tmp/my-lib")), "my_lib");
        assert_eq!(default_project_name(Path::new("/")), "project");
    }

    #[test]
    fn test_selection_pulls_in_dependencies() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_FILE);
        init(&manifest, Some("demo")).unwrap();

        let ws = Workspace::load(&manifest).unwrap();
        let plan = load_plan(&ws, &["demo_gui".to_string()]).unwrap();
        assert_eq!(plan.targets.len(), 2);
        let plan = load_plan(&ws, &["demo_core".to_string()]).unwrap();
        assert_eq!(plan.targets.len(), 1);
    }
}
