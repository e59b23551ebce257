//! Configure phase.
//!
//! Turns a validated manifest into a [`BuildPlan`]: one self-contained
//! [`TargetPlan`] per library, in dependency order, plus the install rules
//! derived from them. Nothing here is shared between targets. Each plan carries
//! its own include directories, defines and language flag, so configuring one
//! library can never change how another is compiled.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ForgeConfig;
use crate::discover::{self, HeaderFile};
use crate::error::ConfigError;
use crate::graph::DependencyGraph;

/// Compile and link configuration for one shared library.
#[derive(Debug, Clone, Serialize)]
pub struct TargetPlan {
    pub name: String,
    pub output_name: String,
    pub source_dir: PathBuf,
    pub header_dir: PathBuf,
    pub sources: Vec<PathBuf>,
    pub headers: Vec<HeaderFile>,
    /// Own header directory first, then those of its transitive dependencies.
    pub include_dirs: Vec<PathBuf>,
    /// Private defines, starting with the `<NAME>_LIBRARY` export macro.
    pub defines: Vec<String>,
    pub standard: String,
    pub flags: Vec<String>,
    /// Direct link dependencies.
    pub links: Vec<String>,
    /// Every library this one needs at link time, dependencies first.
    pub link_closure: Vec<String>,
    pub system_libs: Vec<String>,
    /// Artifact file name, e.g. `libmoqt_core.so`.
    pub artifact: String,
}

/// Where one target's outputs land, relative to the install prefix.
#[derive(Debug, Clone, Serialize)]
pub struct InstallRule {
    pub library: String,
    pub artifact: String,
    pub lib_destination: PathBuf,
    pub include_destination: PathBuf,
    pub headers: Vec<HeaderFile>,
}

impl InstallRule {
    /// Every path this rule produces, relative to the prefix.
    pub fn destinations(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.lib_destination.join(&self.artifact)];
        paths.extend(
            self.headers
                .iter()
                .map(|h| self.include_destination.join(&h.relative)),
        );
        paths
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub project: String,
    pub version: String,
    pub root: PathBuf,
    pub targets: Vec<TargetPlan>,
    pub install_rules: Vec<InstallRule>,
    /// Every library declared in the manifest, including unselected ones.
    pub declared: Vec<String>,
}

impl BuildPlan {
    pub fn target(&self, name: &str) -> Option<&TargetPlan> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// All install destinations, relative to the prefix.
    pub fn install_destinations(&self) -> Vec<PathBuf> {
        self.install_rules
            .iter()
            .flat_map(InstallRule::destinations)
            .collect()
    }
}

/// Shared-library file name for the host platform.
pub fn artifact_file_name(output_name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.dll", output_name)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", output_name)
    } else {
        format!("lib{}.so", output_name)
    }
}

/// Configure every library in the manifest.
pub fn configure(config: &ForgeConfig, root: &Path) -> Result<BuildPlan, ConfigError> {
    configure_selected(config, root, &[])
}

/// Configure `selection` and everything it depends on. An empty selection means all.
pub fn configure_selected(
    config: &ForgeConfig,
    root: &Path,
    selection: &[String],
) -> Result<BuildPlan, ConfigError> {
    config.validate()?;
    let graph = DependencyGraph::from_config(config)?;
    let order = if selection.is_empty() {
        graph.topological_order()?
    } else {
        graph.closure(selection)?
    };

    let mut targets: Vec<TargetPlan> = Vec::with_capacity(order.len());
    for name in &order {
        let lib = config
            .library(name)
            .ok_or_else(|| ConfigError::UnknownLibrary { name: name.clone() })?;
        let files = discover::discover(root, lib, &config.build)?;

        let link_closure = graph.transitive_dependencies(name);
        let header_dir = root.join(lib.header_dir());

        let mut include_dirs = vec![header_dir.clone()];
        for dep in &link_closure {
            // Dependencies precede dependents in `order`, so they are already planned.
            if let Some(dep_plan) = targets.iter().find(|t| &t.name == dep)
                && !include_dirs.contains(&dep_plan.header_dir)
            {
                include_dirs.push(dep_plan.header_dir.clone());
            }
        }

        let mut defines = vec![lib.export_macro()];
        for define in &lib.defines {
            if !defines.contains(define) {
                defines.push(define.clone());
            }
        }

        let target = TargetPlan {
            name: lib.name.clone(),
            output_name: lib.output_name().to_string(),
            source_dir: root.join(lib.source_dir()),
            header_dir,
            sources: files.sources,
            headers: files.headers,
            include_dirs,
            defines,
            standard: config.project.standard.clone(),
            flags: config.build.flags.clone(),
            links: graph.dependencies(name).to_vec(),
            link_closure,
            system_libs: config.build.libs.clone(),
            artifact: artifact_file_name(lib.output_name()),
        };
        debug!(
            library = %target.name,
            sources = target.sources.len(),
            links = ?target.links,
            "configured target"
        );
        targets.push(target);
    }

    let install_rules = targets
        .iter()
        .map(|t| InstallRule {
            library: t.name.clone(),
            artifact: t.artifact.clone(),
            lib_destination: config.install.lib_dir.clone(),
            include_destination: config.install.include_dir.join(&t.name),
            headers: t.headers.clone(),
        })
        .collect();

    info!(targets = targets.len(), "configure complete");
    Ok(BuildPlan {
        project: config.project.name.clone(),
        version: config.project.version.clone(),
        root: root.to_path_buf(),
        targets,
        install_rules,
        declared: config.libraries.iter().map(|l| l.name.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MOQT: &str = r#"
[project]
name = "moqt"

[[library]]
name = "moqt_core"

[[library]]
name = "moqt_gui"
depends = ["moqt_core"]
"#;

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (dir, stem) in [("moqt_core", "a"), ("moqt_gui", "b")] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
            fs::write(tmp.path().join(dir).join(format!("{}.cpp", stem)), "").unwrap();
            fs::write(tmp.path().join(dir).join(format!("{}.h", stem)), "").unwrap();
        }
        tmp
    }

    fn plan(src: &str, root: &Path) -> Result<BuildPlan, ConfigError> {
        configure(&ForgeConfig::parse(src).unwrap(), root)
    }

    #[test]
    fn test_moqt_scenario() {
        let tmp = fixture();
        let plan = plan(MOQT, tmp.path()).unwrap();

        let names: Vec<&str> = plan.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["moqt_core", "moqt_gui"]);

        let core = plan.target("moqt_core").unwrap();
        let gui = plan.target("moqt_gui").unwrap();
        assert_eq!(core.artifact, artifact_file_name("moqt_core"));
        assert_eq!(gui.links, vec!["moqt_core"]);
        assert!(core.links.is_empty());

        let destinations = plan.install_destinations();
        assert!(destinations.contains(&PathBuf::from("include/moqt_core/a.h")));
        assert!(destinations.contains(&PathBuf::from("include/moqt_gui/b.h")));
        assert!(destinations.contains(&Path::new("lib").join(artifact_file_name("moqt_gui"))));
    }

    #[test]
    fn test_defines_are_private_to_each_target() {
        let tmp = fixture();
        let plan = plan(MOQT, tmp.path()).unwrap();
        let core = plan.target("moqt_core").unwrap();
        let gui = plan.target("moqt_gui").unwrap();

        assert_eq!(core.defines, vec!["MOQT_CORE_LIBRARY"]);
        assert_eq!(gui.defines, vec!["MOQT_GUI_LIBRARY"]);
    }

    #[test]
    fn test_include_dirs_follow_dependencies() {
        let tmp = fixture();
        let plan = plan(MOQT, tmp.path()).unwrap();
        let core = plan.target("moqt_core").unwrap();
        let gui = plan.target("moqt_gui").unwrap();

        assert_eq!(core.include_dirs, vec![tmp.path().join("moqt_core")]);
        assert_eq!(
            gui.include_dirs,
            vec![tmp.path().join("moqt_gui"), tmp.path().join("moqt_core")]
        );
    }

    #[test]
    fn test_standard_is_per_target() {
        let tmp = fixture();
        let src = MOQT.replace("name = \"moqt\"", "name = \"moqt\"\nstandard = \"c++17\"");
        let plan = plan(&src, tmp.path()).unwrap();
        assert!(plan.targets.iter().all(|t| t.standard == "c++17"));
    }

    #[test]
    fn test_empty_library_fails_configuration() {
        let tmp = fixture();
        fs::remove_file(tmp.path().join("moqt_gui/b.cpp")).unwrap();
        let err = plan(MOQT, tmp.path()).unwrap_err();
        match err {
            ConfigError::NoSources { name, .. } => assert_eq!(name, "moqt_gui"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rename_leaves_no_old_paths() {
        let tmp = fixture();
        fs::rename(tmp.path().join("moqt_gui"), tmp.path().join("moqt_view")).unwrap();
        let renamed = MOQT.replace("moqt_gui", "moqt_view");
        let plan = plan(&renamed, tmp.path()).unwrap();

        let destinations = plan.install_destinations();
        assert!(destinations.contains(&PathBuf::from("include/moqt_view/b.h")));
        assert!(
            destinations
                .iter()
                .all(|p| !p.to_string_lossy().contains("moqt_gui"))
        );
    }

    #[test]
    fn test_selection_pulls_in_dependencies() {
        let tmp = fixture();
        let config = ForgeConfig::parse(MOQT).unwrap();
        let plan = configure_selected(&config, tmp.path(), &["moqt_gui".to_string()]).unwrap();
        assert_eq!(plan.targets.len(), 2);

        let plan = configure_selected(&config, tmp.path(), &["moqt_core".to_string()]).unwrap();
        assert_eq!(plan.targets.len(), 1);
        assert_eq!(plan.install_rules[0].library, "moqt_core");
    }

    #[test]
    fn test_artifact_name() {
        let name = artifact_file_name("moqt_core");
        assert!(name.contains("moqt_core"));
        if cfg!(target_os = "linux") {
            assert_eq!(name, "libmoqt_core.so");
        }
    }
}
