//! Integration tests for the forge CLI
//!
//! These tests drive the built `forge` binary against scratch projects.
//! Tests that compile C++ skip themselves when no compiler is installed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const MOQT_MANIFEST: &str = r#"[project]
name = "moqt"
version = "0.1.0"

[[library]]
name = "moqt_core"

[[library]]
name = "moqt_gui"
depends = ["moqt_core"]
"#;

const CORE_HEADER: &str = r#"#ifndef A_H
#define A_H
#if defined(_WIN32) && defined(MOQT_CORE_LIBRARY)
#  define A_API __declspec(dllexport)
#elif defined(_WIN32)
#  define A_API __declspec(dllimport)
#else
#  define A_API
#endif
A_API int core_value();
#endif
"#;

const GUI_HEADER: &str = r#"#ifndef B_H
#define B_H
#if defined(_WIN32) && defined(MOQT_GUI_LIBRARY)
#  define B_API __declspec(dllexport)
#elif defined(_WIN32)
#  define B_API __declspec(dllimport)
#else
#  define B_API
#endif
B_API int gui_value();
#endif
"#;

fn forge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_forge"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    forge()
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute forge")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// `moqt_core/{a.cpp,a.h}` and `moqt_gui/{b.cpp,b.h}`.
fn create_moqt_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::write(root.join("forge.toml"), MOQT_MANIFEST).unwrap();

    fs::create_dir_all(root.join("moqt_core")).unwrap();
    fs::write(root.join("moqt_core/a.h"), CORE_HEADER).unwrap();
    fs::write(
        root.join("moqt_core/a.cpp"),
        "#include \"a.h\"\nint core_value() { return 41; }\n",
    )
    .unwrap();

    fs::create_dir_all(root.join("moqt_gui")).unwrap();
    fs::write(root.join("moqt_gui/b.h"), GUI_HEADER).unwrap();
    fs::write(
        root.join("moqt_gui/b.cpp"),
        "#include \"a.h\"\n#include \"b.h\"\nint gui_value() { return core_value() + 1; }\n",
    )
    .unwrap();
    tmp
}

fn compiler_available() -> bool {
    ["clang++", "g++", "c++"].iter().any(|cc| {
        Command::new(cc)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    })
}

fn artifact(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.dll", name)
    } else if cfg!(target_os = "macos") {
        format!("lib{}.dylib", name)
    } else {
        format!("lib{}.so", name)
    }
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(dir).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[test]
fn test_configure_json_plan() {
    let project = create_moqt_project();
    let output = run(project.path(), &["configure", "--json"]);
    assert!(output.status.success(), "configure failed: {}", stderr(&output));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let targets = plan["targets"].as_array().unwrap();
    assert_eq!(targets.len(), 2);

    assert_eq!(targets[0]["name"], "moqt_core");
    assert_eq!(targets[0]["links"].as_array().unwrap().len(), 0);
    assert_eq!(targets[0]["defines"][0], "MOQT_CORE_LIBRARY");

    assert_eq!(targets[1]["name"], "moqt_gui");
    assert_eq!(targets[1]["links"][0], "moqt_core");
    let gui_defines: Vec<&str> = targets[1]["defines"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d.as_str())
        .collect();
    assert!(gui_defines.contains(&"MOQT_GUI_LIBRARY"));
    assert!(!gui_defines.contains(&"MOQT_CORE_LIBRARY"));

    let rules = plan["install_rules"].as_array().unwrap();
    assert_eq!(rules[0]["headers"][0]["relative"], "a.h");
    assert_eq!(rules[1]["headers"][0]["relative"], "b.h");
}

#[test]
fn test_empty_library_directory_fails() {
    let project = create_moqt_project();
    fs::remove_file(project.path().join("moqt_gui/b.cpp")).unwrap();

    let output = run(project.path(), &["configure"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("moqt_gui"), "stderr: {}", err);
    assert!(err.contains("no source files"), "stderr: {}", err);
}

#[test]
fn test_missing_directory_fails() {
    let project = create_moqt_project();
    fs::remove_dir_all(project.path().join("moqt_core")).unwrap();

    let output = run(project.path(), &["configure"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("moqt_core"));
}

#[test]
fn test_unknown_dependency_fails() {
    let project = create_moqt_project();
    let manifest = MOQT_MANIFEST.replace("depends = [\"moqt_core\"]", "depends = [\"moqt_net\"]");
    fs::write(project.path().join("forge.toml"), manifest).unwrap();

    let output = run(project.path(), &["list"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("moqt_net"), "stderr: {}", err);
}

#[test]
fn test_manifest_path_flag() {
    let project = create_moqt_project();
    let manifest = project.path().join("forge.toml");
    let elsewhere = TempDir::new().unwrap();

    let output = run(
        elsewhere.path(),
        &["tree", "--manifest-path", manifest.to_str().unwrap()],
    );
    assert!(output.status.success(), "tree failed: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("moqt_gui"));
    assert!(stdout.contains("moqt_core"));
}

#[test]
fn test_init_then_list() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["init", "--name", "demo"]);
    assert!(output.status.success(), "init failed: {}", stderr(&output));
    assert!(tmp.path().join("forge.toml").is_file());
    assert!(tmp.path().join("demo_core/demo_core.h").is_file());

    let output = run(tmp.path(), &["list"]);
    assert!(output.status.success(), "list failed: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo_core"));
    assert!(stdout.contains("demo_gui"));

    let output = run(tmp.path(), &["init", "--name", "demo"]);
    assert!(!output.status.success());
}

#[test]
fn test_build_and_install_layout() {
    if !compiler_available() {
        eprintln!("Skipping test: no C++ compiler found");
        return;
    }
    let project = create_moqt_project();
    let root = project.path();

    let output = run(root, &["install"]);
    assert!(output.status.success(), "install failed: {}", stderr(&output));

    let mut expected = vec![
        PathBuf::from(".forge-install.toml"),
        PathBuf::from("include/moqt_core/a.h"),
        PathBuf::from("include/moqt_gui/b.h"),
        Path::new("lib").join(artifact("moqt_core")),
        Path::new("lib").join(artifact("moqt_gui")),
    ];
    expected.sort();
    let installed = files_under(&root.join("install"));
    assert_eq!(installed, expected);

    assert!(root.join(".forge/build/debug/compile_commands.json").is_file());

    // A second build has nothing to do.
    let output = run(root, &["build"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Up to date"));
}

#[test]
fn test_rename_leaves_no_stale_install_paths() {
    if !compiler_available() {
        eprintln!("Skipping test: no C++ compiler found");
        return;
    }
    let project = create_moqt_project();
    let root = project.path();

    let output = run(root, &["install"]);
    assert!(output.status.success(), "install failed: {}", stderr(&output));

    fs::rename(root.join("moqt_gui"), root.join("moqt_view")).unwrap();
    fs::write(
        root.join("forge.toml"),
        MOQT_MANIFEST.replace("moqt_gui", "moqt_view"),
    )
    .unwrap();

    let output = run(root, &["install"]);
    assert!(output.status.success(), "reinstall failed: {}", stderr(&output));

    let prefix = root.join("install");
    assert!(prefix.join("include/moqt_view/b.h").is_file());
    assert!(prefix.join("lib").join(artifact("moqt_view")).is_file());
    assert!(!prefix.join("include/moqt_gui").exists());
    assert!(!prefix.join("lib").join(artifact("moqt_gui")).exists());
}

#[test]
fn test_install_single_library_keeps_the_rest() {
    if !compiler_available() {
        eprintln!("Skipping test: no C++ compiler found");
        return;
    }
    let project = create_moqt_project();
    let root = project.path();

    let output = run(root, &["install"]);
    assert!(output.status.success(), "install failed: {}", stderr(&output));
    let before = files_under(&root.join("install"));

    let output = run(root, &["install", "--lib", "moqt_core"]);
    assert!(
        output.status.success(),
        "install --lib failed: {}",
        stderr(&output)
    );

    let prefix = root.join("install");
    assert!(prefix.join("include/moqt_gui/b.h").is_file());
    assert!(prefix.join("lib").join(artifact("moqt_gui")).is_file());
    assert_eq!(files_under(&prefix), before);

    let record = fs::read_to_string(prefix.join(".forge-install.toml")).unwrap();
    assert!(record.contains("moqt_gui"), "record: {}", record);
}

#[test]
fn test_compile_error_is_reported() {
    if !compiler_available() {
        eprintln!("Skipping test: no C++ compiler found");
        return;
    }
    let project = create_moqt_project();
    fs::write(project.path().join("moqt_core/a.cpp"), "int broken( {\n").unwrap();

    let output = run(project.path(), &["build"]);
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("moqt_core"), "stderr: {}", err);
    assert!(err.contains("a.cpp"), "stderr: {}", err);
}

#[test]
fn test_dry_run_builds_nothing() {
    if !compiler_available() {
        eprintln!("Skipping test: no C++ compiler found");
        return;
    }
    let project = create_moqt_project();

    let output = run(project.path(), &["build", "--dry-run"]);
    assert!(output.status.success(), "dry run failed: {}", stderr(&output));
    assert!(!project.path().join(".forge/build/debug/lib").exists());
}

#[test]
fn test_clean_all() {
    let project = create_moqt_project();
    let root = project.path();
    fs::create_dir_all(root.join(".forge/build/debug/obj")).unwrap();
    fs::create_dir_all(root.join("install/lib")).unwrap();

    let output = run(root, &["clean", "--all"]);
    assert!(output.status.success(), "clean failed: {}", stderr(&output));
    assert!(!root.join(".forge").exists());
    assert!(!root.join("install").exists());
    assert!(root.join("moqt_core/a.cpp").exists());
}
