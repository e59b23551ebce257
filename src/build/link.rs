use super::BuildOptions;
use super::compile::command_stamp;
use crate::error::BuildError;
use crate::plan::TargetPlan;
use crate::toolchain::Toolchain;
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    UpToDate,
}

/// Linker command line for a shared library; element 0 is the driver.
///
/// `dependencies` are the artifacts of the target's link closure, dependencies first.
pub fn link_args(
    target: &TargetPlan,
    toolchain: &Toolchain,
    objects: &[PathBuf],
    lib_dir: &Path,
    dependencies: &[PathBuf],
) -> Vec<String> {
    let output = lib_dir.join(&target.artifact);
    let mut args = vec![
        toolchain.cxx_path.to_string_lossy().to_string(),
        "-shared".to_string(),
    ];
    args.extend(objects.iter().map(|o| o.to_string_lossy().to_string()));
    args.push("-o".to_string());
    args.push(output.to_string_lossy().to_string());

    if cfg!(target_os = "macos") {
        args.push(format!("-Wl,-install_name,@rpath/{}", target.artifact));
        args.push("-Wl,-rpath,@loader_path".to_string());
    } else if cfg!(target_os = "windows") {
        let implib = lib_dir.join(format!("lib{}.dll.a", target.output_name));
        args.push(format!("-Wl,--out-implib,{}", implib.display()));
    } else {
        args.push(format!("-Wl,-soname,{}", target.artifact));
        args.push("-Wl,-rpath,$ORIGIN".to_string());
    }

    // Dependents before their dependencies.
    for dep in dependencies.iter().rev() {
        args.push(dep.to_string_lossy().to_string());
    }
    for lib in &target.system_libs {
        args.push(format!("-l{}", lib));
    }
    args
}

fn is_newer(path: &Path, than: std::time::SystemTime) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| t > than)
        .unwrap_or(true)
}

fn needs_link(output: &Path, inputs: &[PathBuf], stamp_path: &Path, stamp: &str) -> bool {
    let Ok(out_time) = fs::metadata(output).and_then(|m| m.modified()) else {
        return true;
    };
    let recorded = fs::read_to_string(stamp_path).unwrap_or_default();
    if recorded.trim() != stamp {
        return true;
    }
    inputs.iter().any(|input| is_newer(input, out_time))
}

/// Link `target` from `objects` into `lib_dir`.
pub fn link_target(
    target: &TargetPlan,
    toolchain: &Toolchain,
    objects: &[PathBuf],
    lib_dir: &Path,
    obj_dir: &Path,
    dependencies: &[PathBuf],
    options: &BuildOptions,
) -> Result<LinkOutcome, BuildError> {
    let args = link_args(target, toolchain, objects, lib_dir, dependencies);

    if options.dry_run {
        println!("{}", args.join(" "));
        return Ok(LinkOutcome::Linked);
    }

    fs::create_dir_all(lib_dir).map_err(|source| BuildError::Io {
        path: lib_dir.to_path_buf(),
        source,
    })?;

    let output = lib_dir.join(&target.artifact);
    let stamp = command_stamp(toolchain, &args);
    let stamp_path = obj_dir.join("link.stamp");
    let inputs: Vec<PathBuf> = objects.iter().chain(dependencies).cloned().collect();

    if !needs_link(&output, &inputs, &stamp_path, &stamp) {
        debug!(library = %target.name, "artifact up to date");
        return Ok(LinkOutcome::UpToDate);
    }

    println!("   {} Linking {}", "~".cyan(), target.artifact.bold());
    if options.verbose {
        println!("   {} {}", "$".dimmed(), args.join(" "));
    }

    let result = Command::new(&args[0])
        .args(&args[1..])
        .output()
        .map_err(|source| BuildError::Spawn {
            program: PathBuf::from(&args[0]),
            source,
        })?;

    if !result.status.success() {
        return Err(BuildError::Link {
            library: target.name.clone(),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
        });
    }

    fs::write(&stamp_path, &stamp).map_err(|source| BuildError::Io {
        path: stamp_path,
        source,
    })?;
    Ok(LinkOutcome::Linked)
}
