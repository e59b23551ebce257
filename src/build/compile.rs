//! Per-target compilation.
//!
//! Sources of one target are compiled in parallel. An object is rebuilt when
//! it is missing, when any file listed in its `.d` dependency file is newer,
//! or when the compile command (flags, defines, toolchain) changed since the
//! last build, as recorded in a `.stamp` file next to the object.

use super::BuildOptions;
use crate::error::BuildError;
use crate::plan::TargetPlan;
use crate::toolchain::{self, Toolchain, is_c_source};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Result of compiling (or skipping) one source file.
#[derive(Debug, Clone)]
pub struct CompiledObject {
    pub object: PathBuf,
    pub recompiled: bool,
    /// `compile_commands.json` entry.
    pub entry: serde_json::Value,
}

/// Object file for `source`, mirroring its path relative to the library directory.
pub fn object_path(obj_dir: &Path, target: &TargetPlan, source: &Path) -> PathBuf {
    let relative = source
        .strip_prefix(&target.source_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default()));
    let mut object = obj_dir.join(relative).into_os_string();
    object.push(".o");
    PathBuf::from(object)
}

/// Full compiler command line for one source; element 0 is the program.
pub fn compile_args(
    target: &TargetPlan,
    toolchain: &Toolchain,
    source: &Path,
    object: &Path,
    release: bool,
) -> Vec<String> {
    let mut args = vec![toolchain.compiler_for(source).to_string_lossy().to_string()];

    args.push("-fdiagnostics-color=always".to_string());
    args.push("-c".to_string());
    args.push(source.to_string_lossy().to_string());
    args.push("-o".to_string());
    args.push(object.to_string_lossy().to_string());

    // A C++ standard flag would be rejected for C sources, and vice versa.
    if is_c_source(source) != toolchain::is_cxx_standard(&target.standard) {
        args.push(toolchain::std_flag(&target.standard));
    }

    if !cfg!(target_os = "windows") {
        args.push("-fPIC".to_string());
    }

    args.push("-MMD".to_string());
    args.push("-MF".to_string());
    args.push(object.with_extension("d").to_string_lossy().to_string());

    if release {
        args.push("-O2".to_string());
        args.push("-DNDEBUG".to_string());
    } else {
        args.push("-g".to_string());
        args.push("-Wall".to_string());
    }

    for define in &target.defines {
        args.push(format!("-D{}", define));
    }
    for dir in &target.include_dirs {
        args.push(format!("-I{}", dir.display()));
    }
    args.extend(target.flags.iter().cloned());
    args
}

/// Hash of everything that should force a rebuild when it changes.
pub fn command_stamp(toolchain: &Toolchain, args: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(toolchain.fingerprint().as_bytes());
    for arg in args {
        hasher.update(b"\0");
        hasher.update(arg.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

// --- Helper: Check Dependencies (.d file) ---
fn dependencies_changed(obj_path: &Path) -> std::io::Result<bool> {
    let d_path = obj_path.with_extension("d");
    if !d_path.exists() {
        return Ok(true);
    }

    let dep_content = fs::read_to_string(&d_path)?;
    let content_flat = dep_content.replace("\\\r\n", " ").replace("\\\n", " ");

    // "objfile.o: src.cpp header.h ..."
    if let Some((_, deps_str)) = content_flat.split_once(": ") {
        let obj_mtime = fs::metadata(obj_path)?.modified()?;

        for dep in deps_str.split_whitespace() {
            let dep_path = Path::new(dep);
            if dep_path.exists() && fs::metadata(dep_path)?.modified()? > obj_mtime {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

fn needs_compile(object: &Path, stamp: &str) -> bool {
    if !object.exists() {
        return true;
    }
    let recorded = fs::read_to_string(object.with_extension("stamp")).unwrap_or_default();
    if recorded.trim() != stamp {
        debug!(object = %object.display(), "compile command changed");
        return true;
    }
    // Unreadable dependency info means we cannot prove the object is current.
    dependencies_changed(object).unwrap_or(true)
}

/// Compile all sources of `target` into `obj_dir`.
pub fn compile_target(
    target: &TargetPlan,
    toolchain: &Toolchain,
    obj_dir: &Path,
    root: &Path,
    options: &BuildOptions,
) -> Result<Vec<CompiledObject>, BuildError> {
    if !options.dry_run {
        fs::create_dir_all(obj_dir).map_err(|source| BuildError::Io {
            path: obj_dir.to_path_buf(),
            source,
        })?;
    }

    let pb = if options.dry_run {
        ProgressBar::hidden()
    } else {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let pb = ProgressBar::new(target.sources.len() as u64);
        pb.set_style(style);
        pb
    };
    pb.set_message(format!("Compiling {}", target.name));

    let root_str = root.to_string_lossy().to_string();

    let results = target
        .sources
        .par_iter()
        .map(|source| -> Result<CompiledObject, BuildError> {
            let object = object_path(obj_dir, target, source);
            let args = compile_args(target, toolchain, source, &object, options.release);
            let stamp = command_stamp(toolchain, &args);

            let entry = json!({
                "directory": root_str,
                "arguments": args,
                "file": source.to_string_lossy(),
                "output": object.to_string_lossy(),
            });

            if options.dry_run {
                pb.println(args.join(" "));
                return Ok(CompiledObject {
                    object,
                    recompiled: true,
                    entry,
                });
            }

            let recompiled = needs_compile(&object, &stamp);
            if recompiled {
                if let Some(dir) = object.parent() {
                    fs::create_dir_all(dir).map_err(|source| BuildError::Io {
                        path: dir.to_path_buf(),
                        source,
                    })?;
                }
                if options.verbose {
                    pb.println(format!("   {} {}", "$".dimmed(), args.join(" ")));
                }
                let output = Command::new(&args[0])
                    .args(&args[1..])
                    .current_dir(root)
                    .output()
                    .map_err(|source| BuildError::Spawn {
                        program: PathBuf::from(&args[0]),
                        source,
                    })?;

                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                if !output.status.success() {
                    return Err(BuildError::Compile {
                        library: target.name.clone(),
                        file: source.clone(),
                        stderr,
                    });
                }
                if !stderr.trim().is_empty() {
                    pb.println(format!(
                        "{} Warning in {}:\n{}",
                        "!".yellow(),
                        source.display(),
                        stderr
                    ));
                }

                let stamp_path = object.with_extension("stamp");
                fs::write(&stamp_path, &stamp).map_err(|source| BuildError::Io {
                    path: stamp_path,
                    source,
                })?;
            }

            pb.inc(1);
            Ok(CompiledObject {
                object,
                recompiled,
                entry,
            })
        })
        .collect::<Result<Vec<_>, BuildError>>();

    match &results {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.abandon(),
    }
    results
}
