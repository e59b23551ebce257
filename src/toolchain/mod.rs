//! Toolchain discovery and language-standard flags.
//!
//! Only GCC-style drivers are supported: clang, gcc and MinGW all accept the
//! same `-shared`/`-fPIC`/`-std=` flags.

pub mod types;

pub use types::{CompilerType, Toolchain, ToolchainError, is_c_source};

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Probe `program --version`, returning the first banner line.
fn probe(program: &str) -> Option<String> {
    let output = Command::new(program).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Some(stdout.lines().next().unwrap_or("unknown").trim().to_string())
}

/// Detect a toolchain. `preferred` is the manifest's `[build] compiler`.
pub fn detect_toolchain(preferred: Option<&str>) -> Result<Toolchain, ToolchainError> {
    if let Some(requested) = preferred {
        let program = match requested.to_lowercase().as_str() {
            "clang" | "clang++" => "clang++".to_string(),
            "gcc" | "g++" => "g++".to_string(),
            _ => requested.to_string(),
        };
        return match probe(&program) {
            Some(version) => Ok(toolchain_for(&program, version)),
            None => Err(ToolchainError::Unusable {
                program,
                reason: "`--version` failed; check that it is installed and on PATH".into(),
            }),
        };
    }

    let mut candidates = Vec::new();
    if let Ok(cxx) = std::env::var("CXX")
        && !cxx.trim().is_empty()
    {
        candidates.push(cxx);
    }
    candidates.extend(["clang++", "g++", "c++"].iter().map(|s| s.to_string()));

    for program in candidates {
        if let Some(version) = probe(&program) {
            debug!(compiler = %program, %version, "detected toolchain");
            return Ok(toolchain_for(&program, version));
        }
    }

    Err(ToolchainError::NotFound(
        "No C++ compiler found. Please install clang or gcc, or set [build] compiler.".to_string(),
    ))
}

fn toolchain_for(program: &str, version: String) -> Toolchain {
    let compiler_type = CompilerType::from_version_banner(&version);
    Toolchain::new_simple(compiler_type, PathBuf::from(program), version)
}

/// Whether `standard` names a C++ dialect (as opposed to a C one).
pub fn is_cxx_standard(standard: &str) -> bool {
    let s = standard.to_lowercase();
    let s = s.strip_prefix("-std=").unwrap_or(&s);
    s.starts_with("c++") || s.starts_with("gnu++")
}

/// Map a standard name to its `-std=` flag, normalizing aliases.
pub fn std_flag(standard: &str) -> String {
    let normalized = standard.to_lowercase();
    let edition = normalized.strip_prefix("-std=").unwrap_or(&normalized);

    match edition {
        "c89" | "c90" => "-std=c89".to_string(),
        "c99" => "-std=c99".to_string(),
        "c11" => "-std=c11".to_string(),
        "c17" | "c18" => "-std=c17".to_string(),
        "c23" | "c2x" => "-std=c23".to_string(),

        "c++98" | "c++03" => "-std=c++03".to_string(),
        "c++11" | "c++0x" => "-std=c++11".to_string(),
        "c++14" | "c++1y" => "-std=c++14".to_string(),
        "c++17" | "c++1z" => "-std=c++17".to_string(),
        "c++20" | "c++2a" => "-std=c++20".to_string(),
        "c++23" | "c++2b" => "-std=c++23".to_string(),
        "c++26" | "c++2c" => "-std=c++26".to_string(),

        "gnu++11" | "gnu++0x" => "-std=gnu++11".to_string(),
        "gnu++14" | "gnu++1y" => "-std=gnu++14".to_string(),
        "gnu++17" | "gnu++1z" => "-std=gnu++17".to_string(),
        "gnu++20" | "gnu++2a" => "-std=gnu++20".to_string(),
        "gnu++23" | "gnu++2b" => "-std=gnu++23".to_string(),

        _ => format!("-std={}", edition),
    }
}
