use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Supported compiler drivers. Both accept GCC-style flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum CompilerType {
    /// Clang/LLVM (clang++ or clang)
    Clang,
    /// GNU Compiler Collection (g++ or gcc)
    GCC,
}

impl CompilerType {
    /// Classify a driver from its `--version` banner.
    pub fn from_version_banner(banner: &str) -> Self {
        if banner.to_lowercase().contains("clang") {
            CompilerType::Clang
        } else {
            CompilerType::GCC
        }
    }
}

impl std::fmt::Display for CompilerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilerType::Clang => write!(f, "Clang"),
            CompilerType::GCC => write!(f, "GCC"),
        }
    }
}

/// Represents a discovered compiler toolchain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toolchain {
    pub compiler_type: CompilerType,

    /// C compiler, used for `.c` sources
    pub cc_path: PathBuf,

    /// C++ compiler, also used as the linker driver
    pub cxx_path: PathBuf,

    /// First line of `--version`
    pub version: String,
}

impl Toolchain {
    /// Derive the C driver from the C++ one (`clang++` -> `clang`, `g++` -> `gcc`).
    pub fn new_simple(compiler_type: CompilerType, cxx_path: PathBuf, version: String) -> Self {
        let cxx = cxx_path.to_string_lossy();
        let cc_path = if let Some(stem) = cxx.strip_suffix("clang++") {
            PathBuf::from(format!("{}clang", stem))
        } else if let Some(stem) = cxx.strip_suffix("g++") {
            PathBuf::from(format!("{}gcc", stem))
        } else if let Some(stem) = cxx.strip_suffix("c++") {
            PathBuf::from(format!("{}cc", stem))
        } else {
            cxx_path.clone()
        };

        Self {
            compiler_type,
            cc_path,
            cxx_path,
            version,
        }
    }

    /// Driver to use for `source`.
    pub fn compiler_for(&self, source: &Path) -> &Path {
        if is_c_source(source) {
            &self.cc_path
        } else {
            &self.cxx_path
        }
    }

    /// One-line summary for verbose output, e.g. `Clang clang++ (clang version 18.1.3)`.
    pub fn describe(&self) -> String {
        format!(
            "{} {} ({})",
            self.compiler_type,
            self.cxx_path.display(),
            self.version
        )
    }

    /// Stable identity of this toolchain, folded into compile stamps.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.cxx_path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(self.version.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub fn is_c_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "c")
}

/// Error type for toolchain operations
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No usable compiler driver
    #[error("Toolchain not found: {0}")]
    NotFound(String),
    /// The configured compiler exists but did not answer `--version`
    #[error("compiler '{program}' is not usable: {reason}")]
    Unusable { program: String, reason: String },
}
