use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Default manifest file name, looked up in the current directory.
pub const MANIFEST_FILE: &str = "forge.toml";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ForgeConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub install: InstallConfig,
    /// Ordered `[[library]]` tables.
    #[serde(default, rename = "library")]
    pub libraries: Vec<LibraryConfig>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Language standard applied to every target, e.g. `c++11`.
    #[serde(default = "default_standard")]
    pub standard: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BuildConfig {
    /// Compiler driver (`clang++`, `g++`, or a path). Autodetected when unset.
    pub compiler: Option<String>,
    /// Extra compile flags applied to every target.
    #[serde(default)]
    pub flags: Vec<String>,
    /// System libraries linked into every target (`pthread` -> `-lpthread`).
    #[serde(default)]
    pub libs: Vec<String>,
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
    #[serde(default = "default_header_extensions")]
    pub header_extensions: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            flags: Vec::new(),
            libs: Vec::new(),
            source_extensions: default_source_extensions(),
            header_extensions: default_header_extensions(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct InstallConfig {
    #[serde(default = "default_prefix")]
    pub prefix: PathBuf,
    /// Destination for every artifact kind (library, archive, runtime).
    #[serde(default = "default_lib_dir")]
    pub lib_dir: PathBuf,
    #[serde(default = "default_include_dir")]
    pub include_dir: PathBuf,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            lib_dir: default_lib_dir(),
            include_dir: default_include_dir(),
        }
    }
}

/// One shared library to build.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct LibraryConfig {
    pub name: String,
    /// Source directory relative to the manifest. Defaults to `name`.
    pub path: Option<PathBuf>,
    /// Public header directory. Defaults to the source directory.
    pub include: Option<PathBuf>,
    /// Libraries this one links against.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Explicit source manifest; disables discovery of sources when set.
    pub sources: Option<Vec<PathBuf>>,
    /// Descend into subdirectories during discovery.
    #[serde(default)]
    pub recursive: bool,
    /// Wildcard patterns (`*`, `**`, `?`) matched against paths relative to the library
    /// directory. Headers outside that directory match relative to `include`.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Extra preprocessor defines private to this target.
    #[serde(default)]
    pub defines: Vec<String>,
    /// Artifact base name. Defaults to `name`.
    pub output_name: Option<String>,
}

impl LibraryConfig {
    pub fn source_dir(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }

    pub fn header_dir(&self) -> PathBuf {
        self.include.clone().unwrap_or_else(|| self.source_dir())
    }

    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(&self.name)
    }

    /// The `<NAME>_LIBRARY` macro defined while compiling this library.
    pub fn export_macro(&self) -> String {
        export_macro(&self.name)
    }
}

/// Upper-case `name`, map anything outside `[A-Za-z0-9_]` to `_`, append `_LIBRARY`.
pub fn export_macro(name: &str) -> String {
    let token: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_LIBRARY", token)
}

impl ForgeConfig {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn library(&self, name: &str) -> Option<&LibraryConfig> {
        self.libraries.iter().find(|lib| lib.name == name)
    }

    /// Structural checks that need no filesystem access.
    ///
    /// Dependency references and cycles are checked by [`crate::graph::DependencyGraph`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.libraries.is_empty() {
            return Err(ConfigError::NoLibraries);
        }

        let mut seen = HashSet::new();
        let mut outputs: HashMap<&str, &str> = HashMap::new();
        for lib in &self.libraries {
            validate_name(&lib.name)?;
            if let Some(output) = &lib.output_name {
                validate_name(output)?;
            }
            if !seen.insert(lib.name.as_str()) {
                return Err(ConfigError::DuplicateLibrary {
                    name: lib.name.clone(),
                });
            }
            if let Some(first) = outputs.insert(lib.output_name(), lib.name.as_str()) {
                return Err(ConfigError::DuplicateOutput {
                    first: first.to_string(),
                    second: lib.name.clone(),
                    output: lib.output_name().to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.trim().is_empty() {
        Some("name must not be empty")
    } else if name.contains(['/', '\\']) {
        Some("name must not contain path separators")
    } else if name == "." || name == ".." {
        Some("name must not be a relative path component")
    } else if name.chars().any(char::is_whitespace) {
        Some("name must not contain whitespace")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Read, parse and validate a manifest.
pub fn load_config(path: &Path) -> Result<ForgeConfig> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "{} not found.\n\n\
            Tip: Run 'forge init' to scaffold a project, or pass --manifest-path.",
            path.display()
        ));
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;

    let config = ForgeConfig::parse(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })?;
    config.validate()?;

    tracing::debug!(
        manifest = %path.display(),
        libraries = config.libraries.len(),
        "loaded manifest"
    );
    Ok(config)
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_standard() -> String {
    "c++11".to_string()
}

fn default_source_extensions() -> Vec<String> {
    ["cpp", "cc", "cxx", "c"].iter().map(|s| s.to_string()).collect()
}

fn default_header_extensions() -> Vec<String> {
    ["h", "hh", "hpp", "hxx"].iter().map(|s| s.to_string()).collect()
}

fn default_prefix() -> PathBuf {
    PathBuf::from("install")
}

fn default_lib_dir() -> PathBuf {
    PathBuf::from("lib")
}

fn default_include_dir() -> PathBuf {
    PathBuf::from("include")
}
