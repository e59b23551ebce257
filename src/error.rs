//! Typed errors for the configure, build and install phases.
//!
//! Every configuration error names the library it concerns so the user can
//! find the offending `[[library]]` table. Command handlers wrap these in
//! `anyhow` with additional context.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the manifest or configuring targets.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The manifest declares no `[[library]]` tables.
    #[error("no libraries declared; add at least one [[library]] table to the manifest")]
    NoLibraries,

    /// A library name is empty, contains path separators, or is otherwise unusable.
    #[error("invalid library name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Two `[[library]]` tables use the same name.
    #[error("library '{name}' is declared more than once")]
    DuplicateLibrary { name: String },

    /// Two libraries would produce the same artifact file.
    #[error("libraries '{first}' and '{second}' both produce output '{output}'; set a distinct output_name")]
    DuplicateOutput {
        first: String,
        second: String,
        output: String,
    },

    /// A `depends` entry references a library that is not declared.
    #[error("library '{name}' depends on unknown library '{dependency}'")]
    UnknownDependency { name: String, dependency: String },

    /// A library selected on the command line is not declared.
    #[error("unknown library '{name}'")]
    UnknownLibrary { name: String },

    /// The `depends` relation contains a cycle.
    #[error("dependency cycle detected: {chain}")]
    DependencyCycle { chain: String },

    /// The library's source or header directory is missing.
    #[error("library '{name}': directory '{}' does not exist", path.display())]
    MissingDirectory { name: String, path: PathBuf },

    /// Discovery found nothing to compile.
    #[error("library '{name}': no source files found in '{}'", path.display())]
    NoSources { name: String, path: PathBuf },

    /// A file listed in the `sources` manifest is missing.
    #[error("library '{name}': listed source '{}' does not exist", path.display())]
    MissingSource { name: String, path: PathBuf },

    /// A file listed in the `sources` manifest escapes the library directory.
    #[error("library '{name}': listed source '{}' is outside the library directory", path.display())]
    SourceOutsideDirectory { name: String, path: PathBuf },

    /// An `exclude` pattern could not be compiled.
    #[error("library '{name}': invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        name: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Walking the library directory failed.
    #[error("library '{name}': failed to scan directory: {source}")]
    Scan {
        name: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors raised while compiling or linking targets.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler process could not be spawned.
    #[error("failed to execute '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler rejected a source file; `stderr` is the compiler's output verbatim.
    #[error("compiling '{}' for library '{library}' failed:\n{stderr}", file.display())]
    Compile {
        library: String,
        file: PathBuf,
        stderr: String,
    },

    /// The linker failed to produce the shared library.
    #[error("linking library '{library}' failed:\n{stderr}")]
    Link { library: String, stderr: String },

    /// A filesystem operation in the build directory failed.
    #[error("build directory error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while applying install rules.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The built artifact to install is missing.
    #[error("artifact for library '{library}' not found at '{}'; run `forge build` first", path.display())]
    MissingArtifact { library: String, path: PathBuf },

    /// A destination directory could not be created.
    #[error("failed to create install directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a file into the install tree failed.
    #[error("failed to install '{}' to '{}': {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file left over from a previous install could not be removed.
    #[error("failed to remove stale file '{}': {source}", path.display())]
    RemoveStale {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The install record could not be read or written.
    #[error("install record '{}': {message}", path.display())]
    Record { path: PathBuf, message: String },
}
