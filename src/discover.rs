//! Source and header discovery.
//!
//! Discovery is scoped to one library directory. By default only the files
//! directly inside it are considered; `recursive = true` descends into
//! subdirectories (skipping hidden ones) and `exclude` patterns prune
//! matches. A `sources` manifest replaces source discovery entirely.

use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{BuildConfig, LibraryConfig};
use crate::error::ConfigError;

/// A public header and its path relative to the header directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderFile {
    pub path: PathBuf,
    pub relative: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveredFiles {
    pub sources: Vec<PathBuf>,
    pub headers: Vec<HeaderFile>,
}

/// Discover the inputs of `lib`, with its directories resolved against `root`.
pub fn discover(
    root: &Path,
    lib: &LibraryConfig,
    build: &BuildConfig,
) -> Result<DiscoveredFiles, ConfigError> {
    let source_dir = root.join(lib.source_dir());
    let header_dir = root.join(lib.header_dir());

    for dir in [&source_dir, &header_dir] {
        if !dir.is_dir() {
            return Err(ConfigError::MissingDirectory {
                name: lib.name.clone(),
                path: dir.clone(),
            });
        }
    }

    let excludes = compile_excludes(lib)?;

    let sources = match &lib.sources {
        Some(listed) => listed_sources(lib, &source_dir, listed)?,
        None => scan(lib, &source_dir, &source_dir, &build.source_extensions, &excludes)?
            .into_iter()
            .map(|(path, _)| path)
            .collect(),
    };

    if sources.is_empty() {
        return Err(ConfigError::NoSources {
            name: lib.name.clone(),
            path: source_dir,
        });
    }

    let headers = scan(lib, &header_dir, &source_dir, &build.header_extensions, &excludes)?
        .into_iter()
        .map(|(path, relative)| HeaderFile { path, relative })
        .collect::<Vec<_>>();

    debug!(
        library = %lib.name,
        sources = sources.len(),
        headers = headers.len(),
        "discovered files"
    );

    Ok(DiscoveredFiles { sources, headers })
}

/// Walk `dir` and collect files with one of `extensions`, sorted by relative path.
///
/// Excludes match against the path relative to `base` (the library directory)
/// when the file lies under it, otherwise relative to `dir`.
fn scan(
    lib: &LibraryConfig,
    dir: &Path,
    base: &Path,
    extensions: &[String],
    excludes: &[Regex],
) -> Result<Vec<(PathBuf, PathBuf)>, ConfigError> {
    let max_depth = if lib.recursive { usize::MAX } else { 1 };
    let mut found = Vec::new();

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry.map_err(|source| ConfigError::Scan {
            name: lib.name.clone(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let matches_ext = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                extensions.iter().any(|e| e.as_str() == ext)
            })
            .unwrap_or(false);
        if !matches_ext {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path).to_path_buf();
        let match_path = path.strip_prefix(base).unwrap_or(&relative);
        if is_excluded(match_path, excludes) {
            debug!(library = %lib.name, file = %match_path.display(), "excluded");
            continue;
        }
        found.push((path.to_path_buf(), relative));
    }

    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}

fn listed_sources(
    lib: &LibraryConfig,
    source_dir: &Path,
    listed: &[PathBuf],
) -> Result<Vec<PathBuf>, ConfigError> {
    let mut sources = Vec::with_capacity(listed.len());
    for entry in listed {
        let escapes = entry.is_absolute()
            || entry
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(ConfigError::SourceOutsideDirectory {
                name: lib.name.clone(),
                path: entry.clone(),
            });
        }

        let path = source_dir.join(entry);
        if !path.is_file() {
            return Err(ConfigError::MissingSource {
                name: lib.name.clone(),
                path,
            });
        }
        if !sources.contains(&path) {
            sources.push(path);
        }
    }
    Ok(sources)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn compile_excludes(lib: &LibraryConfig) -> Result<Vec<Regex>, ConfigError> {
    lib.exclude
        .iter()
        .map(|pattern| {
            Regex::new(&wildcard_to_regex(pattern)).map_err(|source| ConfigError::InvalidExclude {
                name: lib.name.clone(),
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

fn is_excluded(relative: &Path, excludes: &[Regex]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let normalized = relative.to_string_lossy().replace('\\', "/");
    excludes.iter().any(|re| re.is_match(&normalized))
}

/// Translate a wildcard pattern into an anchored regex.
///
/// `**` crosses directory boundaries, `*` and `?` do not. A pattern without a
/// `/` matches against the file name in any directory.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut re = String::from("^");
    if !pattern.contains('/') {
        re.push_str("(?:.*/)?");
    }

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    re.push_str("(?:.*/)?");
                } else {
                    re.push_str(".*");
                }
            }
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    re
}
