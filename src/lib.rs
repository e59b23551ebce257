//! # forge - shared library builds for multi-library C++ projects
//!
//! A project declares its libraries in `forge.toml`. forge discovers each
//! library's sources and public headers, resolves the `depends` graph, builds
//! one shared library per entry (dependencies first) and installs artifacts
//! and headers into a prefix laid out for downstream consumers:
//!
//! ```text
//! <prefix>/lib/libmoqt_core.so
//! <prefix>/lib/libmoqt_gui.so
//! <prefix>/include/moqt_core/a.h
//! <prefix>/include/moqt_gui/b.h
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Manifest parsing (`forge.toml`)
//! - [`graph`] - Library dependency graph and ordering
//! - [`discover`] - Source and header discovery
//! - [`plan`] - Configure phase producing per-target build plans
//! - [`build`] - Parallel, incremental compile and link
//! - [`install`] - Install tree with stale-file removal
//! - [`commands`] - CLI command handlers

/// Parallel, incremental compilation and linking.
pub mod build;

/// CLI command handlers.
pub mod commands;

/// Manifest parsing (`forge.toml`).
pub mod config;

/// Source and header discovery per library.
pub mod discover;

/// Typed errors for configure, build and install.
pub mod error;

/// Library dependency graph.
pub mod graph;

/// Install phase.
pub mod install;

/// Configure phase.
pub mod plan;

/// Project scaffolding for `forge init`.
pub mod templates;

/// Compiler detection and standard flags.
pub mod toolchain;

/// Dependency tree visualization.
pub mod tree;

/// Terminal UI utilities (tables).
pub mod ui;
