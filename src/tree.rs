//! Dependency tree visualization.
//!
//! ```text
//! moqt v0.1.0
//! └── moqt_gui (libmoqt_gui.so)
//!     └── moqt_core (libmoqt_core.so)
//! ```

use crate::config::ForgeConfig;
use crate::graph::DependencyGraph;
use crate::plan::artifact_file_name;
use anyhow::Result;
use colored::*;

/// Render the tree as plain lines, roots first.
pub fn render_tree(config: &ForgeConfig, graph: &DependencyGraph) -> Vec<String> {
    let mut lines = vec![format!(
        "{} v{}",
        config.project.name, config.project.version
    )];

    let roots = graph.roots();
    let count = roots.len();
    for (i, root) in roots.into_iter().enumerate() {
        render_node(config, graph, root, "", i == count - 1, &mut lines);
    }
    lines
}

fn render_node(
    config: &ForgeConfig,
    graph: &DependencyGraph,
    name: &str,
    indent: &str,
    is_last: bool,
    lines: &mut Vec<String>,
) {
    let branch = if is_last { "└──" } else { "├──" };
    let artifact = config
        .library(name)
        .map(|lib| artifact_file_name(lib.output_name()))
        .unwrap_or_default();
    lines.push(format!("{}{} {} ({})", indent, branch, name, artifact));

    let child_indent = format!("{}{}", indent, if is_last { "    " } else { "│   " });
    let deps = graph.dependencies(name);
    for (i, dep) in deps.iter().enumerate() {
        render_node(config, graph, dep, &child_indent, i == deps.len() - 1, lines);
    }
}

pub fn print_tree(config: &ForgeConfig) -> Result<()> {
    let graph = DependencyGraph::from_config(config)?;
    let lines = render_tree(config, &graph);
    if let Some((head, rest)) = lines.split_first() {
        println!("{}", head.bold().cyan());
        for line in rest {
            println!("{}", line);
        }
    }
    Ok(())
}
