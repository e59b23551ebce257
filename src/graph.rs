//! Library dependency graph.
//!
//! Built from the `depends` lists of the manifest. Traversal yields
//! dependencies before dependents and otherwise keeps declaration order, so
//! `moqt_core` is always configured before `moqt_gui`.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::config::ForgeConfig;
use crate::error::ConfigError;

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Library names in manifest order.
    nodes: Vec<String>,

    /// Edges: library -> libraries it depends on, in declared order.
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph, rejecting unknown dependencies and cycles.
    pub fn from_config(config: &ForgeConfig) -> Result<Self, ConfigError> {
        let known: HashSet<&str> = config.libraries.iter().map(|l| l.name.as_str()).collect();
        let mut graph = Self::default();

        for lib in &config.libraries {
            let mut deps = Vec::new();
            for dep in &lib.depends {
                if !known.contains(dep.as_str()) {
                    return Err(ConfigError::UnknownDependency {
                        name: lib.name.clone(),
                        dependency: dep.clone(),
                    });
                }
                if !deps.contains(dep) {
                    deps.push(dep.clone());
                }
            }
            graph.nodes.push(lib.name.clone());
            graph.edges.insert(lib.name.clone(), deps);
        }

        graph.topological_order()?;
        Ok(graph)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Direct dependencies of `name`.
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.edges.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Libraries that depend directly on `name`, in manifest order.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| self.dependencies(n).iter().any(|d| d == name))
            .map(String::as_str)
            .collect()
    }

    /// Libraries nothing else depends on.
    pub fn roots(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| self.dependents(n).is_empty())
            .map(String::as_str)
            .collect()
    }

    /// Every library, dependencies first.
    pub fn topological_order(&self) -> Result<Vec<String>, ConfigError> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for name in &self.nodes {
            self.visit(name, &mut visited, &mut stack, &mut result)?;
        }
        Ok(result)
    }

    /// `roots` and everything they need, dependencies first.
    pub fn closure(&self, roots: &[String]) -> Result<Vec<String>, ConfigError> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for root in roots {
            if !self.contains(root) {
                return Err(ConfigError::UnknownLibrary { name: root.clone() });
            }
            self.visit(root, &mut visited, &mut stack, &mut result)?;
        }
        Ok(result)
    }

    /// Transitive dependencies of `name`, dependencies first, excluding `name`.
    pub fn transitive_dependencies(&self, name: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(name.to_string());
        for dep in self.dependencies(name) {
            self.collect_postorder(dep, &mut visited, &mut result);
        }
        result
    }

    /// Post-order walk that marks nodes on entry, so it terminates even on a cycle.
    fn collect_postorder(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        result: &mut Vec<String>,
    ) {
        if !visited.insert(name.to_string()) {
            return;
        }
        for dep in self.dependencies(name) {
            self.collect_postorder(dep, visited, result);
        }
        result.push(name.to_string());
    }

    /// DFS visit; `stack` holds the current path for cycle reporting.
    fn visit(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
        result: &mut Vec<String>,
    ) -> Result<(), ConfigError> {
        if visited.contains(name) {
            return Ok(());
        }

        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut chain: Vec<&str> = stack[start..].iter().map(String::as_str).collect();
            chain.push(name);
            return Err(ConfigError::DependencyCycle {
                chain: chain.join(" -> "),
            });
        }

        stack.push(name.to_string());
        for dep in self.dependencies(name) {
            self.visit(dep, visited, stack, result)?;
        }
        stack.pop();

        trace!(library = name, "ordered");
        visited.insert(name.to_string());
        result.push(name.to_string());
        Ok(())
    }
}
