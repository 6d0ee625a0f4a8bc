//! Path registry and leaf-collision analysis.
use crate::property::ResolvedNode;
use indexmap::IndexMap;
use std::collections::BTreeSet;

// ------------------------------ Paths ------------------------------------ //

/// Terminal segment of a dotted path.
pub fn leaf(path: &str) -> &str {
    path.rsplit_once('.').map_or(path, |(_, leaf)| leaf)
}

/// Path with its last segment stripped, `None` at the root.
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

/// Proper prefixes of `path`, nearest first.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent(path), |p| parent(*p))
}

// ----------------------------- Registry ---------------------------------- //

/// Insertion-ordered path → node mapping. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    nodes: IndexMap<String, ResolvedNode>,
}

impl PathRegistry {
    /// First occurrence of a path wins; later duplicates are dropped.
    pub fn register(nodes: impl IntoIterator<Item = ResolvedNode>) -> Self {
        let mut map = IndexMap::new();
        for node in nodes {
            if map.contains_key(&node.path) {
                tracing::debug!(path = %node.path, "dropping duplicate VSS path");
                continue;
            }
            map.insert(node.path.clone(), node);
        }
        Self { nodes: map }
    }

    pub fn get(&self, path: &str) -> Option<&ResolvedNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nearest registered proper ancestor of `path`.
    pub fn structural_parent<'a>(&self, path: &'a str) -> Option<&'a str> {
        ancestors(path).find(|p| self.contains(p))
    }
}

/// Leaf names shared by two or more distinct paths.
pub fn find_collisions(registry: &PathRegistry) -> BTreeSet<String> {
    let mut counts = IndexMap::<&str, usize>::new();
    for node in registry.nodes() {
        *counts.entry(leaf(&node.path)).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}
