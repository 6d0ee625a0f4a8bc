// Emission model: what gets generated, independent of the rendered syntax.

use crate::error::{GenError, GenResult};
use crate::property::ResolvedNode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Prefix keeping generated type names clear of reserved identifiers.
pub const TYPE_NAME_PREFIX: &str = "Vss";

static NON_IDENT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static regex"));

/// One generated top-level type (one output file).
#[derive(Debug, Clone, Serialize)]
pub struct EmissionUnit {
    pub name: String,
    pub node: ResolvedNode,
    pub children: Vec<ChildRef>,     // registry order
    pub nested: Vec<NestedType>,     // colliding children, same order
    pub parent: Option<ParentRef>,   // None for the root
}

/// A colliding node declared inside the scope of the type that owns it.
///
/// `implicit` types stand for path segments with no entry in the definitions;
/// they only exist to give a colliding descendant its own scope.
#[derive(Debug, Clone, Serialize)]
pub struct NestedType {
    pub name: String,
    pub node: ResolvedNode,
    pub children: Vec<ChildRef>,
    pub nested: Vec<NestedType>,
    pub implicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Unit,   // separate top-level type, referenced by name
    Nested, // declared in the owner's scope
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRef {
    pub kind: ChildKind,
    pub name: String,
    pub path: String,
}

/// Parent of a top-level unit: the owning unit plus the nested types inside
/// it that lead to the actual parent (empty when the unit itself is the parent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub unit: String,
    pub nested: Vec<String>,
}

impl ParentRef {
    /// Type name of the actual parent.
    pub fn type_name(&self) -> &str {
        self.nested.last().unwrap_or(&self.unit)
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unit)?;
        for name in &self.nested {
            write!(f, ".{name}")?;
        }
        Ok(())
    }
}

/// Deterministic type name of the node at `path`.
pub fn type_name(path: &str) -> GenResult<String> {
    let leaf = crate::registry::leaf(path);
    if leaf.is_empty() {
        return Err(GenError::Invariant(format!("no type name can be derived from '{path}'")));
    }
    Ok(format!("{TYPE_NAME_PREFIX}{}", NON_IDENT_CHARS.replace_all(leaf, "_")))
}
