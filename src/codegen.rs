//! Rust rendering of the emission model.
//!
//! Layout of a generated module:
//! - `mod.rs` declares one submodule per unit, re-exports the unit types and
//!   defines the `VssNode`/`VssChild` traits the units implement.
//! - `<vss_unit>.rs` holds the unit type. Nested types of a unit sit next to
//!   it in the file; nested types of a nested type `VssX` go into `pub mod vss_x`.
use crate::datatype::ValueType;
use crate::error::{GenError, GenResult};
use crate::ir::{ChildKind, ChildRef, EmissionUnit, NestedType};
use crate::parser::VssDataKey;
use crate::property::ResolvedNode;
use convert_case::{Case, Casing};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

pub const GENERATED_HEADER: &str = "// @generated by vss-codegen from VSS definitions. Do not edit.";
pub const INDEX_FILE: &str = "mod.rs";

const NODE_TRAIT: &str = "VssNode";
const CHILD_TRAIT: &str = "VssChild";
const VALUE_FIELD: &str = "value";

static NON_IDENT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_]").expect("static regex"));

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "super", "_"];

/// A rendered output file, relative to the module directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub file_name: String,
    pub contents: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IDENTIFIERS
// ————————————————————————————————————————————————————————————————————————————

/// Module (and file stem) for a type: `VssIsBrokenDown` → `vss_is_broken_down`.
pub fn module_ident(type_name: &str) -> String {
    snake(type_name)
}

/// Field name of a child in its owner: snake_case leaf, keyword-safe.
pub fn field_ident(path: &str) -> String {
    let mut ident = snake(crate::registry::leaf(path));
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident == VALUE_FIELD {
        return format!("{ident}_node");
    }
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        return format!("{ident}_");
    }
    if RUST_KEYWORDS.contains(&ident.as_str()) {
        return format!("r#{ident}");
    }
    ident
}

fn snake(name: &str) -> String {
    let snake = name.to_case(Case::Snake);
    NON_IDENT_CHARS.replace_all(&snake, "_").into_owned()
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

/// Render one top-level unit into its own file. Fails when two items of one
/// scope would get the same identifier.
pub fn render_unit(unit: &EmissionUnit) -> GenResult<RenderedFile> {
    let decl = TypeDecl::from(unit);
    check_identifiers(&decl, &mut Scope::new(Some(&decl)))?;
    let mut cg = Codegen::new();
    cg.emit_unit(unit);
    Ok(RenderedFile {
        file_name: format!("{}.rs", module_ident(&unit.name)),
        contents: cg.into_string(),
    })
}

/// Render the module index for a set of units.
pub fn render_index(units: &[EmissionUnit], module: &str) -> RenderedFile {
    let mut cg = Codegen::new();
    cg.emit_index(units, module);
    RenderedFile {
        file_name: INDEX_FILE.to_string(),
        contents: cg.into_string(),
    }
}

/// Borrowed view shared by units and nested types.
struct TypeDecl<'a> {
    name: &'a str,
    node: &'a ResolvedNode,
    children: &'a [ChildRef],
    nested: &'a [NestedType],
    is_unit: bool,
    implicit: bool,
}

impl<'a> From<&'a EmissionUnit> for TypeDecl<'a> {
    fn from(unit: &'a EmissionUnit) -> Self {
        Self {
            name: &unit.name,
            node: &unit.node,
            children: &unit.children,
            nested: &unit.nested,
            is_unit: true,
            implicit: false,
        }
    }
}

impl<'a> From<&'a NestedType> for TypeDecl<'a> {
    fn from(nested: &'a NestedType) -> Self {
        Self {
            name: &nested.name,
            node: &nested.node,
            children: &nested.children,
            nested: &nested.nested,
            is_unit: false,
            implicit: nested.implicit,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NAME CHECKS
// ————————————————————————————————————————————————————————————————————————————

/// Type and module names declared in one Rust scope, with the VSS path that
/// claimed each.
struct Scope<'a> {
    types: HashMap<String, &'a str>,
    modules: HashMap<String, &'a str>,
}

impl<'a> Scope<'a> {
    /// A unit file scope also holds the unit type itself.
    fn new(unit: Option<&TypeDecl<'a>>) -> Self {
        let mut types = HashMap::new();
        if let Some(unit) = unit {
            types.insert(unit.name.to_string(), unit.node.path.as_str());
        }
        Self { types, modules: HashMap::new() }
    }

    fn claim(names: &mut HashMap<String, &'a str>, what: &str, name: String, path: &'a str) -> GenResult<()> {
        match names.get(&name) {
            Some(other) => Err(clash(what, &name, other, path)),
            None => {
                names.insert(name, path);
                Ok(())
            }
        }
    }
}

fn clash(what: &str, name: &str, first: &str, second: &str) -> GenError {
    GenError::Invariant(format!("'{first}' and '{second}' both map to {what} `{name}`"))
}

/// Reject duplicate field identifiers of `decl`, and duplicate type or
/// module identifiers among the nested types it declares into `scope`.
fn check_identifiers<'a>(decl: &TypeDecl<'a>, scope: &mut Scope<'a>) -> GenResult<()> {
    let mut fields = HashMap::new();
    fields.insert(VALUE_FIELD.to_string(), decl.node.path.as_str());
    for child in decl.children {
        Scope::claim(&mut fields, "field", field_ident(&child.path), &child.path)?;
    }
    for nested in decl.nested {
        let nested = TypeDecl::from(nested);
        Scope::claim(&mut scope.types, "type", nested.name.to_string(), &nested.node.path)?;
        if !nested.nested.is_empty() {
            // Holds the nested types of `nested`.
            Scope::claim(&mut scope.modules, "module", module_ident(nested.name), &nested.node.path)?;
        }
        check_identifiers(&nested, &mut Scope::new(None))?;
    }
    Ok(())
}

/// Line-oriented source builder.
#[derive(Debug, Default)]
pub struct Codegen {
    out: String,
    indent: usize,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    pub fn emit_unit(&mut self, unit: &EmissionUnit) {
        self.line(GENERATED_HEADER);
        self.line(&format!("//! `{}`", unit.node.path));
        self.blank();

        let parent = unit.parent.as_ref().map(|parent| {
            // From the unit file: up to the index, into the owner's file, down the nested chain.
            let mut path = format!("super::{}::", module_ident(&parent.unit));
            if let Some((_, through)) = parent.nested.split_last() {
                for name in through {
                    path.push_str(&module_ident(name));
                    path.push_str("::");
                }
            }
            path.push_str(parent.type_name());
            path
        });
        self.emit_type(&TypeDecl::from(unit), 0, parent.as_deref());
    }

    pub fn emit_index(&mut self, units: &[EmissionUnit], module: &str) {
        self.line(GENERATED_HEADER);
        self.line(&format!("//! VSS node model `{module}`."));
        self.blank();
        for unit in units {
            self.line(&format!("pub mod {};", module_ident(&unit.name)));
        }
        if !units.is_empty() {
            self.blank();
        }
        for unit in units {
            self.line(&format!("pub use {}::{};", module_ident(&unit.name), unit.name));
        }
        if !units.is_empty() {
            self.blank();
        }
        self.line("/// Common view over every generated VSS node.");
        self.open(&format!("pub trait {NODE_TRAIT} {{"));
        self.line("/// Dotted VSS path of the node.");
        self.line("fn vss_path(&self) -> &'static str;");
        self.blank();
        self.line("/// Child nodes, in definition order.");
        self.line(&format!("fn children(&self) -> Vec<&dyn {NODE_TRAIT}>;"));
        self.close("}");
        self.blank();
        self.line("/// Links a node type to the type of its parent node.");
        self.open(&format!("pub trait {CHILD_TRAIT} {{"));
        self.line(&format!("type Parent: {NODE_TRAIT};"));
        self.close("}");
    }

    /// Emit a type and everything declared in its scope. `depth` counts the
    /// `pub mod` levels between the unit file and the current scope.
    fn emit_type(&mut self, decl: &TypeDecl<'_>, depth: usize, parent: Option<&str>) {
        let root = "super::".repeat(depth + 1);
        let value_type = decl.node.value_type();
        let fields: Vec<(String, String)> = decl
            .children
            .iter()
            .map(|child| (field_ident(&child.path), self.child_type(decl, child, &root)))
            .collect();

        self.emit_docs(decl.node);
        if decl.implicit {
            self.doc("Implicit branch: this path has no entry of its own in the definitions.");
        }
        self.line("#[derive(Debug, Clone, PartialEq)]");
        self.open(&format!("pub struct {} {{", decl.name));
        self.line(&format!("pub {VALUE_FIELD}: {},", value_type.rust_type()));
        for (field, ty) in &fields {
            self.line(&format!("pub {field}: {ty},"));
        }
        self.close("}");
        self.blank();

        self.emit_consts(decl, value_type);
        self.blank();

        self.open(&format!("impl Default for {} {{", decl.name));
        self.open("fn default() -> Self {");
        self.open("Self {");
        self.line(&format!("{VALUE_FIELD}: {},", value_type.default_expr()));
        for (field, _) in &fields {
            self.line(&format!("{field}: Default::default(),"));
        }
        self.close("}");
        self.close("}");
        self.close("}");
        self.blank();

        self.open(&format!("impl {root}{NODE_TRAIT} for {} {{", decl.name));
        self.open("fn vss_path(&self) -> &'static str {");
        self.line("Self::VSS_PATH");
        self.close("}");
        self.blank();
        self.open(&format!("fn children(&self) -> Vec<&dyn {root}{NODE_TRAIT}> {{"));
        if fields.is_empty() {
            self.line("Vec::new()");
        } else {
            self.open("vec![");
            for (field, _) in &fields {
                self.line(&format!("&self.{field} as &dyn {root}{NODE_TRAIT},"));
            }
            self.close("]");
        }
        self.close("}");
        self.close("}");

        if let Some(parent) = parent {
            self.blank();
            self.open(&format!("impl {root}{CHILD_TRAIT} for {} {{", decl.name));
            self.line(&format!("type Parent = {parent};"));
            self.close("}");
        }

        self.emit_scope(decl, depth);
    }

    fn emit_scope(&mut self, decl: &TypeDecl<'_>, depth: usize) {
        if decl.nested.is_empty() {
            return;
        }
        if decl.is_unit {
            for nested in decl.nested {
                self.blank();
                self.emit_type(&TypeDecl::from(nested), depth, Some(decl.name));
            }
            return;
        }
        let parent = format!("super::{}", decl.name);
        self.blank();
        self.open(&format!("pub mod {} {{", module_ident(decl.name)));
        for (i, nested) in decl.nested.iter().enumerate() {
            if i > 0 {
                self.blank();
            }
            self.emit_type(&TypeDecl::from(nested), depth + 1, Some(parent.as_str()));
        }
        self.close("}");
    }

    fn child_type(&self, owner: &TypeDecl<'_>, child: &ChildRef, root: &str) -> String {
        match child.kind {
            ChildKind::Unit => format!("{root}{}::{}", module_ident(&child.name), child.name),
            ChildKind::Nested if owner.is_unit => child.name.clone(),
            ChildKind::Nested => format!("{}::{}", module_ident(owner.name), child.name),
        }
    }

    fn emit_docs(&mut self, node: &ResolvedNode) {
        let description = node.properties.value(VssDataKey::Description);
        let comment = node.properties.value(VssDataKey::Comment);
        for line in description.into_iter().flat_map(str::lines) {
            self.doc(line);
        }
        if let Some(comment) = comment {
            if description.is_some() {
                self.doc("");
            }
            for line in comment.lines() {
                self.doc(line);
            }
        }
    }

    fn emit_consts(&mut self, decl: &TypeDecl<'_>, value_type: ValueType) {
        let node = decl.node;
        self.open(&format!("impl {} {{", decl.name));
        self.str_const("VSS_PATH", &node.path);
        self.str_const("UUID", node.uuid());
        self.str_const("NODE_KIND", node.node_kind());
        for (name, key) in [
            ("DESCRIPTION", VssDataKey::Description),
            ("COMMENT", VssDataKey::Comment),
            ("UNIT", VssDataKey::Unit),
            ("DATATYPE", VssDataKey::Datatype),
        ] {
            if let Some(value) = node.properties.value(key) {
                self.str_const(name, value);
            }
        }
        for (name, key) in [("MIN", VssDataKey::Min), ("MAX", VssDataKey::Max)] {
            let Some(raw) = node.properties.value(key) else {
                continue;
            };
            match (value_type.bound_type(), value_type.bound_literal(raw)) {
                (Some(ty), Some(literal)) => self.line(&format!("pub const {name}: {ty} = {literal};")),
                _ => tracing::warn!(
                    path = %node.path,
                    bound = name,
                    raw,
                    value_type = %value_type,
                    "bound does not fit the value type, omitting it"
                ),
            }
        }
        self.close("}");
    }

    fn str_const(&mut self, name: &str, value: &str) {
        self.line(&format!("pub const {name}: &'static str = {value:?};"));
    }

    // -------------------- low-level writers --------------------

    fn doc(&mut self, text: &str) {
        let text = text.trim_end();
        if text.is_empty() {
            self.line("///");
        } else {
            self.line(&format!("/// {text}"));
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }
}
