//! Typed model generation for Vehicle Signal Specification (VSS) trees.
//!
//! Definition files (JSON or YAML) are flattened into path records, resolved
//! into typed property sets, deduplicated into a [`registry::PathRegistry`],
//! linked into a hierarchy of [`ir::EmissionUnit`]s and rendered as one Rust
//! source file per unit. [`generator::generate`] runs the whole pipeline.
pub mod codegen;
pub mod config;
pub mod datatype;
pub mod error;
pub mod generator;
pub mod ir;
pub mod lower;
pub mod parser;
pub mod path_de;
pub mod property;
pub mod registry;

pub use error::{GenError, GenResult};
