//! VSS definition parsers.
//!
//! Each supported source format turns one definition file into a flat,
//! document-ordered list of [`RawNodeRecord`]s keyed by dotted path. Parsers
//! are stateless and consume the whole file.
pub mod json;
pub mod yaml;

use crate::error::{GenError, GenResult};
use serde::Serialize;
use std::path::Path;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Root of every VSS tree.
pub const ROOT_KEY_VEHICLE: &str = "Vehicle";

/// Container holding the child nodes of a branch in the JSON layout.
pub const KEY_CHILDREN: &str = "children";

/// Metadata attributes a VSS entry may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VssDataKey {
    Uuid,
    Type,
    Description,
    Comment,
    Datatype,
    Unit,
    Min,
    Max,
}

impl VssDataKey {
    pub const ALL: &'static [VssDataKey] = &[
        VssDataKey::Uuid,
        VssDataKey::Type,
        VssDataKey::Description,
        VssDataKey::Comment,
        VssDataKey::Datatype,
        VssDataKey::Unit,
        VssDataKey::Min,
        VssDataKey::Max,
    ];

    /// Spelling of the key in source files.
    pub fn key(&self) -> &'static str {
        match self {
            VssDataKey::Uuid => "uuid",
            VssDataKey::Type => "type",
            VssDataKey::Description => "description",
            VssDataKey::Comment => "comment",
            VssDataKey::Datatype => "datatype",
            VssDataKey::Unit => "unit",
            VssDataKey::Min => "min",
            VssDataKey::Max => "max",
        }
    }

    pub fn find_by_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.key() == key)
    }
}

/// One VSS entry exactly as read from a definition file. Absent optional
/// attributes are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawNodeRecord {
    pub path: String,
    pub uuid: String,
    pub node_kind: String,
    pub description: String,
    pub comment: String,
    pub datatype: String,
    pub unit: String,
    pub min: String,
    pub max: String,
}

impl RawNodeRecord {
    /// Build a record from a lookup over attribute keys. A missing or empty
    /// `type` is the one hard failure shared by every format.
    pub(crate) fn from_attributes(
        path: String,
        mut lookup: impl FnMut(VssDataKey) -> String,
    ) -> Result<Self, String> {
        let node_kind = lookup(VssDataKey::Type);
        if node_kind.is_empty() {
            return Err(format!("could not parse '{}' for '{path}'", VssDataKey::Type.key()));
        }
        Ok(Self {
            uuid: lookup(VssDataKey::Uuid),
            description: lookup(VssDataKey::Description),
            comment: lookup(VssDataKey::Comment),
            datatype: lookup(VssDataKey::Datatype),
            unit: lookup(VssDataKey::Unit),
            min: lookup(VssDataKey::Min),
            max: lookup(VssDataKey::Max),
            node_kind,
            path,
        })
    }
}

/// Supported definition formats, each with the file extensions it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SourceFormat {
    pub const ALL: &'static [SourceFormat] = &[SourceFormat::Json, SourceFormat::Yaml];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Json => &["json"],
            SourceFormat::Yaml => &["yml", "yaml"],
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.extensions().contains(&extension))
    }

    /// Dispatch on the text after the last dot of the file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        Self::from_extension(extension)
    }

    /// Read and parse one definition file.
    pub fn parse_nodes(&self, file: &Path) -> GenResult<Vec<RawNodeRecord>> {
        let source = std::fs::read_to_string(file).map_err(|e| GenError::io(file, e))?;
        let parsed = match self {
            SourceFormat::Json => json::parse_str(&source, VssDataKey::ALL),
            SourceFormat::Yaml => yaml::parse_str(&source),
        };
        parsed.map_err(|cause| GenError::format(file, cause))
    }
}

/// Parse a file whose format is picked from its extension.
pub fn parse_file(file: &Path) -> GenResult<Vec<RawNodeRecord>> {
    let format = SourceFormat::from_path(file).ok_or_else(|| {
        GenError::Configuration(format!(
            "file extension of '{}' is not supported",
            file.display()
        ))
    })?;
    format.parse_nodes(file)
}
