//! Pipeline driver: discover → parse → register → lower → render → write.
//!
//! Output is written all-or-nothing. Files are rendered in memory first, then
//! staged in a temporary directory next to the module directory and swapped in
//! with a rename, so a failed run leaves any previous output untouched.
use crate::codegen::{RenderedFile, render_index, render_unit};
use crate::config::GeneratorConfig;
use crate::error::{GenError, GenResult};
use crate::ir::EmissionUnit;
use crate::lower::lower_to_ir;
use crate::parser::{SourceFormat, parse_file};
use crate::property::ResolvedNode;
use crate::registry::PathRegistry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const STAGING_PREFIX: &str = ".vss-codegen-";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub inputs: Vec<PathBuf>,
    pub nodes: usize,
    pub units: usize,
    pub module_dir: PathBuf,
    pub files: Vec<String>,
}

/// Logical model of one input directory, before rendering.
#[derive(Debug, Clone)]
pub struct Model {
    pub inputs: Vec<PathBuf>,
    pub registry: PathRegistry,
    pub units: Vec<EmissionUnit>,
}

// ————————————————————————————————————————————————————————————————————————————
// PIPELINE
// ————————————————————————————————————————————————————————————————————————————

/// Run the whole pipeline and replace the configured module directory.
pub fn generate(config: &GeneratorConfig) -> GenResult<GenerationReport> {
    let model = build_model(&config.input_dir)?;
    let files = render(&model.units, &config.module)?;
    let module_dir = config.module_dir();
    write_module(&module_dir, &files)?;
    tracing::info!(
        units = model.units.len(),
        module_dir = %module_dir.display(),
        "generated VSS models"
    );
    Ok(GenerationReport {
        inputs: model.inputs,
        nodes: model.registry.len(),
        units: model.units.len(),
        module_dir,
        files: files.into_iter().map(|f| f.file_name).collect(),
    })
}

/// Discover, parse and link every definition file under `input_dir`.
pub fn build_model(input_dir: &Path) -> GenResult<Model> {
    let inputs = discover_inputs(input_dir)?;
    let registry = load_registry(&inputs)?;
    if registry.is_empty() {
        return Err(GenError::Configuration(format!(
            "definition files in '{}' declare no VSS nodes",
            input_dir.display()
        )));
    }
    let units = lower_to_ir(&registry)?;
    Ok(Model { inputs, registry, units })
}

/// Supported definition files under `dir`, recursively, sorted by path.
pub fn discover_inputs(dir: &Path) -> GenResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GenError::Configuration(format!(
            "VSS definition directory '{}' does not exist",
            dir.display()
        )));
    }
    let pattern = format!(
        "{}/**/*",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| GenError::Configuration(format!("bad search pattern '{pattern}': {e}")))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            GenError::io(path, std::io::Error::from(e))
        })?;
        if !path.is_file() {
            continue;
        }
        if SourceFormat::from_path(&path).is_some() {
            inputs.push(path);
        } else {
            tracing::warn!(file = %path.display(), "ignoring file with unsupported extension");
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        let extensions = SourceFormat::ALL
            .iter()
            .flat_map(|f| f.extensions())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        return Err(GenError::Configuration(format!(
            "no VSS definition files ({extensions}) found in '{}'",
            dir.display()
        )));
    }
    Ok(inputs)
}

/// Parse and resolve all files in order, then deduplicate by path.
pub fn load_registry(files: &[PathBuf]) -> GenResult<PathRegistry> {
    let mut nodes = Vec::new();
    for file in files {
        let records = parse_file(file)?;
        tracing::info!(file = %file.display(), nodes = records.len(), "parsed VSS definitions");
        nodes.extend(records.iter().map(ResolvedNode::resolve));
    }
    Ok(PathRegistry::register(nodes))
}

/// Render every unit plus the module index.
pub fn render(units: &[EmissionUnit], module: &str) -> GenResult<Vec<RenderedFile>> {
    let mut files = units.iter().map(render_unit).collect::<GenResult<Vec<_>>>()?;
    files.push(render_index(units, module));

    let mut seen = HashSet::new();
    for file in &files {
        if !seen.insert(file.file_name.as_str()) {
            return Err(GenError::Invariant(format!(
                "two generated units share the file name '{}'",
                file.file_name
            )));
        }
    }
    Ok(files)
}

/// Replace `module_dir` with exactly `files`.
pub fn write_module(module_dir: &Path, files: &[RenderedFile]) -> GenResult<()> {
    let parent = match module_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| GenError::io(&parent, e))?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(&parent)
        .map_err(|e| GenError::io(&parent, e))?;
    for file in files {
        let path = staging.path().join(&file.file_name);
        std::fs::write(&path, &file.contents).map_err(|e| GenError::io(&path, e))?;
    }

    if module_dir.exists() {
        std::fs::remove_dir_all(module_dir).map_err(|e| GenError::io(module_dir, e))?;
    }
    std::fs::rename(staging.path(), module_dir).map_err(|e| GenError::io(module_dir, e))?;
    // `staging` now points at a moved directory; dropping it is a no-op.
    Ok(())
}
