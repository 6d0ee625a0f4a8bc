//! Generator settings: optional TOML file merged with command line values.
use crate::error::{GenError, GenResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_DIR: &str = "vss";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";
pub const DEFAULT_MODULE: &str = "vss";

static MODULE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("static regex"));

/// On-disk settings. Every key is optional.
///
/// ```toml
/// input = "vss"
/// out = "src/generated"
/// module = "vss"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub input: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub module: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> GenResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| GenError::io(path, e))?;
        Self::parse(&source)
            .map_err(|e| GenError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn parse(source: &str) -> Result<Self, String> {
        crate::path_de::from_toml_str_with_path(source)
    }
}

/// Values given on the command line; these take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub module: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub module: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Merge `overrides` over `file` over the defaults.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> GenResult<Self> {
        let defaults = Self::default();
        let config = Self {
            input_dir: overrides.input.or(file.input).unwrap_or(defaults.input_dir),
            output_dir: overrides.out.or(file.out).unwrap_or(defaults.output_dir),
            module: overrides.module.or(file.module).unwrap_or(defaults.module),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read the optional config file, then apply `overrides`.
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> GenResult<Self> {
        let file = match config_file {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, overrides)
    }

    /// Directory the generated module is written to.
    pub fn module_dir(&self) -> PathBuf {
        self.output_dir.join(&self.module)
    }

    fn validate(&self) -> GenResult<()> {
        if !MODULE_NAME.is_match(&self.module) {
            return Err(GenError::Configuration(format!(
                "module name '{}' is not a valid Rust module identifier",
                self.module
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = GeneratorConfig::resolve(ConfigFile::default(), Overrides::default()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.module_dir(), PathBuf::from("generated/vss"));
    }

    #[test]
    fn flags_override_file_values() {
        let file = ConfigFile::parse("input = \"defs\"\nout = \"src/gen\"\nmodule = \"signals\"\n").unwrap();
        let overrides = Overrides { out: Some("target/gen".into()), ..Overrides::default() };
        let config = GeneratorConfig::resolve(file, overrides).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("defs"));
        assert_eq!(config.output_dir, PathBuf::from("target/gen"));
        assert_eq!(config.module, "signals");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConfigFile::parse("outdir = \"x\"\n").unwrap_err();
        assert!(err.contains("outdir"), "{err}");
    }

    #[test]
    fn mistyped_values_name_the_key() {
        let err = ConfigFile::parse("module = 3\n").unwrap_err();
        assert!(err.contains("module"), "{err}");
    }

    #[test]
    fn module_must_be_an_identifier() {
        let overrides = Overrides { module: Some("my-module".into()), ..Overrides::default() };
        let err = GeneratorConfig::resolve(ConfigFile::default(), overrides).unwrap_err();
        assert!(matches!(err, GenError::Configuration(_)));
    }

    #[test]
    fn loading_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vss-codegen.toml");
        std::fs::write(&path, "module = \"car\"\n").unwrap();
        let config = GeneratorConfig::load(Some(&path), Overrides::default()).unwrap();
        assert_eq!(config.module, "car");
    }
}
