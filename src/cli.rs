//! CLI: VSS definitions → (generated Rust module | model dump)
use std::path::{Path, PathBuf};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use vss_codegen::config::{GeneratorConfig, Overrides};
use vss_codegen::generator;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate strongly-typed Rust node types from VSS definition files (JSON/YAML)
#[derive(Parser, Debug)]
#[command(name = "vss-codegen", version)]
pub struct CommandLineInterface {
    /// log debug output (RUST_LOG takes precedence)
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate the model module, replacing any previous output
    Generate(GenerateOut),
    /// build the logical model and print it as JSON
    Inspect(InspectOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// directory searched recursively for .json/.yml/.yaml definitions
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// optional TOML settings file (keys: input, out, module)
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory; the module is written to <out>/<module>/
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// name of the generated module directory
    #[arg(long)]
    module: Option<String>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn resolve(&self, out: Option<&PathBuf>, module: Option<&String>) -> anyhow::Result<GeneratorConfig> {
        let overrides = Overrides {
            input: self.input.clone(),
            out: out.cloned(),
            module: module.cloned(),
        };
        let config = GeneratorConfig::load(self.config.as_deref(), overrides)?;
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let config = target
                    .input_settings
                    .resolve(target.out.as_ref(), target.module.as_ref())?;

                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    eprintln!("{config:#?}");
                    return Ok(())
                }

                let report = generator::generate(&config)?;
                eprintln!(
                    "{} {} types from {} nodes ({} files) into {}",
                    "generated".green().bold(),
                    report.units,
                    report.nodes,
                    report.inputs.len(),
                    report.module_dir.display(),
                );
                Ok(())
            }
            Command::Inspect(target) => {
                let config = target.input_settings.resolve(None, None)?;
                let model = generator::build_model(&config.input_dir)?;
                let json_src = serde_json::to_string_pretty(&model.units)
                    .context("failed to serialize the model")?;
                match target.out.as_ref() {
                    Some(out) => write_file(out, &json_src),
                    None => {
                        println!("{json_src}");
                        Ok(())
                    }
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_file(out: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}
