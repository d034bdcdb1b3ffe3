//! CLI: model files → (fixtures | node tree)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use rayon::prelude::*;
use tracing::info;

use fixgen::{FixtureError, ModelSpec, Random};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate populated test fixtures from JSON model files
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// populate the root type of each model and print the values as JSON
    Generate(GenerateOut),
    /// print the node tree of each model
    Nodes(NodesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more model files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// number of root values per model
    #[arg(long, short = 'n', default_value_t = 1)]
    count: usize,

    /// seed; overrides the model's `settings.seed`
    #[arg(long)]
    seed: Option<u64>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct NodesOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_models(&self) -> Result<Vec<(PathBuf, ModelSpec)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|e| anyhow::anyhow!("failed to resolve input file paths: {e}"))?;
        source_paths
            .into_iter()
            .map(|path| -> Result<(PathBuf, ModelSpec)> {
                let model = ModelSpec::load(&path)?;
                Ok((path, model))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| format!("fixgen={level}").into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let models = target.input_settings.load_models()?;
                let mut outputs = serde_json::Map::new();
                for (path, model) in &models {
                    let output = target.generate(model).with_context(|| format!("generating {}", path.display()))?;
                    outputs.insert(path.to_string_lossy().to_string(), output);
                }
                let document = match outputs.len() {
                    1 => outputs.into_iter().next().map(|(_, v)| v).unwrap_or_default(),
                    _ => serde_json::Value::Object(outputs),
                };
                let source = if target.compact {
                    serde_json::to_string(&document)?
                } else {
                    serde_json::to_string_pretty(&document)?
                };
                write_output(target.out.as_deref(), &source)
            }
            Command::Nodes(target) => {
                for (path, model) in target.input_settings.load_models()? {
                    let fixture = model.compile().with_context(|| format!("compiling {}", path.display()))?;
                    println!("{}:", path.display());
                    print!("{}", fixture.tree.format_tree());
                }
                Ok(())
            }
        }
    }
}

impl GenerateOut {
    /// One JSON value, or an array of them when `count > 1`. Every root gets
    /// its own compiled context and engine, so roots are built in parallel.
    fn generate(&self, model: &ModelSpec) -> Result<serde_json::Value> {
        let seed = self
            .seed
            .or(model.settings.seed)
            .unwrap_or_else(|| Random::from_entropy().seed());
        info!(seed, count = self.count, root = %model.root, "generating");

        let mut values = (0..self.count)
            .into_par_iter()
            .map(|i| -> Result<serde_json::Value, FixtureError> {
                let fixture = model.compile()?;
                let value = fixture.generate(Random::new(seed.wrapping_add(i as u64)))?;
                Ok(value.to_json())
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        Ok(match values.len() {
            1 => values.pop().unwrap_or_default(),
            _ => serde_json::Value::Array(values),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, source: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, source).with_context(|| format!("writing {}", out.display()))?;
        }
        None => println!("{source}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                match entry {
                    Ok(p) => {
                        matched_any = true;
                        out.push(p);
                    }
                    Err(e) => return Err(Box::new(e)),
                }
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
