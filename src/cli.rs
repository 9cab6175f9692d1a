//! Minimal CLI: infer → (schema | rust), plus schema/swagger document import.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use crate::model::FieldType;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer structure from JSON/NDJSON samples and emit a schema document or a
/// strict Rust model
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and print the interchange schema document
    Schema(SchemaOut),
    /// infer and emit a strict Rust data model
    Rust(RustOut),
    /// rebuild a model from an exported schema document and emit Rust
    Convert(ConvertOut),
    /// import response models from a Swagger/OpenAPI document
    Swagger(SwaggerOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0)
    #[arg(long)]
    json_pointer: Option<String>,

    /// mark every nested field and element optional, whatever the samples say
    #[arg(long, default_value_t = false)]
    all_optional: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// top-level model name
    #[arg(long, default_value = "Root")]
    name: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// top-level Rust type name
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConvertOut {
    /// a schema document previously produced by `schema`
    #[arg(long, short)]
    input: PathBuf,

    /// top-level Rust type name
    #[arg(long, default_value = "Root")]
    root_type: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SwaggerOut {
    /// a Swagger 2.0 document
    #[arg(long, short)]
    input: PathBuf,

    /// output directory for per-response schema documents (stdout if omitted)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_values(&self) -> Result<Vec<Value>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut values = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            if self.ndjson {
                for (index, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str::<Value>(line).with_context(|| {
                        format!("{}:{}: invalid JSON", source_path.display(), index + 1)
                    })?;
                    self.select(value, &source_path, &mut values);
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("{}: invalid JSON", source_path.display()))?;
                self.select(value, &source_path, &mut values);
            }
        }
        Ok(values)
    }

    fn select(&self, value: Value, source_path: &Path, out: &mut Vec<Value>) {
        match &self.json_pointer {
            None => out.push(value),
            Some(pointer) => match value.pointer(pointer) {
                Some(selected) => out.push(selected.clone()),
                None => {
                    eprintln!(
                        "{} {}: no value at pointer {pointer}, document skipped",
                        "warning:".yellow().bold(),
                        source_path.display()
                    );
                }
            },
        }
    }

    fn infer(&self) -> Result<FieldType> {
        let values = self.load_values()?;
        if values.is_empty() {
            bail!("no input documents");
        }
        // decode is pure and merge is associative/commutative, so samples can
        // decode in parallel and fold as a tree reduction
        let ty = values
            .par_iter()
            .map(crate::decode::decode)
            .reduce(|| FieldType::Unknown(None), crate::merge::merge);
        Ok(if self.all_optional {
            crate::optional::deepen(ty)
        } else {
            ty
        })
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                let ty = target.input_settings.infer()?;
                let outputs = crate::schema::translate(&ty, &target.name);
                write_single(&outputs, target.out.as_deref())
            }
            Command::Rust(target) => {
                let ty = target.input_settings.infer()?;
                let outputs = crate::codegen::translate(&ty, &target.root_type);
                write_single(&outputs, target.out.as_deref())
            }
            Command::Convert(target) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let doc = crate::path_de::from_str_with_path::<crate::schema::SchemaDoc>(&source)
                    .with_context(|| format!("{}: not a schema document", target.input.display()))?;
                let ty = crate::schema::import(&doc)
                    .with_context(|| format!("{}: schema import failed", target.input.display()))?;
                let outputs = crate::codegen::translate(&ty, &target.root_type);
                write_single(&outputs, target.out.as_deref())
            }
            Command::Swagger(target) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let doc = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("{}: invalid JSON", target.input.display()))?;
                let models = crate::swagger::import_document(&doc)
                    .with_context(|| format!("{}: swagger import failed", target.input.display()))?;
                if models.is_empty() {
                    eprintln!(
                        "{} {}: no response schemas found",
                        "warning:".yellow().bold(),
                        target.input.display()
                    );
                }
                for model in &models {
                    let outputs = crate::schema::translate(&model.ty, &model.model_name());
                    match target.out_dir.as_deref() {
                        Some(dir) => {
                            for (file_name, content) in &outputs {
                                write_file(&dir.join(file_name), content)?;
                            }
                        }
                        None => {
                            for (file_name, content) in &outputs {
                                println!("// {file_name}");
                                println!("{content}");
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_single(outputs: &[(String, String)], out: Option<&Path>) -> Result<()> {
    for (_, content) in outputs {
        match out {
            Some(path) => write_file(path, content)?,
            None => println!("{content}"),
        }
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
