//! The ktsyntax Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands. It loads the
//! config, layers flags over it and dispatches to the library.

use std::path::Path;
use std::process;

use clap::Parser;
use termcolor::Color;

use crate::cli::args::{Command, KtArgs};
use crate::cli::output::Output;
use crate::config::{Config, OutputFormat};
use crate::discovery::{discover_sources, parse_all};
use crate::errors::{print_error, read_source, KtError};
use crate::schema::{builtin, validate_schema_str, Schema};
use crate::tree::{render_tree, SyntaxTree, TreeDump};

pub mod args;
pub mod diagnostics;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = KtArgs::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    };
    let color = args.color.unwrap_or(config.color);
    let mut out = Output::new(color.into(), args.verbose);

    // Ok(false) means the command ran but found problems worth a failing exit.
    let result = match args.command {
        Command::Check { schema } => handle_check(&mut out, &schema),
        Command::Slots { production, schema } => {
            handle_slots(&mut out, &config, schema.as_deref(), production.as_deref())
        }
        Command::Parse {
            path,
            format,
            schema,
            threads,
        } => {
            let format = format.unwrap_or(config.format);
            let threads = threads.unwrap_or(config.threads);
            handle_parse(&mut out, &config, schema.as_deref(), &path, format, threads)
        }
        Command::Fingerprint { schema } => handle_fingerprint(&mut out, &config, schema.as_deref()),
        Command::Diff { old, new } => handle_diff(&mut out, &old, &new),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}

// ============================================================================
// SCHEMA COMMANDS
// ============================================================================

fn handle_check(out: &mut Output, path: &Path) -> Result<bool, KtError> {
    let text = read_source(path)?;
    let name = schema_name(path);
    out.progress("Checking", &path.display().to_string());
    let report = validate_schema_str(&name, &text)?;
    out.print_report(&name, &report);
    Ok(report.is_valid())
}

fn handle_slots(
    out: &mut Output,
    config: &Config,
    schema: Option<&Path>,
    production: Option<&str>,
) -> Result<bool, KtError> {
    let schema = load_schema(out, schema.or(config.schema.as_deref()))?;
    match production {
        Some(name) => out.print_slots(schema.production(name)?),
        None => {
            for production in schema.productions() {
                out.print_slots(production);
            }
        }
    }
    Ok(true)
}

fn handle_fingerprint(out: &mut Output, config: &Config, schema: Option<&Path>) -> Result<bool, KtError> {
    let schema = load_schema(out, schema.or(config.schema.as_deref()))?;
    out.print(&format!("{}  {}", schema.fingerprint(), schema.name()));
    Ok(true)
}

fn handle_diff(out: &mut Output, old: &Path, new: &Path) -> Result<bool, KtError> {
    let old_schema = schema_from_file(old)?;
    let new_schema = schema_from_file(new)?;
    if !out.print_changes(&old_schema.canonical(), &new_schema.canonical()) {
        out.status("Unchanged", Color::Green, "accessor contracts are identical");
    }
    Ok(true)
}

// ============================================================================
// PARSE COMMAND
// ============================================================================

fn handle_parse(
    out: &mut Output,
    config: &Config,
    schema: Option<&Path>,
    path: &Path,
    format: OutputFormat,
    threads: usize,
) -> Result<bool, KtError> {
    let schema = load_schema(out, schema.or(config.schema.as_deref()))?;

    // a single file gets the full diagnostic
    if path.is_file() {
        out.progress("Parsing", &path.display().to_string());
        let source = read_source(path)?;
        let tree = crate::parser::parse_with(&schema, &source, &path.display().to_string())?;
        out.print(&format_tree(&tree, format)?);
        return Ok(true);
    }

    let files = discover_sources(path, &config.extensions)?;

    out.progress("Parsing", &format!("{} files under {}", files.len(), path.display()));
    let mut failures = 0;
    for parsed in parse_all(&schema, &files, threads) {
        let display = parsed.path.display().to_string();
        match parsed.result {
            Ok(tree) => {
                out.progress("Parsed", &display);
                if files.len() > 1 && format == OutputFormat::Text {
                    out.print(&format!("// {display}"));
                }
                out.print(&format_tree(&tree, format)?);
            }
            Err(KtError::Parse(error)) => {
                failures += 1;
                let source = read_source(&parsed.path)?;
                let _ = diagnostics::write_compact(out.stderr(), &display, &source, &error);
            }
            Err(other) => {
                failures += 1;
                print_error(other);
            }
        }
    }

    if failures > 0 {
        out.status("Failed", Color::Red, &format!("{failures} of {} files", files.len()));
        return Ok(false);
    }
    out.status("Finished", Color::Green, &format!("{} files parsed", files.len()));
    Ok(true)
}

fn format_tree(tree: &SyntaxTree, format: OutputFormat) -> Result<String, KtError> {
    match format {
        OutputFormat::Text => Ok(render_tree(tree.root())),
        OutputFormat::Json => serde_json::to_string_pretty(&TreeDump::from_node(tree.root()))
            .map_err(|e| KtError::Serialize(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(&TreeDump::from_node(tree.root()))
            .map_err(|e| KtError::Serialize(e.to_string())),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

enum LoadedSchema {
    Builtin(&'static Schema),
    Owned(Box<Schema>),
}

impl std::ops::Deref for LoadedSchema {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        match self {
            LoadedSchema::Builtin(schema) => *schema,
            LoadedSchema::Owned(schema) => schema.as_ref(),
        }
    }
}

fn load_schema(out: &mut Output, path: Option<&Path>) -> Result<LoadedSchema, KtError> {
    match path {
        Some(path) => {
            out.progress("Loading", &path.display().to_string());
            Ok(LoadedSchema::Owned(Box::new(schema_from_file(path)?)))
        }
        None => Ok(LoadedSchema::Builtin(builtin::kotlin()?)),
    }
}

fn schema_from_file(path: &Path) -> Result<Schema, KtError> {
    let text = read_source(path)?;
    Ok(Schema::from_source(&schema_name(path), &text)?)
}

fn schema_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
