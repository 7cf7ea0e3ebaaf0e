//! Defines the command-line arguments and subcommands for the ktsyntax CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{ColorMode, OutputFormat};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "ktsyntax",
    version,
    about = "Schema-driven syntax trees for a Kotlin expression grammar."
)]
pub struct KtArgs {
    /// Config file (defaults to ./ktsyntax.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// When to color output.
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorMode>,

    /// Print progress lines to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a schema file and report errors, warnings and suggestions.
    Check {
        /// The schema file to validate.
        #[arg(required = true)]
        schema: PathBuf,
    },
    /// Print the slot table of one production, or of every production.
    Slots {
        /// Production name; all productions when omitted.
        production: Option<String>,
        /// Schema file to use instead of the built-in Kotlin schema.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Parse a source file, or every source file under a directory.
    Parse {
        /// File or directory to parse.
        #[arg(required = true)]
        path: PathBuf,
        /// Output format for the tree.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Schema file to use instead of the built-in Kotlin schema.
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Parser threads for directories (0 = all cores).
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the SHA-256 fingerprint of a schema's accessor contract.
    Fingerprint {
        /// Schema file to use instead of the built-in Kotlin schema.
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Diff the canonical forms of two schemas.
    Diff {
        #[arg(required = true)]
        old: PathBuf,
        #[arg(required = true)]
        new: PathBuf,
    },
}
