use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dotrename - recover names in obfuscated .NET modules from their signatures
#[derive(Debug, Parser)]
#[command(name = "dotrename", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Switches that map onto `RenameConfig`.
#[derive(Debug, Parser)]
pub struct RenameOptions {
    /// Start from the lenient preset (no collision checks, reassignment allowed, no notes).
    #[arg(long)]
    pub lenient: bool,

    /// Leave scanned method bodies in their expanded, macro-free form.
    #[arg(long)]
    pub keep_expanded: bool,

    /// Do not refuse renames that duplicate a type or field name.
    #[arg(long)]
    pub no_collision_checks: bool,

    /// Let later steps overwrite names given by earlier steps.
    #[arg(long)]
    pub allow_reassign: bool,

    /// Do not report base/derived relationships of renamed types.
    #[arg(long)]
    pub no_relationships: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the registered rename catalogs.
    Catalogs,

    /// List the types of a module snapshot.
    Types {
        /// Path to the JSON module snapshot.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Show only types in this namespace ("" for the global namespace).
        #[arg(short, long)]
        namespace: Option<String>,

        /// Show member counts per type.
        #[arg(short, long)]
        members: bool,
    },

    /// Run a catalog over a module snapshot and report every step.
    Apply {
        /// Path to the JSON module snapshot.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Catalog to run.
        #[arg(short, long, default_value = "sdtd")]
        catalog: String,

        /// Write the rename map (JSON) to this file.
        #[arg(short, long, value_name = "FILE")]
        map: Option<PathBuf>,

        /// Only list steps that did not apply.
        #[arg(long)]
        failures: bool,

        #[command(flatten)]
        options: RenameOptions,
    },
}
