//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FrameCheck: constraint discovery and verification for tabular data
#[derive(Parser)]
#[command(name = "framecheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover constraints from a reference data file
    Discover {
        /// Path to the reference data file (CSV/TSV or spreadsheet)
        #[arg(value_name = "DATA")]
        file: PathBuf,

        /// Output path for the constraints (.json or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the parsed column types instead of narrowing them
        #[arg(long)]
        no_optimize: bool,
    },

    /// Verify a data file against stored constraints
    Verify {
        /// Path to the data file to verify
        #[arg(value_name = "DATA")]
        file: PathBuf,

        /// Constraints file (.json or .csv)
        #[arg(short, long)]
        constraints: PathBuf,

        /// Read columns directly as their declared data types
        #[arg(long)]
        enforce_dtypes: bool,

        /// Write the summary table to this CSV file
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Write failing rows to this CSV file
        #[arg(long)]
        evidence: Option<PathBuf>,

        /// Keep the parsed column types instead of narrowing them
        #[arg(long)]
        no_optimize: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run custom rules against a data file
    Custom {
        /// Path to the data file to check
        #[arg(value_name = "DATA")]
        file: PathBuf,

        /// Rules file (.json or .csv)
        #[arg(short, long)]
        rules: PathBuf,

        /// Write matching rows to this CSV file
        #[arg(long)]
        evidence: Option<PathBuf>,
    },

    /// Change constraints of one column in a constraints file
    Modify {
        /// Constraints file (.json or .csv)
        #[arg(value_name = "CONSTRAINTS")]
        constraints: PathBuf,

        /// Column to modify
        #[arg(value_name = "COLUMN")]
        column: String,

        /// Constraint to set, as kind=value (e.g. max_value=100)
        #[arg(short, long = "set", value_name = "KIND=VALUE", required = true)]
        set: Vec<String>,

        /// Output path (default: overwrite the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage a custom rules file
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Add a rule (the file is created if missing)
    Add {
        /// Rules file (.json or .csv)
        #[arg(value_name = "RULES")]
        file: PathBuf,

        /// Rule name
        #[arg(value_name = "NAME")]
        name: String,

        /// Row predicate, e.g. "age > 80 AND status = 'A'"
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Remove every rule with the given name
    Remove {
        /// Rules file (.json or .csv)
        #[arg(value_name = "RULES")]
        file: PathBuf,

        /// Rule name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List the rules in a file
    List {
        /// Rules file (.json or .csv)
        #[arg(value_name = "RULES")]
        file: PathBuf,
    },
}
