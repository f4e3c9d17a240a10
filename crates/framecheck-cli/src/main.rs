//! FrameCheck CLI - constraint discovery and verification for tabular data.

mod cli;
mod commands;
mod logging;
mod render;

use clap::Parser;
use cli::{Cli, Commands};
use commands::verify::VerifyArgs;
use logging::LogConfig;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose));

    let result = match cli.command {
        Commands::Discover {
            file,
            output,
            no_optimize,
        } => commands::discover::run(file, output, no_optimize),

        Commands::Verify {
            file,
            constraints,
            enforce_dtypes,
            summary,
            evidence,
            no_optimize,
            json,
        } => commands::verify::run(VerifyArgs {
            file,
            constraints,
            enforce_dtypes,
            summary,
            evidence,
            no_optimize,
            json,
        }),

        Commands::Custom {
            file,
            rules,
            evidence,
        } => commands::custom::run(file, rules, evidence),

        Commands::Modify {
            constraints,
            column,
            set,
            output,
        } => commands::modify::run(constraints, column, set, output),

        Commands::Rules { action } => commands::rules::run(action),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
