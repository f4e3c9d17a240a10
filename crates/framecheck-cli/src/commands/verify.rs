//! Verify command - check a data file against stored constraints.

use std::path::PathBuf;

use colored::Colorize;
use framecheck::{ConstraintSet, FrameCheck, FrameCheckConfig, VerifyOptions};

use crate::render;

pub struct VerifyArgs {
    pub file: PathBuf,
    pub constraints: PathBuf,
    pub enforce_dtypes: bool,
    pub summary: Option<PathBuf>,
    pub evidence: Option<PathBuf>,
    pub no_optimize: bool,
    pub json: bool,
}

pub fn run(args: VerifyArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.file.exists() {
        return Err(format!("File not found: {}", args.file.display()).into());
    }

    let constraints = ConstraintSet::load(&args.constraints)?;
    let framecheck = FrameCheck::with_config(FrameCheckConfig {
        optimize: !args.no_optimize,
        verify: VerifyOptions {
            enforce_dtypes: args.enforce_dtypes,
        },
        ..FrameCheckConfig::default()
    });

    let result = framecheck.verify(&args.file, &constraints)?;

    if let Some(path) = &args.summary {
        result.summary.save_csv(path)?;
    }
    if let Some(path) = &args.evidence {
        result.evidence.save_csv(path)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.summary)?);
        return Ok(());
    }

    println!(
        "{} {} against {}",
        "Verifying".cyan().bold(),
        args.file.display().to_string().white(),
        args.constraints.display()
    );
    println!("{}", render::summary_table(&result.summary));

    if result.passed() {
        println!("{}", "All constraints hold.".green());
    } else {
        println!(
            "Found {} breaks in {} evidence rows",
            result.summary.total_breaks().to_string().red().bold(),
            result.evidence.len().to_string().white().bold()
        );
        println!("{}", render::evidence_table(&result.evidence));

        let hidden = render::hidden_evidence_rows(&result.evidence);
        if hidden > 0 {
            println!("{}", format!("... {} more rows", hidden).dimmed());
        }
    }

    if let Some(path) = &args.summary {
        println!("{} {}", "Summary saved to".green().bold(), path.display());
    }
    if let Some(path) = &args.evidence {
        println!("{} {}", "Evidence saved to".green().bold(), path.display());
    }

    Ok(())
}
