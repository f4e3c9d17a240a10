//! Custom command - run named row predicates against a data file.

use std::path::PathBuf;

use colored::Colorize;
use framecheck::{CustomRuleList, FrameCheck};

use crate::render;

pub fn run(
    file: PathBuf,
    rules: PathBuf,
    evidence: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let rule_list = CustomRuleList::load(&rules)?;
    if rule_list.is_empty() {
        println!("{}", "No rules to run.".yellow());
        return Ok(());
    }

    println!(
        "{} {} rules on {}",
        "Running".cyan().bold(),
        rule_list.len(),
        file.display().to_string().white()
    );

    let result = FrameCheck::new().verify_custom(&file, &rule_list)?;
    println!("{}", render::custom_summary_table(&result));

    if !result.evidence.is_empty() {
        println!("{}", render::evidence_table(&result.evidence));
        let hidden = render::hidden_evidence_rows(&result.evidence);
        if hidden > 0 {
            println!("{}", format!("... {} more rows", hidden).dimmed());
        }
    }

    if let Some(path) = evidence {
        result.evidence.save_csv(&path)?;
        println!("{} {}", "Evidence saved to".green().bold(), path.display());
    }

    Ok(())
}
