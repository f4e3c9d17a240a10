//! Discover command - derive constraints from a reference file.

use std::path::PathBuf;

use colored::Colorize;
use framecheck::{FrameCheck, FrameCheckConfig};

use crate::render;

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    no_optimize: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        "Discovering".cyan().bold(),
        file.display().to_string().white()
    );

    let framecheck = FrameCheck::with_config(FrameCheckConfig {
        optimize: !no_optimize,
        ..FrameCheckConfig::default()
    });
    let constraints = framecheck.discover(&file)?;

    println!("{}", render::constraints_table(&constraints));

    let output_path = output.unwrap_or_else(|| super::default_constraints_path(&file));
    constraints.save(&output_path)?;

    println!(
        "{} {} ({} columns)",
        "Saved to".green().bold(),
        output_path.display().to_string().white(),
        constraints.len()
    );
    println!(
        "Run {} to check new data",
        format!("framecheck verify <DATA> -c {}", output_path.display())
            .cyan()
            .bold()
    );

    Ok(())
}
