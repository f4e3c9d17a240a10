//! Example: discover constraints from one file and verify another.
//!
//! Usage:
//!   cargo run --example discover_verify -- <reference> <target>

use std::env;
use std::path::Path;

use framecheck::FrameCheck;

fn main() -> framecheck::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: cargo run --example discover_verify -- <reference> <target>");
        std::process::exit(1);
    }

    let reference = Path::new(&args[1]);
    let target = Path::new(&args[2]);

    let framecheck = FrameCheck::new();
    let constraints = framecheck.discover(reference)?;

    println!("Constraints discovered from {}:", reference.display());
    for (column, record) in constraints.iter() {
        let rendered: Vec<String> = record
            .iter()
            .map(|c| format!("{}={}", c.kind(), c.to_cell()))
            .collect();
        println!("  {:20} {}", column, rendered.join(" "));
    }
    println!();

    let result = framecheck.verify(target, &constraints)?;

    println!("Verification of {}:", target.display());
    for (column, outcomes) in result.summary.columns() {
        for (kind, outcome) in outcomes {
            if outcome.breaks().unwrap_or(0) > 0 {
                println!("  {:20} {:12} {}", column, kind, outcome);
            }
        }
    }

    if result.passed() {
        println!("  all constraints hold");
    } else {
        println!();
        println!(
            "{} breaks, {} evidence rows",
            result.summary.total_breaks(),
            result.evidence.len()
        );
    }

    Ok(())
}
