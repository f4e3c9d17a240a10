//! Rules command - add, remove and list custom rules.

use std::path::Path;

use colored::Colorize;
use framecheck::{CustomRule, CustomRuleList};

use crate::cli::RulesAction;

fn load_or_new(file: &Path) -> Result<CustomRuleList, Box<dyn std::error::Error>> {
    if file.exists() {
        Ok(CustomRuleList::load(file)?)
    } else {
        Ok(CustomRuleList::new())
    }
}

pub fn run(action: RulesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RulesAction::Add { file, name, query } => {
            let rule = CustomRule::new(name, query);
            rule.validate()?;

            let mut rules = load_or_new(&file)?;
            if rules.add(rule.clone()) {
                rules.save(&file)?;
                println!("{} {}", "Added".green().bold(), rule.label());
            } else {
                println!("{} {}", "Already present:".yellow(), rule.label());
            }
        }
        RulesAction::Remove { file, name } => {
            let mut rules = CustomRuleList::load(&file)?;
            let removed = rules.remove(&name)?;
            rules.save(&file)?;
            println!("{} {} rule(s) named {}", "Removed".green().bold(), removed, name.cyan());
        }
        RulesAction::List { file } => {
            let rules = CustomRuleList::load(&file)?;
            if rules.is_empty() {
                println!("{}", "No rules.".yellow());
            }
            for rule in rules.iter() {
                println!("{:20} {}", rule.name.cyan(), rule.query);
            }
        }
    }
    Ok(())
}
