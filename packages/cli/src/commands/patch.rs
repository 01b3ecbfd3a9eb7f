use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tandem_entities::{EntityDocument, Expression, LoadOutcome};
use tracing::info;

#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Expression JSON loaded first
    pub old: PathBuf,

    /// Expression JSON patched into the first
    pub new: PathBuf,

    /// Skip printing rendered markup (overrides config)
    #[arg(long)]
    pub no_html: bool,

    /// Print the load outcomes as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn patch(args: PatchArgs, config: &Config) -> Result<()> {
    let old = read_expression(&args.old)?;
    let new = read_expression(&args.new)?;
    let render_html = config.render_html && !args.no_html;

    let mut document = EntityDocument::new(&args.old);
    let created = document.load(old)?;
    if render_html {
        println!("{} {}", "before:".dimmed(), document.to_html());
    }

    let outcome = document.load(new)?;
    info!(path = %args.new.display(), "reloaded");

    if args.json {
        println!("{}", config.to_json(&[created, outcome])?);
    } else {
        print_outcome(&outcome);
    }

    if render_html {
        println!("{} {}", "after: ".dimmed(), document.to_html());
    }

    document.dispose()?;
    Ok(())
}

fn read_expression(path: &Path) -> Result<Expression> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    Expression::from_json(&source).with_context(|| format!("Invalid expression in {}", path.display()))
}

fn print_outcome(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Created => println!("{}", "Created".green().bold()),
        LoadOutcome::Unchanged => println!("{}", "Unchanged".dimmed()),
        LoadOutcome::Replaced => println!("{} (root changed kind)", "Replaced".yellow().bold()),
        LoadOutcome::Patched { summary } => {
            println!("{}", "Patched".green().bold());
            println!("  {} inserted", summary.inserted);
            println!("  {} removed", summary.removed);
            println!("  {} moved", summary.moved);
            println!("  {} updated", summary.updated);
            println!("  {} attribute changes", summary.attributes_changed);
        }
    }
}
