use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tandem_common::EditAction;
use tandem_cssom::StyleDeclaration;

#[derive(Debug, Args)]
pub struct DiffStyleArgs {
    /// Current inline style, e.g. "color: red; margin: 0"
    pub old: String,

    /// Target inline style
    pub new: String,

    /// Print the edit as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn diff_style(args: DiffStyleArgs, config: &Config) -> Result<()> {
    let mut current = StyleDeclaration::parse(&args.old)?;
    let next = StyleDeclaration::parse(&args.new)?;
    let edit = current.diff(&next);

    if args.json {
        println!("{}", config.to_json(edit.as_content_edit())?);
    } else if edit.is_empty() {
        println!("{}", "No changes".dimmed());
    } else {
        for action in edit.actions() {
            match action {
                EditAction::SetKeyValue(set) => match &set.value {
                    Some(value) => println!("  {} {}: {}", "~".yellow(), set.name.bold(), value),
                    None => println!("  {} {}", "-".red(), set.name.bold()),
                },
            }
        }
    }

    edit.apply_to(&mut current)?;
    println!("{} {}", "→".green(), current.css_text());
    Ok(())
}
