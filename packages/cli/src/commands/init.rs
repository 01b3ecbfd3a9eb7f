use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::Path;
use tandem_entities::Expression;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for the sample expression files
    #[arg(short, long, default_value = "demo")]
    pub demo_dir: String,

    /// Default log level written to the config
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Tandem project...".bright_blue().bold());

    let demo_dir = cwd.join(&args.demo_dir);
    if !demo_dir.exists() {
        fs::create_dir_all(&demo_dir)?;
        println!("  {} Created {}/", "✓".green(), args.demo_dir);
    }

    let samples = [
        ("old.json", sample(&["a", "b", "c"], "red")),
        ("new.json", sample(&["c", "a", "d"], "blue")),
    ];
    for (name, expression) in samples {
        let path = demo_dir.join(name);
        if !path.exists() {
            fs::write(&path, serde_json::to_string_pretty(&expression)?)?;
            println!("  {} Created {}/{}", "✓".green(), args.demo_dir, name);
        }
    }

    let config = Config {
        log_level: args.log_level,
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  Run: tandem patch {0}/old.json {0}/new.json", args.demo_dir);

    Ok(())
}

fn sample(items: &[&str], color: &str) -> Expression {
    Expression::element("ul")
        .with_attr("style", format!("color: {color}"))
        .with_children(
            items
                .iter()
                .map(|item| Expression::element("li").with_child(Expression::text(*item))),
        )
}
