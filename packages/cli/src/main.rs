mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    diff_style, eval_scope, init, patch, DiffStyleArgs, EvalScopeArgs, InitArgs, PatchArgs,
};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Tandem CLI - reconcile entity trees, style declarations and scopes
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (overrides config; RUST_LOG overrides both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Compact JSON output (overrides config)
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and sample expressions
    Init(InitArgs),

    /// Diff two inline styles and apply the edit
    DiffStyle(DiffStyleArgs),

    /// Load an expression, then patch a second one into it
    Patch(PatchArgs),

    /// Build a scope from JSON state and resolve names through it
    EvalScope(EvalScopeArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = Config::load(&cwd)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if cli.compact {
        config.pretty = false;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::DiffStyle(args) => diff_style(args, &config),
        Command::Patch(args) => patch(args, &config),
        Command::EvalScope(args) => eval_scope(args, &config),
    }
}
