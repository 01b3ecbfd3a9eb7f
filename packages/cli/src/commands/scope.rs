use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tandem_sandbox::{NativeValue, Synthetic, SymbolTable};

#[derive(Debug, Args)]
pub struct EvalScopeArgs {
    /// JSON object whose keys become variables in a block scope
    pub state: PathBuf,

    /// JSON object of newer state patched into the block scope
    #[arg(short, long)]
    pub patch: Option<PathBuf>,

    /// Names to resolve through the scope chain
    #[arg(short, long = "get")]
    pub names: Vec<String>,

    /// Message passed to console.log
    #[arg(long)]
    pub log: Option<String>,
}

pub fn eval_scope(args: EvalScopeArgs, config: &Config) -> Result<()> {
    let globals = SymbolTable::with_globals();
    let block = globals.create_child();
    define_all(&block, read_object(&args.state)?);

    if let Some(path) = &args.patch {
        let next = SymbolTable::new();
        define_all(&next, read_object(path)?);
        Synthetic::from(block.clone()).patch(&Synthetic::from(next))?;
    }

    for name in &args.names {
        let owner = if block.has_own(name) {
            "block"
        } else if globals.has_own(name) {
            "global"
        } else {
            "unbound"
        };
        println!(
            "  {} = {} {}",
            name.bold(),
            block.get(name).to_native(),
            format!("({owner})").dimmed()
        );
    }

    if let Some(message) = args.log {
        let log = globals.get("console").get("log");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let args = vec![Synthetic::from(NativeValue::from(message))];
        runtime.block_on(log.apply(&Synthetic::undefined(), args))?;
    }

    println!("{}", config.to_json(&block.to_native())?);
    Ok(())
}

fn read_object(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    match serde_json::from_str(&source)? {
        serde_json::Value::Object(entries) => Ok(entries),
        _ => Err(anyhow!("{} must contain a JSON object", path.display())),
    }
}

fn define_all(table: &SymbolTable, entries: serde_json::Map<String, serde_json::Value>) {
    for (name, value) in entries {
        table.define_variable(&name, Some(Synthetic::from(value)));
    }
}
