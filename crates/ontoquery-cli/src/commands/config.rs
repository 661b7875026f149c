//! `config` command: inspect and edit `config.toml`

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

use crate::config::{config_file_path, Config};
use crate::output::{emit, table, OutputFormat};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one value
    Get { key: String },
    /// Store one value
    Set { key: String, value: String },
    /// Remove a stored value so the built-in default applies again
    Unset { key: String },
    /// Show stored values next to the traversal settings in effect
    List,
    /// Print the config file location
    Path,
    /// Write a fresh config file
    Init {
        /// Dataset to query by default
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: &ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => {
            let value = Config::load()?.get(key)?;
            println!("{}", value.as_deref().unwrap_or("(not set)"));
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            if let Some(dataset) = config.dataset.as_ref().filter(|_| key == "dataset") {
                if !dataset.exists() {
                    tracing::warn!("Dataset {} does not exist yet", dataset.display());
                }
            }
            config.save()?;
            println!("{} = {}", key, value);
        }
        ConfigCommands::Unset { key } => {
            let mut config = Config::load()?;
            if config.unset(key)? {
                config.save()?;
                println!("Removed {}", key);
            } else {
                println!("{} was not set", key);
            }
        }
        ConfigCommands::List => list(&Config::load()?, format)?,
        ConfigCommands::Path => println!("{}", config_file_path().display()),
        ConfigCommands::Init { dataset, force } => {
            let path = config_file_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to replace it",
                    path.display()
                );
            }
            let config = Config {
                dataset: dataset.clone(),
                ..Default::default()
            };
            config
                .save()
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// One row per key: the stored value (if any) and the value traversals use
fn list(config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let effective = serde_json::to_value(config.traversal())?;
    let mut rows = Map::new();
    for key in Config::keys() {
        let in_effect = match *key {
            "call_timeout_ms" => config.call_timeout_ms.map(Value::from).unwrap_or(Value::Null),
            _ => effective.get(*key).cloned().unwrap_or(Value::Null),
        };
        rows.insert(
            key.to_string(),
            json!({"stored": config.get(key)?, "effective": in_effect}),
        );
    }

    emit(&rows, format, |rows| {
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|(key, v)| {
                let show = |field: &str| match &v[field] {
                    Value::Null => "-".to_string(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                vec![key.clone(), show("stored"), show("effective")]
            })
            .collect();
        table(&["KEY", "STORED", "EFFECTIVE"], &cells)
    })
}
