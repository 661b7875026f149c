//! CLI command implementations

pub mod compile;
pub mod completions;
pub mod config;
pub mod objects;
pub mod paths;
pub mod subgraph;

use std::io::Read;

use anyhow::Context;
use ontoquery_condition::ConditionCompiler;
use ontoquery_core::CondCfg;

/// Condition given inline as JSON, as `@file`, or `-` for stdin
pub fn read_condition(arg: &str) -> anyhow::Result<CondCfg> {
    let text = if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else if let Some(path) = arg.strip_prefix('@') {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
    } else {
        arg.to_string()
    };

    let raw: serde_json::Value = serde_json::from_str(&text).context("Condition is not valid JSON")?;
    Ok(ConditionCompiler::parse(&raw)?)
}

pub fn optional_condition(arg: Option<&str>) -> anyhow::Result<Option<CondCfg>> {
    arg.map(read_condition).transpose()
}
