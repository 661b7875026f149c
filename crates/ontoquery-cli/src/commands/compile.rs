//! Compile command

use clap::Args;
use ontoquery_condition::{render, ConditionCompiler, PropertyResolver, RenderedCondition};

use crate::commands::read_condition;
use crate::output::emit;
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct CompileArgs {
    /// Condition as JSON, @file, or - for stdin
    pub condition: String,

    /// Resolve fields against this object type (needs a dataset)
    #[arg(short = 't', long)]
    pub object_type: Option<String>,
}

pub async fn run(args: &CompileArgs, cli: &Cli, ctx: Option<&AppContext>) -> anyhow::Result<()> {
    let condition = read_condition(&args.condition)?;

    let (resolver, compiler) = match (ctx, &args.object_type) {
        (Some(ctx), Some(id)) => (
            PropertyResolver::for_schema(&ctx.object_type(id).await?),
            ctx.compiler.clone(),
        ),
        _ => (PropertyResolver::schemaless(), ConditionCompiler::default()),
    };

    let rendered = render(&compiler, Some(&condition), &resolver).await?;
    tracing::info!("Compiled condition {}", condition.label());

    emit(&rendered, cli.output_format(), |r: &RenderedCondition| {
        let sql = if r.sql.is_empty() { "(none)" } else { r.sql.as_str() };
        format!(
            "DSL: {}\nSQL: {}\n",
            serde_json::to_string(&r.dsl).unwrap_or_default(),
            sql
        )
    })
}
