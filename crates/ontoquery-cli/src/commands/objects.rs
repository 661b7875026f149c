//! Objects command

use clap::Args;
use ontoquery_core::limits::effective_limit;
use ontoquery_core::{ObjectPage, ObjectQuery};

use crate::commands::optional_condition;
use crate::output::{emit, table};
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct ObjectsArgs {
    /// Object type id
    pub object_type: String,

    /// Filter as JSON, @file, or - for stdin
    #[arg(short, long)]
    pub condition: Option<String>,

    /// Limit results
    #[arg(short, long, default_value = "100")]
    pub limit: i64,
}

pub async fn run(args: &ObjectsArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let object_type = ctx.object_type(&args.object_type).await?;
    let condition = optional_condition(args.condition.as_deref())?;

    let page = ctx
        .objects
        .get_objects(&ObjectQuery {
            kn_id: ctx.kn_id.clone(),
            branch: ctx.branch.clone(),
            object_type: object_type.clone(),
            condition,
            limit: effective_limit(args.limit),
            with_total: true,
        })
        .await?;

    tracing::info!("Fetched {} of {} {} objects", page.objects.len(), page.total_count, object_type.id);

    emit(&page, cli.output_format(), |page: &ObjectPage| {
        let rows: Vec<Vec<String>> = page
            .objects
            .iter()
            .map(|o| {
                vec![
                    object_type.object_id(o).unwrap_or_else(|| "-".into()),
                    serde_json::to_string(o).unwrap_or_default(),
                ]
            })
            .collect();
        format!(
            "{}{} of {} objects\n",
            table(&["id", "data"], &rows),
            page.objects.len(),
            page.total_count
        )
    })
}
