//! Subgraph command

use std::time::Duration;

use clap::Args;
use ontoquery_core::{
    CancelSignal, Direction, EdgeDirection, RelationPath, SubgraphQuery, SubgraphResult,
};

use crate::commands::optional_condition;
use crate::output::emit;
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct SubgraphArgs {
    /// Source object type id
    pub source: String,

    /// Start object filter as JSON, @file, or - for stdin
    #[arg(short, long)]
    pub condition: Option<String>,

    /// forward, backward or bidirectional
    #[arg(long, default_value = "forward")]
    pub direction: Direction,

    /// Maximum hops
    #[arg(short = 'n', long, default_value = "1")]
    pub path_length: usize,

    /// Start objects to fetch
    #[arg(short, long, default_value = "0")]
    pub limit: i64,

    /// Relation paths to return across all type paths
    #[arg(long)]
    pub total_limit: Option<i64>,

    /// Return a partial result after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// `ot1-1 -[rt]-> ot2-7 <-[rt2]- ot3-4`
fn describe(path: &RelationPath) -> String {
    let mut out = path
        .relations
        .first()
        .map(|r| r.source_object_id.clone())
        .unwrap_or_default();
    for r in &path.relations {
        let hop = match r.direction {
            EdgeDirection::Forward => format!(" -[{}]-> {}", r.relation_type_id, r.target_object_id),
            EdgeDirection::Backward => format!(" <-[{}]- {}", r.relation_type_id, r.target_object_id),
        };
        out.push_str(&hop);
    }
    out
}

fn summary(result: &SubgraphResult) -> String {
    let mut out: String = result
        .entries
        .iter()
        .map(|p| format!("{}\n", describe(p)))
        .collect();
    out.push_str(&format!(
        "{} paths, {} objects\n",
        result.total_count,
        result.objects.len()
    ));
    if result.quota_exhausted {
        out.push_str("quota exhausted\n");
    }
    for err in &result.branch_errors {
        out.push_str(&format!(
            "type path {} failed at {}: {}\n",
            err.path_index, err.relation_type_id, err.message
        ));
    }
    if result.partial {
        out.push_str("result is partial\n");
    }
    out
}

pub async fn run(args: &SubgraphArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    let mut query = SubgraphQuery::new(ctx.kn_id.clone(), args.source.clone())
        .with_branch(ctx.branch.clone())
        .with_direction(args.direction)
        .with_path_length(args.path_length)
        .with_limit(args.limit);
    query.condition = optional_condition(args.condition.as_deref())?;
    query.total_limit = args.total_limit;

    let (handle, mut cancel) = CancelSignal::pair();
    if let Some(ms) = args.timeout_ms {
        cancel = cancel.with_timeout(Duration::from_millis(ms));
    }
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, returning partial result");
            handle.cancel();
        }
    });

    let result = ctx.engine().query(&query, &cancel).await;
    interrupt.abort();
    let result = result?;

    emit(&result, cli.output_format(), summary)
}
