//! Paths command

use clap::Args;
use ontoquery_core::limits::validate_path_length;
use ontoquery_core::{Direction, EdgeDirection, RelationTypePath};

use crate::output::emit;
use crate::{AppContext, Cli};

#[derive(Args)]
pub struct PathsArgs {
    /// Source object type id
    pub source: String,

    /// forward, backward or bidirectional
    #[arg(long, default_value = "forward")]
    pub direction: Direction,

    /// Maximum hops
    #[arg(short = 'n', long, default_value = "1")]
    pub path_length: usize,
}

/// `a -[rt]-> b <-[rt2]- c`
pub fn describe(path: &RelationTypePath) -> String {
    let mut out = path.source_object_type_id().unwrap_or_default().to_string();
    for edge in &path.type_edges {
        let hop = match edge.direction {
            EdgeDirection::Forward => format!(" -[{}]-> {}", edge.relation_type_id, edge.target_object_type_id),
            EdgeDirection::Backward => format!(" <-[{}]- {}", edge.relation_type_id, edge.target_object_type_id),
        };
        out.push_str(&hop);
    }
    out
}

pub async fn run(args: &PathsArgs, cli: &Cli, ctx: &AppContext) -> anyhow::Result<()> {
    validate_path_length(args.path_length)?;
    ctx.object_type(&args.source).await?;

    let paths = ctx
        .ontology
        .relation_type_paths(&ctx.kn_id, &ctx.branch, &args.source, args.direction, args.path_length)
        .await?;

    emit(&paths, cli.output_format(), |paths: &Vec<RelationTypePath>| {
        if paths.is_empty() {
            return format!("No relation paths from {}\n", args.source);
        }
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:>3}  {}\n", i, describe(p)))
            .collect()
    })
}
