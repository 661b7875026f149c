//! Ontoquery CLI - Command line interface for ontology queries

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{compile, completions, objects, paths, subgraph};
use config::Config;
use ontoquery_condition::ConditionCompiler;
use ontoquery_core::{ObjectSource, ObjectType, OntologyManager, SubgraphEngine, TraversalConfig};
use ontoquery_mcp::{McpServer, ToolHandler};
use ontoquery_storage::{Backends, Dataset, ViewStore};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "ontoquery")]
#[command(author, version, about = "Condition compiler and subgraph query engine for ontologies")]
pub struct Cli {
    /// Dataset file (schema, index documents and view rows as JSON)
    #[arg(short, long, global = true, env = "ONTOQUERY_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Knowledge network id (defaults to the dataset's)
    #[arg(long, global = true)]
    pub kn_id: Option<String>,

    /// Schema branch (defaults to the dataset's)
    #[arg(short, long, global = true)]
    pub branch: Option<String>,

    /// Serve backing views from SQLite instead of memory
    #[arg(long, global = true)]
    pub sqlite: bool,

    /// SQLite database file for --sqlite (in-memory when omitted)
    #[arg(long, global = true, requires = "sqlite")]
    pub sqlite_path: Option<PathBuf>,

    /// Frontier objects folded into one backend query
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// Type paths expanded concurrently
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Timeout for each backend call in milliseconds
    #[arg(long, global = true)]
    pub call_timeout_ms: Option<u64>,

    /// Output format: json, table
    #[arg(short, long, default_value = "json", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }

    /// Traversal settings: config file first, flags on top
    pub fn traversal(&self, config: &Config) -> TraversalConfig {
        let mut traversal = config.traversal();
        if let Some(v) = self.batch_size {
            traversal = traversal.with_batch_size(v);
        }
        if let Some(v) = self.max_concurrency {
            traversal = traversal.with_max_concurrency(v);
        }
        if let Some(ms) = self.call_timeout_ms {
            traversal = traversal.with_call_timeout(Duration::from_millis(ms));
        }
        traversal
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a condition to search DSL and SQL
    Compile(compile::CompileArgs),
    /// Query instances of one object type
    Objects(objects::ObjectsArgs),
    /// List type-level relation paths from an object type
    Paths(paths::PathsArgs),
    /// Expand relation paths from matching start objects
    Subgraph(subgraph::SubgraphArgs),
    /// Start MCP server on stdio
    Serve,
    /// Manage CLI configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context over the loaded dataset
pub struct AppContext {
    pub kn_id: String,
    pub branch: String,
    pub ontology: Arc<dyn OntologyManager>,
    pub objects: Arc<dyn ObjectSource>,
    pub compiler: ConditionCompiler,
    pub traversal: TraversalConfig,
}

impl AppContext {
    pub fn load(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let path = cli
            .dataset
            .clone()
            .or_else(|| config.dataset.clone())
            .context("No dataset given; pass --dataset or run `ontoquery config set dataset <path>`")?;
        tracing::debug!("Using dataset at: {:?}", path);

        let dataset = Dataset::load(&path)
            .with_context(|| format!("Failed to load dataset {}", path.display()))?;
        let traversal = cli.traversal(config);

        if cli.sqlite {
            #[cfg(feature = "sqlite")]
            return Ok(Self::from_backends(
                dataset.into_sqlite_backends(cli.sqlite_path.as_deref())?,
                cli,
                traversal,
            ));
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!("This build has no SQLite support");
        }
        Ok(Self::from_backends(dataset.into_backends()?, cli, traversal))
    }

    fn from_backends<V: ViewStore + 'static>(
        backends: Backends<V>,
        cli: &Cli,
        traversal: TraversalConfig,
    ) -> Self {
        let compiler = backends.compiler().clone();
        Self {
            kn_id: cli.kn_id.clone().unwrap_or(backends.kn_id),
            branch: cli.branch.clone().unwrap_or(backends.branch),
            ontology: backends.ontology,
            objects: backends.objects,
            compiler,
            traversal,
        }
    }

    pub fn engine(&self) -> SubgraphEngine {
        SubgraphEngine::new(self.ontology.clone(), self.objects.clone(), self.traversal.clone())
    }

    pub fn tool_handler(&self) -> ToolHandler {
        ToolHandler::new(
            self.ontology.clone(),
            self.objects.clone(),
            self.compiler.clone(),
            self.traversal.clone(),
        )
        .with_default_network(&self.kn_id, &self.branch)
    }

    pub async fn object_type(&self, id: &str) -> anyhow::Result<ObjectType> {
        self.ontology
            .get_object_type(&self.kn_id, &self.branch, id)
            .await?
            .with_context(|| format!("Object type not found: {}", id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting ontoquery CLI");

    let config = Config::load()?;

    match &cli.command {
        Commands::Config(args) => commands::config::run(args, cli.output_format())?,
        Commands::Completions(args) => completions::run(args)?,
        Commands::Compile(args) => {
            // A dataset is only needed to resolve against an object type
            let ctx = match &args.object_type {
                Some(_) => Some(AppContext::load(&cli, &config)?),
                None => None,
            };
            compile::run(args, &cli, ctx.as_ref()).await?
        }
        Commands::Objects(args) => objects::run(args, &cli, &AppContext::load(&cli, &config)?).await?,
        Commands::Paths(args) => paths::run(args, &cli, &AppContext::load(&cli, &config)?).await?,
        Commands::Subgraph(args) => subgraph::run(args, &cli, &AppContext::load(&cli, &config)?).await?,
        Commands::Serve => {
            let ctx = AppContext::load(&cli, &config)?;
            tracing::info!("Starting MCP server on stdio for {}", ctx.kn_id);
            let server = McpServer::new(ctx.tool_handler());
            server.run_stdio().await?;
        }
    }

    Ok(())
}
