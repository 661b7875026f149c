//! MCP request handlers

use std::sync::Arc;
use std::time::Duration;

use ontoquery_condition::{render, ConditionCompiler, PropertyResolver};
use ontoquery_core::limits::{effective_limit, validate_path_length};
use ontoquery_core::{
    CancelSignal, CondCfg, Direction, Error, ObjectQuery, ObjectSource, ObjectType,
    OntologyManager, SubgraphEngine, SubgraphQuery, TraversalConfig,
};
use ontoquery_storage::{Backends, ViewStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::tools::{COMPILE_CONDITION, LIST_RELATION_TYPE_PATHS, QUERY_OBJECTS, QUERY_SUBGRAPH};

/// MCP tool call request
#[derive(Debug, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// MCP tool call response
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "isError")]
    pub is_error: Option<bool>,
}

/// Content block for responses
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: content.into(),
            }],
            is_error: None,
        }
    }

    pub fn json<T: Serialize>(data: &T) -> Self {
        match serde_json::to_string_pretty(data) {
            Ok(json) => Self::text(json),
            Err(e) => Self::error(format!("JSON serialization error: {}", e)),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// Text of the first content block
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => text,
            None => "",
        }
    }
}

#[derive(Debug, Error)]
enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Query(#[from] Error),
}

impl From<ontoquery_condition::ConditionError> for ToolError {
    fn from(err: ontoquery_condition::ConditionError) -> Self {
        Self::Query(err.into())
    }
}

type ToolResult<T> = std::result::Result<T, ToolError>;

fn parse_args<T: DeserializeOwned>(args: Value) -> ToolResult<T> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Remove and parse the `condition` argument so unknown operators are
/// reported by name
fn take_condition(args: &mut Value) -> ToolResult<Option<CondCfg>> {
    match args.as_object_mut().and_then(|m| m.remove("condition")) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => Ok(Some(ConditionCompiler::parse(&raw)?)),
    }
}

fn respond<T: Serialize>(tool: &str, result: ToolResult<T>) -> ToolCallResponse {
    match result {
        Ok(data) => ToolCallResponse::json(&data),
        Err(e) => {
            tracing::warn!("Tool {} failed: {}", tool, e);
            ToolCallResponse::error(e.to_string())
        }
    }
}

fn default_path_length() -> usize {
    1
}

/// Tool handler that processes tool calls
pub struct ToolHandler {
    ontology: Arc<dyn OntologyManager>,
    objects: Arc<dyn ObjectSource>,
    compiler: ConditionCompiler,
    engine: SubgraphEngine,
    default_kn_id: Option<String>,
    default_branch: Option<String>,
}

impl ToolHandler {
    pub fn new(
        ontology: Arc<dyn OntologyManager>,
        objects: Arc<dyn ObjectSource>,
        compiler: ConditionCompiler,
        config: TraversalConfig,
    ) -> Self {
        let engine = SubgraphEngine::new(ontology.clone(), objects.clone(), config);
        Self {
            ontology,
            objects,
            compiler,
            engine,
            default_kn_id: None,
            default_branch: None,
        }
    }

    pub fn from_backends<V: ViewStore + 'static>(backends: &Backends<V>, config: TraversalConfig) -> Self {
        Self::new(
            backends.ontology.clone(),
            backends.objects.clone(),
            backends.compiler().clone(),
            config,
        )
        .with_default_network(&backends.kn_id, &backends.branch)
    }

    /// Knowledge network and branch used when a call names none
    pub fn with_default_network(mut self, kn_id: &str, branch: &str) -> Self {
        self.default_kn_id = Some(kn_id.to_string());
        self.default_branch = Some(branch.to_string());
        self
    }

    pub fn engine(&self) -> &SubgraphEngine {
        &self.engine
    }

    pub async fn handle(&self, request: ToolCallRequest) -> ToolCallResponse {
        tracing::debug!("Handling tool call: {}", request.name);
        let args = self.with_defaults(request.arguments);

        match request.name.as_str() {
            QUERY_SUBGRAPH => respond(QUERY_SUBGRAPH, self.query_subgraph(args).await),
            QUERY_OBJECTS => respond(QUERY_OBJECTS, self.query_objects(args).await),
            COMPILE_CONDITION => respond(COMPILE_CONDITION, self.compile_condition(args).await),
            LIST_RELATION_TYPE_PATHS => {
                respond(LIST_RELATION_TYPE_PATHS, self.list_relation_type_paths(args).await)
            }
            _ => ToolCallResponse::error(format!("Unknown tool: {}", request.name)),
        }
    }

    fn with_defaults(&self, args: Value) -> Value {
        let mut args = match args {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        if let Some(map) = args.as_object_mut() {
            if let Some(kn_id) = &self.default_kn_id {
                map.entry("kn_id").or_insert_with(|| Value::from(kn_id.as_str()));
            }
            if let Some(branch) = &self.default_branch {
                map.entry("branch").or_insert_with(|| Value::from(branch.as_str()));
            }
        }
        args
    }

    async fn object_type(&self, kn_id: &str, branch: &str, id: &str) -> ToolResult<ObjectType> {
        let object_type = self
            .ontology
            .get_object_type(kn_id, branch, id)
            .await?
            .ok_or_else(|| Error::ObjectTypeNotFound(id.to_string()))?;
        Ok(object_type)
    }

    async fn query_subgraph(&self, mut args: Value) -> ToolResult<Value> {
        #[derive(Deserialize)]
        struct Args {
            #[serde(flatten)]
            query: SubgraphQuery,
            timeout_ms: Option<u64>,
        }

        let condition = take_condition(&mut args)?;
        let mut args: Args = parse_args(args)?;
        args.query.condition = condition;

        let cancel = match args.timeout_ms {
            Some(ms) => CancelSignal::none().with_timeout(Duration::from_millis(ms)),
            None => CancelSignal::none(),
        };
        let result = self.engine.query(&args.query, &cancel).await?;
        Ok(serde_json::to_value(result).map_err(Error::from)?)
    }

    async fn query_objects(&self, mut args: Value) -> ToolResult<Value> {
        #[derive(Deserialize)]
        struct Args {
            kn_id: String,
            #[serde(default)]
            branch: String,
            object_type_id: String,
            #[serde(default)]
            limit: i64,
        }

        let condition = take_condition(&mut args)?;
        let args: Args = parse_args(args)?;
        let object_type = self
            .object_type(&args.kn_id, &args.branch, &args.object_type_id)
            .await?;

        let page = self
            .objects
            .get_objects(&ObjectQuery {
                kn_id: args.kn_id,
                branch: args.branch,
                object_type,
                condition,
                limit: effective_limit(args.limit),
                with_total: true,
            })
            .await?;
        Ok(serde_json::to_value(page).map_err(Error::from)?)
    }

    async fn compile_condition(&self, mut args: Value) -> ToolResult<Value> {
        #[derive(Deserialize)]
        struct Args {
            #[serde(default)]
            kn_id: String,
            #[serde(default)]
            branch: String,
            object_type_id: Option<String>,
        }

        let condition = take_condition(&mut args)?
            .ok_or_else(|| ToolError::InvalidArguments("missing field `condition`".into()))?;
        let args: Args = parse_args(args)?;

        let resolver = match &args.object_type_id {
            Some(id) => PropertyResolver::for_schema(&self.object_type(&args.kn_id, &args.branch, id).await?),
            None => PropertyResolver::schemaless(),
        };
        let rendered = render(&self.compiler, Some(&condition), &resolver).await?;
        Ok(serde_json::to_value(rendered).map_err(Error::from)?)
    }

    async fn list_relation_type_paths(&self, args: Value) -> ToolResult<Value> {
        #[derive(Deserialize)]
        struct Args {
            kn_id: String,
            #[serde(default)]
            branch: String,
            source_object_type_id: String,
            #[serde(default)]
            direction: Direction,
            #[serde(default = "default_path_length")]
            path_length: usize,
        }

        let args: Args = parse_args(args)?;
        validate_path_length(args.path_length).map_err(Error::from)?;
        self.object_type(&args.kn_id, &args.branch, &args.source_object_type_id)
            .await?;

        let paths = self
            .ontology
            .relation_type_paths(
                &args.kn_id,
                &args.branch,
                &args.source_object_type_id,
                args.direction,
                args.path_length,
            )
            .await?;
        Ok(serde_json::json!({ "count": paths.len(), "paths": paths }))
    }
}
