//! Subgraph traversal: batched, quota-bounded, level-by-level expansion of
//! relation type paths over object instances.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::access::{ObjectQuery, ObjectSource, OntologyManager, ViewQuery};
use crate::cancel::CancelSignal;
use crate::condition::CondCfg;
use crate::error::{Error, Result};
use crate::limits::{
    effective_limit, effective_total_limit, validate_path_length, ValidationError,
    DEFAULT_BATCH_SIZE, DEFAULT_LIMIT, DEFAULT_MAX_CONCURRENCY, DEFAULT_TOTAL_LIMIT,
    MAX_CANDIDATES_PER_BATCH, MAX_LIMIT,
};
use crate::mapping::{
    direct_batch_condition, is_related, partition_view_rows, target_condition_from_rows,
    validate_mapping, view_batch_condition,
};
use crate::object_type::{ObjectData, ObjectType};
use crate::path::{LevelObject, Relation, RelationPath, RelationTypePath, TypeEdge};
use crate::quota::PathQuotaManager;
use crate::relation_type::{Direction, MappingRules, RelationType};

/// Tuning knobs for the traversal engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    /// Frontier objects folded into one backend query
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Type-paths (and batches within a level) in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Start objects fetched when a request gives no positive limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Relation paths materialised when a request gives no quota
    #[serde(default = "default_total_limit")]
    pub default_total_limit: usize,

    /// Per backend call; a timeout fails only the issuing branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout: Option<Duration>,

    /// Rows one batch may fetch from a view or a target type
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_total_limit() -> usize {
    DEFAULT_TOTAL_LIMIT
}

fn default_max_candidates() -> usize {
    MAX_CANDIDATES_PER_BATCH
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrency: default_max_concurrency(),
            default_limit: default_limit(),
            default_total_limit: default_total_limit(),
            call_timeout: None,
            max_candidates: default_max_candidates(),
        }
    }
}

impl TraversalConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    pub fn with_default_total_limit(mut self, total_limit: usize) -> Self {
        self.default_total_limit = total_limit;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.clamp(1, MAX_CANDIDATES_PER_BATCH);
        self
    }
}

/// Subgraph query request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubgraphQuery {
    pub kn_id: String,

    #[serde(default)]
    pub branch: String,

    pub source_object_type_id: String,

    /// Filter selecting the start objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<CondCfg>,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default = "default_path_length")]
    pub path_length: usize,

    /// Start objects to fetch; non-positive falls back to the default
    #[serde(default)]
    pub limit: i64,

    /// Relation paths to materialise; absent uses the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_limit: Option<i64>,

    /// Type-level paths to expand; enumerated from the schema when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_paths: Option<Vec<RelationTypePath>>,
}

fn default_path_length() -> usize {
    1
}

impl SubgraphQuery {
    pub fn new(kn_id: impl Into<String>, source_object_type_id: impl Into<String>) -> Self {
        Self {
            kn_id: kn_id.into(),
            source_object_type_id: source_object_type_id.into(),
            path_length: default_path_length(),
            ..Default::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_condition(mut self, condition: CondCfg) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_path_length(mut self, path_length: usize) -> Self {
        self.path_length = path_length;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_total_limit(mut self, total_limit: i64) -> Self {
        self.total_limit = Some(total_limit);
        self
    }

    pub fn with_type_paths(mut self, type_paths: Vec<RelationTypePath>) -> Self {
        self.type_paths = Some(type_paths);
        self
    }
}

/// Failure of one type-path's expansion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchError {
    pub path_index: usize,
    pub relation_type_id: String,
    pub message: String,
}

/// Subgraph query response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubgraphResult {
    pub entries: Vec<RelationPath>,

    /// Participating objects keyed by node key
    pub objects: BTreeMap<String, ObjectData>,

    pub total_count: usize,

    /// Some branch failed or the request was cancelled
    #[serde(default)]
    pub partial: bool,

    #[serde(default)]
    pub quota_exhausted: bool,

    /// A batch hit `max_candidates`, so some relations may be missing
    #[serde(default)]
    pub candidates_truncated: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branch_errors: Vec<BranchError>,
}

/// Per type-path scratch state
#[derive(Debug, Clone)]
pub struct BatchQueryState {
    pub batch_size: usize,
    /// Node keys already placed on this type-path
    pub visited: HashSet<String>,
}

impl BatchQueryState {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            visited: HashSet::new(),
        }
    }
}

/// How a branch stopped
#[derive(Debug)]
enum BranchStatus {
    Done,
    QuotaExhausted,
    Cancelled,
    Failed(Error),
}

struct BranchOutcome {
    path_index: usize,
    entries: Vec<RelationPath>,
    objects: BTreeMap<String, ObjectData>,
    status: BranchStatus,
    failed_relation_type: String,
}

/// One hop of a type path with its schema resolved
struct ResolvedStep {
    edge: TypeEdge,
    relation_type: RelationType,
    target_type: ObjectType,
}

struct ResolvedPath {
    index: usize,
    steps: Vec<ResolvedStep>,
}

struct RequestContext<'a> {
    request_id: Ulid,
    kn_id: &'a str,
    branch: &'a str,
    cancel: &'a CancelSignal,
    truncated: AtomicBool,
}

/// Path currently ending at a frontier object
struct Tail {
    node_key: String,
    path: RelationPath,
    extended: bool,
}

/// Subgraph traversal engine
pub struct SubgraphEngine {
    ontology: Arc<dyn OntologyManager>,
    objects: Arc<dyn ObjectSource>,
    config: TraversalConfig,
}

impl SubgraphEngine {
    pub fn new(
        ontology: Arc<dyn OntologyManager>,
        objects: Arc<dyn ObjectSource>,
        config: TraversalConfig,
    ) -> Self {
        Self {
            ontology,
            objects,
            config,
        }
    }

    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Execute a subgraph query
    pub async fn query(&self, query: &SubgraphQuery, cancel: &CancelSignal) -> Result<SubgraphResult> {
        if query.kn_id.is_empty() {
            return Err(ValidationError::EmptyKnowledgeNetworkId.into());
        }
        if query.source_object_type_id.is_empty() {
            return Err(ValidationError::EmptyObjectTypeId.into());
        }

        let ctx = RequestContext {
            request_id: Ulid::new(),
            kn_id: &query.kn_id,
            branch: &query.branch,
            cancel,
            truncated: AtomicBool::new(false),
        };
        tracing::info!(
            "[{}] Subgraph query: kn={}, source={}, direction={:?}, path_length={}",
            ctx.request_id,
            query.kn_id,
            query.source_object_type_id,
            query.direction,
            query.path_length
        );

        let source_type = self
            .object_type(&ctx, &query.source_object_type_id)
            .await?;

        let type_paths = match &query.type_paths {
            Some(paths) => paths.clone(),
            None => {
                validate_path_length(query.path_length)?;
                self.ontology
                    .relation_type_paths(
                        ctx.kn_id,
                        ctx.branch,
                        &source_type.id,
                        query.direction,
                        query.path_length,
                    )
                    .await?
            }
        };
        let resolved = self.resolve_paths(&ctx, &source_type.id, &type_paths).await?;

        let mut result = SubgraphResult::default();

        let start = match self.start_objects(&ctx, &source_type, query).await {
            Ok(start) => start,
            Err(Error::Cancelled) => {
                tracing::warn!("[{}] Cancelled before start objects were fetched", ctx.request_id);
                result.partial = true;
                return Ok(result);
            }
            Err(e) => return Err(e),
        };
        for object in &start {
            result.objects.insert(object.node_key(), object.data.clone());
        }

        if resolved.is_empty() || start.is_empty() {
            tracing::debug!(
                "[{}] Nothing to expand: {} type paths, {} start objects",
                ctx.request_id,
                resolved.len(),
                start.len()
            );
            return Ok(result);
        }

        let total_limit = match query.total_limit {
            None => self.config.default_total_limit,
            given => effective_total_limit(given),
        };
        let quota = Arc::new(PathQuotaManager::new(total_limit, resolved.len()));

        let mut outcomes: Vec<BranchOutcome> = stream::iter(resolved.iter())
            .map(|path| self.expand_path(&ctx, path, &start, quota.clone()))
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|o| o.path_index);

        for outcome in outcomes {
            result.entries.extend(outcome.entries);
            result.objects.extend(outcome.objects);
            match outcome.status {
                BranchStatus::Done => {}
                BranchStatus::QuotaExhausted => result.quota_exhausted = true,
                BranchStatus::Cancelled => result.partial = true,
                BranchStatus::Failed(err) => {
                    tracing::warn!(
                        "[{}] Type path {} failed at {}: {}",
                        ctx.request_id,
                        outcome.path_index,
                        outcome.failed_relation_type,
                        err
                    );
                    result.partial = true;
                    result.branch_errors.push(BranchError {
                        path_index: outcome.path_index,
                        relation_type_id: outcome.failed_relation_type,
                        message: err.to_string(),
                    });
                }
            }
        }
        result.total_count = result.entries.len();
        result.candidates_truncated = ctx.truncated.load(Ordering::Relaxed);

        tracing::info!(
            "[{}] Subgraph query finished: {} paths, {} objects, partial={}",
            ctx.request_id,
            result.total_count,
            result.objects.len(),
            result.partial
        );
        Ok(result)
    }

    async fn object_type(&self, ctx: &RequestContext<'_>, id: &str) -> Result<ObjectType> {
        self.ontology
            .get_object_type(ctx.kn_id, ctx.branch, id)
            .await?
            .ok_or_else(|| Error::ObjectTypeNotFound(id.to_string()))
    }

    /// Resolve every relation and object type the paths touch, failing fast
    /// on schema errors before any instance data is fetched
    async fn resolve_paths(
        &self,
        ctx: &RequestContext<'_>,
        source_type_id: &str,
        type_paths: &[RelationTypePath],
    ) -> Result<Vec<ResolvedPath>> {
        let mut object_types: HashMap<String, ObjectType> = HashMap::new();
        let mut relation_types: HashMap<String, RelationType> = HashMap::new();
        let mut resolved = Vec::with_capacity(type_paths.len());

        for (index, path) in type_paths.iter().enumerate() {
            if let Some(first) = path.type_edges.first() {
                if first.source_object_type_id != source_type_id {
                    return Err(Error::BadRequest(format!(
                        "type path {} starts at {}, expected {}",
                        index, first.source_object_type_id, source_type_id
                    )));
                }
            }

            let mut steps = Vec::with_capacity(path.type_edges.len());
            for edge in &path.type_edges {
                if !relation_types.contains_key(&edge.relation_type_id) {
                    let rt = self
                        .ontology
                        .get_relation_type(ctx.kn_id, ctx.branch, &edge.relation_type_id)
                        .await?
                        .ok_or_else(|| Error::RelationTypeNotFound(edge.relation_type_id.clone()))?;
                    validate_mapping(&rt)?;
                    relation_types.insert(rt.id.clone(), rt);
                }
                if !object_types.contains_key(&edge.target_object_type_id) {
                    let ot = self.object_type(ctx, &edge.target_object_type_id).await?;
                    object_types.insert(ot.id.clone(), ot);
                }

                let relation_type = relation_types[&edge.relation_type_id].clone();
                let target_type = object_types[&edge.target_object_type_id].clone();
                steps.push(ResolvedStep {
                    edge: edge.clone(),
                    relation_type,
                    target_type,
                });
            }
            resolved.push(ResolvedPath { index, steps });
        }

        Ok(resolved)
    }

    async fn start_objects(
        &self,
        ctx: &RequestContext<'_>,
        source_type: &ObjectType,
        query: &SubgraphQuery,
    ) -> Result<Vec<LevelObject>> {
        let object_query = ObjectQuery {
            kn_id: ctx.kn_id.to_string(),
            branch: ctx.branch.to_string(),
            object_type: source_type.clone(),
            condition: query.condition.clone(),
            limit: if query.limit <= 0 {
                self.config.default_limit
            } else {
                effective_limit(query.limit)
            },
            with_total: false,
        };
        let page = self
            .call(ctx, "start objects", self.objects.get_objects(&object_query))
            .await?;
        let start = to_level_objects(source_type, page.objects);
        tracing::debug!(
            "[{}] Fetched {} start objects of {}",
            ctx.request_id,
            start.len(),
            source_type.id
        );
        Ok(start)
    }

    /// Run a backend call under the per-call timeout and the request's
    /// cancellation signal
    async fn call<T>(
        &self,
        ctx: &RequestContext<'_>,
        what: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let guarded = async {
            match self.config.call_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                    Ok(res) => res,
                    Err(_) => Err(Error::Timeout(what.to_string())),
                },
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(Error::Cancelled),
            res = guarded => res,
        }
    }

    async fn expand_path(
        &self,
        ctx: &RequestContext<'_>,
        path: &ResolvedPath,
        start: &[LevelObject],
        quota: Arc<PathQuotaManager>,
    ) -> BranchOutcome {
        let mut state = BatchQueryState::new(self.config.batch_size);
        let mut frontier: Vec<LevelObject> = start.to_vec();
        let mut tails: Vec<Tail> = Vec::with_capacity(frontier.len());
        for object in &frontier {
            let key = object.node_key();
            state.visited.insert(key.clone());
            tails.push(Tail {
                node_key: key,
                path: RelationPath::default(),
                extended: false,
            });
        }

        let mut entries: Vec<RelationPath> = Vec::new();
        let mut objects: BTreeMap<String, ObjectData> = BTreeMap::new();
        let mut status = BranchStatus::Done;
        let mut failed_relation_type = String::new();

        for (level, step) in path.steps.iter().enumerate() {
            if frontier.is_empty() {
                break;
            }
            if quota.is_exhausted() || quota.path_satisfied(path.index) {
                tracing::debug!(
                    "[{}] Quota spent for type path {} at level {}",
                    ctx.request_id,
                    path.index,
                    level
                );
                status = BranchStatus::QuotaExhausted;
                break;
            }
            if ctx.cancel.is_cancelled() {
                status = BranchStatus::Cancelled;
                break;
            }

            let pairs = match self.expand_level(ctx, step, &frontier, &state).await {
                Ok(pairs) => pairs,
                Err(Error::Cancelled) => {
                    status = BranchStatus::Cancelled;
                    break;
                }
                Err(err) => {
                    failed_relation_type = step.relation_type.id.clone();
                    status = BranchStatus::Failed(err);
                    break;
                }
            };

            let mut tail_index: HashMap<String, Vec<usize>> = HashMap::new();
            for (i, tail) in tails.iter().enumerate() {
                tail_index.entry(tail.node_key.clone()).or_default().push(i);
            }

            let mut next_tails: Vec<Tail> = Vec::new();
            let mut next_frontier: Vec<LevelObject> = Vec::new();
            let mut next_keys: HashSet<String> = HashSet::new();
            let mut quota_hit = false;

            'accept: for (source_idx, target) in pairs {
                let target_key = target.node_key();
                if state.visited.contains(&target_key) {
                    continue;
                }
                let source_key = frontier[source_idx].node_key();
                let Some(indices) = tail_index.get(&source_key) else {
                    continue;
                };

                let mut accepted = 0usize;
                for &i in indices {
                    if !quota.try_acquire(path.index) {
                        quota_hit = true;
                        if accepted > 0 && next_keys.insert(target_key.clone()) {
                            objects.insert(target_key.clone(), target.data.clone());
                            next_frontier.push(target);
                        }
                        break 'accept;
                    }
                    let relation = Relation {
                        relation_type_id: step.relation_type.id.clone(),
                        relation_type_name: step.relation_type.name.clone(),
                        direction: step.edge.direction,
                        source_object_id: source_key.clone(),
                        target_object_id: target_key.clone(),
                    };
                    next_tails.push(Tail {
                        node_key: target_key.clone(),
                        path: tails[i].path.extended(relation),
                        extended: false,
                    });
                    tails[i].extended = true;
                    accepted += 1;
                }

                if accepted > 0 && next_keys.insert(target_key.clone()) {
                    objects.insert(target_key, target.data.clone());
                    next_frontier.push(target);
                }
            }

            tracing::debug!(
                "[{}] Type path {} level {} via {}: {} frontier -> {} objects",
                ctx.request_id,
                path.index,
                level,
                step.relation_type.id,
                frontier.len(),
                next_frontier.len()
            );

            entries.extend(
                tails
                    .drain(..)
                    .filter(|t| !t.extended && t.path.length > 0)
                    .map(|t| t.path),
            );
            state.visited.extend(next_keys);
            tails = next_tails;
            frontier = next_frontier;

            if quota_hit {
                status = BranchStatus::QuotaExhausted;
                break;
            }
        }

        entries.extend(
            tails
                .into_iter()
                .filter(|t| !t.extended && t.path.length > 0)
                .map(|t| t.path),
        );

        BranchOutcome {
            path_index: path.index,
            entries,
            objects,
            status,
            failed_relation_type,
        }
    }

    /// Confirmed (frontier index, target) pairs for one level, in batch order
    async fn expand_level(
        &self,
        ctx: &RequestContext<'_>,
        step: &ResolvedStep,
        frontier: &[LevelObject],
        state: &BatchQueryState,
    ) -> Result<Vec<(usize, LevelObject)>> {
        let batch_size = state.batch_size;
        let results: Vec<Result<Vec<(usize, LevelObject)>>> = stream::iter(
            frontier
                .chunks(batch_size)
                .enumerate()
                .map(|(i, batch)| (i * batch_size, batch)),
        )
        .map(|(offset, batch)| self.expand_batch(ctx, step, offset, batch))
        .buffered(self.config.max_concurrency.max(1))
        .collect()
        .await;

        let mut pairs = Vec::new();
        for result in results {
            pairs.extend(result?);
        }
        Ok(pairs)
    }

    /// One backend query (two for indirect edges) for a whole batch, then a
    /// per-pair check since the batched condition can over-match
    async fn expand_batch(
        &self,
        ctx: &RequestContext<'_>,
        step: &ResolvedStep,
        offset: usize,
        batch: &[LevelObject],
    ) -> Result<Vec<(usize, LevelObject)>> {
        let forward = step.edge.direction.is_forward();
        let rules = &step.relation_type.mapping_rules;
        let mut pairs = Vec::new();

        match rules {
            MappingRules::Direct(mappings) => {
                let Some(condition) = direct_batch_condition(batch, mappings, forward) else {
                    return Ok(pairs);
                };
                let candidates = self.candidates(ctx, &step.target_type, condition).await?;
                for (i, source) in batch.iter().enumerate() {
                    for candidate in &candidates {
                        if is_related(&source.data, &candidate.data, rules, forward, &[]) {
                            pairs.push((offset + i, candidate.clone()));
                        }
                    }
                }
            }
            MappingRules::Indirect(mapping) => {
                let Some(view_condition) = view_batch_condition(batch, mapping, forward) else {
                    return Ok(pairs);
                };
                let view_id = mapping.view_id();
                let view_query = ViewQuery {
                    condition: Some(view_condition),
                    limit: self.config.max_candidates,
                };
                let view_data = self
                    .call(ctx, view_id, self.objects.get_view_data(view_id, &view_query))
                    .await
                    .map_err(|err| match err {
                        Error::Cancelled => Error::Cancelled,
                        other => Error::ViewLookupFailed {
                            view_id: view_id.to_string(),
                            reason: other.to_string(),
                        },
                    })?;
                self.note_truncation(ctx, view_id, view_data.rows.len());

                let Some(condition) = target_condition_from_rows(&view_data.rows, mapping, forward)
                else {
                    return Ok(pairs);
                };
                let candidates = self.candidates(ctx, &step.target_type, condition).await?;
                let partitions = partition_view_rows(batch, &view_data.rows, mapping, forward);

                for (i, source) in batch.iter().enumerate() {
                    let Some(rows) = partitions.get(&source.node_key()) else {
                        continue;
                    };
                    for candidate in &candidates {
                        if is_related(&source.data, &candidate.data, rules, forward, rows) {
                            pairs.push((offset + i, candidate.clone()));
                        }
                    }
                }
            }
        }

        Ok(pairs)
    }

    async fn candidates(
        &self,
        ctx: &RequestContext<'_>,
        target_type: &ObjectType,
        condition: CondCfg,
    ) -> Result<Vec<LevelObject>> {
        let query = ObjectQuery {
            kn_id: ctx.kn_id.to_string(),
            branch: ctx.branch.to_string(),
            object_type: target_type.clone(),
            condition: Some(condition),
            limit: self.config.max_candidates,
            with_total: false,
        };
        let page = self
            .call(ctx, &target_type.id, self.objects.get_objects(&query))
            .await?;
        self.note_truncation(ctx, &target_type.id, page.objects.len());
        let mut seen = HashSet::new();
        Ok(to_level_objects(target_type, page.objects)
            .into_iter()
            .filter(|o| seen.insert(o.node_key()))
            .collect())
    }

    fn note_truncation(&self, ctx: &RequestContext<'_>, source: &str, fetched: usize) {
        if fetched >= self.config.max_candidates {
            tracing::warn!(
                "[{}] Batch fetch from {} hit the {} row cap; relations beyond it are dropped",
                ctx.request_id,
                source,
                self.config.max_candidates
            );
            ctx.truncated.store(true, Ordering::Relaxed);
        }
    }
}

fn to_level_objects(object_type: &ObjectType, objects: Vec<ObjectData>) -> Vec<LevelObject> {
    objects
        .into_iter()
        .filter_map(|data| match object_type.object_id(&data) {
            Some(object_id) => Some(LevelObject {
                object_type_id: object_type.id.clone(),
                object_id,
                data,
            }),
            None => {
                tracing::warn!(
                    "Skipping {} object without primary key values",
                    object_type.id
                );
                None
            }
        })
        .collect()
}
