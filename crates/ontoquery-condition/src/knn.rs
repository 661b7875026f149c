//! Vector similarity (knn) with an optional structured pre-filter

use std::sync::Arc;

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, ALL_FIELDS};
use serde_json::{json, Map, Value};

use crate::error::ConditionError;
use crate::property::PropertyResolver;
use crate::traits::{Condition, Result, Vectorizer};

/// Accepted `limit_key` values
pub const LIMIT_KEYS: [&str; 3] = ["k", "min_score", "max_distance"];

pub const DEFAULT_LIMIT_KEY: &str = "k";
pub const DEFAULT_LIMIT_VALUE: u64 = 10;

pub struct KnnCondition {
    property: DataProperty,
    query: String,
    limit_key: String,
    limit_value: Value,
    filters: Vec<Box<dyn Condition>>,
    vectorizer: Arc<dyn Vectorizer>,
}

impl std::fmt::Debug for KnnCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnnCondition")
            .field("field", &self.property.field())
            .field("query", &self.query)
            .field("limit_key", &self.limit_key)
            .field("limit_value", &self.limit_value)
            .field("filters", &self.filters)
            .finish()
    }
}

impl KnnCondition {
    pub fn new(
        cfg: &CondCfg,
        resolver: &PropertyResolver,
        filters: Vec<Box<dyn Condition>>,
        vectorizer: Arc<dyn Vectorizer>,
    ) -> Result<Self> {
        let query = match cfg.value() {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Array(_) => return Err(ConditionError::ArrayValueNotAllowed(cfg.label())),
            _ => {
                return Err(ConditionError::invalid_value(
                    cfg.label(),
                    "query text must be a non-empty string",
                ))
            }
        };

        let name = if cfg.name.is_empty() { ALL_FIELDS } else { cfg.name.as_str() };
        let property = match &cfg.name_field {
            Some(p) if name != ALL_FIELDS && p.is_vector_capable() => p.clone(),
            _ => resolver
                .resolve_vector(name, cfg.operation.as_str())?
                .into_iter()
                .next()
                .ok_or_else(|| ConditionError::NoEligibleField {
                    name: name.to_string(),
                    operation: cfg.operation.to_string(),
                })?,
        };

        let limit_key = match cfg.option("limit_key") {
            None | Some(Value::Null) => DEFAULT_LIMIT_KEY.to_string(),
            Some(Value::String(k)) if LIMIT_KEYS.contains(&k.as_str()) => k.clone(),
            Some(other) => {
                return Err(ConditionError::InvalidLimitKey(
                    other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                ))
            }
        };
        let limit_value = match cfg.option("limit_value") {
            None | Some(Value::Null) => json!(DEFAULT_LIMIT_VALUE),
            Some(v @ Value::Number(_)) => v.clone(),
            Some(_) => {
                return Err(ConditionError::invalid_value(
                    cfg.label(),
                    "limit_value must be a number",
                ))
            }
        };

        Ok(Self {
            property,
            query,
            limit_key,
            limit_value,
            filters,
            vectorizer,
        })
    }
}

#[async_trait]
impl Condition for KnnCondition {
    async fn convert(&self) -> Result<Value> {
        let vector = self.vectorizer.vectorize(&self.property, &self.query).await?;
        tracing::debug!(
            "Vectorized knn query for {} ({} dims)",
            self.property.name,
            vector.len()
        );

        let mut clause = Map::new();
        clause.insert("vector".to_string(), json!(vector));
        clause.insert(self.limit_key.clone(), self.limit_value.clone());

        match self.filters.len() {
            0 => {}
            1 => {
                clause.insert("filter".to_string(), self.filters[0].convert().await?);
            }
            _ => {
                let mut must = Vec::with_capacity(self.filters.len());
                for filter in &self.filters {
                    must.push(filter.convert().await?);
                }
                clause.insert("filter".to_string(), json!({"bool": {"must": must}}));
            }
        }

        Ok(json!({"knn": {self.property.field(): Value::Object(clause)}}))
    }

    fn convert_to_sql(&self) -> Result<String> {
        Ok(String::new())
    }
}
