//! Full-text queries: match, match_phrase, multi_match

use async_trait::async_trait;
use ontoquery_core::{CondCfg, Operation, ALL_FIELDS};
use serde_json::{json, Value};

use crate::error::ConditionError;
use crate::property::PropertyResolver;
use crate::traits::{Condition, Result};

/// Accepted `match_type` values for multi_match
pub const MATCH_TYPES: [&str; 6] = [
    "best_fields",
    "most_fields",
    "cross_fields",
    "phrase",
    "phrase_prefix",
    "bool_prefix",
];

#[derive(Debug, Clone)]
pub struct FulltextCondition {
    operation: Operation,
    fields: Vec<String>,
    query: String,
    match_type: Option<String>,
    multi: bool,
}

impl FulltextCondition {
    pub fn new(cfg: &CondCfg, resolver: &PropertyResolver) -> Result<Self> {
        let query = match cfg.value() {
            Value::String(s) => s.clone(),
            Value::Array(_) => return Err(ConditionError::ArrayValueNotAllowed(cfg.label())),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(ConditionError::invalid_value(
                    cfg.label(),
                    "query text must be a string",
                ))
            }
        };
        let operation = cfg.operation;
        let op_name = operation.as_str();

        let (fields, multi) = if operation == Operation::MultiMatch {
            (multi_match_fields(cfg, resolver)?, true)
        } else {
            let name = if cfg.name.is_empty() { ALL_FIELDS } else { cfg.name.as_str() };
            let properties = match &cfg.name_field {
                Some(p) if name != ALL_FIELDS && p.is_fulltext_capable() => vec![p.clone()],
                _ => resolver.resolve_fulltext(name, op_name)?,
            };
            let fields = properties.iter().map(|p| p.field().to_string()).collect();
            (fields, name == ALL_FIELDS)
        };

        let match_type = match cfg.option("match_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(t)) if MATCH_TYPES.contains(&t.as_str()) => Some(t.clone()),
            Some(other) => {
                return Err(ConditionError::InvalidMatchType(
                    other.as_str().map(str::to_string).unwrap_or_else(|| other.to_string()),
                ))
            }
        };

        Ok(Self {
            operation,
            fields,
            query,
            match_type,
            multi,
        })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Explicit `fields` list when given, else the condition's own name
fn multi_match_fields(cfg: &CondCfg, resolver: &PropertyResolver) -> Result<Vec<String>> {
    let op_name = cfg.operation.as_str();
    let names: Vec<String> = match cfg.option("fields") {
        Some(Value::Array(items)) if !items.is_empty() => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    ConditionError::invalid_value(cfg.label(), "fields must be strings")
                })
            })
            .collect::<Result<_>>()?,
        Some(Value::Array(_)) | None | Some(Value::Null) => {
            let name = if cfg.name.is_empty() { ALL_FIELDS } else { cfg.name.as_str() };
            vec![name.to_string()]
        }
        Some(_) => {
            return Err(ConditionError::invalid_value(
                cfg.label(),
                "fields must be an array",
            ))
        }
    };

    let mut fields = Vec::new();
    for name in &names {
        for property in resolver.resolve_fulltext(name, op_name)? {
            let field = property.field().to_string();
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    Ok(fields)
}

#[async_trait]
impl Condition for FulltextCondition {
    async fn convert(&self) -> Result<Value> {
        // `type` only exists on multi_match; a single-field clause drops it
        if !self.multi && self.fields.len() == 1 {
            let field = &self.fields[0];
            return Ok(json!({self.operation.as_str(): {field: {"query": self.query}}}));
        }

        let mut clause = json!({"query": self.query, "fields": self.fields});
        let match_type = match (&self.match_type, self.operation) {
            (Some(t), _) => Some(t.as_str()),
            (None, Operation::MatchPhrase) => Some("phrase"),
            _ => None,
        };
        if let (Some(t), Some(obj)) = (match_type, clause.as_object_mut()) {
            obj.insert("type".to_string(), json!(t));
        }
        Ok(json!({"multi_match": clause}))
    }

    fn convert_to_sql(&self) -> Result<String> {
        Ok(String::new())
    }
}
