//! String patterns: like, notlike, regex

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, Operation};
use serde_json::{json, Value};

use crate::error::ConditionError;
use crate::sql;
use crate::traits::{Condition, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKind {
    Like,
    NotLike,
    Regex,
}

#[derive(Debug, Clone)]
pub struct PatternCondition {
    kind: PatternKind,
    field: String,
    pattern: String,
}

impl PatternCondition {
    pub fn new(cfg: &CondCfg, property: &DataProperty) -> Result<Self> {
        let pattern = match cfg.value() {
            Value::String(s) => s.clone(),
            Value::Array(_) => return Err(ConditionError::ArrayValueNotAllowed(cfg.label())),
            _ => {
                return Err(ConditionError::invalid_value(
                    cfg.label(),
                    "pattern must be a string",
                ))
            }
        };
        let kind = match cfg.operation {
            Operation::Like => PatternKind::Like,
            Operation::NotLike => PatternKind::NotLike,
            _ => PatternKind::Regex,
        };

        Ok(Self {
            kind,
            field: property.field().to_string(),
            pattern,
        })
    }
}

/// Escape wildcard metacharacters so the value matches literally
fn escape_wildcard(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl Condition for PatternCondition {
    async fn convert(&self) -> Result<Value> {
        Ok(match self.kind {
            PatternKind::Regex => json!({"regexp": {&self.field: {"value": self.pattern}}}),
            kind => {
                let wildcard = json!({
                    "wildcard": {&self.field: {"value": format!("*{}*", escape_wildcard(&self.pattern))}}
                });
                if kind == PatternKind::NotLike {
                    json!({"bool": {"must_not": [wildcard]}})
                } else {
                    wildcard
                }
            }
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        let operator = match self.kind {
            PatternKind::Regex => return Ok(String::new()),
            PatternKind::Like => "LIKE",
            PatternKind::NotLike => "NOT LIKE",
        };
        let predicate = format!(
            "{} {} {} ESCAPE '\\'",
            sql::quote_ident(&self.field),
            operator,
            sql::quote_str(&format!("%{}%", sql::escape_like(&self.pattern)))
        );
        Ok(if self.kind == PatternKind::NotLike {
            sql::or_null(&self.field, predicate)
        } else {
            predicate
        })
    }
}
