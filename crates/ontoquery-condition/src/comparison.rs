//! Scalar comparison: eq, noteq, gt, gte, lt, lte

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, Operation};
use serde_json::{json, Value};

use crate::error::ConditionError;
use crate::sql;
use crate::traits::{Condition, Result};

#[derive(Debug, Clone)]
pub struct ComparisonCondition {
    operation: Operation,
    field: String,
    value: Value,
    label: String,
}

impl ComparisonCondition {
    pub fn new(cfg: &CondCfg, property: &DataProperty) -> Result<Self> {
        let value = scalar_value(cfg)?;
        Ok(Self {
            operation: cfg.operation,
            field: property.field().to_string(),
            value,
            label: cfg.label(),
        })
    }

    fn sql_operator(&self) -> &'static str {
        match self.operation {
            Operation::Eq => "=",
            Operation::NotEq => "<>",
            Operation::Gt => ">",
            Operation::Gte => ">=",
            Operation::Lt => "<",
            _ => "<=",
        }
    }
}

/// Value of a scalar-only operator
pub(crate) fn scalar_value(cfg: &CondCfg) -> Result<Value> {
    match cfg.value() {
        Value::Array(_) => Err(ConditionError::ArrayValueNotAllowed(cfg.label())),
        Value::Null => Err(ConditionError::invalid_value(cfg.label(), "value is required")),
        Value::Object(_) => Err(ConditionError::invalid_value(
            cfg.label(),
            "value must be a scalar",
        )),
        value => Ok(value.clone()),
    }
}

#[async_trait]
impl Condition for ComparisonCondition {
    async fn convert(&self) -> Result<Value> {
        let term = json!({"term": {&self.field: self.value}});
        Ok(match self.operation {
            Operation::Eq => term,
            Operation::NotEq => json!({"bool": {"must_not": [term]}}),
            op => json!({"range": {&self.field: {op.as_str(): self.value}}}),
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        let predicate = format!(
            "{} {} {}",
            sql::quote_ident(&self.field),
            self.sql_operator(),
            sql::literal(&self.value, &self.label)?
        );
        Ok(if self.operation == Operation::NotEq {
            sql::or_null(&self.field, predicate)
        } else {
            predicate
        })
    }
}
