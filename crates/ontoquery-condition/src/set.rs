//! Set membership: in, notin

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, Operation};
use serde_json::{json, Value};

use crate::error::ConditionError;
use crate::sql;
use crate::traits::{Condition, Result};

#[derive(Debug, Clone)]
pub struct SetCondition {
    negated: bool,
    field: String,
    values: Vec<Value>,
    label: String,
}

impl SetCondition {
    pub fn new(cfg: &CondCfg, property: &DataProperty) -> Result<Self> {
        let values = match cfg.value() {
            Value::Array(items) if !items.is_empty() => items.clone(),
            _ => return Err(ConditionError::ValueMustBeArray(cfg.label())),
        };
        if values.iter().any(|v| v.is_array() || v.is_object()) {
            return Err(ConditionError::invalid_value(
                cfg.label(),
                "set members must be scalars",
            ));
        }

        Ok(Self {
            negated: cfg.operation == Operation::NotIn,
            field: property.field().to_string(),
            values,
            label: cfg.label(),
        })
    }
}

#[async_trait]
impl Condition for SetCondition {
    async fn convert(&self) -> Result<Value> {
        let terms = json!({"terms": {&self.field: self.values}});
        Ok(if self.negated {
            json!({"bool": {"must_not": [terms]}})
        } else {
            terms
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        let predicate = format!(
            "{} {} ({})",
            sql::quote_ident(&self.field),
            if self.negated { "NOT IN" } else { "IN" },
            sql::literal_list(&self.values, &self.label)?
        );
        Ok(if self.negated {
            sql::or_null(&self.field, predicate)
        } else {
            predicate
        })
    }
}
