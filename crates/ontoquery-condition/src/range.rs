//! Closed interval: range, outrange

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, Operation};
use serde_json::{json, Value};

use crate::error::ConditionError;
use crate::sql;
use crate::traits::{Condition, Result};

#[derive(Debug, Clone)]
pub struct RangeCondition {
    outside: bool,
    field: String,
    from: Value,
    to: Value,
    label: String,
}

impl RangeCondition {
    pub fn new(cfg: &CondCfg, property: &DataProperty) -> Result<Self> {
        let (from, to) = match cfg.value() {
            Value::Array(items) if items.len() == 2 => (items[0].clone(), items[1].clone()),
            _ => return Err(ConditionError::InvalidRangeValue(cfg.label())),
        };
        let bound = |v: &Value| !(v.is_null() || v.is_array() || v.is_object());
        if !bound(&from) || !bound(&to) {
            return Err(ConditionError::InvalidRangeValue(cfg.label()));
        }

        Ok(Self {
            outside: cfg.operation == Operation::OutRange,
            field: property.field().to_string(),
            from,
            to,
            label: cfg.label(),
        })
    }
}

#[async_trait]
impl Condition for RangeCondition {
    async fn convert(&self) -> Result<Value> {
        let range = json!({"range": {&self.field: {"gte": self.from, "lte": self.to}}});
        Ok(if self.outside {
            json!({"bool": {"must_not": [range]}})
        } else {
            range
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        let field = sql::quote_ident(&self.field);
        let from = sql::literal(&self.from, &self.label)?;
        let to = sql::literal(&self.to, &self.label)?;
        Ok(if self.outside {
            format!("({} IS NULL OR {} < {} OR {} > {})", field, field, from, field, to)
        } else {
            format!("({} >= {} AND {} <= {})", field, from, field, to)
        })
    }
}
