//! Field presence: exist, notexist

use async_trait::async_trait;
use ontoquery_core::{CondCfg, DataProperty, Operation};
use serde_json::{json, Value};

use crate::sql;
use crate::traits::{Condition, Result};

#[derive(Debug, Clone)]
pub struct ExistCondition {
    negated: bool,
    field: String,
}

impl ExistCondition {
    pub fn new(cfg: &CondCfg, property: &DataProperty) -> Self {
        Self {
            negated: cfg.operation == Operation::NotExist,
            field: property.field().to_string(),
        }
    }
}

#[async_trait]
impl Condition for ExistCondition {
    async fn convert(&self) -> Result<Value> {
        let exists = json!({"exists": {"field": self.field}});
        Ok(if self.negated {
            json!({"bool": {"must_not": [exists]}})
        } else {
            exists
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        Ok(format!(
            "{} IS {}NULL",
            sql::quote_ident(&self.field),
            if self.negated { "" } else { "NOT " }
        ))
    }
}
