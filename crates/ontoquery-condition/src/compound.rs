//! Boolean composition: and, or

use async_trait::async_trait;
use ontoquery_core::Operation;
use serde_json::{json, Value};

use crate::traits::{Condition, Result};

#[derive(Debug)]
pub struct CompoundCondition {
    operation: Operation,
    children: Vec<Box<dyn Condition>>,
}

impl CompoundCondition {
    pub fn new(operation: Operation, children: Vec<Box<dyn Condition>>) -> Self {
        Self {
            operation,
            children,
        }
    }

    fn is_or(&self) -> bool {
        self.operation == Operation::Or
    }
}

#[async_trait]
impl Condition for CompoundCondition {
    async fn convert(&self) -> Result<Value> {
        let mut clauses = Vec::with_capacity(self.children.len());
        for child in &self.children {
            clauses.push(child.convert().await?);
        }
        Ok(if self.is_or() {
            json!({"bool": {"should": clauses, "minimum_should_match": 1}})
        } else {
            json!({"bool": {"must": clauses}})
        })
    }

    fn convert_to_sql(&self) -> Result<String> {
        let mut parts = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let sql = child.convert_to_sql()?;
            if sql.is_empty() {
                // A dropped disjunct would narrow the result
                if self.is_or() {
                    return Ok(String::new());
                }
                continue;
            }
            parts.push(sql);
        }

        Ok(match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => format!(
                "({})",
                parts.join(if self.is_or() { " OR " } else { " AND " })
            ),
        })
    }
}
