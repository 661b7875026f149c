//! Condition tree builder and two-backend renderer

use ontoquery_core::{CondCfg, Operation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compiler::ConditionCompiler;
use crate::property::PropertyResolver;
use crate::traits::Result;

/// Builds `CondCfg` trees, flattening nested nodes of the same operator
pub struct ConditionTree;

impl ConditionTree {
    pub fn leaf(cfg: CondCfg) -> CondCfg {
        cfg
    }

    /// Conjunction of the present children; None when there are none
    pub fn and(children: impl IntoIterator<Item = Option<CondCfg>>) -> Option<CondCfg> {
        Self::combine(Operation::And, children)
    }

    /// Disjunction of the present children; None when there are none
    pub fn or(children: impl IntoIterator<Item = Option<CondCfg>>) -> Option<CondCfg> {
        Self::combine(Operation::Or, children)
    }

    fn combine(
        operation: Operation,
        children: impl IntoIterator<Item = Option<CondCfg>>,
    ) -> Option<CondCfg> {
        let mut flat = Vec::new();
        for child in children.into_iter().flatten() {
            if child.operation == operation && child.name.is_empty() && child.remain.is_empty() {
                flat.extend(child.sub_conditions);
            } else {
                flat.push(child);
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ if operation == Operation::And => Some(CondCfg::and(flat)),
            _ => Some(CondCfg::or(flat)),
        }
    }
}

/// A condition rendered for both backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCondition {
    pub dsl: Value,
    /// Empty when the condition has no relational form
    pub sql: String,
}

impl RenderedCondition {
    pub fn match_all() -> Self {
        Self {
            dsl: json!({"match_all": {}}),
            sql: String::new(),
        }
    }
}

/// Compile once and render the DSL and SQL forms; absent renders as match-all
pub async fn render(
    compiler: &ConditionCompiler,
    cfg: Option<&CondCfg>,
    resolver: &PropertyResolver,
) -> Result<RenderedCondition> {
    let Some(cfg) = cfg else {
        return Ok(RenderedCondition::match_all());
    };
    let condition = compiler.compile(cfg, resolver)?;
    Ok(RenderedCondition {
        dsl: condition.convert().await?,
        sql: condition.convert_to_sql()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontoquery_core::{DataProperty, PropertyType};

    #[test]
    fn test_tree_flattens_and_skips_absent() {
        let inner = ConditionTree::and([
            Some(CondCfg::eq("a", json!(1))),
            Some(CondCfg::eq("b", json!(2))),
        ]);
        let tree = ConditionTree::and([inner, None, Some(CondCfg::eq("c", json!(3)))]).unwrap();
        assert_eq!(tree.operation, Operation::And);
        assert_eq!(tree.sub_conditions.len(), 3);

        let single = ConditionTree::or([None, Some(CondCfg::eq("a", json!(1)))]).unwrap();
        assert_eq!(single.operation, Operation::Eq);
        assert!(ConditionTree::or(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_render_both_forms() {
        let resolver = PropertyResolver::new(&[
            DataProperty::new("a", PropertyType::Integer),
            DataProperty::new("b", PropertyType::Integer),
        ]);
        let compiler = ConditionCompiler::default();

        let tree = ConditionTree::and([
            Some(CondCfg::eq("a", json!(1))),
            Some(CondCfg::in_values("b", vec![json!(2), json!(3)])),
        ]);
        let rendered = render(&compiler, tree.as_ref(), &resolver).await.unwrap();
        assert_eq!(rendered.sql, "(\"a\" = 1 AND \"b\" IN (2, 3))");
        assert_eq!(
            rendered.dsl,
            json!({"bool": {"must": [{"term": {"a": 1}}, {"terms": {"b": [2, 3]}}]}})
        );

        let all = render(&compiler, None, &resolver).await.unwrap();
        assert_eq!(all, RenderedCondition::match_all());
    }
}
