//! Condition compiler: validates a `CondCfg` tree and builds the matching
//! [`Condition`] for every node

use std::sync::Arc;

use ontoquery_core::{CondCfg, DataProperty, Operation, VALUE_FROM_CONST};
use serde_json::Value;

use crate::comparison::ComparisonCondition;
use crate::compound::CompoundCondition;
use crate::error::ConditionError;
use crate::exist::ExistCondition;
use crate::fulltext::FulltextCondition;
use crate::knn::KnnCondition;
use crate::pattern::PatternCondition;
use crate::property::PropertyResolver;
use crate::range::RangeCondition;
use crate::set::SetCondition;
use crate::traits::{Condition, NoVectorizer, Result, Vectorizer};

/// Compiles conditions against a schema. Holds no per-request state.
#[derive(Clone)]
pub struct ConditionCompiler {
    vectorizer: Arc<dyn Vectorizer>,
}

impl std::fmt::Debug for ConditionCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionCompiler").finish_non_exhaustive()
    }
}

impl Default for ConditionCompiler {
    fn default() -> Self {
        Self::new(Arc::new(NoVectorizer))
    }
}

impl ConditionCompiler {
    pub fn new(vectorizer: Arc<dyn Vectorizer>) -> Self {
        Self { vectorizer }
    }

    pub fn vectorizer(&self) -> &Arc<dyn Vectorizer> {
        &self.vectorizer
    }

    /// Compile a condition tree. The first failing node aborts the whole
    /// compile and its label is carried in the error.
    pub fn compile(&self, cfg: &CondCfg, resolver: &PropertyResolver) -> Result<Box<dyn Condition>> {
        if cfg.value_opt.value_from != VALUE_FROM_CONST {
            return Err(ConditionError::UnsupportedValueFrom {
                condition: cfg.label(),
                value_from: cfg.value_opt.value_from.clone(),
            });
        }

        let condition: Box<dyn Condition> = match cfg.operation {
            Operation::And | Operation::Or => {
                if cfg.sub_conditions.is_empty() {
                    return Err(ConditionError::MissingSubConditions(cfg.label()));
                }
                let children = self.compile_all(&cfg.sub_conditions, resolver)?;
                Box::new(CompoundCondition::new(cfg.operation, children))
            }
            Operation::Eq
            | Operation::NotEq
            | Operation::Gt
            | Operation::Gte
            | Operation::Lt
            | Operation::Lte => {
                let property = leaf_property(cfg, resolver)?;
                Box::new(ComparisonCondition::new(cfg, &property)?)
            }
            Operation::In | Operation::NotIn => {
                let property = leaf_property(cfg, resolver)?;
                Box::new(SetCondition::new(cfg, &property)?)
            }
            Operation::Range | Operation::OutRange => {
                let property = leaf_property(cfg, resolver)?;
                Box::new(RangeCondition::new(cfg, &property)?)
            }
            Operation::Exist | Operation::NotExist => {
                let property = leaf_property(cfg, resolver)?;
                Box::new(ExistCondition::new(cfg, &property))
            }
            Operation::Like | Operation::NotLike | Operation::Regex => {
                let property = leaf_property(cfg, resolver)?;
                Box::new(PatternCondition::new(cfg, &property)?)
            }
            Operation::Match | Operation::MatchPhrase | Operation::MultiMatch => {
                Box::new(FulltextCondition::new(cfg, resolver)?)
            }
            Operation::Knn => {
                let filters = self.compile_all(&cfg.sub_conditions, resolver)?;
                Box::new(KnnCondition::new(
                    cfg,
                    resolver,
                    filters,
                    self.vectorizer.clone(),
                )?)
            }
        };

        tracing::debug!("Compiled condition: {}", cfg.label());
        Ok(condition)
    }

    fn compile_all(
        &self,
        cfgs: &[CondCfg],
        resolver: &PropertyResolver,
    ) -> Result<Vec<Box<dyn Condition>>> {
        cfgs.iter()
            .map(|c| {
                self.compile(c, resolver).map_err(|err| {
                    tracing::debug!("Condition {} rejected: {}", c.label(), err);
                    err
                })
            })
            .collect()
    }

    /// Parse raw JSON into a `CondCfg`, reporting unknown operators by name
    pub fn parse(raw: &Value) -> Result<CondCfg> {
        check_operations(raw)?;
        Ok(serde_json::from_value(raw.clone())?)
    }

    /// Fill `name_field` on every leaf the resolver knows
    pub fn annotate(cfg: &mut CondCfg, resolver: &PropertyResolver) {
        if cfg.operation.is_compound() || cfg.operation == Operation::Knn {
            for child in &mut cfg.sub_conditions {
                Self::annotate(child, resolver);
            }
        }
        if !cfg.operation.is_compound() && cfg.name_field.is_none() {
            cfg.name_field = resolver.resolve_with_value(&cfg.name, cfg.value()).ok();
        }
    }
}

/// Property a leaf operates on; pre-resolved `name_field` wins
fn leaf_property(cfg: &CondCfg, resolver: &PropertyResolver) -> Result<DataProperty> {
    match &cfg.name_field {
        Some(property) => Ok(property.clone()),
        None => resolver.resolve_with_value(&cfg.name, cfg.value()),
    }
}

fn check_operations(raw: &Value) -> Result<()> {
    let Some(obj) = raw.as_object() else {
        return Ok(());
    };
    if let Some(op) = obj.get("operation").and_then(Value::as_str) {
        if op.parse::<Operation>().is_err() {
            return Err(ConditionError::UnknownOperation(op.to_string()));
        }
    }
    if let Some(Value::Array(children)) = obj.get("sub_conditions") {
        for child in children {
            check_operations(child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StaticVectorizer;
    use async_trait::async_trait;
    use ontoquery_core::PropertyType;
    use serde_json::json;

    struct FailingVectorizer;

    #[async_trait]
    impl Vectorizer for FailingVectorizer {
        async fn vectorize(&self, _: &DataProperty, _: &str) -> Result<Vec<f32>> {
            Err(ConditionError::Vectorizer("model offline".into()))
        }
    }

    fn resolver() -> PropertyResolver {
        PropertyResolver::new(&[
            DataProperty::new("age", PropertyType::Integer),
            DataProperty::new("name", PropertyType::String).with_mapped_field("f_name"),
            DataProperty::new("title", PropertyType::Text),
            DataProperty::new("body", PropertyType::Text).with_mapped_field("f_body"),
            DataProperty::new("embedding", PropertyType::Vector)
                .with_vector("m1")
                .with_mapped_field("f_embedding"),
        ])
    }

    fn compiler() -> ConditionCompiler {
        ConditionCompiler::new(Arc::new(
            StaticVectorizer::default().with_vector("graph", vec![0.5, 0.25]),
        ))
    }

    fn cond(name: &str, op: Operation, value: Value) -> CondCfg {
        CondCfg::new(name, op, value)
    }

    #[tokio::test]
    async fn test_comparison_rejects_arrays() {
        let compiler = compiler();
        for op in [
            Operation::Eq,
            Operation::NotEq,
            Operation::Gt,
            Operation::Gte,
            Operation::Lt,
            Operation::Lte,
        ] {
            let err = compiler
                .compile(&cond("age", op, json!([1, 2])), &resolver())
                .unwrap_err();
            assert!(matches!(err, ConditionError::ArrayValueNotAllowed(_)), "{}", op);
            assert!(compiler.compile(&cond("age", op, json!(1)), &resolver()).is_ok());
        }
    }

    #[tokio::test]
    async fn test_gt_renders_range_and_sql() {
        let compiled = compiler()
            .compile(&cond("age", Operation::Gt, json!(18)), &resolver())
            .unwrap();
        assert_eq!(
            compiled.convert().await.unwrap(),
            json!({"range": {"age": {"gt": 18}}})
        );
        assert_eq!(compiled.convert_to_sql().unwrap(), "\"age\" > 18");
    }

    #[tokio::test]
    async fn test_noteq_is_negated_term_on_mapped_field() {
        let compiled = compiler()
            .compile(&cond("name", Operation::NotEq, json!("bob")), &resolver())
            .unwrap();
        assert_eq!(
            compiled.convert().await.unwrap(),
            json!({"bool": {"must_not": [{"term": {"f_name": "bob"}}]}})
        );
        assert_eq!(
            compiled.convert_to_sql().unwrap(),
            "(\"f_name\" IS NULL OR \"f_name\" <> 'bob')"
        );
    }

    #[tokio::test]
    async fn test_set_and_range_shapes() {
        let compiler = compiler();
        let r = resolver();

        let notin = compiler
            .compile(&cond("age", Operation::NotIn, json!([1, 2])), &r)
            .unwrap();
        assert_eq!(
            notin.convert_to_sql().unwrap(),
            "(\"age\" IS NULL OR \"age\" NOT IN (1, 2))"
        );
        assert!(matches!(
            compiler.compile(&cond("age", Operation::In, json!(1)), &r),
            Err(ConditionError::ValueMustBeArray(_))
        ));
        assert!(matches!(
            compiler.compile(&cond("age", Operation::In, json!([])), &r),
            Err(ConditionError::ValueMustBeArray(_))
        ));

        let outrange = compiler
            .compile(&cond("age", Operation::OutRange, json!([18, 65])), &r)
            .unwrap();
        assert_eq!(
            outrange.convert_to_sql().unwrap(),
            "(\"age\" IS NULL OR \"age\" < 18 OR \"age\" > 65)"
        );
        assert_eq!(
            outrange.convert().await.unwrap(),
            json!({"bool": {"must_not": [{"range": {"age": {"gte": 18, "lte": 65}}}]}})
        );
        assert!(matches!(
            compiler.compile(&cond("age", Operation::Range, json!([1])), &r),
            Err(ConditionError::InvalidRangeValue(_))
        ));
    }

    #[tokio::test]
    async fn test_exist_and_pattern() {
        let compiler = compiler();
        let r = resolver();

        let missing = compiler
            .compile(&cond("name", Operation::NotExist, Value::Null), &r)
            .unwrap();
        assert_eq!(missing.convert_to_sql().unwrap(), "\"f_name\" IS NULL");

        let like = compiler
            .compile(&cond("name", Operation::Like, json!("50%")), &r)
            .unwrap();
        assert_eq!(
            like.convert().await.unwrap(),
            json!({"wildcard": {"f_name": {"value": "*50%*"}}})
        );
        assert_eq!(
            like.convert_to_sql().unwrap(),
            "\"f_name\" LIKE '%50\\%%' ESCAPE '\\'"
        );

        let regex = compiler
            .compile(&cond("name", Operation::Regex, json!("^b.*")), &r)
            .unwrap();
        assert_eq!(regex.convert_to_sql().unwrap(), "");
    }

    #[tokio::test]
    async fn test_fulltext_requires_enabled_string_field() {
        let disabled = PropertyResolver::new(&[DataProperty::new("summary", PropertyType::String)]);
        let enabled =
            PropertyResolver::new(&[DataProperty::new("summary", PropertyType::String).with_fulltext()]);

        for op in [Operation::Match, Operation::MatchPhrase, Operation::MultiMatch] {
            let cfg = cond("summary", op, json!("graph"));
            assert!(matches!(
                compiler().compile(&cfg, &disabled),
                Err(ConditionError::NoEligibleField { .. })
            ));
            let compiled = compiler().compile(&cfg, &enabled).unwrap();
            assert_eq!(compiled.convert_to_sql().unwrap(), "");
        }
    }

    #[tokio::test]
    async fn test_match_on_all_fields_becomes_multi_match() {
        let compiler = compiler();
        let single = compiler
            .compile(&cond("title", Operation::MatchPhrase, json!("graph db")), &resolver())
            .unwrap();
        assert_eq!(
            single.convert().await.unwrap(),
            json!({"match_phrase": {"title": {"query": "graph db"}}})
        );

        let all = compiler
            .compile(&cond("*", Operation::MatchPhrase, json!("graph db")), &resolver())
            .unwrap();
        assert_eq!(
            all.convert().await.unwrap(),
            json!({"multi_match": {"query": "graph db", "fields": ["title", "f_body"], "type": "phrase"}})
        );
    }

    #[tokio::test]
    async fn test_multi_match_fields_and_match_type() {
        let compiler = compiler();
        let cfg = cond("*", Operation::MultiMatch, json!("graph"))
            .with_option("fields", json!(["body"]))
            .with_option("match_type", json!("most_fields"));
        let compiled = compiler.compile(&cfg, &resolver()).unwrap();
        assert_eq!(
            compiled.convert().await.unwrap(),
            json!({"multi_match": {"query": "graph", "fields": ["f_body"], "type": "most_fields"}})
        );

        let bad = cond("*", Operation::MultiMatch, json!("graph"))
            .with_option("match_type", json!("fuzzy_fields"));
        assert!(matches!(
            compiler.compile(&bad, &resolver()),
            Err(ConditionError::InvalidMatchType(t)) if t == "fuzzy_fields"
        ));

        let ineligible = cond("*", Operation::MultiMatch, json!("graph"))
            .with_option("fields", json!(["age"]));
        assert!(compiler.compile(&ineligible, &resolver()).is_err());
    }

    #[tokio::test]
    async fn test_match_type_ignored_on_single_field() {
        let compiler = compiler();
        for op in [Operation::Match, Operation::MatchPhrase] {
            let cfg = cond("title", op, json!("graph")).with_option("match_type", json!("phrase_prefix"));
            let compiled = compiler.compile(&cfg, &resolver()).unwrap();
            assert_eq!(
                compiled.convert().await.unwrap(),
                json!({op.as_str(): {"title": {"query": "graph"}}})
            );
        }

        // Still honoured once `*` expands to multi_match
        let all = cond("*", Operation::Match, json!("graph")).with_option("match_type", json!("most_fields"));
        assert_eq!(
            compiler.compile(&all, &resolver()).unwrap().convert().await.unwrap(),
            json!({"multi_match": {"query": "graph", "fields": ["title", "f_body"], "type": "most_fields"}})
        );
    }

    #[tokio::test]
    async fn test_knn_vectorizer_failure_propagates() {
        let compiler = ConditionCompiler::new(Arc::new(FailingVectorizer));
        let compiled = compiler
            .compile(&cond("embedding", Operation::Knn, json!("graph")), &resolver())
            .unwrap();
        let err = compiled.convert().await.unwrap_err();
        assert!(matches!(err, ConditionError::Vectorizer(_)));
    }

    #[tokio::test]
    async fn test_knn_clause_and_filter() {
        let compiler = compiler();
        let plain = compiler
            .compile(&cond("embedding", Operation::Knn, json!("graph")), &resolver())
            .unwrap();
        let dsl = plain.convert().await.unwrap();
        assert_eq!(dsl["knn"]["f_embedding"]["vector"], json!([0.5, 0.25]));
        assert_eq!(dsl["knn"]["f_embedding"]["k"], json!(10));
        assert!(dsl["knn"]["f_embedding"].get("filter").is_none());

        let filtered = cond("embedding", Operation::Knn, json!("graph"))
            .with_option("limit_key", json!("min_score"))
            .with_option("limit_value", json!(0.8))
            .with_sub_condition(cond("age", Operation::Gte, json!(21)));
        let dsl = compiler
            .compile(&filtered, &resolver())
            .unwrap()
            .convert()
            .await
            .unwrap();
        assert_eq!(dsl["knn"]["f_embedding"]["min_score"], json!(0.8));
        assert_eq!(
            dsl["knn"]["f_embedding"]["filter"],
            json!({"range": {"age": {"gte": 21}}})
        );

        let bad_key = cond("embedding", Operation::Knn, json!("graph"))
            .with_option("limit_key", json!("top"));
        assert!(matches!(
            compiler.compile(&bad_key, &resolver()),
            Err(ConditionError::InvalidLimitKey(_))
        ));
        assert!(matches!(
            compiler.compile(&cond("title", Operation::Knn, json!("graph")), &resolver()),
            Err(ConditionError::NoEligibleField { .. })
        ));
    }

    #[tokio::test]
    async fn test_compound_sql_skips_and_blanks() {
        let compiler = compiler();
        let r = resolver();

        let and = CondCfg::and(vec![
            cond("age", Operation::Gt, json!(18)),
            cond("title", Operation::Match, json!("graph")),
            cond("name", Operation::Eq, json!("x")),
        ]);
        let compiled = compiler.compile(&and, &r).unwrap();
        assert_eq!(
            compiled.convert_to_sql().unwrap(),
            "(\"age\" > 18 AND \"f_name\" = 'x')"
        );
        assert_eq!(compiled.convert().await.unwrap()["bool"]["must"].as_array().unwrap().len(), 3);

        let or = CondCfg::or(vec![
            cond("age", Operation::Gt, json!(18)),
            cond("title", Operation::Match, json!("graph")),
        ]);
        let compiled = compiler.compile(&or, &r).unwrap();
        assert_eq!(compiled.convert_to_sql().unwrap(), "");
        assert_eq!(
            compiled.convert().await.unwrap()["bool"]["minimum_should_match"],
            json!(1)
        );
    }

    #[tokio::test]
    async fn test_compound_fails_on_any_child() {
        let cfg = CondCfg::and(vec![
            cond("age", Operation::Gt, json!(18)),
            cond("missing", Operation::Eq, json!(1)),
        ]);
        let err = compiler().compile(&cfg, &resolver()).unwrap_err();
        assert!(err.to_string().contains("missing"));

        assert!(matches!(
            compiler().compile(&CondCfg::or(vec![]), &resolver()),
            Err(ConditionError::MissingSubConditions(_))
        ));
    }

    #[test]
    fn test_value_from_and_unknown_operation() {
        let mut cfg = cond("age", Operation::Eq, json!(1));
        cfg.value_opt.value_from = "field".into();
        assert!(matches!(
            compiler().compile(&cfg, &resolver()),
            Err(ConditionError::UnsupportedValueFrom { .. })
        ));

        let raw = json!({"operation": "and", "sub_conditions": [
            {"name": "age", "operation": "between", "value": [1, 2]}
        ]});
        assert!(matches!(
            ConditionCompiler::parse(&raw),
            Err(ConditionError::UnknownOperation(op)) if op == "between"
        ));
    }

    #[test]
    fn test_annotate_resolves_leaves() {
        let mut cfg = CondCfg::and(vec![
            cond("name", Operation::Eq, json!("x")),
            cond("nope", Operation::Eq, json!(1)),
        ]);
        ConditionCompiler::annotate(&mut cfg, &resolver());
        assert!(cfg.name_field.is_none());
        assert_eq!(
            cfg.sub_conditions[0].name_field.as_ref().map(|p| p.field()),
            Some("f_name")
        );
        assert!(cfg.sub_conditions[1].name_field.is_none());
    }
}
