//! Abstract filter expressions (`CondCfg`), the platform-wide wire format
//! for conditions. Compilation to backend queries lives in
//! `ontoquery-condition`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::object_type::DataProperty;

/// Sentinel property name meaning "every eligible field"
pub const ALL_FIELDS: &str = "*";

/// Only supported value source: a literal in the condition itself
pub const VALUE_FROM_CONST: &str = "const";

/// Operator of a condition node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operation {
    And,
    Or,
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    NotLike,
    Range,
    OutRange,
    Exist,
    NotExist,
    Regex,
    Match,
    MatchPhrase,
    MultiMatch,
    Knn,
}

impl Operation {
    pub const ALL: [Operation; 21] = [
        Self::And,
        Self::Or,
        Self::Eq,
        Self::NotEq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Like,
        Self::NotLike,
        Self::Range,
        Self::OutRange,
        Self::Exist,
        Self::NotExist,
        Self::Regex,
        Self::Match,
        Self::MatchPhrase,
        Self::MultiMatch,
        Self::Knn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Eq => "eq",
            Self::NotEq => "noteq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::Like => "like",
            Self::NotLike => "notlike",
            Self::Range => "range",
            Self::OutRange => "outrange",
            Self::Exist => "exist",
            Self::NotExist => "notexist",
            Self::Regex => "regex",
            Self::Match => "match",
            Self::MatchPhrase => "match_phrase",
            Self::MultiMatch => "multi_match",
            Self::Knn => "knn",
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

impl TryFrom<String> for Operation {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self {
        op.as_str().to_string()
    }
}

fn default_value_from() -> String {
    VALUE_FROM_CONST.to_string()
}

fn is_const(value_from: &str) -> bool {
    value_from == VALUE_FROM_CONST
}

/// Value and where it comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOptCfg {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,

    #[serde(default = "default_value_from", skip_serializing_if = "is_const")]
    pub value_from: String,
}

impl Default for ValueOptCfg {
    fn default() -> Self {
        Self {
            value: Value::Null,
            value_from: default_value_from(),
        }
    }
}

/// Abstract filter node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondCfg {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    pub operation: Operation,

    #[serde(flatten)]
    pub value_opt: ValueOptCfg,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_conditions: Vec<CondCfg>,

    /// Resolved property; populated during compilation, never on the wire
    #[serde(skip)]
    pub name_field: Option<DataProperty>,

    /// Operator-specific options (`fields`, `match_type`, `limit_key`, ...)
    #[serde(flatten)]
    pub remain: Map<String, Value>,
}

impl CondCfg {
    pub fn new(name: impl Into<String>, operation: Operation, value: Value) -> Self {
        Self {
            name: name.into(),
            operation,
            value_opt: ValueOptCfg {
                value,
                value_from: default_value_from(),
            },
            sub_conditions: Vec::new(),
            name_field: None,
            remain: Map::new(),
        }
    }

    pub fn eq(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, Operation::Eq, value)
    }

    pub fn in_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(name, Operation::In, Value::Array(values))
    }

    pub fn and(children: Vec<CondCfg>) -> Self {
        Self::compound(Operation::And, children)
    }

    pub fn or(children: Vec<CondCfg>) -> Self {
        Self::compound(Operation::Or, children)
    }

    fn compound(operation: Operation, children: Vec<CondCfg>) -> Self {
        Self {
            name: String::new(),
            operation,
            value_opt: ValueOptCfg::default(),
            sub_conditions: children,
            name_field: None,
            remain: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.remain.insert(key.into(), value);
        self
    }

    pub fn with_sub_condition(mut self, cond: CondCfg) -> Self {
        self.sub_conditions.push(cond);
        self
    }

    pub fn value(&self) -> &Value {
        &self.value_opt.value
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.remain.get(key)
    }

    /// Label used in error messages to point at the offending node
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.operation.to_string()
        } else {
            format!("{} {}", self.name, self.operation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_keywords_round_trip() {
        for op in Operation::ALL {
            let encoded = serde_json::to_value(op).unwrap();
            let decoded: Operation = serde_json::from_value(encoded).unwrap();
            assert_eq!(op, decoded);
        }
    }

    #[test]
    fn test_unknown_operation_rejected_at_parse() {
        let raw = json!({"name": "age", "operation": "between", "value": 1});
        let err = serde_json::from_value::<CondCfg>(raw).unwrap_err();
        assert!(err.to_string().contains("unknown operation"));
    }

    #[test]
    fn test_cond_cfg_round_trip_keeps_remain() {
        let raw = json!({
            "operation": "and",
            "sub_conditions": [
                {"name": "age", "operation": "gt", "value": 18},
                {
                    "name": "*",
                    "operation": "multi_match",
                    "value": "graph database",
                    "fields": ["title", "body"],
                    "match_type": "best_fields"
                },
                {
                    "name": "embedding",
                    "operation": "knn",
                    "value": "similar docs",
                    "value_from": "const",
                    "limit_key": "k",
                    "limit_value": 5
                }
            ]
        });
        let cfg: CondCfg = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.sub_conditions.len(), 3);
        assert_eq!(
            cfg.sub_conditions[1].option("match_type"),
            Some(&json!("best_fields"))
        );

        let encoded = serde_json::to_value(&cfg).unwrap();
        let decoded: CondCfg = serde_json::from_value(encoded).unwrap();
        assert_eq!(cfg, decoded);
    }

    #[test]
    fn test_builders() {
        let cond = CondCfg::or(vec![
            CondCfg::eq("id", json!(1)),
            CondCfg::in_values("id", vec![json!(2), json!(3)]),
        ]);
        assert_eq!(cond.operation, Operation::Or);
        assert_eq!(cond.sub_conditions[1].value(), &json!([2, 3]));
        assert_eq!(cond.label(), "or");
        assert_eq!(cond.sub_conditions[0].label(), "id eq");
    }
}
