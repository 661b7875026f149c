//! In-memory evaluation of the search DSL subset the condition compiler
//! emits

use std::cmp::Ordering;

use ontoquery_core::value::{to_plain_string, values_equal};
use ontoquery_core::ObjectData;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{StorageError, StorageResult};

/// Parsed DSL query
#[derive(Debug, Clone)]
pub enum Query {
    MatchAll,
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Range {
        field: String,
        bounds: Vec<(RangeOp, Value)>,
    },
    Exists {
        field: String,
    },
    Pattern {
        field: String,
        regex: Regex,
    },
    Match {
        fields: Vec<String>,
        query: String,
        phrase: bool,
    },
    Knn {
        field: String,
        vector: Vec<f32>,
        limit: KnnLimit,
        filter: Option<Box<Query>>,
    },
    Bool {
        must: Vec<Query>,
        filter: Vec<Query>,
        should: Vec<Query>,
        must_not: Vec<Query>,
        minimum_should_match: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Result cap of a knn clause
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnnLimit {
    K(usize),
    MinScore(f64),
    MaxDistance(f64),
}

fn unsupported(what: impl std::fmt::Display) -> StorageError {
    StorageError::UnsupportedQuery(what.to_string())
}

/// The single `{field: body}` entry of a leaf clause
fn single_entry<'a>(clause: &'a Value, kind: &str) -> StorageResult<(&'a String, &'a Value)> {
    let obj = clause
        .as_object()
        .ok_or_else(|| unsupported(format!("{} body must be an object", kind)))?;
    let mut iter = obj.iter();
    match (iter.next(), iter.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(unsupported(format!("{} needs exactly one field", kind))),
    }
}

fn parse_list(value: Option<&Value>) -> StorageResult<Vec<Query>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(Query::parse).collect(),
        Some(single @ Value::Object(_)) => Ok(vec![Query::parse(single)?]),
        Some(other) => Err(unsupported(format!("bool clause list: {}", other))),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Regex for an Elasticsearch-style wildcard pattern (`*`, `?`, `\` escape)
fn wildcard_regex(pattern: &str) -> StorageResult<Regex> {
    let mut out = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| unsupported(format!("wildcard {}: {}", pattern, e)))
}

fn pattern_value(body: &Value) -> Option<&str> {
    match body {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str),
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl Query {
    pub fn parse(dsl: &Value) -> StorageResult<Self> {
        let (kind, body) = single_entry(dsl, "query")?;
        match kind.as_str() {
            "match_all" => Ok(Self::MatchAll),
            "term" => {
                let (field, value) = single_entry(body, kind)?;
                let value = match value {
                    Value::Object(obj) if obj.contains_key("value") => obj["value"].clone(),
                    other => other.clone(),
                };
                Ok(Self::Term {
                    field: field.clone(),
                    value,
                })
            }
            "terms" => {
                let (field, values) = single_entry(body, kind)?;
                let values = values
                    .as_array()
                    .cloned()
                    .ok_or_else(|| unsupported("terms needs an array"))?;
                Ok(Self::Terms {
                    field: field.clone(),
                    values,
                })
            }
            "range" => {
                let (field, spec) = single_entry(body, kind)?;
                let spec = spec
                    .as_object()
                    .ok_or_else(|| unsupported("range bounds must be an object"))?;
                let mut bounds = Vec::new();
                for (op, value) in spec {
                    let op = match op.as_str() {
                        "gt" => RangeOp::Gt,
                        "gte" => RangeOp::Gte,
                        "lt" => RangeOp::Lt,
                        "lte" => RangeOp::Lte,
                        other => return Err(unsupported(format!("range operator {}", other))),
                    };
                    bounds.push((op, value.clone()));
                }
                Ok(Self::Range {
                    field: field.clone(),
                    bounds,
                })
            }
            "exists" => {
                let field = body
                    .get("field")
                    .and_then(Value::as_str)
                    .ok_or_else(|| unsupported("exists needs a field"))?;
                Ok(Self::Exists {
                    field: field.to_string(),
                })
            }
            "wildcard" | "regexp" => {
                let (field, spec) = single_entry(body, kind)?;
                let pattern = pattern_value(spec)
                    .ok_or_else(|| unsupported(format!("{} needs a value", kind)))?;
                let regex = if kind == "wildcard" {
                    wildcard_regex(pattern)?
                } else {
                    Regex::new(&format!("^(?:{})$", pattern))
                        .map_err(|e| unsupported(format!("regexp {}: {}", pattern, e)))?
                };
                Ok(Self::Pattern {
                    field: field.clone(),
                    regex,
                })
            }
            "match" | "match_phrase" => {
                let (field, spec) = single_entry(body, kind)?;
                let query = match spec {
                    Value::Object(obj) => obj.get("query").map(to_plain_string).unwrap_or_default(),
                    other => to_plain_string(other),
                };
                Ok(Self::Match {
                    fields: vec![field.clone()],
                    query,
                    phrase: kind == "match_phrase",
                })
            }
            "multi_match" => {
                let query = body.get("query").map(to_plain_string).unwrap_or_default();
                let fields = body
                    .get("fields")
                    .and_then(Value::as_array)
                    .map(|f| f.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default();
                let phrase = matches!(
                    body.get("type").and_then(Value::as_str),
                    Some("phrase") | Some("phrase_prefix")
                );
                Ok(Self::Match {
                    fields,
                    query,
                    phrase,
                })
            }
            "knn" => {
                let (field, spec) = single_entry(body, kind)?;
                let vector = spec
                    .get("vector")
                    .and_then(Value::as_array)
                    .ok_or_else(|| unsupported("knn needs a vector"))?
                    .iter()
                    .map(|v| v.as_f64().map(|f| f as f32))
                    .collect::<Option<Vec<f32>>>()
                    .ok_or_else(|| unsupported("knn vector must be numeric"))?;
                let limit = if let Some(k) = spec.get("k").and_then(Value::as_u64) {
                    KnnLimit::K(k as usize)
                } else if let Some(s) = spec.get("min_score").and_then(Value::as_f64) {
                    KnnLimit::MinScore(s)
                } else if let Some(d) = spec.get("max_distance").and_then(Value::as_f64) {
                    KnnLimit::MaxDistance(d)
                } else {
                    KnnLimit::K(10)
                };
                let filter = match spec.get("filter") {
                    Some(f) => Some(Box::new(Self::parse(f)?)),
                    None => None,
                };
                Ok(Self::Knn {
                    field: field.clone(),
                    vector,
                    limit,
                    filter,
                })
            }
            "bool" => {
                let must = parse_list(body.get("must"))?;
                let filter = parse_list(body.get("filter"))?;
                let should = parse_list(body.get("should"))?;
                let must_not = parse_list(body.get("must_not"))?;
                let minimum_should_match = match body.get("minimum_should_match") {
                    Some(v) => v.as_u64().unwrap_or(1) as usize,
                    None if !should.is_empty() && must.is_empty() && filter.is_empty() => 1,
                    None => 0,
                };
                Ok(Self::Bool {
                    must,
                    filter,
                    should,
                    must_not,
                    minimum_should_match,
                })
            }
            other => Err(unsupported(format!("query type {}", other))),
        }
    }

    /// Whether `doc` satisfies the query
    pub fn matches(&self, doc: &ObjectData) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Term { field, value } => field_values(doc, field).any(|v| values_equal(v, value)),
            Self::Terms { field, values } => {
                field_values(doc, field).any(|v| values.iter().any(|t| values_equal(v, t)))
            }
            Self::Range { field, bounds } => field_values(doc, field).any(|v| {
                bounds.iter().all(|(op, bound)| match compare(v, bound) {
                    Some(ord) => match op {
                        RangeOp::Gt => ord == Ordering::Greater,
                        RangeOp::Gte => ord != Ordering::Less,
                        RangeOp::Lt => ord == Ordering::Less,
                        RangeOp::Lte => ord != Ordering::Greater,
                    },
                    None => false,
                })
            }),
            Self::Exists { field } => field_values(doc, field).next().is_some(),
            Self::Pattern { field, regex } => field_values(doc, field)
                .any(|v| !v.is_array() && !v.is_object() && regex.is_match(&to_plain_string(v))),
            Self::Match {
                fields,
                query,
                phrase,
            } => {
                let wanted = tokenize(query);
                !wanted.is_empty()
                    && fields.iter().any(|f| {
                        field_values(doc, f).any(|v| {
                            let have = tokenize(&to_plain_string(v));
                            if *phrase {
                                have.windows(wanted.len()).any(|w| w == wanted.as_slice())
                            } else {
                                wanted.iter().any(|t| have.contains(t))
                            }
                        })
                    })
            }
            Self::Knn {
                field,
                vector,
                limit,
                filter,
            } => {
                if let Some(filter) = filter {
                    if !filter.matches(doc) {
                        return false;
                    }
                }
                let Some(similarity) = doc_vector(doc, field).and_then(|d| cosine(vector, &d)) else {
                    return false;
                };
                match limit {
                    KnnLimit::K(_) => true,
                    KnnLimit::MinScore(min) => similarity >= *min,
                    KnnLimit::MaxDistance(max) => 1.0 - similarity <= *max,
                }
            }
            Self::Bool {
                must,
                filter,
                should,
                must_not,
                minimum_should_match,
            } => {
                must.iter().all(|q| q.matches(doc))
                    && filter.iter().all(|q| q.matches(doc))
                    && !must_not.iter().any(|q| q.matches(doc))
                    && should.iter().filter(|q| q.matches(doc)).count() >= *minimum_should_match
            }
        }
    }

    /// Relevance of a matching document; vector similarity for knn
    pub fn score(&self, doc: &ObjectData) -> f32 {
        match self {
            Self::Knn { field, vector, .. } => doc_vector(doc, field)
                .and_then(|d| cosine(vector, &d))
                .unwrap_or(0.0) as f32,
            Self::Bool { must, should, .. } => {
                let scored: f32 = must.iter().chain(should).map(|q| q.score(doc)).sum();
                scored.max(1.0)
            }
            _ => 1.0,
        }
    }

    /// `k` of a top-level knn clause
    pub fn top_k(&self) -> Option<usize> {
        match self {
            Self::Knn {
                limit: KnnLimit::K(k),
                ..
            } => Some(*k),
            _ => None,
        }
    }
}

/// Present, non-null values of a field; arrays contribute each element
fn field_values<'a>(doc: &'a ObjectData, field: &str) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
    match doc.get(field) {
        None | Some(Value::Null) => Box::new(std::iter::empty()),
        Some(Value::Array(items)) => Box::new(items.iter().filter(|v| !v.is_null())),
        Some(value) => Box::new(std::iter::once(value)),
    }
}

fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    match (as_f64(value), as_f64(bound)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (value, bound) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        },
    }
}

fn doc_vector(doc: &ObjectData, field: &str) -> Option<Vec<f64>> {
    doc.get(field)?
        .as_array()?
        .iter()
        .map(Value::as_f64)
        .collect()
}

fn cosine(query: &[f32], doc: &[f64]) -> Option<f64> {
    if query.len() != doc.len() || query.is_empty() {
        return None;
    }
    let (mut dot, mut qn, mut dn) = (0.0, 0.0, 0.0);
    for (q, d) in query.iter().zip(doc) {
        let q = *q as f64;
        dot += q * d;
        qn += q * q;
        dn += d * d;
    }
    if qn == 0.0 || dn == 0.0 {
        return None;
    }
    Some(dot / (qn.sqrt() * dn.sqrt()))
}

/// Evaluate `dsl` over `docs`: matching documents best first, capped by a
/// knn `k` and by `limit`
pub fn search<'a>(
    dsl: &Value,
    docs: impl IntoIterator<Item = &'a ObjectData>,
    limit: usize,
) -> StorageResult<Vec<(f32, &'a ObjectData)>> {
    let query = Query::parse(dsl)?;
    let mut hits: Vec<(f32, &ObjectData)> = docs
        .into_iter()
        .filter(|doc| query.matches(doc))
        .map(|doc| (query.score(doc), doc))
        .collect();
    // Stable: equal scores keep storage order
    hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    let cap = query.top_k().map_or(limit, |k| k.min(limit));
    hits.truncate(cap);
    Ok(hits)
}

/// Object of a JSON value, for fixtures and row conversion
pub fn as_object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> ObjectData {
        as_object(value).unwrap()
    }

    fn eval(dsl: Value, d: &ObjectData) -> bool {
        Query::parse(&dsl).unwrap().matches(d)
    }

    #[test]
    fn test_term_range_exists() {
        let d = doc(json!({"age": 30, "name": "ada", "tags": ["x", "y"], "gone": null}));
        assert!(eval(json!({"term": {"age": 30}}), &d));
        assert!(eval(json!({"term": {"age": "30"}}), &d));
        assert!(eval(json!({"terms": {"tags": ["y", "z"]}}), &d));
        assert!(eval(json!({"range": {"age": {"gt": 18, "lte": 30}}}), &d));
        assert!(!eval(json!({"range": {"age": {"lt": 30}}}), &d));
        assert!(eval(json!({"exists": {"field": "name"}}), &d));
        assert!(!eval(json!({"exists": {"field": "gone"}}), &d));
    }

    #[test]
    fn test_patterns() {
        let d = doc(json!({"name": "graph*db"}));
        assert!(eval(json!({"wildcard": {"name": {"value": "*ph\\**"}}}), &d));
        assert!(!eval(json!({"wildcard": {"name": {"value": "*xyz*"}}}), &d));
        assert!(eval(json!({"regexp": {"name": {"value": "gr.*db"}}}), &d));
        assert!(!eval(json!({"regexp": {"name": {"value": "raph"}}}), &d));
    }

    #[test]
    fn test_match_and_phrase() {
        let d = doc(json!({"title": "Typed Knowledge Graphs", "body": "graph traversal"}));
        assert!(eval(json!({"match": {"title": {"query": "graphs databases"}}}), &d));
        assert!(!eval(json!({"match_phrase": {"title": {"query": "graphs typed"}}}), &d));
        assert!(eval(
            json!({"multi_match": {"query": "graph traversal", "fields": ["title", "body"], "type": "phrase"}}),
            &d
        ));
    }

    #[test]
    fn test_bool_semantics() {
        let d = doc(json!({"a": 1, "b": 2}));
        assert!(eval(
            json!({"bool": {"must": [{"term": {"a": 1}}], "must_not": [{"term": {"b": 3}}]}}),
            &d
        ));
        assert!(eval(
            json!({"bool": {"should": [{"term": {"a": 9}}, {"term": {"b": 2}}], "minimum_should_match": 1}}),
            &d
        ));
        assert!(!eval(
            json!({"bool": {"should": [{"term": {"a": 9}}], "minimum_should_match": 1}}),
            &d
        ));
    }

    #[test]
    fn test_knn_ranks_and_filters() {
        let docs = vec![
            doc(json!({"id": 1, "v": [1.0, 0.0], "kind": "a"})),
            doc(json!({"id": 2, "v": [0.0, 1.0], "kind": "a"})),
            doc(json!({"id": 3, "v": [0.9, 0.1], "kind": "b"})),
        ];
        let dsl = json!({"knn": {"v": {"vector": [1.0, 0.0], "k": 2}}});
        let hits = search(&dsl, &docs, 100).unwrap();
        let ids: Vec<_> = hits.iter().map(|(_, d)| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);

        let filtered = json!({"knn": {"v": {"vector": [1.0, 0.0], "k": 2, "filter": {"term": {"kind": "a"}}}}});
        let hits = search(&filtered, &docs, 100).unwrap();
        let ids: Vec<_> = hits.iter().map(|(_, d)| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_unsupported_query() {
        assert!(matches!(
            Query::parse(&json!({"fuzzy": {"a": "b"}})),
            Err(StorageError::UnsupportedQuery(_))
        ));
    }
}
