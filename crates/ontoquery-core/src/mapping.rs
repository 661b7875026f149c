//! Mapping resolver: decides whether two object instances are related
//! under a relation type, and builds the batched conditions used to fetch
//! candidates for a whole frontier at once.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::condition::CondCfg;
use crate::error::{Error, Result};
use crate::object_type::ObjectData;
use crate::path::LevelObject;
use crate::relation_type::{InDirectMapping, Mapping, MappingRules, RelationType};
use crate::value::{value_key, values_equal};

/// Reject relation types whose mapping cannot be resolved
pub fn validate_mapping(rt: &RelationType) -> Result<()> {
    match &rt.mapping_rules {
        MappingRules::Direct(rules) if rules.is_empty() => Err(Error::BadRequest(format!(
            "relation type {} has no mapping rules",
            rt.id
        ))),
        MappingRules::Indirect(m) if m.view_id().is_empty() => Err(Error::BadRequest(format!(
            "relation type {} has an empty backing view id",
            rt.id
        ))),
        MappingRules::Indirect(m)
            if m.source_mapping_rules.is_empty() || m.target_mapping_rules.is_empty() =>
        {
            Err(Error::BadRequest(format!(
                "relation type {} needs both source and target mapping rules",
                rt.id
            )))
        }
        _ => Ok(()),
    }
}

/// Whether `candidate` is related to `source` under `rules`.
///
/// `forward` is false when the edge is walked from its target type back to
/// its source type; `view_rows` are the backing view rows for indirect
/// mappings (ignored for direct ones).
pub fn is_related(
    source: &ObjectData,
    candidate: &ObjectData,
    rules: &MappingRules,
    forward: bool,
    view_rows: &[ObjectData],
) -> bool {
    match rules {
        MappingRules::Direct(rules) => is_directly_related(source, candidate, rules, forward),
        MappingRules::Indirect(mapping) => {
            is_indirectly_related(source, candidate, mapping, forward, view_rows)
        }
    }
}

fn field_equals(left: &ObjectData, left_key: &str, right: &ObjectData, right_key: &str) -> bool {
    match (left.get(left_key), right.get(right_key)) {
        (Some(a), Some(b)) => values_equal(a, b),
        _ => false,
    }
}

fn is_directly_related(
    source: &ObjectData,
    candidate: &ObjectData,
    rules: &[Mapping],
    forward: bool,
) -> bool {
    !rules.is_empty()
        && rules.iter().all(|rule| {
            let (frontier_prop, candidate_prop) = rule.oriented(forward);
            field_equals(source, frontier_prop, candidate, candidate_prop)
        })
}

/// True when every (object property, bridge column) pair matches the row
fn row_matches(object: &ObjectData, row: &ObjectData, pairs: &[(&str, &str)]) -> bool {
    !pairs.is_empty()
        && pairs
            .iter()
            .all(|(prop, column)| field_equals(object, prop, row, column))
}

fn is_indirectly_related(
    source: &ObjectData,
    candidate: &ObjectData,
    mapping: &InDirectMapping,
    forward: bool,
    view_rows: &[ObjectData],
) -> bool {
    let (source_pairs, target_pairs) = mapping.oriented(forward);
    view_rows
        .iter()
        .any(|row| row_matches(source, row, &source_pairs) && row_matches(candidate, row, &target_pairs))
}

/// Build one condition covering every record in `records`.
///
/// Each pair is (key read from the record, field name used in the
/// condition). One pair yields an `in` over the distinct values; several
/// pairs yield an `or` of `and`-ed equalities, one per distinct tuple.
/// Records missing any value contribute nothing; None when nothing does.
pub fn build_batch_condition<'a>(
    records: impl IntoIterator<Item = &'a ObjectData>,
    pairs: &[(&str, &str)],
) -> Option<CondCfg> {
    if pairs.is_empty() {
        return None;
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut tuples: Vec<Vec<Value>> = Vec::new();
    for record in records {
        let tuple: Option<Vec<Value>> = pairs
            .iter()
            .map(|(key, _)| record.get(*key).filter(|v| !v.is_null()).cloned())
            .collect();
        let Some(tuple) = tuple else { continue };
        let key = tuple.iter().map(value_key).collect::<Vec<_>>().join("\u{1f}");
        if seen.insert(key) {
            tuples.push(tuple);
        }
    }

    if tuples.is_empty() {
        return None;
    }

    if pairs.len() == 1 {
        let values = tuples.into_iter().filter_map(|mut t| t.pop()).collect();
        return Some(CondCfg::in_values(pairs[0].1, values));
    }

    let mut branches: Vec<CondCfg> = tuples
        .into_iter()
        .map(|tuple| {
            CondCfg::and(
                pairs
                    .iter()
                    .zip(tuple)
                    .map(|((_, field), value)| CondCfg::eq(*field, value))
                    .collect(),
            )
        })
        .collect();

    if branches.len() == 1 {
        branches.pop()
    } else {
        Some(CondCfg::or(branches))
    }
}

/// Candidate condition for a direct edge across a whole batch
pub fn direct_batch_condition(
    batch: &[LevelObject],
    rules: &[Mapping],
    forward: bool,
) -> Option<CondCfg> {
    let pairs: Vec<(&str, &str)> = rules.iter().map(|r| r.oriented(forward)).collect();
    build_batch_condition(batch.iter().map(|o| &o.data), &pairs)
}

/// Condition on the backing view's bridge columns for a whole batch
pub fn view_batch_condition(
    batch: &[LevelObject],
    mapping: &InDirectMapping,
    forward: bool,
) -> Option<CondCfg> {
    let (source_pairs, _) = mapping.oriented(forward);
    build_batch_condition(batch.iter().map(|o| &o.data), &source_pairs)
}

/// Candidate condition derived from the bridge columns of fetched view rows
pub fn target_condition_from_rows(
    rows: &[ObjectData],
    mapping: &InDirectMapping,
    forward: bool,
) -> Option<CondCfg> {
    let (_, target_pairs) = mapping.oriented(forward);
    let reversed: Vec<(&str, &str)> = target_pairs.iter().map(|(prop, col)| (*col, *prop)).collect();
    build_batch_condition(rows, &reversed)
}

/// Split view rows by the frontier object they bridge from, keyed by
/// node key. Objects with no matching row are absent from the map.
pub fn partition_view_rows(
    batch: &[LevelObject],
    rows: &[ObjectData],
    mapping: &InDirectMapping,
    forward: bool,
) -> HashMap<String, Vec<ObjectData>> {
    let (source_pairs, _) = mapping.oriented(forward);
    let mut partitions: HashMap<String, Vec<ObjectData>> = HashMap::new();
    for object in batch {
        let matching: Vec<ObjectData> = rows
            .iter()
            .filter(|row| row_matches(&object.data, row, &source_pairs))
            .cloned()
            .collect();
        if !matching.is_empty() {
            partitions.insert(object.node_key(), matching);
        }
    }
    partitions
}
