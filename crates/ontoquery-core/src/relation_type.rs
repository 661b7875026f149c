//! Relation type (typed edge) schema

use serde::{Deserialize, Serialize};

use crate::object_type::DataSource;

/// Direction requested for a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
    Bidirectional,
}

impl Direction {
    /// Edge orientations a path step may take under this direction
    pub fn edge_directions(&self) -> &'static [EdgeDirection] {
        match self {
            Self::Forward => &[EdgeDirection::Forward],
            Self::Backward => &[EdgeDirection::Backward],
            Self::Bidirectional => &[EdgeDirection::Forward, EdgeDirection::Backward],
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            "bidirectional" | "both" => Ok(Self::Bidirectional),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// Orientation of one relation type inside a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    #[default]
    Forward,
    Backward,
}

impl EdgeDirection {
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward)
    }
}

/// Equality rule between a property on each side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub source_property: String,
    pub target_property: String,
}

impl Mapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_property: source.into(),
            target_property: target.into(),
        }
    }

    /// (frontier side, candidate side) property names for a traversal direction
    pub fn oriented(&self, forward: bool) -> (&str, &str) {
        if forward {
            (&self.source_property, &self.target_property)
        } else {
            (&self.target_property, &self.source_property)
        }
    }
}

/// Two-stage join through a backing view.
///
/// `source_mapping_rules` map source object properties (source side) onto
/// bridge columns of the view (target side); `target_mapping_rules` map
/// bridge columns (source side) onto target object properties (target side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InDirectMapping {
    pub backing_data_source: DataSource,
    #[serde(default)]
    pub source_mapping_rules: Vec<Mapping>,
    #[serde(default)]
    pub target_mapping_rules: Vec<Mapping>,
}

impl InDirectMapping {
    pub fn view_id(&self) -> &str {
        &self.backing_data_source.id
    }

    /// (object -> bridge rules for the frontier, bridge -> object rules for
    /// the candidate) as (object property, bridge column) pairs.
    pub fn oriented(&self, forward: bool) -> (Vec<(&str, &str)>, Vec<(&str, &str)>) {
        let source_side: Vec<(&str, &str)> = self
            .source_mapping_rules
            .iter()
            .map(|m| (m.source_property.as_str(), m.target_property.as_str()))
            .collect();
        let target_side: Vec<(&str, &str)> = self
            .target_mapping_rules
            .iter()
            .map(|m| (m.target_property.as_str(), m.source_property.as_str()))
            .collect();
        if forward {
            (source_side, target_side)
        } else {
            (target_side, source_side)
        }
    }
}

/// How instances of two object types are related
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingRules {
    Direct(Vec<Mapping>),
    Indirect(InDirectMapping),
}

impl MappingRules {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => RELATION_KIND_DIRECT,
            Self::Indirect(_) => RELATION_KIND_DATA_VIEW,
        }
    }
}

pub const RELATION_KIND_DIRECT: &str = "direct";
pub const RELATION_KIND_DATA_VIEW: &str = "data_view";

/// Typed, directed relationship between two object types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RelationTypeRepr", into = "RelationTypeRepr")]
pub struct RelationType {
    pub id: String,
    pub name: String,
    pub source_object_type_id: String,
    pub target_object_type_id: String,
    pub mapping_rules: MappingRules,
}

impl RelationType {
    pub fn direct(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        rules: Vec<Mapping>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_object_type_id: source.into(),
            target_object_type_id: target.into(),
            mapping_rules: MappingRules::Direct(rules),
        }
    }

    pub fn indirect(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        mapping: InDirectMapping,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_object_type_id: source.into(),
            target_object_type_id: target.into(),
            mapping_rules: MappingRules::Indirect(mapping),
        }
    }

    /// (from, to) object type ids when walked in the given orientation
    pub fn endpoints(&self, direction: EdgeDirection) -> (&str, &str) {
        match direction {
            EdgeDirection::Forward => (&self.source_object_type_id, &self.target_object_type_id),
            EdgeDirection::Backward => (&self.target_object_type_id, &self.source_object_type_id),
        }
    }
}

/// Wire shape: `{"type": "direct"|"data_view", "mapping_rules": [...] | {...}}`
#[derive(Serialize, Deserialize)]
struct RelationTypeRepr {
    id: String,
    #[serde(default)]
    name: String,
    source_object_type_id: String,
    target_object_type_id: String,
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
    mapping_rules: serde_json::Value,
}

fn default_kind() -> String {
    RELATION_KIND_DIRECT.to_string()
}

impl TryFrom<RelationTypeRepr> for RelationType {
    type Error = String;

    fn try_from(repr: RelationTypeRepr) -> Result<Self, Self::Error> {
        let mapping_rules = match repr.kind.as_str() {
            RELATION_KIND_DIRECT => MappingRules::Direct(
                serde_json::from_value(repr.mapping_rules).map_err(|e| e.to_string())?,
            ),
            RELATION_KIND_DATA_VIEW => MappingRules::Indirect(
                serde_json::from_value(repr.mapping_rules).map_err(|e| e.to_string())?,
            ),
            other => return Err(format!("unknown relation type kind: {}", other)),
        };
        Ok(Self {
            id: repr.id,
            name: repr.name,
            source_object_type_id: repr.source_object_type_id,
            target_object_type_id: repr.target_object_type_id,
            mapping_rules,
        })
    }
}

impl From<RelationType> for RelationTypeRepr {
    fn from(rt: RelationType) -> Self {
        let kind = rt.mapping_rules.kind().to_string();
        let mapping_rules = match rt.mapping_rules {
            MappingRules::Direct(rules) => serde_json::to_value(rules),
            MappingRules::Indirect(mapping) => serde_json::to_value(mapping),
        }
        .unwrap_or(serde_json::Value::Null);
        Self {
            id: rt.id,
            name: rt.name,
            source_object_type_id: rt.source_object_type_id,
            target_object_type_id: rt.target_object_type_id,
            kind,
            mapping_rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_relation_wire_format() {
        let raw = json!({
            "id": "rt1",
            "name": "owns",
            "source_object_type_id": "ot1",
            "target_object_type_id": "ot2",
            "type": "direct",
            "mapping_rules": [{"source_property": "id", "target_property": "target_id"}]
        });
        let rt: RelationType = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(rt.mapping_rules, MappingRules::Direct(ref r) if r.len() == 1));
        assert_eq!(serde_json::to_value(&rt).unwrap(), raw);
    }

    #[test]
    fn test_indirect_relation_wire_format() {
        let raw = json!({
            "id": "rt2",
            "source_object_type_id": "ot1",
            "target_object_type_id": "ot2",
            "type": "data_view",
            "mapping_rules": {
                "backing_data_source": {"type": "data_view", "id": "v1"},
                "source_mapping_rules": [{"source_property": "id", "target_property": "view_id"}],
                "target_mapping_rules": [{"source_property": "view_target_id", "target_property": "target_id"}]
            }
        });
        let rt: RelationType = serde_json::from_value(raw).unwrap();
        match rt.mapping_rules {
            MappingRules::Indirect(ref m) => assert_eq!(m.view_id(), "v1"),
            _ => panic!("expected indirect mapping"),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let raw = json!({
            "id": "rt3",
            "source_object_type_id": "a",
            "target_object_type_id": "b",
            "type": "magic",
            "mapping_rules": []
        });
        assert!(serde_json::from_value::<RelationType>(raw).is_err());
    }

    #[test]
    fn test_orientation() {
        let m = Mapping::new("id", "target_id");
        assert_eq!(m.oriented(true), ("id", "target_id"));
        assert_eq!(m.oriented(false), ("target_id", "id"));

        let rt = RelationType::direct("rt1", "owns", "ot1", "ot2", vec![m]);
        assert_eq!(rt.endpoints(EdgeDirection::Forward), ("ot1", "ot2"));
        assert_eq!(rt.endpoints(EdgeDirection::Backward), ("ot2", "ot1"));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("BACKWARD".parse::<Direction>().unwrap(), Direction::Backward);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
