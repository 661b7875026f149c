//! Schema-level and instance-level paths

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::object_type::ObjectData;
use crate::relation_type::{Direction, EdgeDirection, RelationType};

/// One relation type oriented within a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeEdge {
    pub relation_type_id: String,
    #[serde(default)]
    pub relation_type_name: String,
    #[serde(default)]
    pub direction: EdgeDirection,
    /// Object type the edge leaves from, along the path
    pub source_object_type_id: String,
    /// Object type the edge arrives at, along the path
    pub target_object_type_id: String,
}

impl TypeEdge {
    pub fn from_relation_type(rt: &RelationType, direction: EdgeDirection) -> Self {
        let (from, to) = rt.endpoints(direction);
        Self {
            relation_type_id: rt.id.clone(),
            relation_type_name: rt.name.clone(),
            direction,
            source_object_type_id: from.to_string(),
            target_object_type_id: to.to_string(),
        }
    }
}

/// Sequence of object types connected by relation types, known before any
/// instance data is fetched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationTypePath {
    pub object_types: Vec<String>,
    pub type_edges: Vec<TypeEdge>,
    pub length: usize,
}

impl RelationTypePath {
    pub fn new(source_object_type_id: impl Into<String>) -> Self {
        Self {
            object_types: vec![source_object_type_id.into()],
            type_edges: Vec::new(),
            length: 0,
        }
    }

    pub fn push(&mut self, edge: TypeEdge) {
        self.object_types.push(edge.target_object_type_id.clone());
        self.type_edges.push(edge);
        self.length = self.type_edges.len();
    }

    pub fn source_object_type_id(&self) -> Option<&str> {
        self.object_types.first().map(|s| s.as_str())
    }

    fn uses(&self, relation_type_id: &str, direction: EdgeDirection) -> bool {
        self.type_edges
            .iter()
            .any(|e| e.relation_type_id == relation_type_id && e.direction == direction)
    }
}

/// Enumerate type-level paths from a source object type.
///
/// Depth-first over relation types sorted by id. A relation type is used at
/// most once per orientation within a path. Only maximal paths are returned:
/// those that reach `path_length` or cannot be extended further.
pub fn enumerate_type_paths(
    source_object_type_id: &str,
    relation_types: &[RelationType],
    direction: Direction,
    path_length: usize,
) -> Vec<RelationTypePath> {
    let mut sorted: Vec<&RelationType> = relation_types.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out = Vec::new();
    if path_length == 0 {
        return out;
    }

    let mut stack = vec![RelationTypePath::new(source_object_type_id)];
    let mut seen: HashSet<Vec<TypeEdge>> = HashSet::new();

    while let Some(path) = stack.pop() {
        let current = path
            .object_types
            .last()
            .cloned()
            .unwrap_or_else(|| source_object_type_id.to_string());

        let mut extensions = Vec::new();
        if path.length < path_length {
            for rt in &sorted {
                for edge_direction in direction.edge_directions() {
                    let (from, _) = rt.endpoints(*edge_direction);
                    if from != current || path.uses(&rt.id, *edge_direction) {
                        continue;
                    }
                    let mut next = path.clone();
                    next.push(TypeEdge::from_relation_type(rt, *edge_direction));
                    extensions.push(next);
                }
            }
        }

        if extensions.is_empty() {
            if path.length > 0 && seen.insert(path.type_edges.clone()) {
                out.push(path);
            }
            continue;
        }

        // Reverse so the stack pops extensions in sorted order
        stack.extend(extensions.into_iter().rev());
    }

    out
}

/// Object instance on the current traversal frontier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    pub object_type_id: String,
    /// Primary key values joined by `-`
    pub object_id: String,
    pub data: ObjectData,
}

impl LevelObject {
    /// Key identifying the object across all object types of a result
    pub fn node_key(&self) -> String {
        node_key(&self.object_type_id, &self.object_id)
    }
}

pub fn node_key(object_type_id: &str, object_id: &str) -> String {
    format!("{}-{}", object_type_id, object_id)
}

/// One instance-level edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub relation_type_id: String,
    pub relation_type_name: String,
    pub direction: EdgeDirection,
    pub source_object_id: String,
    pub target_object_id: String,
}

/// Concrete sequence of object instances realising a type-level path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPath {
    pub relations: Vec<Relation>,
    pub length: usize,
}

impl RelationPath {
    pub fn extended(&self, relation: Relation) -> Self {
        let mut relations = self.relations.clone();
        relations.push(relation);
        Self {
            length: relations.len(),
            relations,
        }
    }

    /// Node key of the last object on the path
    pub fn tail(&self) -> Option<&str> {
        self.relations.last().map(|r| r.target_object_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation_type::Mapping;

    fn rt(id: &str, source: &str, target: &str) -> RelationType {
        RelationType::direct(id, id, source, target, vec![Mapping::new("id", "ref_id")])
    }

    #[test]
    fn test_enumerate_forward_paths() {
        // ot1 -rt1-> ot2 -rt2-> ot3, ot1 -rt3-> ot3
        let types = vec![rt("rt1", "ot1", "ot2"), rt("rt2", "ot2", "ot3"), rt("rt3", "ot1", "ot3")];
        let paths = enumerate_type_paths("ot1", &types, Direction::Forward, 2);

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].object_types, vec!["ot1", "ot2", "ot3"]);
        assert_eq!(paths[0].length, 2);
        assert_eq!(paths[1].object_types, vec!["ot1", "ot3"]);
    }

    #[test]
    fn test_enumerate_respects_length() {
        let types = vec![rt("rt1", "ot1", "ot2"), rt("rt2", "ot2", "ot3")];
        let paths = enumerate_type_paths("ot1", &types, Direction::Forward, 1);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].type_edges[0].relation_type_id, "rt1");
    }

    #[test]
    fn test_enumerate_backward_swaps_endpoints() {
        let types = vec![rt("rt1", "ot1", "ot2")];
        assert!(enumerate_type_paths("ot2", &types, Direction::Forward, 1).is_empty());

        let paths = enumerate_type_paths("ot2", &types, Direction::Backward, 1);
        assert_eq!(paths.len(), 1);
        let edge = &paths[0].type_edges[0];
        assert_eq!(edge.direction, EdgeDirection::Backward);
        assert_eq!(edge.source_object_type_id, "ot2");
        assert_eq!(edge.target_object_type_id, "ot1");
    }

    #[test]
    fn test_self_loop_used_once_per_orientation() {
        let types = vec![rt("knows", "person", "person")];
        let paths = enumerate_type_paths("person", &types, Direction::Forward, 5);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].length, 1);

        let both = enumerate_type_paths("person", &types, Direction::Bidirectional, 5);
        assert!(both.iter().all(|p| p.length == 2));
    }

    #[test]
    fn test_relation_path_extension() {
        let relation = Relation {
            relation_type_id: "rt1".into(),
            relation_type_name: "owns".into(),
            direction: EdgeDirection::Forward,
            source_object_id: "ot1-1".into(),
            target_object_id: "ot2-9".into(),
        };
        let path = RelationPath::default().extended(relation);
        assert_eq!(path.length, 1);
        assert_eq!(path.tail(), Some("ot2-9"));
    }
}
