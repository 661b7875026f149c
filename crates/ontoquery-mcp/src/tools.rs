//! MCP tool definitions

use serde::Serialize;

/// MCP tool definition
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

pub const QUERY_SUBGRAPH: &str = "query_subgraph";
pub const QUERY_OBJECTS: &str = "query_objects";
pub const COMPILE_CONDITION: &str = "compile_condition";
pub const LIST_RELATION_TYPE_PATHS: &str = "list_relation_type_paths";

fn condition_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "description": "Condition tree: {name, operation, value, value_from, sub_conditions, ...}",
        "required": ["operation"],
        "properties": {
            "name": {"type": "string", "description": "Property name, or * for every eligible field"},
            "operation": {"type": "string", "description": "and, or, eq, noteq, gt, gte, lt, lte, in, notin, like, notlike, range, outrange, exist, notexist, regex, match, match_phrase, multi_match, knn"},
            "value": {},
            "value_from": {"type": "string", "enum": ["const"]},
            "sub_conditions": {"type": "array", "items": {"type": "object"}}
        }
    })
}

/// Get all available tools
pub fn get_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: QUERY_SUBGRAPH,
            description: "Expand relation paths from start objects matching a condition. Returns instance-level paths, the objects on them, and whether the result is partial.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["source_object_type_id"],
                "properties": {
                    "kn_id": {"type": "string", "description": "Knowledge network id (defaults to the loaded dataset)"},
                    "branch": {"type": "string", "description": "Schema branch (default: main)"},
                    "source_object_type_id": {"type": "string", "description": "Object type the paths start from"},
                    "condition": condition_schema(),
                    "direction": {"type": "string", "enum": ["forward", "backward", "bidirectional"], "default": "forward"},
                    "path_length": {"type": "number", "description": "Maximum hops (1-10)", "default": 1},
                    "limit": {"type": "number", "description": "Start objects to fetch (default: 100, max: 10000)"},
                    "total_limit": {"type": "number", "description": "Relation paths to return across all type paths (default: 1000)"},
                    "type_paths": {"type": "array", "items": {"type": "object"}, "description": "Explicit type paths; enumerated from the schema when omitted"},
                    "timeout_ms": {"type": "number", "description": "Abort and return a partial result after this many milliseconds"}
                }
            }),
        },
        Tool {
            name: QUERY_OBJECTS,
            description: "Fetch instances of one object type matching a condition.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["object_type_id"],
                "properties": {
                    "kn_id": {"type": "string", "description": "Knowledge network id (defaults to the loaded dataset)"},
                    "branch": {"type": "string"},
                    "object_type_id": {"type": "string"},
                    "condition": condition_schema(),
                    "limit": {"type": "number", "description": "Objects to return (default: 100, max: 10000)"}
                }
            }),
        },
        Tool {
            name: COMPILE_CONDITION,
            description: "Compile a condition into the search DSL and SQL against an object type's schema, or schemaless when no type is given.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["condition"],
                "properties": {
                    "kn_id": {"type": "string"},
                    "branch": {"type": "string"},
                    "object_type_id": {"type": "string", "description": "Resolve fields against this type's properties"},
                    "condition": condition_schema()
                }
            }),
        },
        Tool {
            name: LIST_RELATION_TYPE_PATHS,
            description: "List type-level relation paths leaving an object type.",
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["source_object_type_id"],
                "properties": {
                    "kn_id": {"type": "string"},
                    "branch": {"type": "string"},
                    "source_object_type_id": {"type": "string"},
                    "direction": {"type": "string", "enum": ["forward", "backward", "bidirectional"], "default": "forward"},
                    "path_length": {"type": "number", "default": 1}
                }
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_are_unique() {
        let tools = get_tools();
        let mut names: Vec<_> = tools.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
        assert!(tools.iter().all(|t| t.input_schema["type"] == "object"));
    }
}
