//! Schema property resolver: maps condition field names to typed properties

use ontoquery_core::{DataProperty, ObjectType, PropertyType, ALL_FIELDS};
use serde_json::Value;

use crate::error::{ConditionError, ConditionResult as Result};

/// Resolves condition names against one object type's properties.
///
/// Lenient resolvers accept names outside the schema and treat them as
/// implicit properties; backing views are queried that way since their
/// bridge columns carry no schema.
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    properties: Vec<DataProperty>,
    lenient: bool,
}

impl PropertyResolver {
    pub fn new(properties: &[DataProperty]) -> Self {
        Self {
            properties: properties.to_vec(),
            lenient: false,
        }
    }

    pub fn for_object_type(object_type: &ObjectType) -> Self {
        Self::new(&object_type.data_properties)
    }

    /// Strict for types that declare properties, schemaless otherwise
    pub fn for_schema(object_type: &ObjectType) -> Self {
        if object_type.data_properties.is_empty() {
            Self::schemaless()
        } else {
            Self::for_object_type(object_type)
        }
    }

    /// Resolver with no declared properties that accepts any name
    pub fn schemaless() -> Self {
        Self::default().lenient()
    }

    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    pub fn properties(&self) -> &[DataProperty] {
        &self.properties
    }

    /// Exact match on property name
    pub fn resolve(&self, name: &str) -> Result<DataProperty> {
        self.resolve_with_value(name, &Value::Null)
    }

    /// Like [`resolve`](Self::resolve); implicit properties take their type
    /// from `value`
    pub fn resolve_with_value(&self, name: &str, value: &Value) -> Result<DataProperty> {
        if let Some(property) = self.properties.iter().find(|p| p.name == name) {
            return Ok(property.clone());
        }
        if self.lenient && !name.is_empty() && name != ALL_FIELDS {
            return Ok(implicit(name, value));
        }
        Err(ConditionError::PropertyNotFound(name.to_string()))
    }

    /// Full-text eligible properties for `name`; `*` expands to all of them
    pub fn resolve_fulltext(&self, name: &str, operation: &str) -> Result<Vec<DataProperty>> {
        self.resolve_eligible(name, operation, DataProperty::is_fulltext_capable)
    }

    /// Vector eligible properties for `name`; `*` expands to all of them
    pub fn resolve_vector(&self, name: &str, operation: &str) -> Result<Vec<DataProperty>> {
        self.resolve_eligible(name, operation, DataProperty::is_vector_capable)
    }

    fn resolve_eligible(
        &self,
        name: &str,
        operation: &str,
        eligible: fn(&DataProperty) -> bool,
    ) -> Result<Vec<DataProperty>> {
        let no_field = || ConditionError::NoEligibleField {
            name: name.to_string(),
            operation: operation.to_string(),
        };

        if name == ALL_FIELDS {
            let all: Vec<DataProperty> =
                self.properties.iter().filter(|p| eligible(p)).cloned().collect();
            return if all.is_empty() { Err(no_field()) } else { Ok(all) };
        }

        let property = self.resolve(name)?;
        if eligible(&property) {
            Ok(vec![property])
        } else {
            Err(no_field())
        }
    }
}

/// Schemaless property: same physical name, type inferred, text searchable
fn implicit(name: &str, value: &Value) -> DataProperty {
    let property_type = match value {
        Value::Null => PropertyType::String,
        other => PropertyType::infer(other),
    };
    DataProperty::new(name, property_type).with_fulltext()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn properties() -> Vec<DataProperty> {
        vec![
            DataProperty::new("age", PropertyType::Integer).with_mapped_field("f_age"),
            DataProperty::new("title", PropertyType::Text),
            DataProperty::new("tag", PropertyType::String),
            DataProperty::new("summary", PropertyType::String).with_fulltext(),
            DataProperty::new("embedding", PropertyType::Vector).with_vector("m1"),
        ]
    }

    #[test]
    fn test_resolve_exact_name() {
        let resolver = PropertyResolver::new(&properties());
        assert_eq!(resolver.resolve("age").unwrap().field(), "f_age");
        assert!(matches!(
            resolver.resolve("missing"),
            Err(ConditionError::PropertyNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_for_schema_falls_back_to_schemaless() {
        let untyped = ObjectType::new("plant", "plant");
        assert!(PropertyResolver::for_schema(&untyped).is_lenient());

        let typed = ObjectType::new("person", "person").with_property(properties().remove(0));
        let resolver = PropertyResolver::for_schema(&typed);
        assert!(!resolver.is_lenient());
        assert!(resolver.resolve("code").is_err());
    }

    #[test]
    fn test_fulltext_eligibility() {
        let resolver = PropertyResolver::new(&properties());
        assert!(resolver.resolve_fulltext("title", "match").is_ok());
        assert!(resolver.resolve_fulltext("summary", "match").is_ok());
        assert!(matches!(
            resolver.resolve_fulltext("tag", "match"),
            Err(ConditionError::NoEligibleField { .. })
        ));

        let all: Vec<String> = resolver
            .resolve_fulltext(ALL_FIELDS, "match")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(all, vec!["title", "summary"]);
    }

    #[test]
    fn test_vector_eligibility() {
        let resolver = PropertyResolver::new(&properties());
        assert_eq!(resolver.resolve_vector("*", "knn").unwrap().len(), 1);
        assert!(resolver.resolve_vector("title", "knn").is_err());

        let empty = PropertyResolver::new(&[]);
        assert!(matches!(
            empty.resolve_vector("*", "knn"),
            Err(ConditionError::NoEligibleField { .. })
        ));
    }

    #[test]
    fn test_lenient_resolves_unknown_columns() {
        let resolver = PropertyResolver::schemaless();
        let property = resolver.resolve_with_value("view_id", &json!(123)).unwrap();
        assert_eq!(property.field(), "view_id");
        assert_eq!(property.property_type, PropertyType::Integer);
        assert!(resolver.resolve(ALL_FIELDS).is_err());
    }
}
