//! Object type (node collection) schema

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property map of a single object instance
pub type ObjectData = Map<String, Value>;

/// Separator between primary key values in an object id
pub const OBJECT_ID_SEPARATOR: &str = "-";

/// Data type of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Vector,
    Json,
}

impl PropertyType {
    /// Best-effort type for a value with no declared schema
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            Value::Array(items) if items.iter().all(Value::is_number) && !items.is_empty() => {
                Self::Vector
            }
            Value::Array(items) => items.first().map(Self::infer).unwrap_or_default(),
            Value::Object(_) => Self::Json,
            _ => Self::String,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulltextConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model_id: String,
}

/// Indexing capabilities of a property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub fulltext_config: FulltextConfig,
    #[serde(default)]
    pub vector_config: VectorConfig,
}

/// Typed descriptor of one object type property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataProperty {
    pub name: String,

    #[serde(rename = "type", default)]
    pub property_type: PropertyType,

    /// Physical field name in the backing store (empty = same as name)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mapped_field: String,

    #[serde(default)]
    pub index_config: IndexConfig,
}

impl DataProperty {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            mapped_field: String::new(),
            index_config: IndexConfig::default(),
        }
    }

    pub fn with_mapped_field(mut self, field: impl Into<String>) -> Self {
        self.mapped_field = field.into();
        self
    }

    pub fn with_fulltext(mut self) -> Self {
        self.index_config.fulltext_config.enabled = true;
        self
    }

    pub fn with_vector(mut self, model_id: impl Into<String>) -> Self {
        self.index_config.vector_config.enabled = true;
        self.index_config.vector_config.model_id = model_id.into();
        self
    }

    /// Physical field name used when talking to a backend
    pub fn field(&self) -> &str {
        if self.mapped_field.is_empty() {
            &self.name
        } else {
            &self.mapped_field
        }
    }

    /// Text fields, or string fields with full-text indexing switched on
    pub fn is_fulltext_capable(&self) -> bool {
        match self.property_type {
            PropertyType::Text => true,
            PropertyType::String => self.index_config.fulltext_config.enabled,
            _ => false,
        }
    }

    pub fn is_vector_capable(&self) -> bool {
        self.property_type == PropertyType::Vector && self.index_config.vector_config.enabled
    }
}

/// Backing resource of an object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "type", default = "default_data_source_type")]
    pub source_type: String,
    pub id: String,
}

fn default_data_source_type() -> String {
    "data_view".to_string()
}

impl DataSource {
    pub fn view(id: impl Into<String>) -> Self {
        Self {
            source_type: default_data_source_type(),
            id: id.into(),
        }
    }
}

/// Search index binding of an object type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    #[serde(default)]
    pub index_available: bool,
    #[serde(default)]
    pub index: String,
}

/// Schema-level entity type in the ontology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectType {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub data_properties: Vec<DataProperty>,

    /// Ordered; their values compose the object id
    #[serde(default)]
    pub primary_keys: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IndexStatus>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logic_properties: Vec<DataProperty>,
}

impl ObjectType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_properties: Vec::new(),
            primary_keys: Vec::new(),
            data_source: None,
            status: None,
            logic_properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: DataProperty) -> Self {
        self.data_properties.push(property);
        self
    }

    pub fn with_primary_keys(mut self, keys: &[&str]) -> Self {
        self.primary_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.status = Some(IndexStatus {
            index_available: true,
            index: index.into(),
        });
        self
    }

    pub fn with_view(mut self, view_id: impl Into<String>) -> Self {
        self.data_source = Some(DataSource::view(view_id));
        self
    }

    pub fn property(&self, name: &str) -> Option<&DataProperty> {
        self.data_properties.iter().find(|p| p.name == name)
    }

    /// Index name when the type is bound to an available search index
    pub fn search_index(&self) -> Option<&str> {
        self.status
            .as_ref()
            .filter(|s| s.index_available && !s.index.is_empty())
            .map(|s| s.index.as_str())
    }

    pub fn view_id(&self) -> Option<&str> {
        self.data_source
            .as_ref()
            .map(|d| d.id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Build the object id from primary key values. Missing keys yield None.
    pub fn object_id(&self, data: &ObjectData) -> Option<String> {
        if self.primary_keys.is_empty() {
            return None;
        }
        let mut parts = Vec::with_capacity(self.primary_keys.len());
        for key in &self.primary_keys {
            let field = self.property(key).map(|p| p.field()).unwrap_or(key);
            let value = data.get(key).or_else(|| data.get(field))?;
            if value.is_null() {
                return None;
            }
            parts.push(crate::value::to_plain_string(value));
        }
        Some(parts.join(OBJECT_ID_SEPARATOR))
    }
}
