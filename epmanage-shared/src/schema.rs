use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Datetime,
    List,
    Dict,
    Media,
    ObjectId,
    Other(String),
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "string" => FieldType::String,
            "integer" => FieldType::Integer,
            "float" => FieldType::Float,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "datetime" => FieldType::Datetime,
            "list" => FieldType::List,
            "dict" => FieldType::Dict,
            "media" => FieldType::Media,
            "objectid" => FieldType::ObjectId,
            _ => FieldType::Other(value),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::List => "list",
            FieldType::Dict => "dict",
            FieldType::Media => "media",
            FieldType::ObjectId => "objectid",
            FieldType::Other(name) => name,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub readonly: bool,
}

/// Field descriptors of one collection, ordered by field name.
pub type CollectionSchema = BTreeMap<String, FieldDescriptor>;

/// Body of `GET /schema`: every collection the backend exposes.
pub type SchemaDocument = HashMap<String, CollectionSchema>;
