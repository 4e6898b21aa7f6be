#![deny(missing_docs)]

//! # Schema Model
//!
//! The OpenAPI 3.0 Schema Object as produced by the generator.
//!
//! A schema is either a pointer (`$ref`) into `#/components/schemas` or an
//! inline body. The only keywords ever emitted next to `$ref` are the
//! `nullable` / `readOnly` / `writeOnly` annotations added at member level.

use crate::contract::DataType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Display;

/// Prefix of every component schema reference.
pub const REF_PREFIX: &str = "#/components/schemas/";

/// JSON type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl From<DataType> for SchemaType {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Boolean => SchemaType::Boolean,
            DataType::Integer => SchemaType::Integer,
            DataType::Number => SchemaType::Number,
            DataType::String => SchemaType::String,
        }
    }
}

impl Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        };
        write!(f, "{}", s)
    }
}

/// `additionalProperties`: either a switch or a schema for the extra values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` / `false`
    Allowed(bool),
    /// Extra properties must match this schema.
    Schema(Box<Schema>),
}

/// Discriminator of a `oneOf` union.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    /// Name of the string property carrying the type name.
    pub property_name: String,
    /// Discriminator value to schema reference.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

impl Discriminator {
    /// Creates a discriminator without mapping entries.
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: IndexMap::new(),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// An OpenAPI Schema Object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Pointer into `#/components/schemas`.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// JSON type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Element schema of an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Named properties in emission order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required property names, emitted sorted.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required: BTreeSet<String>,
    /// Whether and how undeclared properties are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    /// Enum literals in declaration order.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Must match every listed schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    /// Must match exactly one listed schema.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    /// Discriminator of the `oneOf` union.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    /// Accepts `null`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
    /// Only present in responses.
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    /// Only present in requests.
    #[serde(default, skip_serializing_if = "is_false")]
    pub write_only: bool,
    /// Array elements are unique.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    /// Marked obsolete.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Specification extensions (`x-...`).
    #[serde(flatten, default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
}

impl Schema {
    /// Reference to the component schema `schema_id`.
    pub fn reference_to(schema_id: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", REF_PREFIX, schema_id)),
            ..Self::default()
        }
    }

    /// Inline `{type, format}` schema.
    pub fn primitive(schema_type: SchemaType, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    /// Empty `{type: object}` schema.
    pub fn object() -> Self {
        Self::primitive(SchemaType::Object, None)
    }

    /// `{type: array, items}` schema.
    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Whether the schema points at a component definition.
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Schema id targeted by the reference.
    pub fn reference_id(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(REF_PREFIX))
    }

    /// Whether nothing has been set (the "any value" schema).
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Wraps a reference as `{allOf: [ref]}` so sibling keywords are legal.
    pub fn wrap_all_of(self) -> Self {
        Self {
            all_of: vec![self],
            ..Self::default()
        }
    }

    /// Adds a required string property.
    pub fn add_required_string(&mut self, name: &str) {
        self.properties
            .insert(name.to_string(), Schema::primitive(SchemaType::String, None));
        self.required.insert(name.to_string());
    }
}
