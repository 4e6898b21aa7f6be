#![deny(missing_docs)]

//! # Data Contracts
//!
//! Serializer-agnostic classification of a type. The schema generator consumes
//! nothing but these contracts (plus type identity from the catalog), so any
//! serialization backend can be plugged in through [`DataContractResolver`].

use crate::catalog::{MemberInfo, TypeId};
use crate::error::AppResult;
use serde_json::Value;
use std::fmt::Display;

/// JSON data type of a primitive contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Boolean => write!(f, "boolean"),
            DataType::Integer => write!(f, "integer"),
            DataType::Number => write!(f, "number"),
            DataType::String => write!(f, "string"),
        }
    }
}

/// A serializable member of an object contract.
#[derive(Debug, Clone, PartialEq)]
pub struct DataProperty {
    /// Serialized property name.
    pub name: String,
    /// Type of the property value.
    pub member_type: TypeId,
    /// Must be present in payloads.
    pub is_required: bool,
    /// Accepts `null`.
    pub is_nullable: bool,
    /// Only ever serialized, never read back.
    pub is_read_only: bool,
    /// Only ever deserialized.
    pub is_write_only: bool,
    /// Originating member, when the property maps to one.
    pub member: Option<MemberInfo>,
}

impl DataProperty {
    /// Creates a plain read/write property.
    pub fn new(name: impl Into<String>, member_type: TypeId) -> Self {
        Self {
            name: name.into(),
            member_type,
            is_required: false,
            is_nullable: false,
            is_read_only: false,
            is_write_only: false,
            member: None,
        }
    }

    /// Type that declared the originating member.
    pub fn declaring_type(&self) -> Option<TypeId> {
        self.member.as_ref().and_then(|m| m.declaring_type)
    }
}

/// Per-kind details of a contract. Exactly one group exists per contract.
#[derive(Debug, Clone, PartialEq)]
pub enum DataContractKind {
    /// Boolean, integer, number or string; enums carry their literal list.
    Primitive {
        /// JSON data type.
        data_type: DataType,
        /// Format hint (`int32`, `date-time`, `uuid`, ...).
        format: Option<String>,
        /// Enum values in declaration order, already in their serialized form.
        enum_values: Option<Vec<Value>>,
    },
    /// Sequence of items.
    Array {
        /// Element type.
        item_type: TypeId,
        /// The source type enforces set semantics.
        unique_items: bool,
    },
    /// String-keyed map.
    Dictionary {
        /// Key type.
        key_type: TypeId,
        /// Value type.
        value_type: TypeId,
        /// Closed key set, present when the key type is an enum.
        known_keys: Option<Vec<String>>,
    },
    /// Object with named properties.
    Object {
        /// Properties in emission order (base-first, then declaration order).
        properties: Vec<DataProperty>,
        /// Value type of the catch-all extension data map.
        extension_data_type: Option<TypeId>,
        /// Polymorphic type discriminator property name.
        type_name_property: Option<String>,
        /// Discriminator value identifying this type.
        type_name_value: Option<String>,
    },
    /// Untyped, anything goes.
    Dynamic,
}

/// Immutable classification of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContract {
    /// The described type, with nullable wrappers removed.
    pub underlying_type: TypeId,
    /// Kind-specific details.
    pub kind: DataContractKind,
}

impl DataContract {
    /// Primitive contract.
    pub fn for_primitive(
        underlying_type: TypeId,
        data_type: DataType,
        format: Option<&str>,
        enum_values: Option<Vec<Value>>,
    ) -> Self {
        Self {
            underlying_type,
            kind: DataContractKind::Primitive {
                data_type,
                format: format.map(str::to_string),
                enum_values,
            },
        }
    }

    /// Array contract.
    pub fn for_array(underlying_type: TypeId, item_type: TypeId, unique_items: bool) -> Self {
        Self {
            underlying_type,
            kind: DataContractKind::Array {
                item_type,
                unique_items,
            },
        }
    }

    /// Dictionary contract.
    pub fn for_dictionary(
        underlying_type: TypeId,
        key_type: TypeId,
        value_type: TypeId,
        known_keys: Option<Vec<String>>,
    ) -> Self {
        Self {
            underlying_type,
            kind: DataContractKind::Dictionary {
                key_type,
                value_type,
                known_keys,
            },
        }
    }

    /// Object contract.
    pub fn for_object(
        underlying_type: TypeId,
        properties: Vec<DataProperty>,
        extension_data_type: Option<TypeId>,
        type_name_property: Option<String>,
        type_name_value: Option<String>,
    ) -> Self {
        Self {
            underlying_type,
            kind: DataContractKind::Object {
                properties,
                extension_data_type,
                type_name_property,
                type_name_value,
            },
        }
    }

    /// Dynamic contract.
    pub fn for_dynamic(underlying_type: TypeId) -> Self {
        Self {
            underlying_type,
            kind: DataContractKind::Dynamic,
        }
    }

    /// Primitive contract carrying an enum literal list.
    pub fn is_enum(&self) -> bool {
        matches!(
            self.kind,
            DataContractKind::Primitive {
                enum_values: Some(_),
                ..
            }
        )
    }

    /// Object contract.
    pub fn is_object(&self) -> bool {
        matches!(self.kind, DataContractKind::Object { .. })
    }

    /// Object properties, empty for other kinds.
    pub fn properties(&self) -> &[DataProperty] {
        match &self.kind {
            DataContractKind::Object { properties, .. } => properties,
            _ => &[],
        }
    }

    /// Discriminator property name declared by the contract.
    pub fn type_name_property(&self) -> Option<&str> {
        match &self.kind {
            DataContractKind::Object {
                type_name_property, ..
            } => type_name_property.as_deref(),
            _ => None,
        }
    }

    /// Discriminator value declared by the contract.
    pub fn type_name_value(&self) -> Option<&str> {
        match &self.kind {
            DataContractKind::Object {
                type_name_value, ..
            } => type_name_value.as_deref(),
            _ => None,
        }
    }
}

/// Produces data contracts for types.
///
/// Implementations exist per serialization backend. The generator is agnostic
/// of which one is plugged in.
pub trait DataContractResolver: Send + Sync {
    /// Classifies `ty`. Nullable wrappers must be unwrapped first.
    fn resolve(&self, ty: TypeId) -> AppResult<DataContract>;
}
