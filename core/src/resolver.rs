#![deny(missing_docs)]

//! # Catalog Contract Resolver
//!
//! Reference [`DataContractResolver`] working off a [`TypeCatalog`], following
//! the conventions of a JSON serializer:
//! - nullable wrappers are unwrapped before classification,
//! - enums render as their numeric value unless `enums_as_strings` is set,
//! - only readable/writable, non-indexer, non-ignored members are serialized,
//!   inherited members first,
//! - property names go through the explicit override, then the naming policy.

use crate::catalog::{EnumShape, PrimitiveType, TypeCatalog, TypeId, TypeShape};
use crate::contract::{DataContract, DataContractResolver, DataProperty, DataType};
use crate::error::{AppError, AppResult};
use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Property naming policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// `firstName`
    CamelCase,
    /// `first_name`
    SnakeCase,
    /// `first-name`
    KebabCase,
    /// `FirstName`
    PascalCase,
}

impl NamingPolicy {
    /// Applies the policy to a declared name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingPolicy::CamelCase => name.to_lower_camel_case(),
            NamingPolicy::SnakeCase => name.to_snake_case(),
            NamingPolicy::KebabCase => name.to_kebab_case(),
            NamingPolicy::PascalCase => name.to_upper_camel_case(),
        }
    }
}

/// Serializer conventions honored by [`CatalogContractResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Policy for property names without an explicit override.
    pub naming_policy: Option<NamingPolicy>,
    /// Render enum members as strings instead of their numeric value.
    pub enums_as_strings: bool,
    /// Policy for string enum member names without an explicit override.
    pub enum_naming_policy: Option<NamingPolicy>,
    /// Drop getter-only members.
    pub ignore_read_only_properties: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            naming_policy: Some(NamingPolicy::CamelCase),
            enums_as_strings: false,
            enum_naming_policy: None,
            ignore_read_only_properties: false,
        }
    }
}

impl ResolverOptions {
    /// Replaces the property naming policy (`None` keeps declared names).
    pub fn with_naming_policy(mut self, policy: Option<NamingPolicy>) -> Self {
        self.naming_policy = policy;
        self
    }

    /// Renders enums as strings, optionally through a naming policy.
    pub fn with_enums_as_strings(mut self, enum_naming_policy: Option<NamingPolicy>) -> Self {
        self.enums_as_strings = true;
        self.enum_naming_policy = enum_naming_policy;
        self
    }

    /// Drops getter-only members.
    pub fn with_ignore_read_only_properties(mut self) -> Self {
        self.ignore_read_only_properties = true;
        self
    }
}

/// Resolver backed by the type catalog.
#[derive(Debug, Clone)]
pub struct CatalogContractResolver {
    catalog: Arc<TypeCatalog>,
    options: ResolverOptions,
}

impl CatalogContractResolver {
    /// Creates a resolver.
    pub fn new(catalog: Arc<TypeCatalog>, options: ResolverOptions) -> Self {
        Self { catalog, options }
    }

    /// Active options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    fn enum_member_names(&self, shape: &EnumShape) -> Vec<String> {
        shape
            .members
            .iter()
            .map(|member| {
                member.json_name.clone().unwrap_or_else(|| {
                    self.options
                        .enum_naming_policy
                        .map(|policy| policy.apply(&member.name))
                        .unwrap_or_else(|| member.name.clone())
                })
            })
            .collect()
    }

    fn resolve_enum(&self, ty: TypeId, shape: &EnumShape) -> DataContract {
        if self.options.enums_as_strings {
            let values = self
                .enum_member_names(shape)
                .into_iter()
                .map(Value::String)
                .collect();
            return DataContract::for_primitive(ty, DataType::String, None, Some(values));
        }

        let format = if shape.underlying.is_wide_integer() {
            "int64"
        } else {
            "int32"
        };
        let values = shape
            .members
            .iter()
            .map(|member| Value::from(member.value))
            .collect();
        DataContract::for_primitive(ty, DataType::Integer, Some(format), Some(values))
    }

    fn resolve_dictionary(&self, ty: TypeId, key: TypeId, value: TypeId) -> AppResult<DataContract> {
        let key = self.catalog.unwrap_nullable(key);
        // Enum keys always serialize by name, whatever the value convention is.
        let known_keys = match &self.catalog.get(key)?.shape {
            TypeShape::Enum(shape) => Some(
                shape
                    .members
                    .iter()
                    .map(|member| member.json_name.clone().unwrap_or_else(|| member.name.clone()))
                    .collect(),
            ),
            _ => None,
        };
        Ok(DataContract::for_dictionary(ty, key, value, known_keys))
    }

    fn resolve_object(&self, ty: TypeId) -> AppResult<DataContract> {
        let mut chain = self.catalog.ancestors(ty);
        chain.reverse();
        chain.push(ty);

        let mut properties: Vec<DataProperty> = Vec::new();
        let mut extension_data_type = None;
        let mut type_name_property = None;

        for declaring in chain {
            let Some(shape) = self.catalog.object_shape(declaring) else {
                continue;
            };
            if shape.discriminator.is_some() {
                type_name_property = shape.discriminator.clone();
            }

            for member in &shape.members {
                if member.is_indexer || member.is_ignored {
                    continue;
                }
                if !member.can_read && !member.can_write {
                    continue;
                }
                if self.options.ignore_read_only_properties && member.is_read_only() {
                    continue;
                }
                if member.is_extension_data {
                    extension_data_type = Some(self.extension_value_type(member.member_type)?);
                    continue;
                }

                let name = member.json_name.clone().unwrap_or_else(|| {
                    self.options
                        .naming_policy
                        .map(|policy| policy.apply(&member.name))
                        .unwrap_or_else(|| member.name.clone())
                });

                let property = DataProperty {
                    name,
                    member_type: member.member_type,
                    is_required: member.is_required,
                    is_nullable: member.is_nullable
                        || self.catalog.nullable_inner(member.member_type).is_some(),
                    is_read_only: member.is_read_only(),
                    is_write_only: member.is_write_only(),
                    member: Some(member.clone()),
                };

                // A redeclared member hides the inherited one but keeps its slot.
                match properties.iter().position(|p| p.name == property.name) {
                    Some(idx) => properties[idx] = property,
                    None => properties.push(property),
                }
            }
        }

        let type_name_value = self
            .catalog
            .object_shape(ty)
            .and_then(|shape| shape.discriminator_value.clone());

        Ok(DataContract::for_object(
            ty,
            properties,
            extension_data_type,
            type_name_property,
            type_name_value,
        ))
    }

    fn extension_value_type(&self, member_type: TypeId) -> AppResult<TypeId> {
        match &self.catalog.get(member_type)?.shape {
            TypeShape::Map { value, .. } => Ok(*value),
            TypeShape::LegacyMap | TypeShape::Dynamic => Ok(self.catalog.object_type()),
            _ => Err(AppError::UnsupportedType(format!(
                "extension data member of type {} must be a dictionary",
                self.catalog.full_name(member_type)
            ))),
        }
    }
}

impl DataContractResolver for CatalogContractResolver {
    fn resolve(&self, ty: TypeId) -> AppResult<DataContract> {
        let ty = self.catalog.unwrap_nullable(ty);
        let descriptor = self.catalog.get(ty)?;

        match &descriptor.shape {
            TypeShape::Primitive(primitive) => {
                let (data_type, format) = primitive_data_type(*primitive);
                Ok(DataContract::for_primitive(ty, data_type, format, None))
            }
            TypeShape::Binary => Ok(DataContract::for_primitive(
                ty,
                DataType::String,
                Some("binary"),
                None,
            )),
            TypeShape::Enum(shape) => Ok(self.resolve_enum(ty, shape)),
            TypeShape::Sequence { item, unique, .. } => {
                Ok(DataContract::for_array(ty, *item, *unique))
            }
            TypeShape::Map { key, value } => self.resolve_dictionary(ty, *key, *value),
            TypeShape::LegacyMap => {
                let object = self.catalog.object_type();
                Ok(DataContract::for_dictionary(ty, object, object, None))
            }
            TypeShape::Object(_) => self.resolve_object(ty),
            TypeShape::Dynamic => Ok(DataContract::for_dynamic(ty)),
            TypeShape::Nullable(_) => Err(AppError::UnsupportedType(format!(
                "nullable wrapper {} could not be unwrapped",
                self.catalog.full_name(ty)
            ))),
        }
    }
}

/// JSON type and format of a primitive.
pub fn primitive_data_type(primitive: PrimitiveType) -> (DataType, Option<&'static str>) {
    match primitive {
        PrimitiveType::Boolean => (DataType::Boolean, None),
        PrimitiveType::Byte
        | PrimitiveType::SByte
        | PrimitiveType::Int16
        | PrimitiveType::UInt16
        | PrimitiveType::Int32
        | PrimitiveType::UInt32 => (DataType::Integer, Some("int32")),
        PrimitiveType::Int64 | PrimitiveType::UInt64 => (DataType::Integer, Some("int64")),
        PrimitiveType::Single => (DataType::Number, Some("float")),
        PrimitiveType::Double | PrimitiveType::Decimal => (DataType::Number, Some("double")),
        PrimitiveType::Char | PrimitiveType::String => (DataType::String, None),
        PrimitiveType::DateTime | PrimitiveType::DateTimeOffset => {
            (DataType::String, Some("date-time"))
        }
        PrimitiveType::DateOnly => (DataType::String, Some("date")),
        PrimitiveType::TimeOnly => (DataType::String, Some("time")),
        PrimitiveType::TimeSpan => (DataType::String, Some("date-span")),
        PrimitiveType::Guid => (DataType::String, Some("uuid")),
        PrimitiveType::Uri => (DataType::String, Some("uri")),
        PrimitiveType::ByteArray => (DataType::String, Some("byte")),
    }
}
