#![deny(missing_docs)]

//! # Manifest
//!
//! Serde form of a type catalog plus operation list, so APIs can be described
//! in YAML or JSON files.
//!
//! Types are referenced by *type expressions*:
//! - primitives by name or keyword (`Int32`, `int`, `string`, `Guid`),
//! - `T?` for nullable, `T[]` for arrays,
//! - collection generics (`List<T>`, `HashSet<T>`, `IAsyncEnumerable<T>`,
//!   `Dictionary<K, V>`, `Nullable<T>`),
//! - `object`, `IFormFile`, `Hashtable`,
//! - declared types by name (`User`, `Shop.User`, `Page<User>`).
//!
//! Declared types may reference each other in any order.

use crate::catalog::{
    EnumMember, EnumShape, MemberInfo, ObjectShape, ParameterInfo, PrimitiveType, TypeCatalog,
    TypeDescriptor, TypeId, TypeShape,
};
use crate::document::{ApiOperation, ApiParameter, ApiResponse, ParameterLocation};
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Declared kind of a manifest type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Class or struct.
    #[default]
    Object,
    /// Enumeration.
    Enum,
}

/// Enum member, either a bare name or a full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValueSpec {
    /// Name only; the value follows declaration order.
    Name(String),
    /// Explicit record.
    Full {
        /// Declared name.
        name: String,
        /// Numeric value.
        #[serde(default)]
        value: Option<i64>,
        /// Serialized name override.
        #[serde(default)]
        json_name: Option<String>,
    },
}

/// Member of a manifest object type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSpec {
    /// Declared name.
    pub name: String,
    /// Type expression.
    #[serde(rename = "type")]
    pub type_expr: String,
    /// Serialized name override.
    pub json_name: Option<String>,
    /// Accepts `null`.
    pub nullable: bool,
    /// Getter only.
    pub read_only: bool,
    /// Setter only.
    pub write_only: bool,
    /// Required marker.
    pub required: bool,
    /// Ignore marker.
    pub ignored: bool,
    /// Obsolete marker.
    pub obsolete: bool,
    /// Indexer.
    pub indexer: bool,
    /// Extension-data catch-all.
    pub extension_data: bool,
    /// Declared default value.
    pub default: Option<Value>,
}

/// A declared type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeSpec {
    /// Simple name, without generic arguments.
    pub name: String,
    /// Namespace.
    pub namespace: Option<String>,
    /// Assembly override. Defaults to the first namespace segment.
    pub assembly: Option<String>,
    /// Object or enum.
    pub kind: TypeKind,
    /// Generic arguments of a constructed type, as type expressions.
    pub generic_arguments: Vec<String>,
    /// Base type expression.
    pub base: Option<String>,
    /// Abstract marker.
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Discriminator property name declared on this type.
    pub discriminator: Option<String>,
    /// Discriminator value of this type.
    pub discriminator_value: Option<String>,
    /// Members in declaration order.
    pub members: Vec<MemberSpec>,
    /// Enum underlying type name. Defaults to `Int32`.
    pub underlying: Option<String>,
    /// Enum members.
    pub values: Vec<EnumValueSpec>,
}

/// A parameter of a manifest operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Bound name.
    pub name: String,
    /// Source.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// Type expression. Untyped parameters are strings.
    #[serde(rename = "type", default)]
    pub type_expr: Option<String>,
    /// Required marker.
    #[serde(default)]
    pub required: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<Value>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A response of a manifest operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// Status code.
    pub status: String,
    /// Payload type expression.
    #[serde(rename = "type", default)]
    pub type_expr: Option<String>,
    /// Description override.
    #[serde(default)]
    pub description: Option<String>,
}

/// A manifest operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    /// HTTP method.
    pub method: String,
    /// Route template.
    pub path: String,
    /// Group name (tag).
    #[serde(default)]
    pub group: Option<String>,
    /// Operation id.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Summary.
    #[serde(default)]
    pub summary: Option<String>,
    /// Obsolete marker.
    #[serde(default)]
    pub deprecated: bool,
    /// Parameters.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Responses.
    #[serde(default)]
    pub responses: Vec<ResponseSpec>,
}

/// Types and operations of one API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Declared types.
    pub types: Vec<TypeSpec>,
    /// Operations.
    pub operations: Vec<OperationSpec>,
}

impl Manifest {
    /// Parses a YAML manifest.
    pub fn from_yaml(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::General(format!("Failed to parse manifest: {}", e)))
    }

    /// Parses a JSON manifest.
    pub fn from_json(content: &str) -> AppResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| AppError::General(format!("Failed to parse manifest: {}", e)))
    }

    /// Reads a manifest file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Builds the catalog, then the operations against it.
    pub fn build(&self) -> AppResult<(TypeCatalog, Vec<ApiOperation>)> {
        let mut catalog = TypeCatalog::new();
        let mut declared: Vec<Option<TypeId>> = Vec::with_capacity(self.types.len());

        // Non-generic types first so generic arguments can name them.
        for spec in &self.types {
            if !spec.generic_arguments.is_empty() {
                declared.push(None);
                continue;
            }
            let shape = match spec.kind {
                TypeKind::Enum => TypeShape::Enum(enum_shape(spec)?),
                TypeKind::Object => TypeShape::Object(ObjectShape::new()),
            };
            declared.push(Some(catalog.add(descriptor(spec, shape))));
        }

        for (idx, spec) in self.types.iter().enumerate() {
            if spec.generic_arguments.is_empty() {
                continue;
            }
            let mut arguments = Vec::with_capacity(spec.generic_arguments.len());
            for argument in &spec.generic_arguments {
                arguments.push(resolve_type(&mut catalog, argument)?.0);
            }
            let shape = TypeShape::Object(ObjectShape::new());
            let id = catalog.add(descriptor(spec, shape).with_generic_arguments(arguments));
            declared[idx] = Some(id);
        }

        for (spec, id) in self.types.iter().zip(declared) {
            let Some(id) = id else { continue };
            if spec.kind == TypeKind::Object {
                let shape = object_shape(&mut catalog, spec)?;
                catalog.define_object(id, shape)?;
            }
        }

        let mut operations = Vec::with_capacity(self.operations.len());
        for spec in &self.operations {
            operations.push(operation(&mut catalog, spec)?);
        }

        debug!(
            types = catalog.len(),
            operations = operations.len(),
            "built manifest"
        );
        Ok((catalog, operations))
    }
}

fn descriptor(spec: &TypeSpec, shape: TypeShape) -> TypeDescriptor {
    let descriptor = TypeDescriptor::new(spec.namespace.as_deref(), spec.name.clone(), shape);
    match &spec.assembly {
        Some(assembly) => descriptor.with_assembly(assembly.clone()),
        None => descriptor,
    }
}

fn enum_shape(spec: &TypeSpec) -> AppResult<EnumShape> {
    let underlying = match &spec.underlying {
        Some(name) => PrimitiveType::from_name(name).ok_or_else(|| {
            AppError::UnsupportedType(format!("enum {} has underlying type {}", spec.name, name))
        })?,
        None => PrimitiveType::Int32,
    };

    // `None` once an explicit value leaves no successor.
    let mut next = Some(0i64);
    let mut members = Vec::with_capacity(spec.values.len());
    for value in &spec.values {
        let (name, explicit, json_name) = match value {
            EnumValueSpec::Name(name) => (name, None, None),
            EnumValueSpec::Full {
                name,
                value,
                json_name,
            } => (name, *value, json_name.clone()),
        };
        let value = match explicit.or(next) {
            Some(value) => value,
            None => {
                return Err(AppError::UnsupportedType(format!(
                    "enum {} member {} has no value after {}",
                    spec.name,
                    name,
                    i64::MAX
                )))
            }
        };
        next = value.checked_add(1);
        members.push(EnumMember {
            name: name.clone(),
            value,
            json_name,
        });
    }

    Ok(EnumShape {
        underlying,
        members,
    })
}

fn object_shape(catalog: &mut TypeCatalog, spec: &TypeSpec) -> AppResult<ObjectShape> {
    let mut shape = ObjectShape::new();
    if let Some(base) = &spec.base {
        shape = shape.with_base(resolve_type(catalog, base)?.0);
    }
    shape.is_abstract = spec.is_abstract;
    shape.discriminator = spec.discriminator.clone();
    shape.discriminator_value = spec.discriminator_value.clone();

    for member in &spec.members {
        let (member_type, nullable) = resolve_type(catalog, &member.type_expr)?;
        let mut info = MemberInfo::new(member.name.clone(), member_type);
        info.json_name = member.json_name.clone();
        info.is_nullable = member.nullable || nullable;
        info.can_read = !member.write_only;
        info.can_write = !member.read_only;
        info.is_required = member.required;
        info.is_ignored = member.ignored;
        info.is_obsolete = member.obsolete;
        info.is_indexer = member.indexer;
        info.is_extension_data = member.extension_data;
        info.default_value = member.default.clone();
        shape = shape.with_member(info);
    }
    Ok(shape)
}

fn operation(catalog: &mut TypeCatalog, spec: &OperationSpec) -> AppResult<ApiOperation> {
    let mut api = ApiOperation::new(spec.method.clone(), spec.path.clone());
    api.group_name = spec.group.clone();
    api.operation_id = spec.operation_id.clone();
    api.summary = spec.summary.clone();
    api.deprecated = spec.deprecated;

    for parameter in &spec.parameters {
        let mut api_parameter = ApiParameter::new(parameter.name.clone(), parameter.location);
        api_parameter.is_required = parameter.required;
        api_parameter.description = parameter.description.clone();
        if let Some(expr) = &parameter.type_expr {
            let (ty, nullable) = resolve_type(catalog, expr)?;
            let mut info = ParameterInfo::new(parameter.name.clone(), ty);
            info.is_nullable = nullable;
            info.is_required = parameter.required;
            info.default_value = parameter.default.clone();
            api_parameter = api_parameter.with_parameter(info);
        }
        api.parameters.push(api_parameter);
    }

    for response in &spec.responses {
        let mut api_response = ApiResponse::new(response.status.clone());
        api_response.description = response.description.clone();
        if let Some(expr) = &response.type_expr {
            api_response = api_response.with_type(resolve_type(catalog, expr)?.0);
        }
        api.responses.push(api_response);
    }

    Ok(api)
}

/// Resolves a type expression against the catalog, constructing collection
/// types on demand.
///
/// The flag is set when a `?` suffix was applied to a reference type, which
/// has no wrapper type and is instead carried as member nullability.
pub fn resolve_type(catalog: &mut TypeCatalog, expr: &str) -> AppResult<(TypeId, bool)> {
    let expr = expr.trim();

    if let Some(inner) = expr.strip_suffix('?') {
        let (inner, _) = resolve_type(catalog, inner)?;
        if is_value_type(catalog, inner) {
            return Ok((catalog.nullable(inner), false));
        }
        return Ok((inner, true));
    }

    if let Some(inner) = expr.strip_suffix("[]") {
        if inner.trim().eq_ignore_ascii_case("byte") {
            return Ok((catalog.primitive(PrimitiveType::ByteArray), false));
        }
        let (item, _) = resolve_type(catalog, inner)?;
        return Ok((catalog.array(item), false));
    }

    if let Some((base, inner)) = split_generic(expr) {
        let mut arguments = Vec::new();
        for argument in split_generic_args(inner) {
            arguments.push(resolve_type(catalog, &argument)?.0);
        }
        return construct_generic(catalog, base, &arguments, expr).map(|id| (id, false));
    }

    let ty = match expr {
        "object" | "Object" | "dynamic" => catalog.object_type(),
        "IFormFile" | "file" | "binary" => catalog.binary(),
        "Hashtable" | "IDictionary" => catalog.legacy_dictionary(),
        _ => match PrimitiveType::from_name(expr) {
            Some(primitive) => catalog.primitive(primitive),
            None => catalog
                .find(expr)
                .ok_or_else(|| AppError::UnknownType(expr.to_string()))?,
        },
    };
    Ok((ty, false))
}

fn construct_generic(
    catalog: &mut TypeCatalog,
    base: &str,
    arguments: &[TypeId],
    expr: &str,
) -> AppResult<TypeId> {
    let arity_error = || {
        AppError::UnsupportedType(format!(
            "{} takes a different number of type arguments",
            expr
        ))
    };
    match (base, arguments) {
        (
            "List" | "IList" | "ICollection" | "IEnumerable" | "IReadOnlyList"
            | "IReadOnlyCollection" | "Collection",
            [item],
        ) => Ok(catalog.list(*item)),
        ("HashSet" | "ISet" | "SortedSet" | "IReadOnlySet", [item]) => Ok(catalog.set(*item)),
        ("IAsyncEnumerable", [item]) => Ok(catalog.async_sequence(*item)),
        ("Nullable", [inner]) => Ok(catalog.nullable(*inner)),
        (
            "Dictionary" | "IDictionary" | "IReadOnlyDictionary" | "SortedDictionary",
            [key, value],
        ) => Ok(catalog.dictionary(*key, *value)),
        (
            "List" | "IList" | "ICollection" | "IEnumerable" | "IReadOnlyList"
            | "IReadOnlyCollection" | "Collection" | "HashSet" | "ISet" | "SortedSet"
            | "IReadOnlySet" | "IAsyncEnumerable" | "Nullable" | "Dictionary" | "IDictionary"
            | "IReadOnlyDictionary" | "SortedDictionary",
            _,
        ) => Err(arity_error()),
        _ => {
            let names: Vec<String> = arguments
                .iter()
                .map(|arg| catalog.display_name(*arg))
                .collect();
            let display = format!("{}<{}>", base, names.join(", "));
            catalog
                .find(&display)
                .ok_or(AppError::UnknownType(display))
        }
    }
}

fn is_value_type(catalog: &TypeCatalog, ty: TypeId) -> bool {
    match catalog.get(ty).map(|d| &d.shape) {
        Ok(TypeShape::Primitive(primitive)) => !matches!(
            primitive,
            PrimitiveType::String | PrimitiveType::Uri | PrimitiveType::ByteArray
        ),
        Ok(TypeShape::Enum(_)) => true,
        _ => false,
    }
}

fn split_generic(ty: &str) -> Option<(&str, &str)> {
    let start = ty.find('<')?;
    if !ty.ends_with('>') {
        return None;
    }
    let base = ty[..start].trim();
    let base = base.rsplit('.').next().unwrap_or(base);
    let inner = &ty[start + 1..ty.len() - 1];
    Some((base, inner))
}

fn split_generic_args(inner: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in inner.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }

    args
}
