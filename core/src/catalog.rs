#![deny(missing_docs)]

//! # Type Catalog
//!
//! The type metadata surface consumed by the generator.
//!
//! Every type is a `TypeDescriptor` stored in an arena and addressed by a
//! copyable `TypeId`. Identity of a type is identity of its handle within one
//! catalog, so two types with the same name in different namespaces are
//! distinct. Constructed types (`List<T>`, `T?`, `Dictionary<K, V>`, ...) are
//! interned: asking for `List<Int32>` twice yields the same handle.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;

/// Stable handle of a type inside a [`TypeCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Returns the arena index of the type.
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Built-in scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveType {
    /// `bool`
    Boolean,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 8-bit integer.
    SByte,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit float.
    Single,
    /// 64-bit float.
    Double,
    /// 128-bit decimal.
    Decimal,
    /// Single UTF-16 character.
    Char,
    /// Text.
    String,
    /// Date and time.
    DateTime,
    /// Date and time with offset.
    DateTimeOffset,
    /// Calendar date.
    DateOnly,
    /// Time of day.
    TimeOnly,
    /// Duration.
    TimeSpan,
    /// UUID.
    Guid,
    /// URI.
    Uri,
    /// Base64 encoded byte buffer.
    ByteArray,
}

impl PrimitiveType {
    /// Every primitive, in declaration order.
    pub const ALL: [PrimitiveType; 22] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::SByte,
        PrimitiveType::Int16,
        PrimitiveType::UInt16,
        PrimitiveType::Int32,
        PrimitiveType::UInt32,
        PrimitiveType::Int64,
        PrimitiveType::UInt64,
        PrimitiveType::Single,
        PrimitiveType::Double,
        PrimitiveType::Decimal,
        PrimitiveType::Char,
        PrimitiveType::String,
        PrimitiveType::DateTime,
        PrimitiveType::DateTimeOffset,
        PrimitiveType::DateOnly,
        PrimitiveType::TimeOnly,
        PrimitiveType::TimeSpan,
        PrimitiveType::Guid,
        PrimitiveType::Uri,
        PrimitiveType::ByteArray,
    ];

    /// The type name as it appears in schema ids and type expressions.
    pub fn type_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Byte => "Byte",
            PrimitiveType::SByte => "SByte",
            PrimitiveType::Int16 => "Int16",
            PrimitiveType::UInt16 => "UInt16",
            PrimitiveType::Int32 => "Int32",
            PrimitiveType::UInt32 => "UInt32",
            PrimitiveType::Int64 => "Int64",
            PrimitiveType::UInt64 => "UInt64",
            PrimitiveType::Single => "Single",
            PrimitiveType::Double => "Double",
            PrimitiveType::Decimal => "Decimal",
            PrimitiveType::Char => "Char",
            PrimitiveType::String => "String",
            PrimitiveType::DateTime => "DateTime",
            PrimitiveType::DateTimeOffset => "DateTimeOffset",
            PrimitiveType::DateOnly => "DateOnly",
            PrimitiveType::TimeOnly => "TimeOnly",
            PrimitiveType::TimeSpan => "TimeSpan",
            PrimitiveType::Guid => "Guid",
            PrimitiveType::Uri => "Uri",
            PrimitiveType::ByteArray => "Byte[]",
        }
    }

    /// Looks a primitive up by its type name or common keyword alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let alias = match name {
            "bool" => Some(PrimitiveType::Boolean),
            "byte" => Some(PrimitiveType::Byte),
            "sbyte" => Some(PrimitiveType::SByte),
            "short" => Some(PrimitiveType::Int16),
            "ushort" => Some(PrimitiveType::UInt16),
            "int" => Some(PrimitiveType::Int32),
            "uint" => Some(PrimitiveType::UInt32),
            "long" => Some(PrimitiveType::Int64),
            "ulong" => Some(PrimitiveType::UInt64),
            "float" => Some(PrimitiveType::Single),
            "double" => Some(PrimitiveType::Double),
            "decimal" => Some(PrimitiveType::Decimal),
            "char" => Some(PrimitiveType::Char),
            "string" => Some(PrimitiveType::String),
            "byte[]" => Some(PrimitiveType::ByteArray),
            _ => None,
        };
        alias.or_else(|| Self::ALL.into_iter().find(|p| p.type_name() == name))
    }

    /// Whether the value is 64 bits wide (used for enum formats).
    pub fn is_wide_integer(self) -> bool {
        matches!(self, PrimitiveType::Int64 | PrimitiveType::UInt64)
    }
}

/// Declared member of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    /// Declared member name.
    pub name: String,
    /// Declared member type.
    pub member_type: TypeId,
    /// The type that declares the member. Filled in when the owning shape is defined.
    pub declaring_type: Option<TypeId>,
    /// Explicit serialized name override.
    pub json_name: Option<String>,
    /// Annotated as nullable (`T?` on a reference type).
    pub is_nullable: bool,
    /// Has a public getter.
    pub can_read: bool,
    /// Has a public setter.
    pub can_write: bool,
    /// Indexer members are never serialized.
    pub is_indexer: bool,
    /// Excluded by an ignore marker.
    pub is_ignored: bool,
    /// Carries a required marker.
    pub is_required: bool,
    /// Carries an obsolete marker.
    pub is_obsolete: bool,
    /// Catch-all map receiving unknown properties.
    pub is_extension_data: bool,
    /// Declared default value.
    pub default_value: Option<Value>,
}

impl MemberInfo {
    /// Creates a public read/write member.
    pub fn new(name: impl Into<String>, member_type: TypeId) -> Self {
        Self {
            name: name.into(),
            member_type,
            declaring_type: None,
            json_name: None,
            is_nullable: false,
            can_read: true,
            can_write: true,
            is_indexer: false,
            is_ignored: false,
            is_required: false,
            is_obsolete: false,
            is_extension_data: false,
            default_value: None,
        }
    }

    /// Sets the serialized name override.
    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    /// Marks the member as nullable.
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Removes the setter.
    pub fn read_only(mut self) -> Self {
        self.can_write = false;
        self
    }

    /// Removes the getter.
    pub fn write_only(mut self) -> Self {
        self.can_read = false;
        self
    }

    /// Marks the member as an indexer.
    pub fn indexer(mut self) -> Self {
        self.is_indexer = true;
        self
    }

    /// Marks the member as ignored.
    pub fn ignored(mut self) -> Self {
        self.is_ignored = true;
        self
    }

    /// Marks the member as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the member as obsolete.
    pub fn obsolete(mut self) -> Self {
        self.is_obsolete = true;
        self
    }

    /// Marks the member as the extension-data catch-all.
    pub fn extension_data(mut self) -> Self {
        self.is_extension_data = true;
        self
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Readable but not writable.
    pub fn is_read_only(&self) -> bool {
        self.can_read && !self.can_write
    }

    /// Writable but not readable.
    pub fn is_write_only(&self) -> bool {
        self.can_write && !self.can_read
    }
}

/// Metadata of an action parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Declared parameter name.
    pub name: String,
    /// Declared parameter type.
    pub parameter_type: TypeId,
    /// Declared default value.
    pub default_value: Option<Value>,
    /// Annotated as nullable.
    pub is_nullable: bool,
    /// Carries a required marker.
    pub is_required: bool,
}

impl ParameterInfo {
    /// Creates parameter metadata without markers.
    pub fn new(name: impl Into<String>, parameter_type: TypeId) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            default_value: None,
            is_nullable: false,
            is_required: false,
        }
    }

    /// Sets the declared default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Marks the parameter as nullable.
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }
}

/// Member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Declared name.
    pub name: String,
    /// Underlying numeric value.
    pub value: i64,
    /// Explicit serialized name override.
    pub json_name: Option<String>,
}

/// Shape of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    /// Underlying integral type.
    pub underlying: PrimitiveType,
    /// Members in declaration order.
    pub members: Vec<EnumMember>,
}

impl EnumShape {
    /// Creates an `Int32` backed enum whose values follow declaration order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| EnumMember {
                name: name.into(),
                value: idx as i64,
                json_name: None,
            })
            .collect();
        Self {
            underlying: PrimitiveType::Int32,
            members,
        }
    }

    /// Replaces the underlying integral type.
    pub fn with_underlying(mut self, underlying: PrimitiveType) -> Self {
        self.underlying = underlying;
        self
    }
}

/// Shape of a class-like type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    /// Base type, if any.
    pub base: Option<TypeId>,
    /// Abstract types are never listed as a `oneOf` member of their own union.
    pub is_abstract: bool,
    /// Members declared directly on this type, in declaration order.
    pub members: Vec<MemberInfo>,
    /// Polymorphic type discriminator property name declared on this type.
    pub discriminator: Option<String>,
    /// Discriminator value identifying this type.
    pub discriminator_value: Option<String>,
}

impl ObjectShape {
    /// Creates an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base type.
    pub fn with_base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Marks the type abstract.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Appends a member.
    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    /// Declares the polymorphic discriminator property.
    pub fn with_discriminator(mut self, property_name: impl Into<String>) -> Self {
        self.discriminator = Some(property_name.into());
        self
    }

    /// Declares the discriminator value of this type.
    pub fn with_discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }
}

/// Structural classification of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// Built-in scalar.
    Primitive(PrimitiveType),
    /// Nullable wrapper over a value type.
    Nullable(TypeId),
    /// Arrays, lists, sets and async sequences.
    Sequence {
        /// Element type.
        item: TypeId,
        /// Enforces set semantics.
        unique: bool,
        /// Async sequence (`IAsyncEnumerable<T>`).
        is_async: bool,
    },
    /// Generic dictionary.
    Map {
        /// Key type.
        key: TypeId,
        /// Value type.
        value: TypeId,
    },
    /// Legacy non-generic dictionary.
    LegacyMap,
    /// Enumeration.
    Enum(EnumShape),
    /// Class or struct.
    Object(ObjectShape),
    /// The universal open type.
    Dynamic,
    /// Uploaded file / raw binary payload.
    Binary,
}

/// A type known to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Simple name, without generic arguments (`List`, `Node`, `Int32[]`).
    pub name: String,
    /// Namespace, if any.
    pub namespace: Option<String>,
    /// Defining assembly (module). Subtype discovery is scoped to it.
    pub assembly: Option<String>,
    /// Generic arguments of a constructed type.
    pub generic_arguments: Vec<TypeId>,
    /// Structural classification.
    pub shape: TypeShape,
}

impl TypeDescriptor {
    /// Creates a non-generic descriptor.
    pub fn new(namespace: Option<&str>, name: impl Into<String>, shape: TypeShape) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            assembly: namespace.map(|ns| ns.split('.').next().unwrap_or(ns).to_string()),
            generic_arguments: Vec::new(),
            shape,
        }
    }

    /// Overrides the defining assembly.
    pub fn with_assembly(mut self, assembly: impl Into<String>) -> Self {
        self.assembly = Some(assembly.into());
        self
    }

    /// Sets the generic arguments of a constructed type.
    pub fn with_generic_arguments(mut self, arguments: Vec<TypeId>) -> Self {
        self.generic_arguments = arguments;
        self
    }

    /// Whether this is a constructed generic type.
    pub fn is_generic(&self) -> bool {
        !self.generic_arguments.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ConstructedKey {
    Nullable(TypeId),
    List(TypeId),
    Array(TypeId),
    Set(TypeId),
    AsyncSequence(TypeId),
    Dictionary(TypeId, TypeId),
}

const SYSTEM: &str = "System";
const COLLECTIONS: &str = "System.Collections.Generic";

/// Arena of type descriptors.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: Vec<TypeDescriptor>,
    primitives: HashMap<PrimitiveType, TypeId>,
    constructed: HashMap<ConstructedKey, TypeId>,
    object: TypeId,
    legacy_map: Option<TypeId>,
    binary: Option<TypeId>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    /// Creates a catalog holding only the universal `Object` type.
    pub fn new() -> Self {
        let object = TypeDescriptor::new(Some(SYSTEM), "Object", TypeShape::Dynamic);
        Self {
            types: vec![object],
            primitives: HashMap::new(),
            constructed: HashMap::new(),
            object: TypeId(0),
            legacy_map: None,
            binary: None,
        }
    }

    /// Adds a descriptor and returns its handle.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> TypeId {
        let id = TypeId(self.types.len());
        let mut descriptor = descriptor;
        if let TypeShape::Object(shape) = &mut descriptor.shape {
            stamp_declaring_type(shape, id);
        }
        self.types.push(descriptor);
        id
    }

    /// Adds an object type.
    pub fn add_object(&mut self, namespace: &str, name: &str, shape: ObjectShape) -> TypeId {
        self.add(TypeDescriptor::new(
            Some(namespace),
            name,
            TypeShape::Object(shape),
        ))
    }

    /// Adds an enum type.
    pub fn add_enum(&mut self, namespace: &str, name: &str, shape: EnumShape) -> TypeId {
        self.add(TypeDescriptor::new(Some(namespace), name, TypeShape::Enum(shape)))
    }

    /// Declares an object type without members so it can be referenced before
    /// it is defined (self-referential and mutually recursive graphs).
    pub fn declare_object(&mut self, namespace: &str, name: &str) -> TypeId {
        self.add_object(namespace, name, ObjectShape::new())
    }

    /// Replaces the shape of an existing type.
    pub fn define(&mut self, id: TypeId, shape: TypeShape) -> AppResult<()> {
        let descriptor = self
            .types
            .get_mut(id.0)
            .ok_or_else(|| AppError::UnknownType(id.to_string()))?;
        let mut shape = shape;
        if let TypeShape::Object(object) = &mut shape {
            stamp_declaring_type(object, id);
        }
        descriptor.shape = shape;
        Ok(())
    }

    /// Replaces the object shape of an existing type.
    pub fn define_object(&mut self, id: TypeId, shape: ObjectShape) -> AppResult<()> {
        self.define(id, TypeShape::Object(shape))
    }

    /// The universal open type.
    pub fn object_type(&self) -> TypeId {
        self.object
    }

    /// Interned primitive.
    pub fn primitive(&mut self, primitive: PrimitiveType) -> TypeId {
        if let Some(id) = self.primitives.get(&primitive) {
            return *id;
        }
        let id = self.add(TypeDescriptor::new(
            Some(SYSTEM),
            primitive.type_name(),
            TypeShape::Primitive(primitive),
        ));
        self.primitives.insert(primitive, id);
        id
    }

    /// Interned `Nullable<T>`.
    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        self.constructed(ConstructedKey::Nullable(inner), |_| {
            TypeDescriptor::new(Some(SYSTEM), "Nullable", TypeShape::Nullable(inner))
                .with_generic_arguments(vec![inner])
        })
    }

    /// Interned `List<T>`.
    pub fn list(&mut self, item: TypeId) -> TypeId {
        self.constructed(ConstructedKey::List(item), |_| {
            TypeDescriptor::new(Some(COLLECTIONS), "List", sequence(item, false, false))
                .with_generic_arguments(vec![item])
        })
    }

    /// Interned `T[]`.
    pub fn array(&mut self, item: TypeId) -> TypeId {
        self.constructed(ConstructedKey::Array(item), |catalog| {
            let item_descriptor = &catalog.types[item.0];
            let name = format!("{}[]", catalog.display_name_of(item_descriptor));
            let mut descriptor = TypeDescriptor::new(None, name, sequence(item, false, false));
            descriptor.namespace = item_descriptor.namespace.clone();
            descriptor.assembly = item_descriptor.assembly.clone();
            descriptor
        })
    }

    /// Interned `HashSet<T>`.
    pub fn set(&mut self, item: TypeId) -> TypeId {
        self.constructed(ConstructedKey::Set(item), |_| {
            TypeDescriptor::new(Some(COLLECTIONS), "HashSet", sequence(item, true, false))
                .with_generic_arguments(vec![item])
        })
    }

    /// Interned `IAsyncEnumerable<T>`.
    pub fn async_sequence(&mut self, item: TypeId) -> TypeId {
        self.constructed(ConstructedKey::AsyncSequence(item), |_| {
            TypeDescriptor::new(
                Some(COLLECTIONS),
                "IAsyncEnumerable",
                sequence(item, false, true),
            )
            .with_generic_arguments(vec![item])
        })
    }

    /// Interned `Dictionary<K, V>`.
    pub fn dictionary(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.constructed(ConstructedKey::Dictionary(key, value), |_| {
            TypeDescriptor::new(Some(COLLECTIONS), "Dictionary", TypeShape::Map { key, value })
                .with_generic_arguments(vec![key, value])
        })
    }

    /// Interned legacy non-generic dictionary (`Hashtable`).
    pub fn legacy_dictionary(&mut self) -> TypeId {
        if let Some(id) = self.legacy_map {
            return id;
        }
        let id = self.add(TypeDescriptor::new(
            Some("System.Collections"),
            "Hashtable",
            TypeShape::LegacyMap,
        ));
        self.legacy_map = Some(id);
        id
    }

    /// Interned file upload type (`IFormFile`).
    pub fn binary(&mut self) -> TypeId {
        if let Some(id) = self.binary {
            return id;
        }
        let id = self.add(TypeDescriptor::new(
            Some("Microsoft.AspNetCore.Http"),
            "IFormFile",
            TypeShape::Binary,
        ));
        self.binary = Some(id);
        id
    }

    fn constructed<F>(&mut self, key: ConstructedKey, build: F) -> TypeId
    where
        F: FnOnce(&Self) -> TypeDescriptor,
    {
        if let Some(id) = self.constructed.get(&key) {
            return *id;
        }
        let descriptor = build(self);
        let id = self.add(descriptor);
        self.constructed.insert(key, id);
        id
    }

    /// Looks a descriptor up.
    pub fn get(&self, id: TypeId) -> AppResult<&TypeDescriptor> {
        self.types
            .get(id.0)
            .ok_or_else(|| AppError::UnknownType(id.to_string()))
    }

    /// Number of types in the catalog.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog holds nothing but the built-in `Object`.
    pub fn is_empty(&self) -> bool {
        self.types.len() <= 1
    }

    /// Iterates all types in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDescriptor)> {
        self.types
            .iter()
            .enumerate()
            .map(|(idx, descriptor)| (TypeId(idx), descriptor))
    }

    /// Name with generic arguments, e.g. `Page<User>`.
    pub fn display_name(&self, id: TypeId) -> String {
        match self.types.get(id.0) {
            Some(descriptor) => self.display_name_of(descriptor),
            None => id.to_string(),
        }
    }

    fn display_name_of(&self, descriptor: &TypeDescriptor) -> String {
        if descriptor.generic_arguments.is_empty() {
            return descriptor.name.clone();
        }
        let args: Vec<String> = descriptor
            .generic_arguments
            .iter()
            .map(|arg| self.display_name(*arg))
            .collect();
        format!("{}<{}>", descriptor.name, args.join(", "))
    }

    /// Namespace-qualified display name, e.g. `Billing.Page<User>`.
    pub fn full_name(&self, id: TypeId) -> String {
        let display = self.display_name(id);
        match self.types.get(id.0).and_then(|d| d.namespace.as_deref()) {
            Some(ns) => format!("{}.{}", ns, display),
            None => display,
        }
    }

    /// Finds a type by display name or namespace-qualified name.
    ///
    /// Returns `None` when the name is unknown or ambiguous.
    pub fn find(&self, name: &str) -> Option<TypeId> {
        let mut found = None;
        for (id, _) in self.iter() {
            if self.display_name(id) == name || self.full_name(id) == name {
                if found.is_some() {
                    return None;
                }
                found = Some(id);
            }
        }
        found
    }

    /// Inner type of a `Nullable<T>` wrapper.
    pub fn nullable_inner(&self, id: TypeId) -> Option<TypeId> {
        match self.types.get(id.0).map(|d| &d.shape) {
            Some(TypeShape::Nullable(inner)) => Some(*inner),
            _ => None,
        }
    }

    /// Strips every `Nullable<T>` layer.
    pub fn unwrap_nullable(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let Some(inner) = self.nullable_inner(current) {
            current = inner;
        }
        current
    }

    /// Object shape of the type, if it is an object.
    pub fn object_shape(&self, id: TypeId) -> Option<&ObjectShape> {
        match self.types.get(id.0).map(|d| &d.shape) {
            Some(TypeShape::Object(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Direct base type.
    pub fn base_type(&self, id: TypeId) -> Option<TypeId> {
        self.object_shape(id).and_then(|shape| shape.base)
    }

    /// Base types from the nearest to the root.
    pub fn ancestors(&self, id: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = self.base_type(id);
        while let Some(base) = current {
            // Malformed catalogs could declare a cycle through `base`.
            if chain.contains(&base) || base == id {
                break;
            }
            chain.push(base);
            current = self.base_type(base);
        }
        chain
    }

    /// Whether `id` is an abstract object type.
    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.object_shape(id).is_some_and(|shape| shape.is_abstract)
    }

    /// Whether `id` is a binary payload type.
    pub fn is_binary(&self, id: TypeId) -> bool {
        matches!(
            self.types.get(id.0).map(|d| &d.shape),
            Some(TypeShape::Binary)
        )
    }
}

fn sequence(item: TypeId, unique: bool, is_async: bool) -> TypeShape {
    TypeShape::Sequence {
        item,
        unique,
        is_async,
    }
}

fn stamp_declaring_type(shape: &mut ObjectShape, id: TypeId) {
    for member in &mut shape.members {
        member.declaring_type = Some(id);
    }
}
