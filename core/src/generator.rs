#![deny(missing_docs)]

//! # Schema Generator
//!
//! Walks a type graph and produces OpenAPI schemas.
//!
//! Dispatch is a `match` over the [`DataContractKind`] of the type:
//! - primitives are inlined, enums are referenced (unless inlined by option),
//! - arrays and dictionaries are inlined, except when directly self-referential,
//! - objects are always referenced, or described as a `oneOf` union when
//!   polymorphism is enabled and the type has known subtypes,
//! - the dynamic type yields the empty schema.
//!
//! Custom type mappings and file uploads are handled before dispatch.

use crate::catalog::{MemberInfo, ParameterInfo, TypeCatalog, TypeId};
use crate::contract::{DataContract, DataContractKind, DataContractResolver, DataProperty};
use crate::error::{AppError, AppResult};
use crate::filters::SchemaFilterContext;
use crate::options::SchemaGeneratorOptions;
use crate::repository::SchemaRepository;
use crate::schema::{AdditionalProperties, Discriminator, Schema, SchemaType};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where a schema is requested from.
#[derive(Clone, Copy)]
enum Site<'a> {
    Type,
    Member {
        member: Option<&'a MemberInfo>,
        property: Option<&'a DataProperty>,
    },
    Parameter(&'a ParameterInfo),
}

impl<'a> Site<'a> {
    fn member(&self) -> Option<&'a MemberInfo> {
        match self {
            Site::Member { member, .. } => *member,
            _ => None,
        }
    }

    fn parameter(&self) -> Option<&'a ParameterInfo> {
        match self {
            Site::Parameter(parameter) => Some(*parameter),
            _ => None,
        }
    }
}

/// Annotations applied on top of a type-level schema at a usage site.
#[derive(Debug, Default)]
struct Narrowing {
    nullable: bool,
    read_only: bool,
    write_only: bool,
    deprecated: bool,
    default: Option<Value>,
}

impl Narrowing {
    fn for_site(site: &Site<'_>) -> Self {
        match site {
            Site::Type => Self::default(),
            Site::Member {
                member,
                property: Some(property),
            } => {
                let required_marker = member.is_some_and(|m| m.is_required);
                Self {
                    nullable: property.is_nullable && !required_marker,
                    read_only: property.is_read_only,
                    write_only: property.is_write_only,
                    deprecated: member.is_some_and(|m| m.is_obsolete),
                    default: member.and_then(|m| m.default_value.clone()),
                }
            }
            Site::Member {
                member: Some(member),
                property: None,
            } => Self {
                nullable: member.is_nullable && !member.is_required,
                read_only: member.is_read_only(),
                write_only: member.is_write_only(),
                deprecated: member.is_obsolete,
                default: member.default_value.clone(),
            },
            Site::Member { .. } => Self::default(),
            Site::Parameter(parameter) => Self {
                nullable: parameter.is_nullable && !parameter.is_required,
                default: parameter.default_value.clone(),
                ..Self::default()
            },
        }
    }

    fn is_empty(&self) -> bool {
        !(self.nullable || self.read_only || self.write_only || self.deprecated)
            && self.default.is_none()
    }
}

/// Produces schemas for catalog types.
#[derive(Clone)]
pub struct SchemaGenerator {
    catalog: Arc<TypeCatalog>,
    resolver: Arc<dyn DataContractResolver>,
    options: SchemaGeneratorOptions,
}

impl fmt::Debug for SchemaGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaGenerator")
            .field("types", &self.catalog.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SchemaGenerator {
    /// Creates a generator.
    pub fn new(
        catalog: Arc<TypeCatalog>,
        resolver: Arc<dyn DataContractResolver>,
        options: SchemaGeneratorOptions,
    ) -> Self {
        Self {
            catalog,
            resolver,
            options,
        }
    }

    /// The catalog being described.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Active options.
    pub fn options(&self) -> &SchemaGeneratorOptions {
        &self.options
    }

    /// Schema for a type: an inline body or a reference into `repository`.
    pub fn generate_schema(&self, ty: TypeId, repository: &mut SchemaRepository) -> AppResult<Schema> {
        self.generate(ty, repository, Site::Type)
    }

    /// Schema for a member of type `ty`, with the member's nullability, access,
    /// obsolete marker and default value applied.
    pub fn generate_schema_for_member(
        &self,
        ty: TypeId,
        repository: &mut SchemaRepository,
        member: &MemberInfo,
    ) -> AppResult<Schema> {
        self.generate(
            ty,
            repository,
            Site::Member {
                member: Some(member),
                property: None,
            },
        )
    }

    /// Schema for an action parameter of type `ty`, with the parameter's
    /// default value and nullability applied.
    pub fn generate_schema_for_parameter(
        &self,
        ty: TypeId,
        repository: &mut SchemaRepository,
        parameter: &ParameterInfo,
    ) -> AppResult<Schema> {
        self.generate(ty, repository, Site::Parameter(parameter))
    }

    fn generate(&self, ty: TypeId, repository: &mut SchemaRepository, site: Site<'_>) -> AppResult<Schema> {
        if let Some(factory) = self.options.custom_mapping(&self.catalog, ty) {
            trace!(ty = %self.catalog.full_name(ty), "using custom type mapping");
            return Ok(factory());
        }

        let contract = self.resolver.resolve(ty)?;
        let mut schema = self.generate_for_contract(&contract, repository)?;

        if self.catalog.nullable_inner(ty).is_some() {
            schema = if schema.is_reference() {
                Schema {
                    nullable: true,
                    ..schema.wrap_all_of()
                }
            } else {
                Schema {
                    nullable: true,
                    ..schema
                }
            };
        }

        let mut schema = self.narrow(schema, Narrowing::for_site(&site));
        if !schema.is_reference() {
            self.apply_filters(&mut schema, &contract, site, repository)?;
        }
        Ok(schema)
    }

    fn narrow(&self, schema: Schema, narrowing: Narrowing) -> Schema {
        if narrowing.is_empty() {
            return schema;
        }

        if schema.is_reference() {
            if !self.options.use_all_of_to_extend_reference_schemas {
                // Only annotation flags may sit next to `$ref`.
                return Schema {
                    nullable: narrowing.nullable,
                    read_only: narrowing.read_only,
                    write_only: narrowing.write_only,
                    ..schema
                };
            }
            return apply_narrowing(schema.wrap_all_of(), narrowing);
        }

        apply_narrowing(schema, narrowing)
    }

    fn generate_for_contract(
        &self,
        contract: &DataContract,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        if self.options.use_one_of_for_polymorphism {
            if let Some(known_types) = self.known_types_of(contract) {
                return self.generate_polymorphic(contract, &known_types, repository);
            }
        }
        self.generate_concrete(contract, repository)
    }

    fn generate_concrete(
        &self,
        contract: &DataContract,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let ty = contract.underlying_type;
        if let Some(factory) = self.options.custom_mapping(&self.catalog, ty) {
            return Ok(factory());
        }
        if self.catalog.is_binary(ty) {
            return Ok(Schema::primitive(SchemaType::String, Some("binary")));
        }

        match &contract.kind {
            DataContractKind::Primitive { .. } => {
                if contract.is_enum() && !self.options.use_inline_definitions_for_enums {
                    self.generate_referenced(contract, repository, |_| {
                        Ok(create_primitive_schema(contract))
                    })
                } else {
                    Ok(create_primitive_schema(contract))
                }
            }
            DataContractKind::Array {
                item_type,
                unique_items,
            } => {
                let (item_type, unique_items) = (*item_type, *unique_items);
                if item_type == ty {
                    self.generate_referenced(contract, repository, |repo| {
                        self.create_array_schema(item_type, unique_items, repo)
                    })
                } else {
                    self.create_array_schema(item_type, unique_items, repository)
                }
            }
            DataContractKind::Dictionary {
                value_type,
                known_keys,
                ..
            } => {
                let value_type = *value_type;
                let known_keys = known_keys.as_deref();
                if value_type == ty {
                    self.generate_referenced(contract, repository, |repo| {
                        self.create_dictionary_schema(value_type, known_keys, repo)
                    })
                } else {
                    self.create_dictionary_schema(value_type, known_keys, repository)
                }
            }
            DataContractKind::Object { .. } => {
                if ty == self.catalog.object_type() {
                    return Ok(Schema::default());
                }
                self.generate_referenced(contract, repository, |repo| {
                    self.create_object_schema(contract, repo)
                })
            }
            DataContractKind::Dynamic => Ok(Schema::default()),
        }
    }

    fn generate_referenced<F>(
        &self,
        contract: &DataContract,
        repository: &mut SchemaRepository,
        factory: F,
    ) -> AppResult<Schema>
    where
        F: FnOnce(&mut SchemaRepository) -> AppResult<Schema>,
    {
        let ty = contract.underlying_type;
        if let Some(reference) = repository.lookup_by_type(ty) {
            return Ok(reference);
        }

        let schema_id = (self.options.schema_id_selector)(&self.catalog, ty);
        let type_name = self.catalog.full_name(ty);
        repository.get_or_add(ty, &type_name, &schema_id, |repo| {
            let mut schema = factory(repo)?;
            self.apply_filters(&mut schema, contract, Site::Type, repo)?;
            Ok(schema)
        })
    }

    fn create_array_schema(
        &self,
        item_type: TypeId,
        unique_items: bool,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let items = self.generate(item_type, repository, Site::Type)?;
        let mut schema = Schema::array(items);
        if unique_items {
            schema.unique_items = Some(true);
        }
        Ok(schema)
    }

    fn create_dictionary_schema(
        &self,
        value_type: TypeId,
        known_keys: Option<&[String]>,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let mut schema = Schema::object();
        match known_keys {
            Some(keys) => {
                for key in keys {
                    let value = self.generate(value_type, repository, Site::Type)?;
                    schema.properties.insert(key.clone(), value);
                }
                schema.additional_properties = Some(AdditionalProperties::Allowed(false));
            }
            None => {
                let value = self.generate(value_type, repository, Site::Type)?;
                schema.additional_properties = Some(AdditionalProperties::Schema(Box::new(value)));
            }
        }
        Ok(schema)
    }

    fn create_object_schema(
        &self,
        contract: &DataContract,
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let DataContractKind::Object {
            properties,
            extension_data_type,
            ..
        } = &contract.kind
        else {
            return Err(AppError::UnsupportedType(format!(
                "{} is not an object",
                self.catalog.full_name(contract.underlying_type)
            )));
        };
        let ty = contract.underlying_type;

        let mut schema = Schema::object();
        schema.additional_properties = Some(AdditionalProperties::Allowed(false));
        let mut inherited_from: Vec<TypeId> = Vec::new();

        if self.options.use_all_of_for_inheritance || self.options.use_one_of_for_polymorphism {
            if let Some(base) = self.known_base_type(ty) {
                let base_contract = self.resolver.resolve(base)?;
                let base_schema = self.generate_concrete(&base_contract, repository)?;
                if self.options.use_all_of_for_inheritance {
                    schema.all_of.push(base_schema);
                    inherited_from.push(base);
                    inherited_from.extend(self.catalog.ancestors(base));
                } else if let Some(name) = self.discriminator_name(&base_contract) {
                    schema.add_required_string(&name);
                }
            }

            if let Some(known_types) = self.known_types_of(contract) {
                for &known in known_types.iter().filter(|&&known| known != ty) {
                    self.register_known_type(known, repository)?;
                }
                if let Some(discriminator) =
                    self.discriminator_for(contract, &known_types, repository)?
                {
                    schema.add_required_string(&discriminator.property_name);
                    if self.options.use_all_of_for_inheritance {
                        schema.discriminator = Some(discriminator);
                    }
                }
            }
        }

        for property in properties {
            if property
                .declaring_type()
                .is_some_and(|declaring| inherited_from.contains(&declaring))
            {
                continue;
            }
            let obsolete = property.member.as_ref().is_some_and(|m| m.is_obsolete);
            if self.options.ignore_obsolete_properties && obsolete {
                continue;
            }

            let site = Site::Member {
                member: property.member.as_ref(),
                property: Some(property),
            };
            let property_schema = self.generate(property.member_type, repository, site)?;
            schema
                .properties
                .insert(property.name.clone(), property_schema);
            if property.is_required {
                schema.required.insert(property.name.clone());
            }
        }

        if let Some(extension_type) = extension_data_type {
            let values = self.generate(*extension_type, repository, Site::Type)?;
            schema.additional_properties = Some(AdditionalProperties::Schema(Box::new(values)));
        }

        Ok(schema)
    }

    fn generate_polymorphic(
        &self,
        contract: &DataContract,
        known_types: &[TypeId],
        repository: &mut SchemaRepository,
    ) -> AppResult<Schema> {
        let mut one_of = Vec::with_capacity(known_types.len());
        for &known in known_types {
            let known_contract = self.resolver.resolve(known)?;
            one_of.push(self.generate_concrete(&known_contract, repository)?);
        }

        let discriminator = self.discriminator_for(contract, known_types, repository)?;
        debug!(
            ty = %self.catalog.full_name(contract.underlying_type),
            members = one_of.len(),
            "built polymorphic union"
        );
        Ok(Schema {
            one_of,
            discriminator,
            ..Schema::default()
        })
    }

    fn register_known_type(&self, ty: TypeId, repository: &mut SchemaRepository) -> AppResult<()> {
        if self.options.custom_mapping(&self.catalog, ty).is_some() {
            return Ok(());
        }
        let contract = self.resolver.resolve(ty)?;
        if !contract.is_object() {
            return Ok(());
        }
        let schema_id = (self.options.schema_id_selector)(&self.catalog, ty);
        let type_name = self.catalog.full_name(ty);
        repository.register_supplementary(ty, &type_name, &schema_id, |repo| {
            let mut schema = self.create_object_schema(&contract, repo)?;
            self.apply_filters(&mut schema, &contract, Site::Type, repo)?;
            Ok(schema)
        })
    }

    /// Nearest ancestor whose subtype selector lists `ty`.
    pub fn known_base_type(&self, ty: TypeId) -> Option<TypeId> {
        self.catalog
            .ancestors(ty)
            .into_iter()
            .filter(|&base| base != self.catalog.object_type())
            .find(|&base| (self.options.sub_types_selector)(&self.catalog, base).contains(&ty))
    }

    /// Members of the polymorphic union of `ty`: the type itself unless
    /// abstract, then its known subtypes. `None` without known subtypes.
    pub fn known_types(&self, ty: TypeId) -> Option<Vec<TypeId>> {
        let sub_types = (self.options.sub_types_selector)(&self.catalog, ty);
        if sub_types.is_empty() {
            return None;
        }
        let mut known = Vec::with_capacity(sub_types.len() + 1);
        if !self.catalog.is_abstract(ty) {
            known.push(ty);
        }
        known.extend(sub_types.into_iter().filter(|&sub| sub != ty));
        Some(known)
    }

    fn known_types_of(&self, contract: &DataContract) -> Option<Vec<TypeId>> {
        if !contract.is_object() || contract.underlying_type == self.catalog.object_type() {
            return None;
        }
        self.known_types(contract.underlying_type)
    }

    fn discriminator_name(&self, contract: &DataContract) -> Option<String> {
        (self.options.discriminator_name_selector)(&self.catalog, contract.underlying_type)
            .or_else(|| contract.type_name_property().map(str::to_string))
    }

    fn discriminator_for(
        &self,
        contract: &DataContract,
        known_types: &[TypeId],
        repository: &mut SchemaRepository,
    ) -> AppResult<Option<Discriminator>> {
        let Some(property_name) = self.discriminator_name(contract) else {
            return Ok(None);
        };

        let mut mapping = IndexMap::new();
        for &known in known_types {
            let known_contract = self.resolver.resolve(known)?;
            let value = (self.options.discriminator_value_selector)(&self.catalog, known)
                .or_else(|| known_contract.type_name_value().map(str::to_string));
            let Some(value) = value else {
                continue;
            };
            let concrete = self.generate_concrete(&known_contract, repository)?;
            if let Some(reference) = concrete.reference {
                mapping.insert(value, reference);
            }
        }

        Ok(Some(Discriminator {
            property_name,
            mapping,
        }))
    }

    fn apply_filters(
        &self,
        schema: &mut Schema,
        contract: &DataContract,
        site: Site<'_>,
        repository: &mut SchemaRepository,
    ) -> AppResult<()> {
        for filter in &self.options.schema_filters {
            let mut context = SchemaFilterContext {
                type_id: contract.underlying_type,
                contract,
                member: site.member(),
                parameter: site.parameter(),
                repository: &mut *repository,
                generator: self,
            };
            filter.apply(schema, &mut context)?;
        }
        Ok(())
    }
}

fn create_primitive_schema(contract: &DataContract) -> Schema {
    match &contract.kind {
        DataContractKind::Primitive {
            data_type,
            format,
            enum_values,
        } => Schema {
            schema_type: Some((*data_type).into()),
            format: format.clone(),
            enum_values: enum_values.clone(),
            ..Schema::default()
        },
        _ => Schema::default(),
    }
}

fn apply_narrowing(mut schema: Schema, narrowing: Narrowing) -> Schema {
    schema.nullable |= narrowing.nullable;
    schema.read_only |= narrowing.read_only;
    schema.write_only |= narrowing.write_only;
    schema.deprecated |= narrowing.deprecated;
    if narrowing.default.is_some() {
        schema.default = narrowing.default;
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnumShape, ObjectShape, PrimitiveType, TypeDescriptor, TypeShape};
    use crate::contract::DataType;
    use crate::filters::SchemaFilter;
    use crate::resolver::{CatalogContractResolver, ResolverOptions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn generator(catalog: TypeCatalog, options: SchemaGeneratorOptions) -> SchemaGenerator {
        let catalog = Arc::new(catalog);
        let resolver = Arc::new(CatalogContractResolver::new(
            catalog.clone(),
            ResolverOptions::default(),
        ));
        SchemaGenerator::new(catalog, resolver, options)
    }

    fn json_of(schema: &Schema) -> Value {
        serde_json::to_value(schema).unwrap()
    }

    #[test]
    fn test_primitives_are_inline() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int64);
        let guid = catalog.primitive(PrimitiveType::Guid);
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();

        assert_eq!(
            json_of(&gen.generate_schema(int, &mut repo).unwrap()),
            json!({"type": "integer", "format": "int64"})
        );
        assert_eq!(
            json_of(&gen.generate_schema(guid, &mut repo).unwrap()),
            json!({"type": "string", "format": "uuid"})
        );
        assert!(repo.is_empty());
    }

    #[test]
    fn test_nullable_value_type() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int32);
        let nullable = catalog.nullable(int);
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let schema = gen
            .generate_schema(nullable, &mut SchemaRepository::new())
            .unwrap();
        assert_eq!(
            json_of(&schema),
            json!({"type": "integer", "format": "int32", "nullable": true})
        );
    }

    #[test]
    fn test_enums_are_referenced_unless_inlined() {
        let mut catalog = TypeCatalog::new();
        let color = catalog.add_enum("Paint", "Color", EnumShape::from_names(["Red", "Green"]));
        let nullable = catalog.nullable(color);
        let catalog = Arc::new(catalog);
        let resolver = Arc::new(CatalogContractResolver::new(
            catalog.clone(),
            ResolverOptions::default(),
        ));

        let referenced = SchemaGenerator::new(
            catalog.clone(),
            resolver.clone(),
            SchemaGeneratorOptions::default(),
        );
        let mut repo = SchemaRepository::new();
        let schema = referenced.generate_schema(color, &mut repo).unwrap();
        assert_eq!(schema.reference_id(), Some("Color"));
        assert_eq!(
            json_of(repo.definition("Color").unwrap()),
            json!({"type": "integer", "format": "int32", "enum": [0, 1]})
        );

        let wrapped = referenced.generate_schema(nullable, &mut repo).unwrap();
        assert_eq!(
            json_of(&wrapped),
            json!({"allOf": [{"$ref": "#/components/schemas/Color"}], "nullable": true})
        );

        let inline = SchemaGenerator::new(
            catalog,
            resolver,
            SchemaGeneratorOptions::default().with_inline_enums(),
        );
        let mut repo = SchemaRepository::new();
        let schema = inline.generate_schema(color, &mut repo).unwrap();
        assert_eq!(schema.enum_values, Some(vec![json!(0), json!(1)]));
        assert!(repo.is_empty());
    }

    struct TaggedStrings {
        string: TypeId,
        inner: CatalogContractResolver,
    }

    impl DataContractResolver for TaggedStrings {
        fn resolve(&self, ty: TypeId) -> AppResult<DataContract> {
            if ty == self.string {
                return Ok(DataContract::for_primitive(
                    ty,
                    DataType::String,
                    None,
                    Some(vec![json!("a"), json!("b")]),
                ));
            }
            self.inner.resolve(ty)
        }
    }

    #[test]
    fn test_enum_flag_comes_from_contract() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let catalog = Arc::new(catalog);
        let resolver = Arc::new(TaggedStrings {
            string,
            inner: CatalogContractResolver::new(catalog.clone(), ResolverOptions::default()),
        });
        let gen = SchemaGenerator::new(catalog, resolver, SchemaGeneratorOptions::default());

        let mut repo = SchemaRepository::new();
        let schema = gen.generate_schema(string, &mut repo).unwrap();
        assert!(schema.is_reference());
        let id = schema.reference_id().unwrap();
        assert_eq!(
            json_of(repo.definition(id).unwrap()),
            json!({"type": "string", "enum": ["a", "b"]})
        );
    }

    #[test]
    fn test_arrays_and_sets() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let list = catalog.list(string);
        let set = catalog.set(string);
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();

        assert_eq!(
            json_of(&gen.generate_schema(list, &mut repo).unwrap()),
            json!({"type": "array", "items": {"type": "string"}})
        );
        assert_eq!(
            json_of(&gen.generate_schema(set, &mut repo).unwrap()),
            json!({"type": "array", "items": {"type": "string"}, "uniqueItems": true})
        );
        assert!(repo.is_empty());
    }

    #[test]
    fn test_self_referential_array_is_referenced() {
        let mut catalog = TypeCatalog::new();
        let tree = catalog.declare_object("Demo", "Tree");
        catalog
            .define(
                tree,
                TypeShape::Sequence {
                    item: tree,
                    unique: false,
                    is_async: false,
                },
            )
            .unwrap();
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();

        let schema = gen.generate_schema(tree, &mut repo).unwrap();
        assert_eq!(schema.reference_id(), Some("Tree"));
        let body = repo.definition("Tree").unwrap();
        assert_eq!(
            body.items.as_ref().and_then(|items| items.reference_id()),
            Some("Tree")
        );
    }

    #[test]
    fn test_self_referential_dictionary_is_referenced() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let folder = catalog.declare_object("Demo", "Folder");
        catalog
            .define(
                folder,
                TypeShape::Map {
                    key: string,
                    value: folder,
                },
            )
            .unwrap();
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();

        let schema = gen.generate_schema(folder, &mut repo).unwrap();
        assert_eq!(schema.reference_id(), Some("Folder"));
        assert_eq!(
            json_of(repo.definition("Folder").unwrap()),
            json!({
                "type": "object",
                "additionalProperties": {"$ref": "#/components/schemas/Folder"}
            })
        );
    }

    #[test]
    fn test_dictionary_value_schema() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let double = catalog.primitive(PrimitiveType::Double);
        let map = catalog.dictionary(string, double);
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let schema = gen.generate_schema(map, &mut SchemaRepository::new()).unwrap();
        assert_eq!(
            json_of(&schema),
            json!({"type": "object", "additionalProperties": {"type": "number", "format": "double"}})
        );
    }

    #[test]
    fn test_object_flags_and_required() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int32);
        let string = catalog.primitive(PrimitiveType::String);
        let account = catalog.add_object(
            "Bank",
            "Account",
            ObjectShape::new()
                .with_member(MemberInfo::new("Id", int).read_only())
                .with_member(MemberInfo::new("Owner", string).required())
                .with_member(MemberInfo::new("Pin", string).write_only())
                .with_member(MemberInfo::new("Legacy", string).obsolete())
                .with_member(MemberInfo::new("Limit", int).with_default(json!(100))),
        );
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();
        gen.generate_schema(account, &mut repo).unwrap();

        assert_eq!(
            json_of(repo.definition("Account").unwrap()),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer", "format": "int32", "readOnly": true},
                    "owner": {"type": "string"},
                    "pin": {"type": "string", "writeOnly": true},
                    "legacy": {"type": "string", "deprecated": true},
                    "limit": {"type": "integer", "format": "int32", "default": 100}
                },
                "required": ["owner"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn test_ignore_obsolete_properties() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let doc = catalog.add_object(
            "Docs",
            "Page",
            ObjectShape::new()
                .with_member(MemberInfo::new("Title", string))
                .with_member(MemberInfo::new("Slug", string).obsolete()),
        );
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_ignore_obsolete_properties(),
        );
        let mut repo = SchemaRepository::new();
        gen.generate_schema(doc, &mut repo).unwrap();
        let keys: Vec<&String> = repo.definition("Page").unwrap().properties.keys().collect();
        assert_eq!(keys, vec!["title"]);
    }

    #[test]
    fn test_member_reference_wrapped_in_all_of() {
        let mut catalog = TypeCatalog::new();
        let node = catalog.declare_object("Demo", "Node");
        catalog
            .define_object(
                node,
                ObjectShape::new().with_member(MemberInfo::new("Next", node).nullable()),
            )
            .unwrap();
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_all_of_to_extend_reference_schemas(),
        );
        let mut repo = SchemaRepository::new();
        gen.generate_schema(node, &mut repo).unwrap();
        assert_eq!(
            json_of(&repo.definition("Node").unwrap().properties["next"]),
            json!({"allOf": [{"$ref": "#/components/schemas/Node"}], "nullable": true})
        );
    }

    #[test]
    fn test_extension_data_opens_object() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let bag = catalog.dictionary(string, string);
        let open = catalog.add_object(
            "Api",
            "Open",
            ObjectShape::new().with_member(MemberInfo::new("Extra", bag).extension_data()),
        );
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let mut repo = SchemaRepository::new();
        gen.generate_schema(open, &mut repo).unwrap();
        assert_eq!(
            json_of(repo.definition("Open").unwrap()),
            json!({"type": "object", "additionalProperties": {"type": "string"}})
        );
    }

    #[test]
    fn test_binary_and_generic_mapping() {
        let mut catalog = TypeCatalog::new();
        let file = catalog.binary();
        let user = catalog.declare_object("Shop", "User");
        let page = catalog.add(
            TypeDescriptor::new(Some("Shop"), "Page", TypeShape::Object(ObjectShape::new()))
                .with_generic_arguments(vec![user]),
        );
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default()
                .map_generic_type("Page", || Schema::primitive(SchemaType::String, Some("cursor"))),
        );
        let mut repo = SchemaRepository::new();
        assert_eq!(
            json_of(&gen.generate_schema(file, &mut repo).unwrap()),
            json!({"type": "string", "format": "binary"})
        );
        assert_eq!(
            json_of(&gen.generate_schema(page, &mut repo).unwrap()),
            json!({"type": "string", "format": "cursor"})
        );
        assert!(repo.is_empty());
    }

    #[test]
    fn test_parameter_default_and_nullability() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int32);
        let gen = generator(catalog, SchemaGeneratorOptions::default());
        let parameter = ParameterInfo::new("page", int)
            .with_default(json!(1))
            .nullable();
        let schema = gen
            .generate_schema_for_parameter(int, &mut SchemaRepository::new(), &parameter)
            .unwrap();
        assert_eq!(
            json_of(&schema),
            json!({"type": "integer", "format": "int32", "nullable": true, "default": 1})
        );
    }

    struct Tagging;

    impl SchemaFilter for Tagging {
        fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> AppResult<()> {
            let name = context.generator.catalog().display_name(context.type_id);
            let source = match (context.member, context.parameter) {
                (Some(member), _) => format!("member:{}", member.name),
                (_, Some(parameter)) => format!("parameter:{}", parameter.name),
                _ => "type".to_string(),
            };
            schema
                .extensions
                .insert("x-source".into(), json!(format!("{}@{}", name, source)));
            Ok(())
        }
    }

    #[test]
    fn test_filters_run_once_per_schema_instance() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int32);
        let ints = catalog.list(int);
        let bag = catalog.add_object(
            "Demo",
            "Bag",
            ObjectShape::new().with_member(MemberInfo::new("Counts", ints)),
        );
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_schema_filter(Tagging),
        );
        let mut repo = SchemaRepository::new();
        let reference = gen.generate_schema(bag, &mut repo).unwrap();
        assert!(reference.extensions.is_empty());

        let body = repo.definition("Bag").unwrap();
        assert_eq!(body.extensions["x-source"], json!("Bag@type"));
        let counts = &body.properties["counts"];
        assert_eq!(counts.extensions["x-source"], json!("List<Int32>@member:Counts"));
        assert_eq!(
            counts.items.as_ref().unwrap().extensions["x-source"],
            json!("Int32@type")
        );
    }

    #[test]
    fn test_filter_error_aborts_generation() {
        let mut catalog = TypeCatalog::new();
        let int = catalog.primitive(PrimitiveType::Int32);
        let item = catalog.add_object(
            "Demo",
            "Item",
            ObjectShape::new().with_member(MemberInfo::new("Id", int)),
        );
        fn failing(_: &mut Schema, _: &mut SchemaFilterContext<'_>) -> AppResult<()> {
            Err(AppError::Filter("rejected".into()))
        }
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_schema_filter(failing),
        );
        let mut repo = SchemaRepository::new();
        let err = gen.generate_schema(item, &mut repo).unwrap_err();
        assert!(matches!(err, AppError::Filter(_)));
        assert!(repo.is_empty());
    }

    fn shapes() -> (TypeCatalog, TypeId, TypeId, TypeId) {
        let mut catalog = TypeCatalog::new();
        let double = catalog.primitive(PrimitiveType::Double);
        let string = catalog.primitive(PrimitiveType::String);
        let shape = catalog.add_object(
            "Geo",
            "Shape",
            ObjectShape::new().with_member(MemberInfo::new("Name", string)),
        );
        let circle = catalog.add_object(
            "Geo",
            "Circle",
            ObjectShape::new()
                .with_base(shape)
                .with_member(MemberInfo::new("Radius", double)),
        );
        let square = catalog.add_object(
            "Geo",
            "Square",
            ObjectShape::new()
                .with_base(shape)
                .with_member(MemberInfo::new("Side", double)),
        );
        (catalog, shape, circle, square)
    }

    #[test]
    fn test_all_of_partitions_properties() {
        let (catalog, _, circle, _) = shapes();
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_all_of_for_inheritance(),
        );
        let mut repo = SchemaRepository::new();
        gen.generate_schema(circle, &mut repo).unwrap();

        let circle_body = repo.definition("Circle").unwrap();
        assert_eq!(circle_body.all_of.len(), 1);
        assert_eq!(circle_body.all_of[0].reference_id(), Some("Shape"));
        let keys: Vec<&String> = circle_body.properties.keys().collect();
        assert_eq!(keys, vec!["radius"]);

        let shape_body = repo.definition("Shape").unwrap();
        let keys: Vec<&String> = shape_body.properties.keys().collect();
        assert_eq!(keys, vec!["name"]);
        assert!(repo.definition("Square").is_some());
    }

    #[test]
    fn test_all_of_partition_matches_flattened_properties() {
        let (catalog, _, circle, _) = shapes();
        let catalog = Arc::new(catalog);
        let resolver = Arc::new(CatalogContractResolver::new(
            catalog.clone(),
            ResolverOptions::default(),
        ));

        let flat = SchemaGenerator::new(
            catalog.clone(),
            resolver.clone(),
            SchemaGeneratorOptions::default(),
        );
        let mut flat_repo = SchemaRepository::new();
        flat.generate_schema(circle, &mut flat_repo).unwrap();
        let flattened: Vec<String> = flat_repo
            .definition("Circle")
            .unwrap()
            .properties
            .keys()
            .cloned()
            .collect();

        let split = SchemaGenerator::new(
            catalog,
            resolver,
            SchemaGeneratorOptions::default().with_all_of_for_inheritance(),
        );
        let mut split_repo = SchemaRepository::new();
        split.generate_schema(circle, &mut split_repo).unwrap();
        let own = &split_repo.definition("Circle").unwrap().properties;
        let inherited = &split_repo.definition("Shape").unwrap().properties;

        assert!(own.keys().all(|key| !inherited.contains_key(key)));
        let mut union: Vec<String> = inherited.keys().chain(own.keys()).cloned().collect();
        union.sort();
        let mut expected = flattened.clone();
        expected.sort();
        assert_eq!(union, expected);
        assert_eq!(flattened, vec!["name".to_string(), "radius".to_string()]);
    }

    #[test]
    fn test_one_of_with_discriminator() {
        let (catalog, shape, _, _) = shapes();
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default()
                .with_one_of_for_polymorphism()
                .with_discriminator_name_selector(|_, _| Some("kind".to_string()))
                .with_discriminator_value_selector(|catalog, ty| {
                    Some(catalog.display_name(ty).to_lowercase())
                }),
        );
        let mut repo = SchemaRepository::new();
        let schema = gen.generate_schema(shape, &mut repo).unwrap();

        let ids: Vec<Option<&str>> = schema.one_of.iter().map(|s| s.reference_id()).collect();
        assert_eq!(ids, vec![Some("Shape"), Some("Circle"), Some("Square")]);
        let discriminator = schema.discriminator.as_ref().unwrap();
        assert_eq!(discriminator.property_name, "kind");
        assert_eq!(
            discriminator.mapping["circle"],
            "#/components/schemas/Circle"
        );

        for id in ["Shape", "Circle", "Square"] {
            let body = repo.definition(id).unwrap();
            assert!(body.required.contains("kind"), "{id} must require kind");
            assert_eq!(
                body.properties["kind"].schema_type,
                Some(SchemaType::String)
            );
            assert!(body.discriminator.is_none());
        }
    }

    #[test]
    fn test_abstract_base_is_not_a_union_member() {
        let mut catalog = TypeCatalog::new();
        let string = catalog.primitive(PrimitiveType::String);
        let pet = catalog.add_object(
            "Zoo",
            "Pet",
            ObjectShape::new()
                .abstract_type()
                .with_discriminator("$type")
                .with_member(MemberInfo::new("Name", string)),
        );
        let cat = catalog.add_object(
            "Zoo",
            "Cat",
            ObjectShape::new().with_base(pet).with_discriminator_value("cat"),
        );
        let dog = catalog.add_object("Zoo", "Dog", ObjectShape::new().with_base(pet));
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default()
                .with_one_of_for_polymorphism()
                .with_all_of_for_inheritance(),
        );
        let mut repo = SchemaRepository::new();
        let schema = gen.generate_schema(pet, &mut repo).unwrap();

        assert_eq!(schema.one_of.len(), 2);
        assert_eq!(gen.known_types(pet), Some(vec![cat, dog]));
        let discriminator = schema.discriminator.unwrap();
        assert_eq!(discriminator.property_name, "$type");
        assert_eq!(discriminator.mapping.len(), 1);

        let pet_body = repo.definition("Pet").unwrap();
        assert!(pet_body.required.contains("$type"));
        assert!(pet_body.discriminator.is_some());
        let dog_body = repo.definition("Dog").unwrap();
        assert!(dog_body.properties.is_empty());
        assert_eq!(dog_body.all_of[0].reference_id(), Some("Pet"));
    }

    #[test]
    fn test_middle_type_is_concrete_inside_parent_union() {
        let (mut catalog, shape, circle, _) = shapes();
        let ring = catalog.add_object("Geo", "Ring", ObjectShape::new().with_base(circle));
        let gen = generator(
            catalog,
            SchemaGeneratorOptions::default().with_one_of_for_polymorphism(),
        );
        let mut repo = SchemaRepository::new();

        let outer = gen.generate_schema(shape, &mut repo).unwrap();
        assert_eq!(outer.one_of[1].reference_id(), Some("Circle"));
        assert!(outer.one_of.iter().all(Schema::is_reference));

        let middle = gen.generate_schema(circle, &mut repo).unwrap();
        let ids: Vec<Option<&str>> = middle.one_of.iter().map(|s| s.reference_id()).collect();
        assert_eq!(ids, vec![Some("Circle"), Some("Ring")]);
        assert_eq!(gen.known_base_type(ring), Some(circle));
    }
}
