#![deny(missing_docs)]

//! # Generator Options
//!
//! Immutable configuration handed to the [`SchemaGenerator`](crate::generator::SchemaGenerator)
//! at construction: strategy switches, selector closures, custom type mappings
//! and schema filters.

use crate::catalog::{TypeCatalog, TypeId, TypeShape};
use crate::filters::SchemaFilter;
use crate::schema::Schema;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Computes the schema id of a type.
pub type SchemaIdSelector = Arc<dyn Fn(&TypeCatalog, TypeId) -> String + Send + Sync>;

/// Lists the known subtypes of a type.
pub type SubTypesSelector = Arc<dyn Fn(&TypeCatalog, TypeId) -> Vec<TypeId> + Send + Sync>;

/// Picks a discriminator property name or value for a type.
pub type DiscriminatorSelector = Arc<dyn Fn(&TypeCatalog, TypeId) -> Option<String> + Send + Sync>;

/// Produces a hand-authored schema.
pub type SchemaFactory = Arc<dyn Fn() -> Schema + Send + Sync>;

/// Default schema id: the type name with generic argument ids as a prefix
/// (`Page<User>` becomes `UserPage`) and `[]` spelled `Array`.
pub fn default_schema_id(catalog: &TypeCatalog, ty: TypeId) -> String {
    let Ok(descriptor) = catalog.get(ty) else {
        return ty.to_string();
    };

    if let TypeShape::Sequence { item, .. } = descriptor.shape {
        if descriptor.name.ends_with("[]") {
            return format!("{}Array", default_schema_id(catalog, item));
        }
    }

    let name = descriptor.name.replace("[]", "Array");
    if !descriptor.is_generic() {
        return name;
    }

    let prefix: String = descriptor
        .generic_arguments
        .iter()
        .map(|arg| default_schema_id(catalog, *arg))
        .collect();
    format!("{}{}", prefix, name)
}

/// Default subtype lookup: direct subtypes declared in the same assembly, in
/// catalog order.
pub fn default_sub_types(catalog: &TypeCatalog, ty: TypeId) -> Vec<TypeId> {
    let Ok(descriptor) = catalog.get(ty) else {
        return Vec::new();
    };
    let assembly = descriptor.assembly.as_deref();
    catalog
        .iter()
        .filter(|(id, candidate)| {
            catalog.base_type(*id) == Some(ty) && candidate.assembly.as_deref() == assembly
        })
        .map(|(id, _)| id)
        .collect()
}

fn no_discriminator(_: &TypeCatalog, _: TypeId) -> Option<String> {
    None
}

/// Configuration of the schema generator.
#[derive(Clone)]
pub struct SchemaGeneratorOptions {
    /// Hand-authored schemas by exact type.
    pub custom_type_mappings: HashMap<TypeId, SchemaFactory>,
    /// Hand-authored schemas by generic definition name (`Page` covers every `Page<T>`).
    pub generic_type_mappings: HashMap<String, SchemaFactory>,
    /// Emit enums inline instead of as named definitions.
    pub use_inline_definitions_for_enums: bool,
    /// Subtypes reference their base through `allOf` and only carry own properties.
    pub use_all_of_for_inheritance: bool,
    /// Types with known subtypes are described as a `oneOf` union.
    pub use_one_of_for_polymorphism: bool,
    /// Member level annotations wrap references as `allOf: [$ref]`.
    pub use_all_of_to_extend_reference_schemas: bool,
    /// Skip members carrying an obsolete marker.
    pub ignore_obsolete_properties: bool,
    /// Schema id selector.
    pub schema_id_selector: SchemaIdSelector,
    /// Known subtype selector.
    pub sub_types_selector: SubTypesSelector,
    /// Discriminator property name selector. Falls back to the contract.
    pub discriminator_name_selector: DiscriminatorSelector,
    /// Discriminator value selector. Falls back to the contract.
    pub discriminator_value_selector: DiscriminatorSelector,
    /// Schema filters in registration order.
    pub schema_filters: Vec<Arc<dyn SchemaFilter>>,
}

impl Default for SchemaGeneratorOptions {
    fn default() -> Self {
        Self {
            custom_type_mappings: HashMap::new(),
            generic_type_mappings: HashMap::new(),
            use_inline_definitions_for_enums: false,
            use_all_of_for_inheritance: false,
            use_one_of_for_polymorphism: false,
            use_all_of_to_extend_reference_schemas: false,
            ignore_obsolete_properties: false,
            schema_id_selector: Arc::new(default_schema_id),
            sub_types_selector: Arc::new(default_sub_types),
            discriminator_name_selector: Arc::new(no_discriminator),
            discriminator_value_selector: Arc::new(no_discriminator),
            schema_filters: Vec::new(),
        }
    }
}

impl fmt::Debug for SchemaGeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaGeneratorOptions")
            .field("custom_type_mappings", &self.custom_type_mappings.len())
            .field("generic_type_mappings", &self.generic_type_mappings.len())
            .field(
                "use_inline_definitions_for_enums",
                &self.use_inline_definitions_for_enums,
            )
            .field("use_all_of_for_inheritance", &self.use_all_of_for_inheritance)
            .field("use_one_of_for_polymorphism", &self.use_one_of_for_polymorphism)
            .field(
                "use_all_of_to_extend_reference_schemas",
                &self.use_all_of_to_extend_reference_schemas,
            )
            .field("ignore_obsolete_properties", &self.ignore_obsolete_properties)
            .field("schema_filters", &self.schema_filters.len())
            .finish_non_exhaustive()
    }
}

impl SchemaGeneratorOptions {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a type to a hand-authored schema.
    pub fn map_type<F>(mut self, ty: TypeId, factory: F) -> Self
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        self.custom_type_mappings.insert(ty, Arc::new(factory));
        self
    }

    /// Maps every construction of a generic definition to a hand-authored schema.
    pub fn map_generic_type<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Schema + Send + Sync + 'static,
    {
        self.generic_type_mappings
            .insert(name.into(), Arc::new(factory));
        self
    }

    /// Emits enums inline.
    pub fn with_inline_enums(mut self) -> Self {
        self.use_inline_definitions_for_enums = true;
        self
    }

    /// Enables `allOf` inheritance.
    pub fn with_all_of_for_inheritance(mut self) -> Self {
        self.use_all_of_for_inheritance = true;
        self
    }

    /// Enables `oneOf` polymorphism.
    pub fn with_one_of_for_polymorphism(mut self) -> Self {
        self.use_one_of_for_polymorphism = true;
        self
    }

    /// Wraps annotated member references in `allOf`.
    pub fn with_all_of_to_extend_reference_schemas(mut self) -> Self {
        self.use_all_of_to_extend_reference_schemas = true;
        self
    }

    /// Skips obsolete members.
    pub fn with_ignore_obsolete_properties(mut self) -> Self {
        self.ignore_obsolete_properties = true;
        self
    }

    /// Replaces the schema id selector.
    pub fn with_schema_id_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&TypeCatalog, TypeId) -> String + Send + Sync + 'static,
    {
        self.schema_id_selector = Arc::new(selector);
        self
    }

    /// Replaces the subtype selector.
    pub fn with_sub_types_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&TypeCatalog, TypeId) -> Vec<TypeId> + Send + Sync + 'static,
    {
        self.sub_types_selector = Arc::new(selector);
        self
    }

    /// Replaces the discriminator name selector.
    pub fn with_discriminator_name_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&TypeCatalog, TypeId) -> Option<String> + Send + Sync + 'static,
    {
        self.discriminator_name_selector = Arc::new(selector);
        self
    }

    /// Replaces the discriminator value selector.
    pub fn with_discriminator_value_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&TypeCatalog, TypeId) -> Option<String> + Send + Sync + 'static,
    {
        self.discriminator_value_selector = Arc::new(selector);
        self
    }

    /// Appends a schema filter.
    pub fn with_schema_filter<F>(mut self, filter: F) -> Self
    where
        F: SchemaFilter + 'static,
    {
        self.schema_filters.push(Arc::new(filter));
        self
    }

    /// Custom mapping for the type, by exact type first, then by generic definition.
    pub fn custom_mapping(&self, catalog: &TypeCatalog, ty: TypeId) -> Option<&SchemaFactory> {
        if let Some(factory) = self.custom_type_mappings.get(&ty) {
            return Some(factory);
        }
        let descriptor = catalog.get(ty).ok()?;
        if !descriptor.is_generic() {
            return None;
        }
        self.generic_type_mappings.get(&descriptor.name)
    }
}
