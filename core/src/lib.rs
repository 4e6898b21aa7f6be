#![deny(missing_docs)]

//! # OAS Reflect Core
//!
//! Generates OpenAPI 3.0 schemas and documents from reflected type metadata.
//!
//! The pipeline is:
//! 1. describe types in a [`TypeCatalog`] (directly or through a [`Manifest`]),
//! 2. classify them with a [`DataContractResolver`],
//! 3. turn them into [`Schema`] values with a [`SchemaGenerator`], which
//!    records named definitions in a [`SchemaRepository`],
//! 4. assemble operations and components into an [`OpenApiDocument`] with a
//!    [`DocumentGenerator`].

/// Shared error types.
pub mod error;

/// Reflected type metadata.
pub mod catalog;

/// Serializer-facing classification of types.
pub mod contract;

/// Default contract resolver over the type catalog.
pub mod resolver;

/// OpenAPI schema object model.
pub mod schema;

/// Named schema definitions of a generation pass.
pub mod repository;

/// Schema post-processing hooks.
pub mod filters;

/// Schema generator configuration.
pub mod options;

/// Type to schema translation.
pub mod generator;

/// OpenAPI document assembly.
pub mod document;

/// YAML/JSON API manifests.
pub mod manifest;

pub use catalog::{
    EnumMember, EnumShape, MemberInfo, ObjectShape, ParameterInfo, PrimitiveType, TypeCatalog,
    TypeDescriptor, TypeId, TypeShape,
};
pub use contract::{
    DataContract, DataContractKind, DataContractResolver, DataProperty, DataType,
};
pub use document::{
    ApiOperation, ApiParameter, ApiResponse, AsyncDocumentFilter, DocumentFilter,
    DocumentFilterContext, DocumentGenerator, DocumentGeneratorOptions, Info, OpenApiDocument,
    ParameterLocation,
};
pub use error::{AppError, AppResult};
pub use filters::{SchemaFilter, SchemaFilterContext};
pub use generator::SchemaGenerator;
pub use manifest::Manifest;
pub use options::SchemaGeneratorOptions;
pub use repository::SchemaRepository;
pub use resolver::{CatalogContractResolver, NamingPolicy, ResolverOptions};
pub use schema::{AdditionalProperties, Discriminator, Schema, SchemaType};
