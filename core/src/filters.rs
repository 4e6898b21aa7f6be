#![deny(missing_docs)]

//! # Schema Filters
//!
//! Post-processing hooks run on freshly generated schemas, once per named
//! definition and once per inline schema instance.

use crate::catalog::{MemberInfo, ParameterInfo, TypeId};
use crate::contract::DataContract;
use crate::error::AppResult;
use crate::generator::SchemaGenerator;
use crate::repository::SchemaRepository;
use crate::schema::Schema;

/// What a filter can see while mutating a schema.
pub struct SchemaFilterContext<'a> {
    /// The described type (nullable wrappers removed).
    pub type_id: TypeId,
    /// Contract the schema was generated from.
    pub contract: &'a DataContract,
    /// Originating member, for property schemas.
    pub member: Option<&'a MemberInfo>,
    /// Originating parameter, for parameter schemas.
    pub parameter: Option<&'a ParameterInfo>,
    /// The repository of the current pass.
    pub repository: &'a mut SchemaRepository,
    /// The generator, for requesting schemas of other types.
    pub generator: &'a SchemaGenerator,
}

/// Mutates generated schemas in place.
///
/// Filters run in registration order. An error aborts the whole pass.
pub trait SchemaFilter: Send + Sync {
    /// Applies the filter.
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> AppResult<()>;
}

impl<F> SchemaFilter for F
where
    F: Fn(&mut Schema, &mut SchemaFilterContext<'_>) -> AppResult<()> + Send + Sync,
{
    fn apply(&self, schema: &mut Schema, context: &mut SchemaFilterContext<'_>) -> AppResult<()> {
        self(schema, context)
    }
}
