#![deny(missing_docs)]

//! # Schema Repository
//!
//! Memoizing store of named schema definitions for one document pass.
//!
//! Definitions live in an arena. A slot is reserved for a type *before* its
//! body is generated, so a recursive request for the same type while the
//! factory is still running receives a reference to the reserved slot instead
//! of re-entering generation.

use crate::catalog::{MemberInfo, TypeId};
use crate::error::{AppError, AppResult};
use crate::schema::Schema;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace, warn};

/// A reserved or completed definition.
#[derive(Debug, Clone)]
struct SchemaEntry {
    schema_id: String,
    type_id: TypeId,
    type_name: String,
    body: Option<Schema>,
}

/// Identity-keyed store of generated schema definitions.
///
/// Not shareable across concurrent passes; every mutation goes through
/// `&mut self`.
#[derive(Debug, Default, Clone)]
pub struct SchemaRepository {
    entries: Vec<SchemaEntry>,
    by_type: HashMap<TypeId, usize>,
    by_id: HashMap<String, usize>,
}

impl SchemaRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reference for `type_id`, generating its definition on first use.
    ///
    /// `type_name` is the full name of the type, used in collision errors.
    /// The factory receives the repository and may recurse into it, including
    /// for `type_id` itself. If it fails, the reservation and everything
    /// registered after it are discarded.
    pub fn get_or_add<F>(
        &mut self,
        type_id: TypeId,
        type_name: &str,
        schema_id: &str,
        factory: F,
    ) -> AppResult<Schema>
    where
        F: FnOnce(&mut SchemaRepository) -> AppResult<Schema>,
    {
        if let Some(reference) = self.lookup_by_type(type_id) {
            return Ok(reference);
        }

        let idx = self.reserve(type_id, type_name, schema_id)?;
        match factory(self) {
            Ok(body) => {
                debug!(schema_id, type_name, "stored schema definition");
                self.entries[idx].body = Some(body);
                Ok(Schema::reference_to(schema_id))
            }
            Err(e) => {
                debug!(schema_id, error = %e, "discarding schema reservation");
                self.rollback(idx);
                Err(e)
            }
        }
    }

    /// Registers a definition for a type that is not the natural entry point
    /// of the current generation (known subtypes, base types).
    ///
    /// Does nothing when the type is already registered.
    pub fn register_supplementary<F>(
        &mut self,
        type_id: TypeId,
        type_name: &str,
        schema_id: &str,
        factory: F,
    ) -> AppResult<()>
    where
        F: FnOnce(&mut SchemaRepository) -> AppResult<Schema>,
    {
        self.get_or_add(type_id, type_name, schema_id, factory)
            .map(|_| ())
    }

    fn reserve(&mut self, type_id: TypeId, type_name: &str, schema_id: &str) -> AppResult<usize> {
        if let Some(&idx) = self.by_id.get(schema_id) {
            let existing = &self.entries[idx];
            warn!(
                schema_id,
                existing = %existing.type_name,
                incoming = type_name,
                "schema id collision"
            );
            return Err(AppError::SchemaIdCollision {
                schema_id: schema_id.to_string(),
                existing: existing.type_name.clone(),
                incoming: type_name.to_string(),
            });
        }

        let idx = self.entries.len();
        trace!(schema_id, type_name, idx, "reserved schema id");
        self.entries.push(SchemaEntry {
            schema_id: schema_id.to_string(),
            type_id,
            type_name: type_name.to_string(),
            body: None,
        });
        self.by_type.insert(type_id, idx);
        self.by_id.insert(schema_id.to_string(), idx);
        Ok(idx)
    }

    fn rollback(&mut self, idx: usize) {
        for entry in self.entries.drain(idx..) {
            self.by_type.remove(&entry.type_id);
            self.by_id.remove(&entry.schema_id);
        }
    }

    /// Reference for an already registered (or reserved) type.
    pub fn lookup_by_type(&self, type_id: TypeId) -> Option<Schema> {
        self.by_type
            .get(&type_id)
            .map(|&idx| Schema::reference_to(&self.entries[idx].schema_id))
    }

    /// Reference for the member's type with the member's nullability and
    /// access narrowing applied as `$ref` siblings.
    pub fn lookup_by_member(&self, member: &MemberInfo) -> Option<Schema> {
        let mut schema = self.lookup_by_type(member.member_type)?;
        schema.nullable = member.is_nullable && !member.is_required;
        schema.read_only = member.is_read_only();
        schema.write_only = member.is_write_only();
        Some(schema)
    }

    /// Schema id registered for the type.
    pub fn schema_id_of(&self, type_id: TypeId) -> Option<&str> {
        self.by_type
            .get(&type_id)
            .map(|&idx| self.entries[idx].schema_id.as_str())
    }

    /// Completed definition for a schema id. `None` while still reserved.
    pub fn definition(&self, schema_id: &str) -> Option<&Schema> {
        self.by_id
            .get(schema_id)
            .and_then(|&idx| self.entries[idx].body.as_ref())
    }

    /// Mutable access to a completed definition.
    pub fn definition_mut(&mut self, schema_id: &str) -> Option<&mut Schema> {
        match self.by_id.get(schema_id) {
            Some(&idx) => self.entries[idx].body.as_mut(),
            None => None,
        }
    }

    /// Completed definitions keyed by schema id.
    pub fn schemas(&self) -> BTreeMap<String, Schema> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .body
                    .as_ref()
                    .map(|body| (entry.schema_id.clone(), body.clone()))
            })
            .collect()
    }

    /// Number of registered types, reservations included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ObjectShape, TypeCatalog};
    use crate::schema::SchemaType;

    fn two_types() -> (TypeCatalog, TypeId, TypeId) {
        let mut catalog = TypeCatalog::new();
        let a = catalog.add_object("Billing", "Foo", ObjectShape::new());
        let b = catalog.add_object("Shipping", "Foo", ObjectShape::new());
        (catalog, a, b)
    }

    #[test]
    fn test_factory_runs_once_per_type() {
        let (_, a, _) = two_types();
        let mut repo = SchemaRepository::new();
        let mut calls = 0;
        let first = repo
            .get_or_add(a, "Billing.Foo", "Foo", |_| {
                calls += 1;
                Ok(Schema::object())
            })
            .unwrap();
        let second = repo
            .get_or_add(a, "Billing.Foo", "Foo", |_| panic!("factory must not run twice"))
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(first, second);
        assert_eq!(first.reference_id(), Some("Foo"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_reentrant_request_returns_reservation() {
        let (_, a, _) = two_types();
        let mut repo = SchemaRepository::new();
        repo.get_or_add(a, "Billing.Foo", "Foo", |repo| {
            let inner = repo.get_or_add(a, "Billing.Foo", "Foo", |_| Ok(Schema::default()))?;
            assert_eq!(inner.reference_id(), Some("Foo"));
            assert!(repo.definition("Foo").is_none());
            let mut body = Schema::object();
            body.properties.insert("next".into(), inner);
            Ok(body)
        })
        .unwrap();
        let body = repo.definition("Foo").unwrap();
        assert_eq!(body.properties["next"].reference_id(), Some("Foo"));
    }

    #[test]
    fn test_collision_names_both_types() {
        let (_, a, b) = two_types();
        let mut repo = SchemaRepository::new();
        repo.get_or_add(a, "Billing.Foo", "Foo", |_| Ok(Schema::object()))
            .unwrap();
        let err = repo
            .get_or_add(b, "Shipping.Foo", "Foo", |_| Ok(Schema::object()))
            .unwrap_err();
        match err {
            AppError::SchemaIdCollision {
                existing, incoming, ..
            } => {
                assert_eq!(existing, "Billing.Foo");
                assert_eq!(incoming, "Shipping.Foo");
            }
            other => panic!("expected collision, got {other}"),
        }
    }

    #[test]
    fn test_failed_factory_rolls_back() {
        let (_, a, b) = two_types();
        let mut repo = SchemaRepository::new();
        let result = repo.get_or_add(a, "Billing.Foo", "Foo", |repo| {
            repo.register_supplementary(b, "Shipping.Foo", "ShippingFoo", |_| {
                Ok(Schema::object())
            })?;
            Err(AppError::Filter("boom".into()))
        });
        assert!(result.is_err());
        assert!(repo.is_empty());
        assert!(repo.lookup_by_type(a).is_none());
        assert!(repo.lookup_by_type(b).is_none());

        repo.get_or_add(b, "Shipping.Foo", "Foo", |_| Ok(Schema::object()))
            .unwrap();
        assert_eq!(repo.schema_id_of(b), Some("Foo"));
    }

    #[test]
    fn test_lookup_by_member_applies_narrowing() {
        let (_, a, _) = two_types();
        let mut repo = SchemaRepository::new();
        repo.get_or_add(a, "Billing.Foo", "Foo", |_| Ok(Schema::object()))
            .unwrap();
        let member = MemberInfo::new("Foo", a).nullable().read_only();
        let schema = repo.lookup_by_member(&member).unwrap();
        assert!(schema.nullable);
        assert!(schema.read_only);
        assert!(!schema.write_only);
    }

    #[test]
    fn test_schemas_are_sorted_and_mutable() {
        let (_, a, b) = two_types();
        let mut repo = SchemaRepository::new();
        repo.get_or_add(b, "Shipping.Foo", "ShippingFoo", |_| Ok(Schema::object()))
            .unwrap();
        repo.get_or_add(a, "Billing.Foo", "BillingFoo", |_| Ok(Schema::object()))
            .unwrap();
        repo.definition_mut("BillingFoo").unwrap().description = Some("invoice".into());

        let schemas = repo.schemas();
        let ids: Vec<&str> = schemas.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["BillingFoo", "ShippingFoo"]);
        assert_eq!(
            schemas["BillingFoo"].schema_type,
            Some(SchemaType::Object)
        );
        assert_eq!(schemas["BillingFoo"].description.as_deref(), Some("invoice"));
    }
}
