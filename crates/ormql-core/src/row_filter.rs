//! Row-level filters.
//!
//! Row filters restrict which entities a query may return regardless of
//! its arguments. Each filter targets an entity type or an interface and
//! declares, as a [`Selection`], the fields it reads, so those fields can
//! be folded into the query projection.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::Schema;
use crate::entity::Entity;
use crate::error::Error;
use crate::projection::{extract_property_paths, Selection};
use crate::query::Predicate;

type RowTest = dyn Fn(&Entity) -> Result<bool, Error> + Send + Sync;

/// A filter applied to every row of a target type.
#[derive(Clone)]
pub struct RowFilter {
    /// Filter name, for diagnostics.
    pub name: String,
    /// Entity type or interface the filter applies to.
    pub target: String,
    /// What the filter reads from the row.
    pub selection: Selection,
    test: Arc<RowTest>,
}

impl RowFilter {
    /// Create a filter from a test closure.
    pub fn new<F>(
        name: impl Into<String>,
        target: impl Into<String>,
        selection: Selection,
        test: F,
    ) -> Self
    where
        F: Fn(&Entity) -> Result<bool, Error> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            target: target.into(),
            selection,
            test: Arc::new(test),
        }
    }

    /// Create a filter from a compiled predicate.
    pub fn from_predicate(name: impl Into<String>, selection: Selection, predicate: Predicate) -> Self {
        let target = predicate.entity_type().to_string();
        Self::new(name, target, selection, move |entity| predicate.evaluate(entity))
    }

    /// Evaluate the filter against one row.
    pub fn allows(&self, entity: &Entity) -> Result<bool, Error> {
        (self.test)(entity)
    }
}

impl fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilter")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Registry of row filters.
///
/// A filter registered on an interface applies to every entity type that
/// implements it, directly or through inherited interfaces. A row is
/// included only when every applicable filter allows it.
pub struct RowFilters {
    schema: Arc<Schema>,
    filters: RwLock<Vec<Arc<RowFilter>>>,
}

impl RowFilters {
    /// Create an empty registry.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            filters: RwLock::new(Vec::new()),
        }
    }

    /// Register a filter.
    pub fn register(&self, filter: RowFilter) {
        debug!(name = %filter.name, target = %filter.target, "registered row filter");
        self.filters.write().push(Arc::new(filter));
    }

    /// Filters that apply to an entity type.
    pub fn applicable(&self, entity_type: &str) -> Vec<Arc<RowFilter>> {
        self.filters
            .read()
            .iter()
            .filter(|f| f.target == entity_type || self.schema.implements(entity_type, &f.target))
            .cloned()
            .collect()
    }

    /// Every path the applicable filters read from an entity type.
    pub fn required_paths(&self, entity_type: &str) -> BTreeSet<String> {
        self.applicable(entity_type)
            .iter()
            .flat_map(|f| extract_property_paths(&f.selection, entity_type))
            .collect()
    }

    /// Whether every applicable filter allows the row.
    pub fn should_include(&self, entity: &Entity) -> Result<bool, Error> {
        allows_all(&self.applicable(&entity.entity_type), entity)
    }

    /// Keep the rows every applicable filter allows.
    ///
    /// Rows are checked against their own type, so a mixed list of
    /// implementations of an interface is handled per row. Applicable
    /// filters are resolved once per type, not once per row.
    pub fn retain(&self, items: Vec<Entity>) -> Result<Vec<Entity>, Error> {
        if self.is_empty() {
            return Ok(items);
        }

        let mut resolved: HashMap<String, Vec<Arc<RowFilter>>> = HashMap::new();
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if !resolved.contains_key(item.entity_type.as_str()) {
                resolved.insert(item.entity_type.clone(), self.applicable(&item.entity_type));
            }
            if allows_all(&resolved[item.entity_type.as_str()], &item)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    /// Check if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}

fn allows_all(filters: &[Arc<RowFilter>], entity: &Entity) -> Result<bool, Error> {
    for filter in filters {
        if !filter.allows(entity)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, InterfaceDef, ScalarType};
    use crate::projection::SelectExpr;
    use ormql_proto::Value;

    fn schema() -> Arc<Schema> {
        let tenant_owned = InterfaceDef::new("ITenantOwned")
            .with_field(FieldDef::scalar("TenantId", ScalarType::Int32));
        let soft_deleted = InterfaceDef::new("ISoftDeleted")
            .with_field(FieldDef::scalar("Deleted", ScalarType::Bool))
            .extending("ITenantOwned");

        let document = EntityDef::new("Document", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::reference("Folder", "Folder"))
            .implementing("ISoftDeleted");
        let folder = EntityDef::new("Folder", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("Public", ScalarType::Bool));

        Arc::new(
            Schema::new()
                .with_interface(tenant_owned)
                .with_interface(soft_deleted)
                .with_entity(document)
                .with_entity(folder),
        )
    }

    fn tenant_filter() -> RowFilter {
        RowFilter::new(
            "tenant",
            "ITenantOwned",
            Selection::new("e", SelectExpr::path("e", "TenantId")),
            |e| Ok(e.scalar("TenantId").and_then(Value::as_i64) == Some(1)),
        )
    }

    fn visible_filter() -> RowFilter {
        RowFilter::new(
            "visible",
            "Document",
            Selection::new(
                "e",
                SelectExpr::binary(
                    "&&",
                    SelectExpr::unary("!", SelectExpr::path("e", "Deleted")),
                    SelectExpr::path("e", "Folder.Public"),
                ),
            ),
            |e| {
                let deleted = e.scalar("Deleted").and_then(Value::as_bool).unwrap_or(false);
                let public = e
                    .reference("Folder")
                    .and_then(|f| f.scalar("Public"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Ok(!deleted && public)
            },
        )
    }

    fn document(id: i32, tenant: i32, deleted: bool, public: bool) -> Entity {
        Entity::new("Document")
            .with("Id", id)
            .with("TenantId", tenant)
            .with("Deleted", deleted)
            .with_reference(
                "Folder",
                Some(Entity::new("Folder").with("Id", 1).with("Public", public)),
            )
    }

    #[test]
    fn test_interface_filters_apply_to_implementors() {
        let filters = RowFilters::new(schema());
        filters.register(tenant_filter());
        filters.register(visible_filter());

        assert_eq!(filters.applicable("Document").len(), 2);
        assert!(filters.applicable("Folder").is_empty());
        assert_eq!(filters.len(), 2);
    }

    #[test]
    fn test_required_paths_are_merged() {
        let filters = RowFilters::new(schema());
        filters.register(tenant_filter());
        filters.register(visible_filter());

        let paths: Vec<_> = filters.required_paths("Document").into_iter().collect();
        assert_eq!(paths, vec!["Deleted", "Folder.Public", "TenantId"]);
        assert!(filters.required_paths("Folder").is_empty());
    }

    #[test]
    fn test_every_filter_must_pass() {
        let filters = RowFilters::new(schema());
        filters.register(tenant_filter());
        filters.register(visible_filter());

        assert!(filters.should_include(&document(1, 1, false, true)).unwrap());
        assert!(!filters.should_include(&document(2, 2, false, true)).unwrap());
        assert!(!filters.should_include(&document(3, 1, true, true)).unwrap());
        assert!(!filters.should_include(&document(4, 1, false, false)).unwrap());

        let kept = filters
            .retain(vec![document(1, 1, false, true), document(2, 2, false, true)])
            .unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_retain_resolves_per_type() {
        let filters = RowFilters::new(schema());
        filters.register(tenant_filter());
        filters.register(visible_filter());

        let folder = |id: i32| Entity::new("Folder").with("Id", id).with("Public", false);
        let rows = vec![
            document(1, 1, false, true),
            folder(10),
            document(2, 2, false, true),
            folder(11),
            document(3, 1, false, true),
        ];
        let expected: Vec<bool> = rows
            .iter()
            .map(|row| filters.should_include(row).unwrap())
            .collect();
        assert_eq!(expected, vec![true, true, false, true, true]);

        let kept: Vec<(String, i64)> = filters
            .retain(rows)
            .unwrap()
            .iter()
            .map(|row| {
                let id = row.scalar("Id").and_then(Value::as_i64).unwrap_or_default();
                (row.entity_type.clone(), id)
            })
            .collect();
        assert_eq!(
            kept,
            vec![
                ("Document".to_string(), 1),
                ("Folder".to_string(), 10),
                ("Folder".to_string(), 11),
                ("Document".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_empty_registry_includes_everything() {
        let filters = RowFilters::new(schema());
        assert!(filters.is_empty());
        assert!(filters.should_include(&document(1, 9, true, false)).unwrap());
    }

    #[test]
    fn test_filter_errors_propagate() {
        let filters = RowFilters::new(schema());
        filters.register(RowFilter::new(
            "broken",
            "Document",
            Selection::new("e", SelectExpr::param("e")),
            |_| Err(Error::InvalidArgument("boom".into())),
        ));

        assert!(filters.should_include(&document(1, 1, false, true)).is_err());
    }
}
