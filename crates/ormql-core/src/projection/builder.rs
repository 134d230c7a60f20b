//! Projection building and caching.
//!
//! A [`Projection`] copies only the requested members of an entity graph:
//! keys and foreign keys always, requested scalars, and requested
//! navigations projected the same way. Shapes that cannot be safely
//! constructed yield `None`; callers then load the full entity.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use super::info::FieldProjectionInfo;
use crate::catalog::Schema;
use crate::entity::{Entity, FieldValue};
use ormql_proto::Value;

/// A compiled projection for one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    entity_type: String,
    members: Vec<String>,
    navigations: Vec<NavigationProjection>,
}

#[derive(Debug, Clone, PartialEq)]
struct NavigationProjection {
    name: String,
    kind: NavigationKind,
    projection: Projection,
}

#[derive(Debug, Clone, PartialEq)]
enum NavigationKind {
    Reference,
    /// Collection ordered by the target's first key.
    Collection { order_key: String },
}

impl Projection {
    /// Entity type this projection constructs.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Scalar members copied by this projection, keys first.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Names of the projected navigations.
    pub fn navigation_names(&self) -> impl Iterator<Item = &str> {
        self.navigations.iter().map(|n| n.name.as_str())
    }

    /// Construct the projected copy of an entity.
    pub fn apply(&self, source: &Entity) -> Entity {
        let mut projected = Entity::new(source.entity_type.clone());

        for member in &self.members {
            if let Some(value) = source.get(member) {
                projected.set(member.clone(), value.clone());
            }
        }

        for navigation in &self.navigations {
            let value = match &navigation.kind {
                NavigationKind::Reference => FieldValue::Reference(
                    source
                        .reference(&navigation.name)
                        .map(|target| Box::new(navigation.projection.apply(target))),
                ),
                NavigationKind::Collection { order_key } => {
                    let mut items: Vec<&Entity> = source
                        .collection(&navigation.name)
                        .map(|items| items.iter().collect())
                        .unwrap_or_default();
                    items.sort_by(|a, b| {
                        let key = |e: &Entity| e.scalar(order_key).cloned().unwrap_or(Value::Null);
                        key(a).sort_cmp(&key(b))
                    });
                    FieldValue::Collection(
                        items
                            .into_iter()
                            .map(|item| navigation.projection.apply(item))
                            .collect(),
                    )
                }
            };
            projected.set(navigation.name.clone(), value);
        }

        projected
    }
}

/// Why a shape cannot be projected.
struct Fallback(String);

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds projections and caches them by shape.
///
/// The cache maps a structural key (entity type plus the canonical
/// rendering of the request) to the outcome, fallbacks included.
pub struct ProjectionBuilder {
    schema: Arc<Schema>,
    enabled: bool,
    cache: DashMap<String, Option<Arc<Projection>>>,
}

impl ProjectionBuilder {
    /// Create a builder over a schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            enabled: true,
            cache: DashMap::new(),
        }
    }

    /// Disable projection; every request falls back.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Build, or fetch from the cache, the projection for a request.
    ///
    /// `None` means the shape cannot be projected and the full entity
    /// should be loaded instead.
    pub fn try_build(&self, entity_type: &str, info: &FieldProjectionInfo) -> Option<Arc<Projection>> {
        if !self.enabled {
            trace!(entity = entity_type, "projection disabled");
            return None;
        }

        let key = format!("{}#{}|{}", entity_type.len(), entity_type, info.canonical());
        if let Some(hit) = self.cache.get(&key) {
            trace!(entity = entity_type, "projection cache hit");
            return hit.value().clone();
        }

        let outcome = match self.build(entity_type, info) {
            Ok(projection) => {
                debug!(
                    entity = entity_type,
                    members = projection.members.len(),
                    navigations = projection.navigations.len(),
                    "built projection"
                );
                Some(Arc::new(projection))
            }
            Err(reason) => {
                warn!(entity = entity_type, reason = %reason, "projection fallback");
                None
            }
        };

        self.cache.entry(key).or_insert(outcome).value().clone()
    }

    fn build(&self, entity_type: &str, info: &FieldProjectionInfo) -> Result<Projection, Fallback> {
        let entity = self
            .schema
            .get_entity(entity_type)
            .ok_or_else(|| Fallback(format!("{entity_type} is not a concrete entity")))?;
        if entity.is_abstract {
            return Err(Fallback(format!("{entity_type} is abstract")));
        }

        // Keys and foreign keys come from the catalog, not the request.
        let mut members: Vec<String> = Vec::new();
        let requested = entity
            .keys
            .iter()
            .chain(&entity.foreign_keys)
            .chain(&info.key_names)
            .chain(&info.foreign_key_names)
            .chain(&info.scalar_fields);
        for name in requested {
            if members.contains(name) {
                continue;
            }
            let field = self
                .schema
                .find_member(entity_type, name)
                .ok_or_else(|| Fallback(format!("{entity_type}.{name} is unknown")))?;
            if field.is_navigation() {
                return Err(Fallback(format!("{entity_type}.{name} is a navigation")));
            }
            if !field.writable {
                return Err(Fallback(format!("{entity_type}.{name} is read-only")));
            }
            members.push(name.clone());
        }

        let mut navigations = Vec::with_capacity(info.navigations.len());
        for (name, navigation) in &info.navigations {
            let target = self
                .schema
                .get_entity(&navigation.entity_type)
                .ok_or_else(|| Fallback(format!("{entity_type}.{name} targets an interface")))?;

            let kind = if navigation.is_collection {
                let order_key = target
                    .first_key()
                    .ok_or_else(|| Fallback(format!("{} has no key to order by", target.name)))?;
                NavigationKind::Collection {
                    order_key: order_key.to_string(),
                }
            } else {
                NavigationKind::Reference
            };

            navigations.push(NavigationProjection {
                name: name.clone(),
                kind,
                projection: self.build(&navigation.entity_type, &navigation.projection)?,
            });
        }

        Ok(Projection {
            entity_type: entity_type.to_string(),
            members,
            navigations,
        })
    }

    /// Number of cached shapes, fallbacks included.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached projection.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, InterfaceDef, ScalarType};
    use crate::projection::NavigationProjectionInfo;

    fn schema() -> Arc<Schema> {
        let parent = EntityDef::new("Parent", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("Name", ScalarType::String))
            .with_field(FieldDef::scalar("Computed", ScalarType::String).read_only())
            .with_field(FieldDef::collection("Children", "Child"))
            .with_field(FieldDef::collection("Tags", "Tag"))
            .with_field(FieldDef::reference("Owner", "IOwner"));
        let child = EntityDef::new("Child", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("ParentId", ScalarType::Int32))
            .with_field(FieldDef::scalar("Label", ScalarType::String))
            .with_field(FieldDef::reference("Parent", "Parent"))
            .with_foreign_key("ParentId");
        let tag = EntityDef::keyless("Tag").with_field(FieldDef::scalar("Text", ScalarType::String));
        let shape = EntityDef::new("Shape", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .abstract_type();

        Arc::new(
            Schema::new()
                .with_interface(InterfaceDef::new("IOwner"))
                .with_entity(parent)
                .with_entity(child)
                .with_entity(tag)
                .with_entity(shape),
        )
    }

    fn info(schema: &Schema, entity_type: &str, paths: &[&str]) -> FieldProjectionInfo {
        FieldProjectionInfo::from_selection(schema, entity_type, paths.iter().copied()).unwrap()
    }

    fn child(id: i32, label: &str) -> Entity {
        Entity::new("Child")
            .with("Id", id)
            .with("ParentId", 1)
            .with("Label", label)
    }

    #[test]
    fn test_keys_are_always_projected() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));

        let projection = builder.try_build("Child", &info(&schema, "Child", &[])).unwrap();
        assert_eq!(projection.members(), &["Id".to_string(), "ParentId".to_string()]);

        let projected = projection.apply(&child(7, "x"));
        assert_eq!(projected.scalar("Id"), Some(&Value::Int32(7)));
        assert!(projected.scalar("Label").is_none());
    }

    #[test]
    fn test_keys_projected_without_request_metadata() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));

        let mut bare = FieldProjectionInfo::default();
        bare.scalar_fields.insert("Label".to_string());
        let parent_nav = NavigationProjectionInfo {
            entity_type: "Parent".to_string(),
            is_collection: false,
            projection: FieldProjectionInfo::default(),
        };
        bare.navigations.insert("Parent".to_string(), parent_nav);

        let projection = builder.try_build("Child", &bare).unwrap();
        assert_eq!(
            projection.members(),
            &["Id".to_string(), "ParentId".to_string(), "Label".to_string()]
        );
        assert_eq!(projection.navigation_names().collect::<Vec<_>>(), vec!["Parent"]);

        let parent = Entity::new("Parent").with("Id", 9).with("Name", "p");
        let projected = projection.apply(&child(1, "a").with_reference("Parent", Some(parent)));
        let projected_parent = projected.reference("Parent").unwrap();
        assert_eq!(projected_parent.scalar("Id"), Some(&Value::Int32(9)));
        assert!(projected_parent.scalar("Name").is_none());
    }

    #[test]
    fn test_reference_navigation_preserves_null() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));
        let projection = builder
            .try_build("Child", &info(&schema, "Child", &["Label", "Parent.Name"]))
            .unwrap();

        let parent = Entity::new("Parent")
            .with("Id", 1)
            .with("Name", "p")
            .with("Computed", "skip");
        let with_parent = child(1, "a").with_reference("Parent", Some(parent));
        let projected = projection.apply(&with_parent);
        let projected_parent = projected.reference("Parent").unwrap();
        assert_eq!(projected_parent.scalar("Name"), Some(&Value::from("p")));
        assert!(projected_parent.scalar("Computed").is_none());

        let orphan = child(2, "b").with_reference("Parent", None);
        assert_eq!(
            projection.apply(&orphan).get("Parent"),
            Some(&FieldValue::Reference(None))
        );
    }

    #[test]
    fn test_collections_are_ordered_by_first_key() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));
        let projection = builder
            .try_build("Parent", &info(&schema, "Parent", &["Children.Label"]))
            .unwrap();

        let parent = Entity::new("Parent").with("Id", 1).with_collection(
            "Children",
            vec![child(3, "c"), child(1, "a"), child(2, "b")],
        );
        let projected = projection.apply(&parent);
        let ids: Vec<_> = projected
            .collection("Children")
            .unwrap()
            .iter()
            .filter_map(|c| c.scalar("Id").and_then(Value::as_i64))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_fallbacks() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));

        // Abstract root, read-only scalar, unknown member.
        assert!(builder.try_build("Shape", &info(&schema, "Shape", &[])).is_none());
        assert!(builder
            .try_build("Parent", &info(&schema, "Parent", &["Computed"]))
            .is_none());
        assert!(builder
            .try_build("Parent", &info(&schema, "Parent", &["Bogus"]))
            .is_none());

        // Interface navigation target, keyless collection target.
        assert!(builder
            .try_build("Parent", &info(&schema, "Parent", &["Owner"]))
            .is_none());
        assert!(builder
            .try_build("Parent", &info(&schema, "Parent", &["Tags.Text"]))
            .is_none());

        // A fallback deep in the tree fails the whole shape.
        assert!(builder
            .try_build("Child", &info(&schema, "Child", &["Parent.Computed"]))
            .is_none());
    }

    #[test]
    fn test_cache_returns_same_projection() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));

        let first = builder
            .try_build("Child", &info(&schema, "Child", &["Label", "Parent.Name"]))
            .unwrap();
        let second = builder
            .try_build("Child", &info(&schema, "Child", &["Parent.Name", "Label"]))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = builder
            .try_build("Child", &info(&schema, "Child", &["Label"]))
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));

        // Fallbacks are cached too.
        let _ = builder.try_build("Shape", &info(&schema, "Shape", &[]));
        let _ = builder.try_build("Shape", &info(&schema, "Shape", &[]));
        assert_eq!(builder.len(), 3);

        builder.clear();
        assert!(builder.is_empty());
    }

    #[test]
    fn test_separator_in_name_is_a_distinct_shape() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema));

        assert!(builder
            .try_build("Child", &info(&schema, "Child", &["Id,Label"]))
            .is_none());
        let split = builder
            .try_build("Child", &info(&schema, "Child", &["Id", "Label"]))
            .unwrap();
        assert!(split.members().contains(&"Label".to_string()));
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_disabled_builder_falls_back() {
        let schema = schema();
        let builder = ProjectionBuilder::new(Arc::clone(&schema)).disabled();

        assert!(builder.try_build("Child", &info(&schema, "Child", &[])).is_none());
        assert!(builder.is_empty());
    }
}
