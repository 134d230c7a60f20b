//! Property path resolution.
//!
//! Turns a dotted path such as `"Parent.Name"` into a [`PropertyAccessor`]
//! for an entity type. Resolution consults the schema once; the accessor
//! then walks the resolved member chain without any further lookups.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::catalog::{FieldDef, FieldType, ScalarType, Schema};
use crate::entity::{Entity, FieldValue};
use crate::error::Error;
use ormql_proto::Value;

static NULL_VALUE: Value = Value::Null;

/// A resolved, reusable reader for one (entity type, path) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessor {
    /// Entity type the path was resolved against.
    pub entity_type: String,
    /// The dotted path.
    pub path: String,
    /// Type of the terminal member.
    pub property_type: FieldType,
    /// The terminal member definition.
    pub member: FieldDef,
    chain: Vec<String>,
}

impl PropertyAccessor {
    /// Scalar type of the terminal member, `None` for navigations.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.property_type.scalar_type()
    }

    /// Read the terminal field of an entity.
    ///
    /// Returns `None` when an intermediate reference is null or the field is
    /// absent from the instance.
    pub fn read_field<'a>(&self, entity: &'a Entity) -> Option<&'a FieldValue> {
        let (last, init) = self.chain.split_last()?;
        let mut current = entity;
        for segment in init {
            current = current.reference(segment)?;
        }
        current.get(last)
    }

    /// Read a scalar by reference. Null navigations and missing fields read
    /// as [`Value::Null`].
    pub fn read_ref<'a>(&self, entity: &'a Entity) -> &'a Value {
        match self.read_field(entity) {
            Some(FieldValue::Scalar(v)) => v,
            _ => &NULL_VALUE,
        }
    }

    /// Read a scalar value.
    pub fn read(&self, entity: &Entity) -> Value {
        self.read_ref(entity).clone()
    }
}

/// Resolves property paths against the schema and caches the accessors.
///
/// The cache is keyed by (entity type, literal path), grows append-only and
/// is shared by every concurrent caller.
pub struct PathResolver {
    schema: Arc<Schema>,
    cache: DashMap<(String, String), Arc<PropertyAccessor>>,
}

impl PathResolver {
    /// Create a resolver over a schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            cache: DashMap::new(),
        }
    }

    /// The schema paths are resolved against.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Resolve a path, building and caching the accessor on first use.
    pub fn resolve(&self, entity_type: &str, path: &str) -> Result<Arc<PropertyAccessor>, Error> {
        let key = (entity_type.to_string(), path.to_string());
        if let Some(hit) = self.cache.get(&key) {
            trace!(entity = entity_type, path, "accessor cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        let accessor = Arc::new(self.build(entity_type, path)?);
        debug!(
            entity = entity_type,
            path,
            property_type = ?accessor.property_type,
            "resolved property path"
        );

        // A racing resolver may have inserted first; both results are equal.
        let entry = self.cache.entry(key).or_insert(accessor);
        Ok(Arc::clone(entry.value()))
    }

    fn build(&self, entity_type: &str, path: &str) -> Result<PropertyAccessor, Error> {
        if !self.schema.contains_type(entity_type) {
            return Err(Error::UnknownEntity(entity_type.to_string()));
        }

        let fail = |segment: &str, reason: &str| Error::PathResolution {
            entity: entity_type.to_string(),
            path: path.to_string(),
            segment: segment.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(fail("", "empty path"));
        }

        let segments: Vec<&str> = path.split('.').collect();
        let mut current = entity_type.to_string();
        let mut member: Option<&FieldDef> = None;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(fail(segment, "empty segment"));
            }

            let field = self
                .schema
                .find_member(&current, segment)
                .ok_or_else(|| fail(segment, &format!("{current} has no member")))?;

            if i + 1 < segments.len() {
                match &field.field_type {
                    FieldType::Reference { entity } => current = entity.clone(),
                    FieldType::Collection { .. } => {
                        return Err(fail(segment, "collection navigation cannot be traversed"))
                    }
                    _ => return Err(fail(segment, "scalar member has no members")),
                }
            }
            member = Some(field);
        }

        let member = member.cloned().ok_or_else(|| fail(path, "empty path"))?;

        Ok(PropertyAccessor {
            entity_type: entity_type.to_string(),
            path: path.to_string(),
            property_type: member.field_type.clone(),
            member,
            chain: segments.into_iter().map(String::from).collect(),
        })
    }

    /// Number of cached accessors.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Drop every cached accessor.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
