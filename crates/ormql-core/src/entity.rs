//! Entity instances.
//!
//! An [`Entity`] is a materialized row of some catalog type: named scalar
//! values plus navigations to other entities.

use ormql_proto::Value;

/// The value stored under one field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Scalar value.
    Scalar(Value),
    /// Single-valued navigation, `None` when not set.
    Reference(Option<Box<Entity>>),
    /// Collection navigation.
    Collection(Vec<Entity>),
}

/// A materialized entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Name of the entity type in the catalog.
    pub entity_type: String,
    /// Field values in insertion order.
    pub fields: Vec<(String, FieldValue)>,
}

impl Entity {
    /// Create an empty entity of a type.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    /// Set a scalar field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, FieldValue::Scalar(value.into()));
        self
    }

    /// Set a reference navigation.
    pub fn with_reference(mut self, name: impl Into<String>, target: Option<Entity>) -> Self {
        self.set(name, FieldValue::Reference(target.map(Box::new)));
        self
    }

    /// Set a collection navigation.
    pub fn with_collection(mut self, name: impl Into<String>, items: Vec<Entity>) -> Self {
        self.set(name, FieldValue::Collection(items));
        self
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a scalar field by name.
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(FieldValue::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// Get the target of a reference navigation.
    pub fn reference(&self, name: &str) -> Option<&Entity> {
        match self.get(name) {
            Some(FieldValue::Reference(Some(target))) => Some(target),
            _ => None,
        }
    }

    /// Get the items of a collection navigation.
    pub fn collection(&self, name: &str) -> Option<&[Entity]> {
        match self.get(name) {
            Some(FieldValue::Collection(items)) => Some(items),
            _ => None,
        }
    }

    /// Names of the fields present on this instance.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}
