//! Entity and interface definitions.

use super::field::FieldDef;
use serde::{Deserialize, Serialize};

/// An entity definition (the shape of one mapped type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within schema).
    pub name: String,
    /// Primary key field names, in declaration order.
    pub keys: Vec<String>,
    /// Foreign key field names.
    pub foreign_keys: Vec<String>,
    /// Field definitions, navigations included.
    pub fields: Vec<FieldDef>,
    /// Abstract types cannot be constructed by a projection.
    pub is_abstract: bool,
    /// Interfaces this entity implements directly.
    pub implements: Vec<String>,
}

impl EntityDef {
    /// Create a new entity definition with a single key.
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: vec![key.into()],
            foreign_keys: Vec::new(),
            fields: Vec::new(),
            is_abstract: false,
            implements: Vec::new(),
        }
    }

    /// Create an entity definition without a key.
    pub fn keyless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            foreign_keys: Vec::new(),
            fields: Vec::new(),
            is_abstract: false,
            implements: Vec::new(),
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a further key field (composite keys).
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Declare a foreign key field.
    pub fn with_foreign_key(mut self, field: impl Into<String>) -> Self {
        self.foreign_keys.push(field.into());
        self
    }

    /// Declare an implemented interface.
    pub fn implementing(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    /// Mark the entity as abstract.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Get a field declared directly on this entity.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First declared key, used for deterministic collection ordering.
    pub fn first_key(&self) -> Option<&str> {
        self.keys.first().map(|s| s.as_str())
    }

    /// Iterate navigation fields.
    pub fn navigations(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_navigation())
    }
}

/// An interface definition. Entities reach interface members by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDef {
    /// Interface name (unique within schema).
    pub name: String,
    /// Interfaces this interface inherits.
    pub extends: Vec<String>,
    /// Member definitions.
    pub fields: Vec<FieldDef>,
}

impl InterfaceDef {
    /// Create a new interface definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a member.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Inherit another interface.
    pub fn extending(mut self, interface: impl Into<String>) -> Self {
        self.extends.push(interface.into());
        self
    }

    /// Get a member declared directly on this interface.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
