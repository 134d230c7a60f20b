//! Field definitions for entities and interfaces.

use super::types::{FieldType, ScalarType};
use serde::{Deserialize, Serialize};

/// Member visibility. Path resolution reaches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Exposed member.
    #[default]
    Public,
    /// Internal member, still reachable by path.
    NonPublic,
}

/// A field definition within an entity or interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
    /// Member visibility.
    pub visibility: Visibility,
    /// Whether the field can be assigned when constructing a projection.
    pub writable: bool,
}

impl FieldDef {
    /// Create a new public, writable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            visibility: Visibility::Public,
            writable: true,
        }
    }

    /// Create a required scalar field.
    pub fn scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::Scalar(scalar))
    }

    /// Create an optional scalar field.
    pub fn optional_scalar(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self::new(name, FieldType::OptionalScalar(scalar))
    }

    /// Create a reference navigation.
    pub fn reference(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, FieldType::reference(entity))
    }

    /// Create a collection navigation.
    pub fn collection(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, FieldType::collection(entity))
    }

    /// Mark as non-public.
    pub fn non_public(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }

    /// Mark as read-only (computed or getter-only).
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Check if this field is a navigation.
    pub fn is_navigation(&self) -> bool {
        self.field_type.is_navigation()
    }
}
