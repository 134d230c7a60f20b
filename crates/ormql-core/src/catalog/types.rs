//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};

/// Scalar data types a field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Boolean value.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// UUID (128-bit identifier).
    Uuid,
    /// Date and time without an offset.
    DateTime,
    /// Date and time with a UTC offset.
    DateTimeOffset,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
}

impl ScalarType {
    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    /// Check if this type is an integer of any width.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarType::Int8
                | ScalarType::Int16
                | ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::UInt8
                | ScalarType::UInt16
                | ScalarType::UInt32
                | ScalarType::UInt64
        )
    }

    /// Check if this type is string-like.
    pub fn is_string_like(&self) -> bool {
        matches!(self, ScalarType::String)
    }

    /// Type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
            ScalarType::Uuid => "uuid",
            ScalarType::DateTime => "datetime",
            ScalarType::DateTimeOffset => "datetimeoffset",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
        }
    }
}

/// Field types: scalars, nullable scalars and navigations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar value.
    Scalar(ScalarType),
    /// An optional scalar value (nullable).
    OptionalScalar(ScalarType),
    /// A single-valued navigation to another entity. Always nullable.
    Reference {
        /// Name of the target entity or interface.
        entity: String,
    },
    /// A collection navigation to another entity.
    Collection {
        /// Name of the target entity or interface.
        entity: String,
    },
}

impl FieldType {
    /// Create a scalar field type.
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldType::Scalar(scalar)
    }

    /// Create an optional scalar field type.
    pub fn optional_scalar(scalar: ScalarType) -> Self {
        FieldType::OptionalScalar(scalar)
    }

    /// Create a reference navigation type.
    pub fn reference(entity: impl Into<String>) -> Self {
        FieldType::Reference {
            entity: entity.into(),
        }
    }

    /// Create a collection navigation type.
    pub fn collection(entity: impl Into<String>) -> Self {
        FieldType::Collection {
            entity: entity.into(),
        }
    }

    /// Check if this type is nullable.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            FieldType::Scalar(ScalarType::String)
                | FieldType::OptionalScalar(_)
                | FieldType::Reference { .. }
        )
    }

    /// Check if this type is a navigation.
    pub fn is_navigation(&self) -> bool {
        matches!(self, FieldType::Reference { .. } | FieldType::Collection { .. })
    }

    /// Check if this type is a collection navigation.
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldType::Collection { .. })
    }

    /// Get the scalar type if this is a scalar-based type.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self {
            FieldType::Scalar(s) | FieldType::OptionalScalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Get the target entity name if this is a navigation.
    pub fn target_entity(&self) -> Option<&str> {
        match self {
            FieldType::Reference { entity } | FieldType::Collection { entity } => Some(entity),
            _ => None,
        }
    }
}
