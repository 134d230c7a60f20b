//! Conversion of raw string operands into typed values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::catalog::{FieldType, ScalarType};
use crate::error::Error;
use ormql_proto::Value;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Convert an operand to the type of a property.
///
/// A null operand converts to [`Value::Null`] only when the property is
/// nullable.
pub fn convert_operand(raw: Option<&str>, field_type: &FieldType) -> Result<Value, Error> {
    let scalar = field_type.scalar_type().ok_or_else(|| Error::Conversion {
        value: raw.unwrap_or("null").to_string(),
        target: "navigation".to_string(),
    })?;

    match raw {
        None if field_type.is_nullable() => Ok(Value::Null),
        None => Err(Error::Conversion {
            value: "null".to_string(),
            target: scalar.name().to_string(),
        }),
        Some(raw) => parse_scalar(raw, scalar),
    }
}

/// Parse a non-null operand as a scalar type.
pub fn parse_scalar(raw: &str, scalar: ScalarType) -> Result<Value, Error> {
    if scalar == ScalarType::String {
        return Ok(Value::String(raw.to_string()));
    }

    let text = raw.trim();
    let parsed = match scalar {
        ScalarType::Bool => parse_bool(text).map(Value::Bool),
        ScalarType::Int8 => text.parse().ok().map(Value::Int8),
        ScalarType::Int16 => text.parse().ok().map(Value::Int16),
        ScalarType::Int32 => text.parse().ok().map(Value::Int32),
        ScalarType::Int64 => text.parse().ok().map(Value::Int64),
        ScalarType::UInt8 => text.parse().ok().map(Value::UInt8),
        ScalarType::UInt16 => text.parse().ok().map(Value::UInt16),
        ScalarType::UInt32 => text.parse().ok().map(Value::UInt32),
        ScalarType::UInt64 => text.parse().ok().map(Value::UInt64),
        ScalarType::Float32 => text.parse().ok().map(Value::Float32),
        ScalarType::Float64 => text.parse().ok().map(Value::Float64),
        ScalarType::Uuid => parse_uuid(text).map(Value::Uuid),
        ScalarType::DateTime => parse_datetime(text).map(Value::DateTime),
        ScalarType::DateTimeOffset => parse_datetime_offset(text).map(Value::DateTimeOffset),
        ScalarType::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(Value::Date),
        ScalarType::Time => parse_time(text).map(Value::Time),
        ScalarType::String => Some(Value::String(raw.to_string())),
    };

    parsed.ok_or_else(|| Error::Conversion {
        value: raw.to_string(),
        target: scalar.name().to_string(),
    })
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a GUID in hyphenated, braced or plain 32-digit hex form.
pub fn parse_uuid(text: &str) -> Option<[u8; 16]> {
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text);

    let digits: String = if inner.len() == 36 {
        let groups: Vec<&str> = inner.split('-').collect();
        let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        if lengths != [8, 4, 4, 4, 12] {
            return None;
        }
        groups.concat()
    } else {
        inner.to_string()
    };

    if digits.len() != 32 {
        return None;
    }

    let mut bytes = [0u8; 16];
    hex::decode_to_slice(&digits, &mut bytes).ok()?;
    Some(bytes)
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_datetime_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::<FixedOffset>::parse_from_rfc3339(text).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::<FixedOffset>::parse_from_str(text, fmt).ok())
    })
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}
