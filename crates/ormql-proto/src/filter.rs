//! Filter expression model for `where` arguments.
//!
//! A [`FilterExpression`] is either a leaf comparison against a dotted
//! property path or a group of child expressions. Children of a group are
//! folded left to right, each child's [`Connector`] stating how it joins the
//! sibling that follows it.

use serde::{Deserialize, Serialize};

/// Comparison operator of a leaf expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    /// Property equals the operand.
    #[default]
    Equal,
    /// Property does not equal the operand.
    NotEqual,
    /// Property equals one of the operands.
    In,
    /// Property equals none of the operands.
    NotIn,
    /// Property is greater than the operand.
    GreaterThan,
    /// Property is greater than or equal to the operand.
    GreaterThanOrEqual,
    /// Property is less than the operand.
    LessThan,
    /// Property is less than or equal to the operand.
    LessThanOrEqual,
    /// String property starts with the operand.
    StartsWith,
    /// String property ends with the operand.
    EndsWith,
    /// String property contains the operand.
    Contains,
    /// String property matches a SQL LIKE pattern.
    Like,
}

impl Comparison {
    /// Whether this operator takes a list of operands.
    pub fn is_set(&self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }

    /// Whether this operator is an ordering comparison.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Comparison::GreaterThan
                | Comparison::GreaterThanOrEqual
                | Comparison::LessThan
                | Comparison::LessThanOrEqual
        )
    }

    /// Whether this operator only applies to string properties.
    pub fn is_string_only(&self) -> bool {
        matches!(
            self,
            Comparison::StartsWith | Comparison::EndsWith | Comparison::Contains | Comparison::Like
        )
    }
}

/// String comparison mode for string-typed targets.
///
/// Culture-sensitive modes behave like their ordinal counterparts; case is
/// folded with Unicode lowercasing for the `IgnoreCase` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringComparison {
    /// Exact byte-wise comparison.
    Ordinal,
    /// Case-insensitive comparison.
    OrdinalIgnoreCase,
    /// Culture-aware comparison.
    CurrentCulture,
    /// Culture-aware case-insensitive comparison.
    CurrentCultureIgnoreCase,
    /// Invariant-culture comparison.
    InvariantCulture,
    /// Invariant-culture case-insensitive comparison.
    InvariantCultureIgnoreCase,
}

impl StringComparison {
    /// Whether this mode ignores case.
    pub fn ignores_case(&self) -> bool {
        matches!(
            self,
            StringComparison::OrdinalIgnoreCase
                | StringComparison::CurrentCultureIgnoreCase
                | StringComparison::InvariantCultureIgnoreCase
        )
    }
}

impl Default for StringComparison {
    fn default() -> Self {
        StringComparison::OrdinalIgnoreCase
    }
}

/// How an expression combines with the sibling that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Connector {
    /// Both must hold.
    #[default]
    And,
    /// Either may hold.
    Or,
}

/// A node in a filter tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterExpression {
    /// Dotted property path into the target entity. Ignored on groups.
    pub path: String,
    /// Comparison operator. Ignored on groups.
    pub comparison: Comparison,
    /// String comparison mode, only meaningful for string targets.
    pub case: Option<StringComparison>,
    /// Raw operands. Entries may be null.
    pub value: Option<Vec<Option<String>>>,
    /// Inverts the result of this leaf only.
    pub negate: bool,
    /// How this node joins the next sibling.
    pub connector: Connector,
    /// Child expressions. When present this node is a group.
    pub grouped_expressions: Option<Vec<FilterExpression>>,
}

impl FilterExpression {
    /// Create a leaf expression.
    pub fn leaf<I, S>(path: impl Into<String>, comparison: Comparison, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            comparison,
            value: Some(values.into_iter().map(|v| Some(v.into())).collect()),
            ..Default::default()
        }
    }

    /// Create a group of child expressions.
    pub fn group(children: Vec<FilterExpression>) -> Self {
        Self {
            grouped_expressions: Some(children),
            ..Default::default()
        }
    }

    /// Create an equality filter.
    pub fn eq(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::Equal, [value])
    }

    /// Create a not-equal filter.
    pub fn ne(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::NotEqual, [value])
    }

    /// Create a greater-than filter.
    pub fn gt(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::GreaterThan, [value])
    }

    /// Create a greater-than-or-equal filter.
    pub fn ge(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::GreaterThanOrEqual, [value])
    }

    /// Create a less-than filter.
    pub fn lt(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::LessThan, [value])
    }

    /// Create a less-than-or-equal filter.
    pub fn le(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::leaf(path, Comparison::LessThanOrEqual, [value])
    }

    /// Create an IN filter.
    pub fn in_values<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::leaf(path, Comparison::In, values)
    }

    /// Create a NOT IN filter.
    pub fn not_in_values<I, S>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::leaf(path, Comparison::NotIn, values)
    }

    /// Create a filter matching a null property.
    pub fn is_null(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            comparison: Comparison::Equal,
            value: Some(vec![None]),
            ..Default::default()
        }
    }

    /// Set the string comparison mode.
    pub fn with_case(mut self, case: StringComparison) -> Self {
        self.case = Some(case);
        self
    }

    /// Set the connector to the next sibling.
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    /// Join the next sibling with OR.
    pub fn or(self) -> Self {
        self.with_connector(Connector::Or)
    }

    /// Invert the result of this leaf.
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    /// Whether this node is a group.
    pub fn is_group(&self) -> bool {
        self.grouped_expressions.is_some()
    }

    /// Raw operands, empty when none were supplied.
    pub fn values(&self) -> &[Option<String>] {
        self.value.as_deref().unwrap_or(&[])
    }
}
