//! Predicate compilation for `where` arguments.
//!
//! The [`PredicateCompiler`] turns a [`FilterExpression`] tree into a
//! [`Predicate`]: a reusable closure over [`Entity`] values. Paths are
//! resolved and operators checked once, at compile time. Operands of
//! non-string properties are converted lazily, on the first evaluation that
//! reaches the leaf.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use super::accessor::{PathResolver, PropertyAccessor};
use super::convert::convert_operand;
use crate::entity::Entity;
use crate::error::Error;
use ormql_proto::{Comparison, Connector, FilterExpression, StringComparison, Value};

type PredicateFn = dyn Fn(&Entity) -> Result<bool, Error> + Send + Sync;

/// A compiled filter over entities of one type.
#[derive(Clone)]
pub struct Predicate {
    entity_type: String,
    test: Arc<PredicateFn>,
}

impl Predicate {
    fn new<F>(entity_type: &str, test: F) -> Self
    where
        F: Fn(&Entity) -> Result<bool, Error> + Send + Sync + 'static,
    {
        Self {
            entity_type: entity_type.to_string(),
            test: Arc::new(test),
        }
    }

    /// A predicate that accepts every entity.
    pub fn always(entity_type: &str) -> Self {
        Self::new(entity_type, |_| Ok(true))
    }

    /// Entity type this predicate was compiled for.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Evaluate the predicate against one entity.
    pub fn evaluate(&self, entity: &Entity) -> Result<bool, Error> {
        (self.test)(entity)
    }

    /// Keep the entities that satisfy the predicate.
    ///
    /// The first evaluation error aborts the whole call.
    pub fn filter<'a, I>(&self, items: I) -> Result<Vec<&'a Entity>, Error>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut kept = Vec::new();
        for item in items {
            if self.evaluate(item)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Owned variant of [`filter`](Self::filter).
    pub fn retain(&self, items: Vec<Entity>) -> Result<Vec<Entity>, Error> {
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if self.evaluate(&item)? {
                kept.push(item);
            }
        }
        Ok(kept)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("entity_type", &self.entity_type)
            .finish_non_exhaustive()
    }
}

/// Compiles filter expressions into predicates.
pub struct PredicateCompiler {
    resolver: Arc<PathResolver>,
    default_case: StringComparison,
}

impl PredicateCompiler {
    /// Create a compiler using the default string comparison mode.
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self {
            resolver,
            default_case: StringComparison::default(),
        }
    }

    /// Set the mode used by string leaves that do not specify `case`.
    pub fn with_default_case(mut self, mode: StringComparison) -> Self {
        self.default_case = mode;
        self
    }

    /// Compile an expression tree for an entity type.
    pub fn compile(&self, entity_type: &str, expression: &FilterExpression) -> Result<Predicate, Error> {
        let predicate = self.compile_node(entity_type, expression)?;
        debug!(entity = entity_type, "compiled filter predicate");
        Ok(predicate)
    }

    /// Compile a top-level `where` list as an implicit group.
    pub fn compile_all(
        &self,
        entity_type: &str,
        expressions: &[FilterExpression],
    ) -> Result<Predicate, Error> {
        let predicate = self.compile_group(entity_type, expressions)?;
        debug!(
            entity = entity_type,
            expressions = expressions.len(),
            "compiled filter predicate"
        );
        Ok(predicate)
    }

    fn compile_node(&self, entity_type: &str, expression: &FilterExpression) -> Result<Predicate, Error> {
        match &expression.grouped_expressions {
            Some(children) => self.compile_group(entity_type, children),
            None => self.compile_leaf(entity_type, expression),
        }
    }

    fn compile_group(&self, entity_type: &str, children: &[FilterExpression]) -> Result<Predicate, Error> {
        let compiled = children
            .iter()
            .map(|child| Ok((self.compile_node(entity_type, child)?, child.connector)))
            .collect::<Result<Vec<_>, Error>>()?;

        if compiled.is_empty() {
            return Ok(Predicate::always(entity_type));
        }

        // Left fold: each child's connector joins it to the next sibling.
        Ok(Predicate::new(entity_type, move |entity| {
            let mut children = compiled.iter();
            let Some((first, connector)) = children.next() else {
                return Ok(true);
            };

            let mut acc = first.evaluate(entity)?;
            let mut connector = *connector;
            for (child, next) in children {
                acc = match (connector, acc) {
                    (Connector::And, false) => false,
                    (Connector::Or, true) => true,
                    _ => child.evaluate(entity)?,
                };
                connector = *next;
            }
            Ok(acc)
        }))
    }

    fn compile_leaf(&self, entity_type: &str, expression: &FilterExpression) -> Result<Predicate, Error> {
        let path = expression.path.as_str();
        let comparison = expression.comparison;
        let accessor = self.resolver.resolve(entity_type, path)?;

        let unsupported = |kind: &str| Error::UnsupportedComparison {
            path: path.to_string(),
            comparison,
            kind: kind.to_string(),
        };

        let scalar = accessor
            .scalar_type()
            .ok_or_else(|| unsupported("navigation"))?;

        let values = expression.values();
        check_value_count(path, comparison, values.len())?;

        let leaf = if scalar.is_string_like() {
            if comparison.is_ordering() {
                return Err(unsupported(scalar.name()));
            }
            let mode = expression.case.unwrap_or(self.default_case);
            Leaf::Text(TextLeaf::new(accessor, comparison, mode, values))
        } else {
            if comparison.is_string_only() {
                return Err(unsupported(scalar.name()));
            }
            Leaf::Typed(TypedLeaf {
                accessor,
                comparison,
                raw: values.to_vec(),
                operands: OnceLock::new(),
            })
        };

        let negate = expression.negate;
        Ok(Predicate::new(entity_type, move |entity| {
            leaf.evaluate(entity).map(|matched| matched != negate)
        }))
    }
}

fn check_value_count(path: &str, comparison: Comparison, count: usize) -> Result<(), Error> {
    let (ok, expected) = if comparison.is_set() {
        (count >= 1, "one or more")
    } else {
        (count == 1, "exactly one")
    };

    if ok {
        Ok(())
    } else {
        Err(Error::InvalidValueCount {
            path: path.to_string(),
            comparison,
            expected,
            count,
        })
    }
}

enum Leaf {
    Text(TextLeaf),
    Typed(TypedLeaf),
}

impl Leaf {
    fn evaluate(&self, entity: &Entity) -> Result<bool, Error> {
        match self {
            Leaf::Text(leaf) => Ok(leaf.evaluate(entity)),
            Leaf::Typed(leaf) => leaf.evaluate(entity),
        }
    }
}

/// Leaf over a string property. Operands are case-folded up front.
struct TextLeaf {
    accessor: Arc<PropertyAccessor>,
    comparison: Comparison,
    ignore_case: bool,
    operands: Vec<Option<String>>,
}

impl TextLeaf {
    fn new(
        accessor: Arc<PropertyAccessor>,
        comparison: Comparison,
        mode: StringComparison,
        values: &[Option<String>],
    ) -> Self {
        let ignore_case = mode.ignores_case();
        let operands = values
            .iter()
            .map(|v| v.as_deref().map(|s| fold(s, ignore_case).into_owned()))
            .collect();

        Self {
            accessor,
            comparison,
            ignore_case,
            operands,
        }
    }

    fn evaluate(&self, entity: &Entity) -> bool {
        let property = match self.accessor.read_ref(entity) {
            Value::String(s) => Some(fold(s, self.ignore_case)),
            _ => None,
        };
        let property = property.as_deref();

        let equals = |operand: &Option<String>| property == operand.as_deref();

        match self.comparison {
            Comparison::Equal => self.operands.first().is_some_and(equals),
            Comparison::NotEqual => !self.operands.first().is_some_and(equals),
            Comparison::In => self.operands.iter().any(equals),
            Comparison::NotIn => !self.operands.iter().any(equals),
            _ => {
                let (Some(value), Some(Some(operand))) = (property, self.operands.first()) else {
                    return false;
                };
                match self.comparison {
                    Comparison::StartsWith => value.starts_with(operand.as_str()),
                    Comparison::EndsWith => value.ends_with(operand.as_str()),
                    Comparison::Contains => value.contains(operand.as_str()),
                    Comparison::Like => like_match(value, operand),
                    _ => false,
                }
            }
        }
    }
}

fn fold(s: &str, ignore_case: bool) -> Cow<'_, str> {
    if ignore_case {
        Cow::Owned(s.to_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}

/// Leaf over a non-string scalar. Operands are converted on first use and
/// the outcome, success or failure, is kept.
struct TypedLeaf {
    accessor: Arc<PropertyAccessor>,
    comparison: Comparison,
    raw: Vec<Option<String>>,
    operands: OnceLock<Result<Vec<Value>, Error>>,
}

impl TypedLeaf {
    fn operands(&self) -> Result<&[Value], Error> {
        let converted = self.operands.get_or_init(|| {
            self.raw
                .iter()
                .map(|raw| convert_operand(raw.as_deref(), &self.accessor.property_type))
                .collect()
        });

        match converted {
            Ok(values) => Ok(values),
            Err(e) => Err(e.clone()),
        }
    }

    fn evaluate(&self, entity: &Entity) -> Result<bool, Error> {
        let operands = self.operands()?;
        let property = self.accessor.read_ref(entity);

        let ordering = |expected: fn(Ordering) -> bool| {
            operands
                .first()
                .and_then(|operand| property.compare(operand))
                .is_some_and(expected)
        };

        Ok(match self.comparison {
            Comparison::Equal => operands.first().is_some_and(|o| property.equals(o)),
            Comparison::NotEqual => !operands.first().is_some_and(|o| property.equals(o)),
            Comparison::In => operands.iter().any(|o| property.equals(o)),
            Comparison::NotIn => !operands.iter().any(|o| property.equals(o)),
            Comparison::GreaterThan => ordering(Ordering::is_gt),
            Comparison::GreaterThanOrEqual => ordering(Ordering::is_ge),
            Comparison::LessThan => ordering(Ordering::is_lt),
            Comparison::LessThanOrEqual => ordering(Ordering::is_le),
            Comparison::StartsWith | Comparison::EndsWith | Comparison::Contains | Comparison::Like => false,
        })
    }
}

/// Match a string against a SQL LIKE pattern.
///
/// Supports:
/// - `%` matches zero or more characters
/// - `_` matches exactly one character
/// - `\%`, `\_` and `\\` match the literal character; a trailing `\` is
///   itself literal
///
/// Runs in O(value × pattern) time whatever the pattern.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let tokens = like_tokens(pattern);

    let (mut v, mut t) = (0, 0);
    // Token index after the last `%` and the value index it is retried from.
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match tokens.get(t) {
            Some(LikeToken::Any) => {
                t += 1;
                backtrack = Some((t, v));
                continue;
            }
            Some(LikeToken::One) => {
                v += 1;
                t += 1;
                continue;
            }
            Some(LikeToken::Char(c)) if *c == value[v] => {
                v += 1;
                t += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((resume, from)) => {
                t = resume;
                v = from + 1;
                backtrack = Some((resume, v));
            }
            None => return false,
        }
    }

    tokens[t..].iter().all(|token| *token == LikeToken::Any)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Any,
    One,
    Char(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Char(chars.next().unwrap_or('\\')),
            c => LikeToken::Char(c),
        });
    }
    tokens
}
