//! Application of list-field arguments to an in-memory source.

use std::sync::Arc;

use tracing::debug;

use super::accessor::{PathResolver, PropertyAccessor};
use super::convert::convert_operand;
use super::filter::PredicateCompiler;
use super::sort::SortCompiler;
use crate::entity::Entity;
use crate::error::Error;
use crate::row_filter::RowFilters;
use ormql_proto::{Paging, QueryArguments, Value};

/// Applies `ids`, `where`, row filters, `orderBy` and paging, in that
/// order.
///
/// Everything is compiled before the first row is touched, so argument and
/// configuration errors surface even for an empty source.
pub struct ArgumentProcessor<'a> {
    resolver: &'a PathResolver,
    predicates: &'a PredicateCompiler,
    sorts: &'a SortCompiler,
    row_filters: Option<&'a RowFilters>,
}

impl<'a> ArgumentProcessor<'a> {
    /// Create a processor over the given compilers.
    pub fn new(
        resolver: &'a PathResolver,
        predicates: &'a PredicateCompiler,
        sorts: &'a SortCompiler,
    ) -> Self {
        Self {
            resolver,
            predicates,
            sorts,
            row_filters: None,
        }
    }

    /// Also enforce registered row filters.
    pub fn with_row_filters(mut self, row_filters: &'a RowFilters) -> Self {
        self.row_filters = Some(row_filters);
        self
    }

    /// Apply the arguments to a list of entities of `entity_type`.
    pub fn apply(
        &self,
        entity_type: &str,
        args: &QueryArguments,
        items: Vec<Entity>,
    ) -> Result<Vec<Entity>, Error> {
        let paging = args.paging()?;
        let ids = match &args.ids {
            Some(ids) => Some(self.compile_ids(entity_type, ids)?),
            None => None,
        };
        let predicate = self.predicates.compile_all(entity_type, &args.where_)?;
        let comparator = self.sorts.compile(entity_type, &args.order_by)?;

        let total = items.len();
        let mut rows = match ids {
            Some((accessor, ids)) => items
                .into_iter()
                .filter(|item| {
                    let key = accessor.read_ref(item);
                    ids.iter().any(|id| key.equals(id))
                })
                .collect(),
            None => items,
        };

        rows = predicate.retain(rows)?;
        if let Some(row_filters) = self.row_filters {
            rows = row_filters.retain(rows)?;
        }
        comparator.sort(&mut rows);

        if let Some(paging) = paging {
            apply_paging(&mut rows, paging);
        }

        debug!(
            entity = entity_type,
            input = total,
            output = rows.len(),
            "applied query arguments"
        );
        Ok(rows)
    }

    fn compile_ids(
        &self,
        entity_type: &str,
        ids: &[String],
    ) -> Result<(Arc<PropertyAccessor>, Vec<Value>), Error> {
        let schema = self.resolver.schema();
        let key = match schema.get_entity(entity_type) {
            Some(entity) => entity.first_key().ok_or_else(|| {
                Error::InvalidArgument(format!("ids given but {entity_type} has no key"))
            })?,
            None if schema.contains_type(entity_type) => {
                return Err(Error::InvalidArgument(format!(
                    "ids given but {entity_type} is an interface"
                )))
            }
            None => return Err(Error::UnknownEntity(entity_type.to_string())),
        };

        let accessor = self.resolver.resolve(entity_type, key)?;
        let values = ids
            .iter()
            .map(|id| convert_operand(Some(id.as_str()), &accessor.property_type))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok((accessor, values))
    }
}

/// Slice rows to the paging bounds.
pub fn apply_paging(rows: &mut Vec<Entity>, paging: Paging) {
    let (skip, take) = paging.bounds();

    if skip > 0 {
        if skip >= rows.len() {
            rows.clear();
            return;
        }
        rows.drain(0..skip);
    }

    if let Some(take) = take {
        rows.truncate(take);
    }
}
