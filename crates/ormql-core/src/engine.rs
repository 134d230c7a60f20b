//! The query engine facade.
//!
//! [`QueryEngine`] owns the schema, the configuration and every
//! process-wide cache, and exposes the compilers behind one handle that
//! field resolvers can share.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Schema;
use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::error::Error;
use crate::projection::{FieldProjectionInfo, Projection, ProjectionBuilder};
use crate::query::{
    ArgumentProcessor, Comparator, PathResolver, Predicate, PredicateCompiler, PropertyAccessor,
    SortCompiler, SortStrategy,
};
use crate::row_filter::{RowFilter, RowFilters};
use ormql_proto::{FilterExpression, OrderBy, QueryArguments};

/// Shared entry point for filter, ordering and projection compilation.
pub struct QueryEngine {
    schema: Arc<Schema>,
    config: EngineConfig,
    resolver: Arc<PathResolver>,
    predicates: PredicateCompiler,
    sorts: SortCompiler,
    projections: ProjectionBuilder,
    row_filters: RowFilters,
}

impl QueryEngine {
    /// Create an engine with the default configuration.
    pub fn new(schema: Schema) -> Result<Self, Error> {
        Self::with_config(schema, EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(schema: Schema, config: EngineConfig) -> Result<Self, Error> {
        if config.validate_schema {
            schema.validate()?;
        }

        let schema = Arc::new(schema);
        let resolver = Arc::new(PathResolver::new(Arc::clone(&schema)));
        let predicates = PredicateCompiler::new(Arc::clone(&resolver))
            .with_default_case(config.default_string_comparison);
        let sorts = SortCompiler::new(Arc::clone(&resolver));
        let mut projections = ProjectionBuilder::new(Arc::clone(&schema));
        if !config.projection {
            projections = projections.disabled();
        }
        let row_filters = RowFilters::new(Arc::clone(&schema));

        info!(
            entities = schema.entities.len(),
            interfaces = schema.interfaces.len(),
            "query engine ready"
        );

        Ok(Self {
            schema,
            config,
            resolver,
            predicates,
            sorts,
            projections,
            row_filters,
        })
    }

    /// The schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a property path.
    pub fn resolve(&self, entity_type: &str, path: &str) -> Result<Arc<PropertyAccessor>, Error> {
        self.resolver.resolve(entity_type, path)
    }

    /// Compile one filter expression.
    pub fn compile_filter(
        &self,
        entity_type: &str,
        expression: &FilterExpression,
    ) -> Result<Predicate, Error> {
        self.predicates.compile(entity_type, expression)
    }

    /// Compile a `where` list as an implicit group.
    pub fn compile_where(
        &self,
        entity_type: &str,
        expressions: &[FilterExpression],
    ) -> Result<Predicate, Error> {
        self.predicates.compile_all(entity_type, expressions)
    }

    /// Compile an `orderBy` list.
    pub fn compile_order(&self, entity_type: &str, order_by: &[OrderBy]) -> Result<Comparator, Error> {
        self.sorts.compile(entity_type, order_by)
    }

    /// Register a custom sort strategy for an entity type.
    pub fn register_sort_strategy(&self, entity_type: impl Into<String>, strategy: Arc<dyn SortStrategy>) {
        self.sorts.register(entity_type, strategy);
    }

    /// Register a row filter.
    pub fn register_row_filter(&self, filter: RowFilter) {
        self.row_filters.register(filter);
    }

    /// The row filter registry.
    pub fn row_filters(&self) -> &RowFilters {
        &self.row_filters
    }

    /// Build the request for a selection, extended with the paths the
    /// applicable row filters read.
    pub fn projection_info<'a, I>(&self, entity_type: &str, selected: I) -> Result<FieldProjectionInfo, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let requested = FieldProjectionInfo::from_selection(&self.schema, entity_type, selected)?;
        let required = self.row_filters.required_paths(entity_type);
        requested.merge_filter_fields(&self.schema, entity_type, required.iter().map(String::as_str))
    }

    /// Projection for a request, or `None` when the full entity must be
    /// loaded.
    pub fn project(&self, entity_type: &str, info: &FieldProjectionInfo) -> Option<Arc<Projection>> {
        self.projections.try_build(entity_type, info)
    }

    /// Apply list-field arguments, with row filters, to a source.
    pub fn query(
        &self,
        entity_type: &str,
        args: &QueryArguments,
        items: Vec<Entity>,
    ) -> Result<Vec<Entity>, Error> {
        ArgumentProcessor::new(&self.resolver, &self.predicates, &self.sorts)
            .with_row_filters(&self.row_filters)
            .apply(entity_type, args, items)
    }

    /// Apply arguments, then narrow each result to the selected paths when
    /// the shape can be projected. Unprojectable shapes return full
    /// entities.
    pub fn query_projected<'a, I>(
        &self,
        entity_type: &str,
        args: &QueryArguments,
        selected: I,
        items: Vec<Entity>,
    ) -> Result<Vec<Entity>, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let info = self.projection_info(entity_type, selected)?;
        let rows = self.query(entity_type, args, items)?;

        Ok(match self.project(entity_type, &info) {
            Some(projection) => rows.iter().map(|row| projection.apply(row)).collect(),
            None => rows,
        })
    }

    /// Drop every cached accessor and projection.
    pub fn clear_caches(&self) {
        self.resolver.clear();
        self.projections.clear();
        debug!("cleared query caches");
    }

    /// Number of cached accessors and projections.
    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.resolver.len(), self.projections.len())
    }
}
