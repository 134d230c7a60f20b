//! Sort compilation for `orderBy` arguments.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::accessor::{PathResolver, PropertyAccessor};
use crate::entity::Entity;
use crate::error::Error;
use ormql_proto::OrderBy;

/// Custom ordering for paths that are not plain property reads.
///
/// A strategy is registered per entity type and claims the paths it
/// handles; claimed paths bypass property resolution entirely.
pub trait SortStrategy: Send + Sync {
    /// Whether this strategy orders by `path`.
    fn claims(&self, path: &str) -> bool;

    /// Ascending ordering of two entities for a claimed path.
    fn compare(&self, path: &str, a: &Entity, b: &Entity) -> Ordering;
}

enum KeySource {
    Property(Arc<PropertyAccessor>),
    Custom(Arc<dyn SortStrategy>),
}

struct SortKey {
    path: String,
    source: KeySource,
    descending: bool,
}

impl SortKey {
    fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ordering = match &self.source {
            KeySource::Property(accessor) => accessor.read_ref(a).sort_cmp(accessor.read_ref(b)),
            KeySource::Custom(strategy) => strategy.compare(&self.path, a, b),
        };

        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// A compiled multi-key ordering.
#[derive(Clone)]
pub struct Comparator {
    keys: Arc<[SortKey]>,
}

impl Comparator {
    /// Compare two entities key by key; ties fall through to the next key.
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        for key in self.keys.iter() {
            let ordering = key.compare(a, b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort in place.
    pub fn sort(&self, items: &mut [Entity]) {
        if self.keys.is_empty() {
            return;
        }
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// Number of sort keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the comparator has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.keys
                    .iter()
                    .map(|k| (k.path.as_str(), if k.descending { "desc" } else { "asc" })),
            )
            .finish()
    }
}

/// Compiles `orderBy` lists into comparators.
pub struct SortCompiler {
    resolver: Arc<PathResolver>,
    strategies: RwLock<HashMap<String, Vec<Arc<dyn SortStrategy>>>>,
}

impl SortCompiler {
    /// Create a sort compiler with no custom strategies.
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self {
            resolver,
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Register a custom strategy for an entity type.
    pub fn register(&self, entity_type: impl Into<String>, strategy: Arc<dyn SortStrategy>) {
        self.strategies
            .write()
            .entry(entity_type.into())
            .or_default()
            .push(strategy);
    }

    /// Compile sort keys for an entity type.
    pub fn compile(&self, entity_type: &str, order_by: &[OrderBy]) -> Result<Comparator, Error> {
        let strategies = self.strategies.read();
        let registered = strategies.get(entity_type);

        let mut keys = Vec::with_capacity(order_by.len());
        for order in order_by {
            let custom = registered.and_then(|list| list.iter().find(|s| s.claims(&order.path)));

            let source = match custom {
                Some(strategy) => KeySource::Custom(Arc::clone(strategy)),
                None => {
                    let accessor = self.resolver.resolve(entity_type, &order.path)?;
                    if accessor.property_type.is_navigation() {
                        return Err(Error::InvalidArgument(format!(
                            "cannot order {} by navigation '{}'",
                            entity_type, order.path
                        )));
                    }
                    KeySource::Property(accessor)
                }
            };

            keys.push(SortKey {
                path: order.path.clone(),
                source,
                descending: order.descending,
            });
        }

        debug!(entity = entity_type, keys = keys.len(), "compiled comparator");
        Ok(Comparator { keys: keys.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, ScalarType, Schema};
    use ormql_proto::Value;

    fn compiler() -> SortCompiler {
        let item = EntityDef::new("Item", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("Name", ScalarType::String))
            .with_field(FieldDef::optional_scalar("Rank", ScalarType::Int64))
            .with_field(FieldDef::scalar("Score", ScalarType::Float64))
            .with_field(FieldDef::reference("Owner", "Item"));
        let schema = Arc::new(Schema::new().with_entity(item));
        SortCompiler::new(Arc::new(PathResolver::new(schema)))
    }

    fn item(id: i32, name: &str, rank: Option<i64>) -> Entity {
        Entity::new("Item")
            .with("Id", id)
            .with("Name", name)
            .with("Rank", rank)
    }

    fn ids(items: &[Entity]) -> Vec<i64> {
        items
            .iter()
            .filter_map(|i| i.scalar("Id").and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn test_single_key_with_nulls_first() {
        let mut items = vec![item(1, "a", Some(5)), item(2, "b", None), item(3, "c", Some(1))];

        compiler()
            .compile("Item", &[OrderBy::asc("Rank")])
            .unwrap()
            .sort(&mut items);
        assert_eq!(ids(&items), vec![2, 3, 1]);

        compiler()
            .compile("Item", &[OrderBy::desc("Rank")])
            .unwrap()
            .sort(&mut items);
        assert_eq!(ids(&items), vec![1, 3, 2]);
    }

    #[test]
    fn test_float_key_with_nan() {
        let scores = [2.5, f64::NAN, -1.0, 7.0, f64::NAN, 0.0, 3.25, f64::NAN, 1.0];
        let mut items: Vec<Entity> = (0..200)
            .map(|i| {
                let score = scores[i % scores.len()] * (i / scores.len() + 1) as f64;
                item(i as i32, "x", None).with("Score", score)
            })
            .collect();

        let comparator = compiler().compile("Item", &[OrderBy::asc("Score")]).unwrap();
        comparator.sort(&mut items);

        let sorted: Vec<f64> = items
            .iter()
            .filter_map(|i| i.scalar("Score").and_then(Value::as_f64))
            .collect();
        let first_nan = sorted.iter().position(|s| s.is_nan()).unwrap();
        assert!(sorted[..first_nan].windows(2).all(|w| w[0] <= w[1]));
        assert!(sorted[first_nan..].iter().all(|s| s.is_nan()));

        compiler()
            .compile("Item", &[OrderBy::desc("Score")])
            .unwrap()
            .sort(&mut items);
        let first = items[0].scalar("Score").and_then(Value::as_f64).unwrap();
        assert!(first.is_nan());
    }

    #[test]
    fn test_ties_fall_through_and_sort_is_stable() {
        let mut items = vec![
            item(1, "b", Some(1)),
            item(2, "a", Some(2)),
            item(3, "b", Some(0)),
            item(4, "a", Some(2)),
        ];

        let comparator = compiler()
            .compile("Item", &[OrderBy::asc("Name"), OrderBy::desc("Rank")])
            .unwrap();
        comparator.sort(&mut items);

        // Items 2 and 4 tie on both keys and keep their input order.
        assert_eq!(ids(&items), vec![2, 4, 1, 3]);
        assert_eq!(comparator.len(), 2);
    }

    #[test]
    fn test_nested_path() {
        let owned = |id: i32, owner: &str| {
            item(id, "x", None).with_reference("Owner", Some(item(0, owner, None)))
        };
        let mut items = vec![owned(1, "zed"), owned(2, "amy"), item(3, "x", None)];

        compiler()
            .compile("Item", &[OrderBy::asc("Owner.Name")])
            .unwrap()
            .sort(&mut items);
        assert_eq!(ids(&items), vec![3, 2, 1]);
    }

    struct NameLength;

    impl SortStrategy for NameLength {
        fn claims(&self, path: &str) -> bool {
            path == "NameLength"
        }

        fn compare(&self, _path: &str, a: &Entity, b: &Entity) -> Ordering {
            let len = |e: &Entity| e.scalar("Name").and_then(Value::as_str).map_or(0, str::len);
            len(a).cmp(&len(b))
        }
    }

    #[test]
    fn test_custom_strategy() {
        let compiler = compiler();
        compiler.register("Item", Arc::new(NameLength));

        let mut items = vec![item(1, "ccc", None), item(2, "a", None), item(3, "bb", None)];
        compiler
            .compile("Item", &[OrderBy::desc("NameLength")])
            .unwrap()
            .sort(&mut items);
        assert_eq!(ids(&items), vec![1, 3, 2]);

        // Unregistered types still resolve the path as a property.
        assert!(compiler.compile("Other", &[OrderBy::asc("NameLength")]).is_err());
    }

    #[test]
    fn test_invalid_keys() {
        let compiler = compiler();

        assert!(matches!(
            compiler.compile("Item", &[OrderBy::asc("Missing")]),
            Err(Error::PathResolution { .. })
        ));
        assert!(matches!(
            compiler.compile("Item", &[OrderBy::asc("Owner")]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_order_is_identity() {
        let comparator = compiler().compile("Item", &[]).unwrap();
        let mut items = vec![item(2, "b", None), item(1, "a", None)];
        comparator.sort(&mut items);

        assert!(comparator.is_empty());
        assert_eq!(ids(&items), vec![2, 1]);
    }
}
