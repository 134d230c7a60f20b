//! Requested field trees for projection building.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::catalog::Schema;
use crate::error::Error;

/// The fields requested from one entity type, with nested navigations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldProjectionInfo {
    /// Requested scalar members.
    pub scalar_fields: BTreeSet<String>,
    /// Primary key members, in declaration order.
    pub key_names: Vec<String>,
    /// Foreign key members.
    pub foreign_key_names: BTreeSet<String>,
    /// Requested navigations by member name.
    pub navigations: BTreeMap<String, NavigationProjectionInfo>,
}

/// A requested navigation and the fields requested from its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProjectionInfo {
    /// Target type of the navigation.
    pub entity_type: String,
    /// Whether the navigation is a collection.
    pub is_collection: bool,
    /// Fields requested from the target.
    pub projection: FieldProjectionInfo,
}

impl FieldProjectionInfo {
    /// Empty request for an entity type, carrying its keys and foreign keys.
    ///
    /// Interfaces have no keys of their own.
    pub fn for_entity(schema: &Schema, entity_type: &str) -> Result<Self, Error> {
        if let Some(entity) = schema.get_entity(entity_type) {
            return Ok(Self {
                key_names: entity.keys.clone(),
                foreign_key_names: entity.foreign_keys.iter().cloned().collect(),
                ..Default::default()
            });
        }
        if schema.get_interface(entity_type).is_some() {
            return Ok(Self::default());
        }
        Err(Error::UnknownEntity(entity_type.to_string()))
    }

    /// Request built from dotted selection paths such as `"Parent.Name"`.
    ///
    /// Members the schema does not know are kept as scalars so that the
    /// projection builder can reject the shape.
    pub fn from_selection<'a, I>(schema: &Schema, entity_type: &str, paths: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut info = Self::for_entity(schema, entity_type)?;
        for path in paths {
            info.add_path(schema, entity_type, path)?;
        }
        Ok(info)
    }

    /// A copy of this request extended with the paths row filters read.
    pub fn merge_filter_fields<'a, I>(
        &self,
        schema: &Schema,
        entity_type: &str,
        paths: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut merged = self.clone();
        for path in paths {
            merged.add_path(schema, entity_type, path)?;
        }
        Ok(merged)
    }

    fn add_path(&mut self, schema: &Schema, entity_type: &str, path: &str) -> Result<(), Error> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        if head.is_empty() {
            return Ok(());
        }

        let target = schema
            .find_member(entity_type, head)
            .and_then(|field| Some((field.field_type.target_entity()?, field.field_type.is_collection())));

        match target {
            Some((target, is_collection)) => {
                let navigation = match self.navigations.entry(head.to_string()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(NavigationProjectionInfo {
                        entity_type: target.to_string(),
                        is_collection,
                        projection: Self::for_entity(schema, target)?,
                    }),
                };
                if let Some(rest) = rest {
                    let target = navigation.entity_type.clone();
                    navigation.projection.add_path(schema, &target, rest)?;
                }
            }
            None => {
                self.scalar_fields.insert(head.to_string());
            }
        }
        Ok(())
    }

    /// Every requested navigation path, parents before children.
    ///
    /// These are the paths a data source must eagerly include.
    pub fn include_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_includes("", &mut paths);
        paths
    }

    fn collect_includes(&self, prefix: &str, paths: &mut Vec<String>) {
        for (name, navigation) in &self.navigations {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            paths.push(path.clone());
            navigation.projection.collect_includes(&path, paths);
        }
    }

    /// Canonical rendering of the requested shape. Equal shapes render
    /// equally regardless of the order fields were requested in.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.render(&mut out);
        out
    }

    fn render(&self, out: &mut String) {
        out.push_str("{k:");
        push_names(out, &self.key_names);
        out.push_str(";f:");
        push_names(out, &self.foreign_key_names);
        out.push_str(";s:");
        push_names(out, &self.scalar_fields);
        for (name, navigation) in &self.navigations {
            out.push_str(";n:");
            push_name(out, name);
            push_name(out, &navigation.entity_type);
            if navigation.is_collection {
                out.push('*');
            }
            out.push('=');
            navigation.projection.render(out);
        }
        out.push('}');
    }
}

fn push_names<'a>(out: &mut String, names: impl IntoIterator<Item = &'a String>) {
    for name in names {
        push_name(out, name);
    }
}

/// Names are length-prefixed so separators inside a name cannot merge
/// two shapes.
fn push_name(out: &mut String, name: &str) {
    let _ = write!(out, "{}#{}", name.len(), name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, FieldDef, ScalarType};

    fn schema() -> Schema {
        let parent = EntityDef::new("Parent", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("Name", ScalarType::String))
            .with_field(FieldDef::collection("Children", "Child"));
        let child = EntityDef::new("Child", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("ParentId", ScalarType::Int32))
            .with_field(FieldDef::scalar("Label", ScalarType::String))
            .with_field(FieldDef::reference("Parent", "Parent"))
            .with_foreign_key("ParentId");
        Schema::new().with_entity(parent).with_entity(child)
    }

    #[test]
    fn test_for_entity_carries_keys() {
        let info = FieldProjectionInfo::for_entity(&schema(), "Child").unwrap();

        assert_eq!(info.key_names, vec!["Id"]);
        assert!(info.foreign_key_names.contains("ParentId"));
        assert!(info.scalar_fields.is_empty());
        assert!(FieldProjectionInfo::for_entity(&schema(), "Ghost").is_err());
    }

    #[test]
    fn test_from_selection_builds_tree() {
        let schema = schema();
        let info = FieldProjectionInfo::from_selection(
            &schema,
            "Child",
            ["Label", "Parent.Name", "Parent.Children.Label"],
        )
        .unwrap();

        assert!(info.scalar_fields.contains("Label"));
        let parent = &info.navigations["Parent"];
        assert_eq!(parent.entity_type, "Parent");
        assert!(!parent.is_collection);
        assert!(parent.projection.scalar_fields.contains("Name"));
        assert_eq!(parent.projection.key_names, vec!["Id"]);

        let children = &parent.projection.navigations["Children"];
        assert!(children.is_collection);
        assert!(children.projection.foreign_key_names.contains("ParentId"));

        assert_eq!(info.include_paths(), vec!["Parent", "Parent.Children"]);
    }

    #[test]
    fn test_merge_filter_fields_returns_new_request() {
        let schema = schema();
        let requested = FieldProjectionInfo::from_selection(&schema, "Child", ["Label"]).unwrap();
        let merged = requested
            .merge_filter_fields(&schema, "Child", ["Parent.Name"])
            .unwrap();

        assert!(requested.navigations.is_empty());
        assert!(merged.navigations.contains_key("Parent"));
        assert!(merged.scalar_fields.contains("Label"));
    }

    #[test]
    fn test_canonical_ignores_request_order() {
        let schema = schema();
        let a = FieldProjectionInfo::from_selection(&schema, "Child", ["Label", "Parent.Name"]).unwrap();
        let b = FieldProjectionInfo::from_selection(&schema, "Child", ["Parent.Name", "Label"]).unwrap();
        let c = FieldProjectionInfo::from_selection(&schema, "Child", ["Label"]).unwrap();

        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), c.canonical());

        let merged = FieldProjectionInfo::from_selection(&schema, "Child", ["A,B"]).unwrap();
        let split = FieldProjectionInfo::from_selection(&schema, "Child", ["A", "B"]).unwrap();
        assert_ne!(merged.canonical(), split.canonical());

        let tricky = FieldProjectionInfo::from_selection(&schema, "Child", ["Label;n:Parent"]).unwrap();
        let nested = FieldProjectionInfo::from_selection(&schema, "Child", ["Label", "Parent"]).unwrap();
        assert_ne!(tricky.canonical(), nested.canonical());
    }

    #[test]
    fn test_unknown_members_are_kept() {
        let info = FieldProjectionInfo::from_selection(&schema(), "Child", ["Bogus"]).unwrap();
        assert!(info.scalar_fields.contains("Bogus"));
    }
}
