//! Schema - the set of entity and interface definitions.

use super::{EntityDef, FieldDef, InterfaceDef};
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Entity and interface metadata for every mapped type.
///
/// The schema stands in for runtime reflection: path resolution, predicate
/// compilation and projection building consult it once, at compile time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Entity definitions keyed by name.
    pub entities: HashMap<String, EntityDef>,
    /// Interface definitions keyed by name.
    pub interfaces: HashMap<String, InterfaceDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to the schema.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Add an interface to the schema.
    pub fn with_interface(mut self, interface: InterfaceDef) -> Self {
        self.interfaces.insert(interface.name.clone(), interface);
        self
    }

    /// Get an entity by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Get an interface by name.
    pub fn get_interface(&self, name: &str) -> Option<&InterfaceDef> {
        self.interfaces.get(name)
    }

    /// Check whether a type name is an entity or an interface.
    pub fn contains_type(&self, name: &str) -> bool {
        self.entities.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// Entity definition, or `UnknownEntity`.
    pub fn entity(&self, name: &str) -> Result<&EntityDef, Error> {
        self.get_entity(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    fn own_fields(&self, type_name: &str) -> Option<&[FieldDef]> {
        if let Some(entity) = self.entities.get(type_name) {
            return Some(&entity.fields);
        }
        self.interfaces.get(type_name).map(|i| i.fields.as_slice())
    }

    fn direct_interfaces(&self, type_name: &str) -> &[String] {
        if let Some(entity) = self.entities.get(type_name) {
            return &entity.implements;
        }
        self.interfaces
            .get(type_name)
            .map(|i| i.extends.as_slice())
            .unwrap_or(&[])
    }

    /// All interfaces reachable from a type, breadth-first, without repeats.
    pub fn interfaces_of(&self, type_name: &str) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<&str> = self
            .direct_interfaces(type_name)
            .iter()
            .map(|s| s.as_str())
            .collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            order.push(name);
            queue.extend(self.direct_interfaces(name).iter().map(|s| s.as_str()));
        }

        order
    }

    /// Check whether a type implements an interface, directly or inherited.
    pub fn implements(&self, type_name: &str, interface: &str) -> bool {
        self.interfaces_of(type_name).contains(&interface)
    }

    /// Find a member on a type: its own fields first, then its interfaces
    /// breadth-first.
    pub fn find_member(&self, type_name: &str, member: &str) -> Option<&FieldDef> {
        if let Some(field) = self
            .own_fields(type_name)?
            .iter()
            .find(|f| f.name == member)
        {
            return Some(field);
        }

        self.interfaces_of(type_name)
            .into_iter()
            .filter_map(|name| self.interfaces.get(name))
            .find_map(|interface| interface.get_field(member))
    }

    /// Check the schema for dangling references.
    pub fn validate(&self) -> Result<(), Error> {
        for entity in self.entities.values() {
            for key in entity.keys.iter().chain(entity.foreign_keys.iter()) {
                match self.find_member(&entity.name, key) {
                    Some(field) if !field.is_navigation() => {}
                    _ => {
                        return Err(Error::InvalidSchema(format!(
                            "{}.{} is not a scalar field",
                            entity.name, key
                        )))
                    }
                }
            }
            for interface in &entity.implements {
                if !self.interfaces.contains_key(interface) {
                    return Err(Error::InvalidSchema(format!(
                        "{} implements unknown interface {}",
                        entity.name, interface
                    )));
                }
            }
        }

        let all_fields = self
            .entities
            .values()
            .flat_map(|e| e.fields.iter().map(move |f| (e.name.as_str(), f)))
            .chain(
                self.interfaces
                    .values()
                    .flat_map(|i| i.fields.iter().map(move |f| (i.name.as_str(), f))),
            );
        for (owner, field) in all_fields {
            if let Some(target) = field.field_type.target_entity() {
                if !self.contains_type(target) {
                    return Err(Error::InvalidSchema(format!(
                        "{}.{} navigates to unknown type {}",
                        owner, field.name, target
                    )));
                }
            }
        }

        for interface in self.interfaces.values() {
            for parent in &interface.extends {
                if !self.interfaces.contains_key(parent) {
                    return Err(Error::InvalidSchema(format!(
                        "{} extends unknown interface {}",
                        interface.name, parent
                    )));
                }
            }
        }

        Ok(())
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScalarType;

    fn sample_schema() -> Schema {
        let named = InterfaceDef::new("INamed")
            .with_field(FieldDef::scalar("Name", ScalarType::String))
            .extending("IAudited");
        let audited =
            InterfaceDef::new("IAudited").with_field(FieldDef::scalar("Version", ScalarType::Int64));

        let parent = EntityDef::new("Parent", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::collection("Children", "Child"))
            .implementing("INamed");

        let child = EntityDef::new("Child", "Id")
            .with_field(FieldDef::scalar("Id", ScalarType::Int32))
            .with_field(FieldDef::scalar("ParentId", ScalarType::Int32))
            .with_field(FieldDef::reference("Parent", "Parent"))
            .with_foreign_key("ParentId");

        Schema::new()
            .with_interface(named)
            .with_interface(audited)
            .with_entity(parent)
            .with_entity(child)
    }

    #[test]
    fn test_schema_lookup() {
        let schema = sample_schema();

        assert!(schema.get_entity("Parent").is_some());
        assert!(schema.get_interface("INamed").is_some());
        assert!(schema.contains_type("IAudited"));
        assert!(!schema.contains_type("Nope"));
        assert!(matches!(schema.entity("Nope"), Err(Error::UnknownEntity(_))));
        assert_eq!(schema.entity_names().len(), 2);
    }

    #[test]
    fn test_interface_walk_is_breadth_first() {
        let schema = sample_schema();

        assert_eq!(schema.interfaces_of("Parent"), vec!["INamed", "IAudited"]);
        assert!(schema.implements("Parent", "IAudited"));
        assert!(!schema.implements("Child", "INamed"));
    }

    #[test]
    fn test_find_member_through_interfaces() {
        let schema = sample_schema();

        assert!(schema.find_member("Parent", "Id").is_some());
        assert!(schema.find_member("Parent", "Name").is_some());
        assert!(schema.find_member("Parent", "Version").is_some());
        assert!(schema.find_member("Child", "Name").is_none());
        assert!(schema.find_member("Missing", "Id").is_none());
    }

    #[test]
    fn test_validate() {
        let schema = sample_schema();
        assert!(schema.validate().is_ok());

        let broken = sample_schema().with_entity(
            EntityDef::new("Orphan", "Id")
                .with_field(FieldDef::scalar("Id", ScalarType::Int32))
                .with_field(FieldDef::reference("Owner", "Ghost")),
        );
        assert!(matches!(broken.validate(), Err(Error::InvalidSchema(_))));

        let bad_key = Schema::new().with_entity(EntityDef::new("NoKey", "Id"));
        assert!(matches!(bad_key.validate(), Err(Error::InvalidSchema(_))));
    }
}
