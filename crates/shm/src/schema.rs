// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory schema model: named groups of named, defaulted variables.
//!
//! The schema is the single source of truth, authored by hand and never
//! mutated by the compiler. Name uniqueness is enforced at construction (both
//! the builder API and the serde path go through the same checked inserts),
//! so a fully constructed schema cannot contain duplicates. Defaults are kept
//! in their written YAML form until validation so that unsupported shapes can
//! be reported against the owning group and variable.

use crate::types::Value;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Fatal schema defects. Any of these aborts a generation run before output
/// is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateGroupName { group: String },
    DuplicateVariableName { variable: String },
    /// Zero groups (`group: None`) or a group with zero variables.
    EmptySchema { group: Option<String> },
    UnsupportedDefaultType { group: String, variable: String, found: String },
    /// More variables than the u16 wire tag can address.
    TagSpaceExhausted { variables: usize },
    /// Internal consistency assertion; unreachable for any valid schema.
    TagCollision { tag: u16 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateGroupName { group } => {
                write!(f, "duplicate group name '{}'", group)
            }
            SchemaError::DuplicateVariableName { variable } => {
                write!(f, "duplicate variable name '{}'", variable)
            }
            SchemaError::EmptySchema { group: None } => {
                write!(f, "schema defines no groups")
            }
            SchemaError::EmptySchema { group: Some(group) } => {
                write!(f, "group '{}' defines no variables", group)
            }
            SchemaError::UnsupportedDefaultType {
                group,
                variable,
                found,
            } => write!(
                f,
                "variable '{}.{}' has unsupported default ({}); expected bool, int or float",
                group, variable, found
            ),
            SchemaError::TagSpaceExhausted { variables } => {
                write!(f, "{} variables exceed the u16 tag space", variables)
            }
            SchemaError::TagCollision { tag } => {
                write!(f, "tag {} assigned twice", tag)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Namespacing unit: a named set of variables. Groups carry no defaults of
/// their own.
#[derive(Debug, Clone, Default)]
pub struct Group {
    variables: BTreeMap<String, serde_yaml::Value>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked insert; the backing map never holds two variables of one name.
    pub fn insert_variable(
        &mut self,
        name: impl Into<String>,
        default: serde_yaml::Value,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(SchemaError::DuplicateVariableName { variable: name });
        }
        self.variables.insert(name, default);
        Ok(())
    }

    /// Variables in byte-wise lexicographic name order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &serde_yaml::Value)> {
        self.variables.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// The authored schema: a uniqueness-enforcing mapping from group name to
/// [`Group`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    groups: BTreeMap<String, Group>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(
        &mut self,
        name: impl Into<String>,
        group: Group,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return Err(SchemaError::DuplicateGroupName { group: name });
        }
        self.groups.insert(name, group);
        Ok(())
    }

    /// Groups in byte-wise lexicographic name order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.groups.iter().map(|(name, g)| (name.as_str(), g))
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total variable count across all groups.
    pub fn var_count(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    /// Structural validation: at least one addressable variable, and every
    /// default maps to exactly one member of the type system.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.groups.is_empty() {
            return Err(SchemaError::EmptySchema { group: None });
        }
        for (group_name, group) in &self.groups {
            if group.is_empty() {
                return Err(SchemaError::EmptySchema {
                    group: Some(group_name.clone()),
                });
            }
            for (var_name, default) in group.variables() {
                if Value::infer(default).is_none() {
                    return Err(SchemaError::UnsupportedDefaultType {
                        group: group_name.clone(),
                        variable: var_name.to_string(),
                        found: yaml_shape(default),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Human-readable class of a YAML value, for diagnostics.
pub(crate) fn yaml_shape(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(_) => "bool".to_string(),
        serde_yaml::Value::Number(n) if n.is_f64() => "float".to_string(),
        serde_yaml::Value::Number(_) => "integer out of range".to_string(),
        serde_yaml::Value::String(_) => "string".to_string(),
        serde_yaml::Value::Sequence(_) => "sequence".to_string(),
        serde_yaml::Value::Mapping(_) => "mapping".to_string(),
        serde_yaml::Value::Tagged(_) => "tagged value".to_string(),
    }
}

// Deserialization funnels through the checked inserts so that a schema file
// with duplicate names fails to load rather than silently keeping the last
// entry.

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupVisitor;

        impl<'de> Visitor<'de> for GroupVisitor {
            type Value = Group;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of variable name to default value")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Group, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut group = Group::new();
                while let Some((name, default)) = map.next_entry::<String, serde_yaml::Value>()? {
                    group
                        .insert_variable(name, default)
                        .map_err(de::Error::custom)?;
                }
                Ok(group)
            }
        }

        deserializer.deserialize_map(GroupVisitor)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of group name to variables")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Schema, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut schema = Schema::new();
                while let Some((name, group)) = map.next_entry::<String, Group>()? {
                    schema
                        .insert_group(name, group)
                        .map_err(de::Error::custom)?;
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
