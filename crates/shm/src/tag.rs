// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deterministic tag assignment.
//!
//! Tags are recomputed from names on every compilation run; there is no
//! persisted tag registry. Group names sort byte-wise lexicographically, then
//! variable names within each group, and the flattened walk is numbered
//! `0, 1, 2, ...`. Every independently built consumer of the same schema
//! therefore lands on the same tag per variable, which is the property the
//! whole system rests on. The cost is accepted up front: any rename, add or
//! remove shifts tags and requires a full regenerate-and-redeploy.

use crate::schema::{Schema, SchemaError};
use crate::types::{TypeTag, Value};
use crate::wire::UpdateRecord;
use std::collections::BTreeMap;
use std::fmt;

/// A variable after compilation: inferred type, assigned tag, typed default.
#[derive(Debug, Clone)]
pub struct TaggedVar {
    pub name: String,
    pub tag: u16,
    pub type_tag: TypeTag,
    pub default: Value,
}

/// A group after compilation. Group membership survives only for code
/// generation; at runtime a variable is addressed by tag alone.
#[derive(Debug, Clone)]
pub struct TaggedGroup {
    name: String,
    vars: BTreeMap<String, TaggedVar>,
}

impl TaggedGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn var(&self, name: &str) -> Option<&TaggedVar> {
        self.vars.get(name)
    }

    /// Variables in name order, which within one group is also tag order.
    pub fn vars(&self) -> impl Iterator<Item = &TaggedVar> {
        self.vars.values()
    }

    /// Collect `prefix0, prefix1, ...` until the first gap. Used for banks of
    /// numbered variables such as a thruster array.
    pub fn array(&self, prefix: &str) -> Vec<&TaggedVar> {
        let mut out = Vec::new();
        for index in 0.. {
            match self.vars.get(&format!("{}{}", prefix, index)) {
                Some(var) => out.push(var),
                None => break,
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Name-addressed binding failures at the client edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    UnknownGroup { group: String },
    UnknownVariable { group: String, variable: String },
    TypeMismatch { path: String, expected: TypeTag, found: TypeTag },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::UnknownGroup { group } => write!(f, "group '{}' not found", group),
            BindError::UnknownVariable { group, variable } => {
                write!(f, "variable '{}.{}' not found", group, variable)
            }
            BindError::TypeMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "variable '{}' has type {}, not {}",
                path, expected, found
            ),
        }
    }
}

impl std::error::Error for BindError {}

/// Schema after deterministic tag assignment. Immutable; tags form exactly
/// `{0 .. var_count-1}`.
#[derive(Debug, Clone)]
pub struct TaggedSchema {
    groups: BTreeMap<String, TaggedGroup>,
    /// Tag -> (group, variable), index equals tag.
    paths: Vec<(String, String)>,
}

impl TaggedSchema {
    pub fn group(&self, name: &str) -> Option<&TaggedGroup> {
        self.groups.get(name)
    }

    /// Groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &TaggedGroup> {
        self.groups.values()
    }

    /// Runtime addressing: the variable owning `tag`, if any.
    pub fn var(&self, tag: u16) -> Option<&TaggedVar> {
        let (group, name) = self.paths.get(usize::from(tag))?;
        self.groups.get(group)?.var(name)
    }

    pub fn lookup(&self, group: &str, variable: &str) -> Option<&TaggedVar> {
        self.groups.get(group)?.var(variable)
    }

    /// Dotted-path lookup, e.g. `"switches.softKill"`.
    pub fn var_by_path(&self, path: &str) -> Option<&TaggedVar> {
        let (group, variable) = path.split_once('.')?;
        self.lookup(group, variable)
    }

    /// Dotted path for a tag, e.g. `"switches.softKill"`.
    pub fn path(&self, tag: u16) -> Option<String> {
        self.paths
            .get(usize::from(tag))
            .map(|(group, name)| format!("{}.{}", group, name))
    }

    /// All variables in tag order, with their owning group name.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &TaggedVar)> {
        self.groups
            .values()
            .flat_map(|group| group.vars().map(move |var| (group.name(), var)))
    }

    /// Total variable count; tags are exactly `0..len`.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Name-addressed construction of an update record, for clients that
    /// speak in `group.variable` terms rather than tags.
    ///
    /// One widening is allowed here: an Int value binds to a Float variable
    /// by conversion, since human-entered whole numbers are routine at this
    /// edge. On the wire and in [`crate::store::Store::apply`] types must
    /// match exactly.
    pub fn bind(
        &self,
        group: &str,
        variable: &str,
        value: Value,
    ) -> Result<UpdateRecord, BindError> {
        let tagged_group = self.groups.get(group).ok_or_else(|| BindError::UnknownGroup {
            group: group.to_string(),
        })?;
        let var = tagged_group
            .var(variable)
            .ok_or_else(|| BindError::UnknownVariable {
                group: group.to_string(),
                variable: variable.to_string(),
            })?;

        let value = match (var.type_tag, value) {
            (TypeTag::Float, Value::Int(i)) => Value::Float(i as f32),
            (expected, value) if value.type_tag() == expected => value,
            (expected, value) => {
                return Err(BindError::TypeMismatch {
                    path: format!("{}.{}", group, variable),
                    expected,
                    found: value.type_tag(),
                })
            }
        };

        Ok(UpdateRecord {
            tag: var.tag,
            value,
        })
    }
}

/// Compile a schema into its tagged form.
///
/// Pure and idempotent: the same schema always yields the same tag per
/// `(group, variable)` pair, across runs and across machines.
pub fn assign_tags(schema: &Schema) -> Result<TaggedSchema, SchemaError> {
    schema.validate()?;

    let total = schema.var_count();
    if total > usize::from(u16::MAX) + 1 {
        return Err(SchemaError::TagSpaceExhausted { variables: total });
    }

    let mut groups = BTreeMap::new();
    let mut paths = Vec::with_capacity(total);
    let mut seen = vec![false; total];
    let mut next: usize = 0;

    for (group_name, group) in schema.groups() {
        let mut vars = BTreeMap::new();
        for (var_name, default) in group.variables() {
            // validate() already classified every default.
            let default = Value::infer(default).ok_or_else(|| {
                SchemaError::UnsupportedDefaultType {
                    group: group_name.to_string(),
                    variable: var_name.to_string(),
                    found: crate::schema::yaml_shape(default),
                }
            })?;

            let tag = next as u16;
            if std::mem::replace(&mut seen[next], true) {
                return Err(SchemaError::TagCollision { tag });
            }
            next += 1;

            vars.insert(
                var_name.to_string(),
                TaggedVar {
                    name: var_name.to_string(),
                    tag,
                    type_tag: default.type_tag(),
                    default,
                },
            );
            paths.push((group_name.to_string(), var_name.to_string()));
        }
        groups.insert(
            group_name.to_string(),
            TaggedGroup {
                name: group_name.to_string(),
                vars,
            },
        );
    }

    debug_assert!(seen.iter().all(|&s| s));
    log::debug!("assigned {} tags across {} groups", total, groups.len());

    Ok(TaggedSchema { groups, paths })
}
