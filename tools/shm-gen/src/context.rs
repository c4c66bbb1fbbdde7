// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Template context construction.
//!
//! Templates are the authority on target-language syntax; the context hands
//! them the compiled facts in two shapes. `vars` is the flattened walk in tag
//! order, one entry per variable. `groups` nests the same entries per group
//! for targets that mirror the schema's structure. Defaults are passed as
//! source literals (floats keep their decimal point), never as re-serialized
//! numbers, so every target prints exactly what the schema author wrote the
//! value to be.

use serde::Serialize;
use shm::{TaggedSchema, TaggedVar};

/// One variable, flattened for template iteration.
#[derive(Debug, Serialize)]
pub struct VarContext {
    pub group: String,
    pub name: String,
    pub tag: u16,
    /// `"bool"`, `"int"` or `"float"`; type mapping is the template's job.
    pub r#type: &'static str,
    /// Default value as a source literal (`true`, `32`, `30.0`).
    pub default: String,
    /// `SCREAMING_SNAKE` spelling, e.g. `SWITCHES_SOFT_KILL`.
    pub const_name: String,
    /// `snake_case` spelling, e.g. `switches_soft_kill`.
    pub fn_name: String,
}

/// One group with its variables in tag order.
#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub name: String,
    pub vars: Vec<VarContext>,
}

/// Build the render context for one tagged schema.
pub fn build(schema_path: &str, tagged: &TaggedSchema) -> tera::Context {
    let groups: Vec<GroupContext> = tagged
        .groups()
        .map(|group| GroupContext {
            name: group.name().to_string(),
            vars: group
                .vars()
                .map(|var| var_context(group.name(), var))
                .collect(),
        })
        .collect();

    let vars: Vec<VarContext> = tagged
        .vars()
        .map(|(group, var)| var_context(group, var))
        .collect();

    let mut ctx = tera::Context::new();
    ctx.insert("schema_path", schema_path);
    ctx.insert("var_count", &tagged.len());
    ctx.insert("groups", &groups);
    ctx.insert("vars", &vars);
    ctx
}

fn var_context(group: &str, var: &TaggedVar) -> VarContext {
    VarContext {
        group: group.to_string(),
        name: var.name.clone(),
        tag: var.tag,
        r#type: var.type_tag.name(),
        default: var.default.to_string(),
        const_name: format!("{}_{}", shout(group), shout(&var.name)),
        fn_name: format!("{}_{}", snake(group), snake(&var.name)),
    }
}

/// camelCase -> SCREAMING_SNAKE (`softKill` -> `SOFT_KILL`).
fn shout(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// camelCase -> snake_case (`softKill` -> `soft_kill`).
fn snake(name: &str) -> String {
    shout(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shout_splits_camel_case() {
        assert_eq!(shout("softKill"), "SOFT_KILL");
        assert_eq!(shout("controllerOut"), "CONTROLLER_OUT");
        assert_eq!(shout("t0"), "T0");
        assert_eq!(shout("voltage"), "VOLTAGE");
    }

    #[test]
    fn test_snake_spelling() {
        assert_eq!(snake("maxTilt"), "max_tilt");
        assert_eq!(snake("yawVel"), "yaw_vel");
    }

    #[test]
    fn test_context_flattens_in_tag_order() {
        let schema: shm::Schema =
            serde_yaml::from_str("power:\n  voltage: 0.0\nled:\n  brightness: 32\n")
                .expect("schema yaml should load");
        let tagged = shm::assign_tags(&schema).expect("assignment should succeed");

        let ctx = build("shm.yaml", &tagged);
        let vars = ctx
            .get("vars")
            .and_then(|v| v.as_array())
            .expect("vars should be an array");

        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0]["const_name"], "LED_BRIGHTNESS");
        assert_eq!(vars[0]["tag"], 0);
        assert_eq!(vars[1]["const_name"], "POWER_VOLTAGE");
        assert_eq!(vars[1]["type"], "float");
        assert_eq!(vars[1]["default"], "0.0");
    }

    #[test]
    fn test_context_defaults_stay_source_literals() {
        let schema: shm::Schema =
            serde_yaml::from_str("pitchConf:\n  p: 0.01\n  enabled: false\n")
                .expect("schema yaml should load");
        let tagged = shm::assign_tags(&schema).expect("assignment should succeed");

        let ctx = build("shm.yaml", &tagged);
        let groups = ctx
            .get("groups")
            .and_then(|g| g.as_array())
            .expect("groups should be an array");

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["name"], "pitchConf");
        let vars = groups[0]["vars"].as_array().expect("vars");
        assert_eq!(vars[0]["default"], "false");
        assert_eq!(vars[1]["default"], "0.01");
    }
}
