// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # shm - schema compiler for a shared tagged-variable store
//!
//! shm is a lightweight database of primitive values used as the sole
//! communication medium between independently built components: an embedded
//! control process, a handheld remote, and external clients on a byte-stream
//! link. One authored schema (named groups of named, defaulted variables) is
//! compiled into a deterministic global tag namespace; the tags and the
//! update wire format are the contract every consumer shares.
//!
//! ```text
//! Schema (YAML) --> assign_tags --> TaggedSchema --> generated accessors (per target)
//!                                        |
//!                                        +--> Store (defaults, apply/answer)
//!                                        +--> wire (update/query frames)
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use shm::{assign_tags, Schema, Store, Value};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema: Schema = serde_yaml::from_str(
//!         "switches:\n  softKill: true\npower:\n  voltage: 0.0\n",
//!     )?;
//!     let tagged = assign_tags(&schema)?;
//!     let mut store = Store::new(&tagged);
//!
//!     let record = tagged.bind("switches", "softKill", Value::Bool(false))?;
//!     store.apply(&record)?;
//!     Ok(())
//! }
//! ```
//!
//! Tag assignment is a pure function of the schema's names: the same schema
//! always compiles to the same tags, on any machine, in any generation pass.
//! There is deliberately no tag-stable evolution - after any schema edit,
//! every component is regenerated and redeployed.

/// Schema model: groups, variables, defaults, structural validation.
pub mod schema;
/// Runtime value table addressed by tag.
pub mod store;
/// Deterministic tag assignment over a validated schema.
pub mod tag;
/// Closed set of variable types and the default-value inference rule.
pub mod types;
/// Length-prefixed update/query wire protocol.
pub mod wire;

pub use schema::{Group, Schema, SchemaError};
pub use store::{ApplyError, BatchReport, RecordError, Store};
pub use tag::{assign_tags, BindError, TaggedGroup, TaggedSchema, TaggedVar};
pub use types::{TypeTag, Value};
pub use wire::{decode, encode_batch, BatchDecoder, DecodeError, Message, UpdateRecord};
