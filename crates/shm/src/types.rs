// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Closed set of primitive value types a shm variable may hold.
//!
//! A variable's type is never declared; it is inferred from the written form
//! of its default value (`true` -> Bool, `1` -> Int, `1.0` -> Float). The
//! inference is syntactic: `1.0` is Float even though it equals the integer
//! `1`, because storage width and wire encoding follow the declared type.

use std::fmt;

/// Type discriminant shared by the schema compiler and the wire format.
///
/// Wire discriminants: Bool = 0x01, Int = 0x02, Float = 0x03. Discriminant
/// 0x00 is reserved for value-less query messages (see [`crate::wire`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
}

impl TypeTag {
    /// One-byte wire discriminant for this type.
    pub const fn discriminant(self) -> u8 {
        match self {
            TypeTag::Bool => 0x01,
            TypeTag::Int => 0x02,
            TypeTag::Float => 0x03,
        }
    }

    /// Inverse of [`TypeTag::discriminant`]. `None` for unknown bytes.
    pub const fn from_discriminant(disc: u8) -> Option<TypeTag> {
        match disc {
            0x01 => Some(TypeTag::Bool),
            0x02 => Some(TypeTag::Int),
            0x03 => Some(TypeTag::Float),
            _ => None,
        }
    }

    /// Encoded value width in bytes (fixed per type, never per value).
    pub const fn value_size(self) -> usize {
        match self {
            TypeTag::Bool => 1,
            TypeTag::Int => 4,
            TypeTag::Float => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed scalar value: the payload of a variable, a default, or an update.
///
/// Widths are fixed once for all targets: 32-bit signed integers and IEEE-754
/// binary32 floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl Value {
    pub const fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
        }
    }

    /// Infer a typed value from the written form of a schema default.
    ///
    /// Follows the YAML scalar class, not the numeric value: a bool literal
    /// maps to Bool, an integer literal to Int, any other number to Float.
    /// Returns `None` for shapes outside the closed type set (strings,
    /// sequences, mappings, null) and for integers outside the `i32` range.
    pub fn infer(default: &serde_yaml::Value) -> Option<Value> {
        match default {
            serde_yaml::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_yaml::Value::Number(n) if n.is_f64() => {
                n.as_f64().map(|f| Value::Float(f as f32))
            }
            serde_yaml::Value::Number(n) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .map(Value::Int),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            // {:?} keeps the trailing ".0" on whole floats, so the printed
            // form always reads back as the same type.
            Value::Float(x) => write!(f, "{:?}", x),
        }
    }
}
