// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime value table addressed by tag.
//!
//! A compiled component holds one [`Store`] per tagged schema, seeded with
//! every variable's default. Updates apply point-wise: records for distinct
//! tags commute, two records for the same tag apply in arrival order. A
//! rejected record leaves the store untouched; values are never coerced
//! across the tag boundary, since silent coercion over a process or link
//! boundary is the failure class the wire format exists to prevent.
//!
//! The store is single-writer (`&mut self`). Per-tag atomicity for readers in
//! other processes is the concern of whatever segment or transport shares the
//! values, not of this table.

use crate::tag::TaggedSchema;
use crate::types::{TypeTag, Value};
use crate::wire::{BatchDecoder, DecodeError, Message, UpdateRecord};
use std::fmt;

/// Rejection of a single decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {
    UnknownTag { tag: u16 },
    TypeMismatch { tag: u16, expected: TypeTag, found: TypeTag },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::UnknownTag { tag } => write!(f, "no variable owns tag {}", tag),
            ApplyError::TypeMismatch {
                tag,
                expected,
                found,
            } => write!(
                f,
                "tag {} is declared {}, got {}",
                tag, expected, found
            ),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Why one record of a batch was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordError {
    Decode(DecodeError),
    Apply(ApplyError),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Decode(err) => err.fmt(f),
            RecordError::Apply(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<DecodeError> for RecordError {
    fn from(err: DecodeError) -> Self {
        RecordError::Decode(err)
    }
}

impl From<ApplyError> for RecordError {
    fn from(err: ApplyError) -> Self {
        RecordError::Apply(err)
    }
}

/// Outcome of applying one batch of frames.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Update records applied, in order.
    pub applied: usize,
    /// Replies to query frames, carrying current values at answer time.
    pub answers: Vec<UpdateRecord>,
    /// Rejected records with their position in the batch. Rejections never
    /// block later records.
    pub rejected: Vec<(usize, RecordError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Tag-indexed value table seeded from a tagged schema's defaults.
#[derive(Debug, Clone)]
pub struct Store {
    values: Vec<Value>,
}

impl Store {
    /// Every variable starts at its schema default. Tags are dense, so the
    /// table is a plain vector indexed by tag.
    pub fn new(schema: &TaggedSchema) -> Self {
        let mut values = vec![Value::Bool(false); schema.len()];
        for (_, var) in schema.vars() {
            values[usize::from(var.tag)] = var.default;
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, tag: u16) -> Option<Value> {
        self.values.get(usize::from(tag)).copied()
    }

    pub fn get_bool(&self, tag: u16) -> Result<bool, ApplyError> {
        match self.checked(tag)? {
            Value::Bool(b) => Ok(b),
            value => Err(mismatch(tag, TypeTag::Bool, value)),
        }
    }

    pub fn get_int(&self, tag: u16) -> Result<i32, ApplyError> {
        match self.checked(tag)? {
            Value::Int(i) => Ok(i),
            value => Err(mismatch(tag, TypeTag::Int, value)),
        }
    }

    pub fn get_float(&self, tag: u16) -> Result<f32, ApplyError> {
        match self.checked(tag)? {
            Value::Float(x) => Ok(x),
            value => Err(mismatch(tag, TypeTag::Float, value)),
        }
    }

    /// Point write with strict type agreement.
    pub fn set(&mut self, tag: u16, value: Value) -> Result<(), ApplyError> {
        let slot = self
            .values
            .get_mut(usize::from(tag))
            .ok_or(ApplyError::UnknownTag { tag })?;
        if slot.type_tag() != value.type_tag() {
            return Err(ApplyError::TypeMismatch {
                tag,
                expected: slot.type_tag(),
                found: value.type_tag(),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Apply one decoded update. Rejection leaves the store unchanged.
    pub fn apply(&mut self, record: &UpdateRecord) -> Result<(), ApplyError> {
        self.set(record.tag, record.value)
    }

    /// Reply to a query: the variable's current value as an update record.
    pub fn answer(&self, tag: u16) -> Result<UpdateRecord, ApplyError> {
        let value = self.checked(tag)?;
        Ok(UpdateRecord { tag, value })
    }

    /// Drain a batch of frames, applying updates and answering queries.
    ///
    /// Each malformed or unaddressable record is rejected, logged and
    /// counted, and processing continues with the next frame; only a
    /// truncated frame ends the batch early (no boundary is left to resume
    /// from).
    pub fn apply_batch(&mut self, bytes: &[u8]) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, message) in BatchDecoder::new(bytes).enumerate() {
            let result = message.map_err(RecordError::from).and_then(|message| {
                match message {
                    Message::Update(record) => {
                        self.apply(&record)?;
                        report.applied += 1;
                    }
                    Message::Query { tag } => {
                        report.answers.push(self.answer(tag)?);
                    }
                }
                Ok(())
            });
            if let Err(err) = result {
                log::warn!("rejected record {} in batch: {}", index, err);
                report.rejected.push((index, err));
            }
        }
        report
    }

    fn checked(&self, tag: u16) -> Result<Value, ApplyError> {
        self.get(tag).ok_or(ApplyError::UnknownTag { tag })
    }
}

fn mismatch(tag: u16, expected: TypeTag, found: Value) -> ApplyError {
    ApplyError::TypeMismatch {
        tag,
        expected,
        found: found.type_tag(),
    }
}
