// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Update wire protocol.
//!
//! Every message travels as one length-prefixed frame, little-endian
//! throughout:
//!
//! ```text
//! frame = [len: u8] body                  len = body bytes, 3..=7
//! body  = [tag: u16 LE] [disc: u8] value
//! value = Bool  -> 1 byte (0x00 / 0x01)
//!         Int   -> i32 LE (4 bytes)
//!         Float -> f32 LE (4 bytes, IEEE-754 bits)
//! ```
//!
//! Discriminant `0x00` carries no value bytes and is a query: the receiver
//! answers with an update frame holding the variable's current value. A batch
//! is a bare concatenation of frames. The length prefix is what lets a reader
//! skip a frame whose body it cannot make sense of and still find the next
//! one; only a frame cut short by the end of the buffer is unrecoverable.
//!
//! Any client able to produce this byte layout can mutate the store without
//! being compiled against the schema, given out-of-band knowledge of the tag
//! assignment.

use crate::types::{TypeTag, Value};
use std::fmt;

/// Discriminant for a value-less query frame.
const QUERY_DISC: u8 = 0x00;

/// Body bytes ahead of the value: tag (2) + discriminant (1).
const BODY_HEADER: usize = 3;

/// A single addressed mutation: tag plus typed value. The type discriminant
/// travels with the value and must match the schema's declaration when
/// applied; it is never coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRecord {
    pub tag: u16,
    pub value: Value,
}

impl UpdateRecord {
    pub const fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }
}

/// One wire message: an update, or a query for a variable's current value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Update(UpdateRecord),
    Query { tag: u16 },
}

impl Message {
    /// Encode into a single framed message.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Update(record) => {
                let type_tag = record.type_tag();
                let mut buf = Vec::with_capacity(1 + BODY_HEADER + type_tag.value_size());
                buf.push((BODY_HEADER + type_tag.value_size()) as u8);
                buf.extend_from_slice(&record.tag.to_le_bytes());
                buf.push(type_tag.discriminant());
                match record.value {
                    Value::Bool(b) => buf.push(u8::from(b)),
                    Value::Int(i) => buf.extend_from_slice(&i.to_le_bytes()),
                    Value::Float(x) => buf.extend_from_slice(&x.to_le_bytes()),
                }
                buf
            }
            Message::Query { tag } => {
                let mut buf = Vec::with_capacity(1 + BODY_HEADER);
                buf.push(BODY_HEADER as u8);
                buf.extend_from_slice(&tag.to_le_bytes());
                buf.push(QUERY_DISC);
                buf
            }
        }
    }

    pub fn tag(&self) -> u16 {
        match self {
            Message::Update(record) => record.tag,
            Message::Query { tag } => *tag,
        }
    }
}

/// Per-record decode failures. All are recoverable by the caller: a bad
/// record is rejected without blocking later well-formed records, except a
/// truncated one, after which no frame boundary is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    TruncatedRecord { expected: usize, got: usize },
    UnknownTypeDiscriminant { disc: u8 },
    LengthMismatch { expected: usize, got: usize },
    InvalidBool { byte: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedRecord { expected, got } => {
                write!(f, "truncated record: expected {} bytes, got {}", expected, got)
            }
            DecodeError::UnknownTypeDiscriminant { disc } => {
                write!(f, "unknown type discriminant {:#04x}", disc)
            }
            DecodeError::LengthMismatch { expected, got } => write!(
                f,
                "record length {} does not match its type (expected {})",
                got, expected
            ),
            DecodeError::InvalidBool { byte } => {
                write!(f, "bool value byte {:#04x} is neither 0 nor 1", byte)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl DecodeError {
    /// True when the byte stream ended mid-frame and no further frame
    /// boundary can be trusted.
    pub const fn is_truncation(&self) -> bool {
        matches!(self, DecodeError::TruncatedRecord { .. })
    }
}

/// Decode one frame from the front of `bytes`. Returns the message and the
/// number of bytes consumed.
pub fn decode(bytes: &[u8]) -> Result<(Message, usize), DecodeError> {
    let &len = bytes.first().ok_or(DecodeError::TruncatedRecord {
        expected: 1,
        got: 0,
    })?;
    let len = usize::from(len);
    let frame_len = 1 + len;
    if bytes.len() < frame_len {
        return Err(DecodeError::TruncatedRecord {
            expected: frame_len,
            got: bytes.len(),
        });
    }
    let body = &bytes[1..frame_len];

    if len < BODY_HEADER {
        return Err(DecodeError::LengthMismatch {
            expected: BODY_HEADER,
            got: len,
        });
    }
    let tag = u16::from_le_bytes([body[0], body[1]]);
    let disc = body[2];

    if disc == QUERY_DISC {
        if len != BODY_HEADER {
            return Err(DecodeError::LengthMismatch {
                expected: BODY_HEADER,
                got: len,
            });
        }
        return Ok((Message::Query { tag }, frame_len));
    }

    let type_tag = TypeTag::from_discriminant(disc)
        .ok_or(DecodeError::UnknownTypeDiscriminant { disc })?;
    if len != BODY_HEADER + type_tag.value_size() {
        return Err(DecodeError::LengthMismatch {
            expected: BODY_HEADER + type_tag.value_size(),
            got: len,
        });
    }

    let value = &body[BODY_HEADER..];
    let value = match type_tag {
        TypeTag::Bool => match value[0] {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            byte => return Err(DecodeError::InvalidBool { byte }),
        },
        TypeTag::Int => Value::Int(i32::from_le_bytes([value[0], value[1], value[2], value[3]])),
        TypeTag::Float => {
            Value::Float(f32::from_le_bytes([value[0], value[1], value[2], value[3]]))
        }
    };

    Ok((Message::Update(UpdateRecord { tag, value }), frame_len))
}

/// Encode a batch: a bare concatenation of frames.
pub fn encode_batch<'a>(messages: impl IntoIterator<Item = &'a Message>) -> Vec<u8> {
    let mut buf = Vec::new();
    for message in messages {
        buf.extend_from_slice(&message.encode());
    }
    buf
}

/// Iterator over the frames of a batch.
///
/// A frame with a malformed body is yielded as an error and skipped; the
/// following frames still decode. A truncated frame is yielded once and ends
/// the iteration.
pub struct BatchDecoder<'a> {
    bytes: &'a [u8],
    offset: usize,
    halted: bool,
}

impl<'a> BatchDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            halted: false,
        }
    }

    /// Offset of the next undecoded byte.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for BatchDecoder<'_> {
    type Item = Result<Message, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.offset >= self.bytes.len() {
            return None;
        }
        match decode(&self.bytes[self.offset..]) {
            Ok((message, consumed)) => {
                self.offset += consumed;
                Some(Ok(message))
            }
            Err(err) if err.is_truncation() => {
                self.halted = true;
                Some(Err(err))
            }
            Err(err) => {
                // The length prefix was intact, so the next frame boundary is
                // still known; skip this frame only.
                self.offset += 1 + usize::from(self.bytes[self.offset]);
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_byte_layout() {
        let record = UpdateRecord {
            tag: 0x0102,
            value: Value::Int(-2),
        };
        let bytes = Message::Update(record).encode();
        assert_eq!(bytes, [7, 0x02, 0x01, 0x02, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_bool_byte_layout() {
        let bytes = Message::Update(UpdateRecord {
            tag: 3,
            value: Value::Bool(true),
        })
        .encode();
        assert_eq!(bytes, [4, 0x03, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_query_byte_layout() {
        let bytes = Message::Query { tag: 9 }.encode();
        assert_eq!(bytes, [3, 0x09, 0x00, 0x00]);
    }

    #[test]
    fn test_roundtrip_every_type() {
        let records = [
            UpdateRecord {
                tag: 0,
                value: Value::Bool(false),
            },
            UpdateRecord {
                tag: 7,
                value: Value::Bool(true),
            },
            UpdateRecord {
                tag: 41,
                value: Value::Int(i32::MIN),
            },
            UpdateRecord {
                tag: u16::MAX,
                value: Value::Float(-0.001),
            },
        ];
        for record in records {
            let bytes = Message::Update(record).encode();
            let (decoded, consumed) = decode(&bytes).expect("frame should decode");
            assert_eq!(consumed, bytes.len());
            assert_eq!(decoded, Message::Update(record));
        }
    }

    #[test]
    fn test_roundtrip_query() {
        let bytes = Message::Query { tag: 12 }.encode();
        let (decoded, consumed) = decode(&bytes).expect("frame should decode");
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, Message::Query { tag: 12 });
    }

    #[test]
    fn test_decode_truncated_frame() {
        let mut bytes = Message::Update(UpdateRecord {
            tag: 1,
            value: Value::Int(5),
        })
        .encode();
        bytes.truncate(4);

        let err = decode(&bytes).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedRecord {
                expected: 8,
                got: 4
            }
        );
        assert!(err.is_truncation());
    }

    #[test]
    fn test_decode_unknown_discriminant() {
        // len=4, tag=1, disc=0x07, one value byte
        let bytes = [4, 0x01, 0x00, 0x07, 0x00];
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DecodeError::UnknownTypeDiscriminant { disc: 0x07 }
        );
    }

    #[test]
    fn test_decode_length_disagrees_with_type() {
        // Bool discriminant but a 4-byte value.
        let bytes = [7, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DecodeError::LengthMismatch {
                expected: 4,
                got: 7
            }
        );
    }

    #[test]
    fn test_decode_rejects_garbage_bool() {
        let bytes = [4, 0x00, 0x00, 0x01, 0x02];
        assert_eq!(
            decode(&bytes).unwrap_err(),
            DecodeError::InvalidBool { byte: 0x02 }
        );
    }

    #[test]
    fn test_batch_skips_bad_frame_and_continues() {
        let good = Message::Update(UpdateRecord {
            tag: 2,
            value: Value::Float(1.5),
        });
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&[4, 0x01, 0x00, 0x07, 0x00]); // unknown disc
        bytes.extend_from_slice(&good.encode());

        let decoded: Vec<_> = BatchDecoder::new(&bytes).collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(
            decoded[0],
            Err(DecodeError::UnknownTypeDiscriminant { disc: 0x07 })
        );
        assert_eq!(decoded[1], Ok(good));
    }

    #[test]
    fn test_batch_halts_on_truncation() {
        let good = Message::Query { tag: 1 };
        let mut bytes = good.encode();
        bytes.extend_from_slice(&[7, 0x01, 0x00]); // frame cut short

        let decoded: Vec<_> = BatchDecoder::new(&bytes).collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], Ok(good));
        assert!(matches!(
            decoded[1],
            Err(DecodeError::TruncatedRecord { .. })
        ));
    }

    #[test]
    fn test_encode_batch_concatenates_frames() {
        let messages = [
            Message::Update(UpdateRecord {
                tag: 0,
                value: Value::Bool(true),
            }),
            Message::Query { tag: 1 },
        ];
        let bytes = encode_batch(&messages);

        let decoded: Vec<_> = BatchDecoder::new(&bytes)
            .collect::<Result<Vec<_>, _>>()
            .expect("batch should decode");
        assert_eq!(decoded, messages);
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        assert_eq!(BatchDecoder::new(&[]).count(), 0);
    }
}
