// SMPP v3.4 codec primitives: network-byte-order integers, C-octet strings,
// and the fixed 16-byte PDU header shared by every command.

use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Upper bound on `command_length` to prevent memory exhaustion from a
/// hostile or corrupted peer.
pub const MAX_PDU_SIZE: u32 = 65536;

/// The fixed PDU preamble (Section 2.2.1): four big-endian u32 words.
///
/// `command_length` covers the entire PDU, header included. `command_status`
/// is meaningful only on response PDUs and is zero on requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode a header from the buffer, consuming exactly 16 bytes.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::InvalidCommandId(command_id_raw))?;
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        if command_length < Self::SIZE as u32 || command_length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode the header into the buffer.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id.into());
        buf.put_u32(self.command_status.into());
        buf.put_u32(self.sequence_number);
    }
}

/// Codec errors, classified so the session can pick the right
/// generic_nack status for malformed inbound traffic.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("incomplete PDU: need more data")]
    Incomplete,

    #[error("invalid command_id: {0:#010x}")]
    InvalidCommandId(u32),

    #[error("invalid PDU length {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("command_length {declared} disagrees with a frame of {actual} bytes")]
    LengthMismatch { declared: u32, actual: usize },

    #[error("PDU body ends inside mandatory field '{0}'")]
    TruncatedField(&'static str),

    #[error("trailing bytes do not form a complete optional parameter")]
    TruncatedTlv,

    #[error("field '{field}' takes {expected}, got {got}")]
    FieldType {
        field: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("field '{field}': {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// io::Error is not Clone; the copy keeps its kind and message. Cloning is
// what lets the session hand out its stored last-error more than once.
impl Clone for CodecError {
    fn clone(&self) -> Self {
        match self {
            CodecError::Incomplete => CodecError::Incomplete,
            CodecError::InvalidCommandId(id) => CodecError::InvalidCommandId(*id),
            CodecError::InvalidPduLength { length, min, max } => CodecError::InvalidPduLength {
                length: *length,
                min: *min,
                max: *max,
            },
            CodecError::LengthMismatch { declared, actual } => CodecError::LengthMismatch {
                declared: *declared,
                actual: *actual,
            },
            CodecError::TruncatedField(field) => CodecError::TruncatedField(*field),
            CodecError::TruncatedTlv => CodecError::TruncatedTlv,
            CodecError::FieldType {
                field,
                expected,
                got,
            } => CodecError::FieldType {
                field: *field,
                expected: *expected,
                got: *got,
            },
            CodecError::FieldValidation { field, reason } => CodecError::FieldValidation {
                field: *field,
                reason: reason.clone(),
            },
            CodecError::Io(e) => CodecError::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl CodecError {
    /// The generic_nack status a malformed inbound PDU earns, if the error
    /// is one the codec can classify. `None` means the error is not a
    /// peer-protocol problem (e.g. transport failure) and no nack is owed.
    pub fn nack_status(&self) -> Option<CommandStatus> {
        match self {
            CodecError::InvalidCommandId(_) => Some(CommandStatus::InvalidCommandId),
            CodecError::Incomplete
            | CodecError::InvalidPduLength { .. }
            | CodecError::LengthMismatch { .. }
            | CodecError::TruncatedField(_)
            | CodecError::TruncatedTlv => Some(CommandStatus::InvalidCommandLength),
            _ => None,
        }
    }
}

/// Read one byte; EOF is an `Incomplete`.
pub fn get_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Read a 16-bit big-endian integer.
pub fn get_u16(buf: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u16())
}

/// Read a 32-bit big-endian integer.
pub fn get_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u32())
}

/// Peek the next 32-bit big-endian integer without advancing the cursor.
pub fn peek_u32(buf: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::Incomplete);
    }
    let pos = buf.position();
    let value = buf.get_u32();
    buf.set_position(pos);
    Ok(value)
}

/// Read a C-octet string: bytes up to and including the next NUL. The NUL
/// is consumed but not stored. A buffer that ends before the NUL is a
/// truncated field.
pub fn get_cstring(
    buf: &mut Cursor<&[u8]>,
    field_name: &'static str,
) -> Result<Bytes, CodecError> {
    match buf.chunk().iter().position(|&b| b == 0) {
        Some(nul) => {
            let value = buf.copy_to_bytes(nul);
            buf.advance(1);
            Ok(value)
        }
        None => Err(CodecError::TruncatedField(field_name)),
    }
}

/// Write a C-octet string: the value followed by a NUL terminator. An empty
/// value is a lone NUL.
pub fn put_cstring(buf: &mut BytesMut, value: &[u8]) {
    buf.put_slice(value);
    buf.put_u8(0);
}
