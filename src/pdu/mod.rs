//! Schema-driven PDU model.
//!
//! A [`Pdu`] is a header plus a [`FieldStore`]. The registry declares the
//! ordered mandatory-field list per command, and a single parser/writer
//! pair walks that declaration, so adding a command is a table entry
//! rather than a new codec.

mod fields;
mod registry;

pub use fields::{FieldKind, FieldName, FieldStore, FieldValue};
pub use registry::{FieldSpec, field_kind, mandatory_fields};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

use crate::codec::{CodecError, PduHeader, get_cstring, put_cstring};
use crate::datatypes::{CommandId, CommandStatus, EsmClass, INTERFACE_VERSION_SMPP_34, Tlv};

/// One SMPP protocol data unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pdu {
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    body: FieldStore,
}

impl Pdu {
    /// A request PDU with OK status.
    pub fn new(command_id: CommandId, sequence_number: u32) -> Self {
        Self::with_status(command_id, CommandStatus::Ok, sequence_number)
    }

    /// A PDU with an explicit status, for responses and nacks.
    pub fn with_status(
        command_id: CommandId,
        command_status: CommandStatus,
        sequence_number: u32,
    ) -> Self {
        Self {
            command_id,
            command_status,
            sequence_number,
            body: FieldStore::new(),
        }
    }

    /// Validity predicate: responses are valid iff their status is OK;
    /// requests are always valid, as is generic_nack, whose status carries
    /// the offence rather than a verdict on the nack itself.
    pub fn is_ok(&self) -> bool {
        self.command_id == CommandId::GenericNack
            || !self.command_id.is_response()
            || self.command_status == CommandStatus::Ok
    }

    /// Assign a mandatory field, checking the value shape against this
    /// command's schema and the field's wire length limit. Assigning
    /// `short_message` keeps `sm_length` in step.
    pub fn set(
        &mut self,
        name: FieldName,
        value: impl Into<FieldValue>,
    ) -> Result<(), CodecError> {
        let value = value.into();
        let kind = field_kind(self.command_id, name).ok_or_else(|| CodecError::FieldValidation {
            field: name.as_str(),
            reason: format!("not a mandatory field of {:?}", self.command_id),
        })?;

        if !value.fits(kind) {
            return Err(CodecError::FieldType {
                field: name.as_str(),
                expected: match kind {
                    FieldKind::Byte => "a 1-byte integer",
                    FieldKind::CString | FieldKind::SmPayload => "a byte-string",
                },
                got: value.shape(),
            });
        }

        if let FieldValue::Text(text) = &value {
            if let Some(limit) = name.max_len() {
                if text.len() > limit {
                    return Err(CodecError::FieldValidation {
                        field: name.as_str(),
                        reason: format!(
                            "{} octets exceeds the {limit}-octet limit",
                            text.len()
                        ),
                    });
                }
            }
        }

        if name == FieldName::ShortMessage {
            if let FieldValue::Text(payload) = &value {
                self.body
                    .insert(FieldName::SmLength, FieldValue::Byte(payload.len() as u8));
            }
        }

        self.body.insert(name, value);
        Ok(())
    }

    pub fn field(&self, name: FieldName) -> Option<&FieldValue> {
        self.body.get(name)
    }

    pub fn byte(&self, name: FieldName) -> Option<u8> {
        self.body.byte(name)
    }

    pub fn text(&self, name: FieldName) -> Option<&Bytes> {
        self.body.text(name)
    }

    /// Add an optional parameter; a duplicate tag overwrites.
    pub fn set_tlv(&mut self, tlv: Tlv) {
        self.body.put_tlv(tlv);
    }

    pub fn tlv(&self, tag: u16) -> Option<&Tlv> {
        self.body.tlv(tag)
    }

    pub fn tlvs(&self) -> &[Tlv] {
        self.body.tlvs()
    }

    /// The decomposed esm_class (default when the field is unset).
    pub fn esm_class(&self) -> EsmClass {
        EsmClass::from_byte(self.body.byte(FieldName::EsmClass).unwrap_or(0))
    }

    /// The raw short-message payload, UDH included when present.
    pub fn short_message(&self) -> Option<&Bytes> {
        self.body.text(FieldName::ShortMessage)
    }

    /// The user data header: the first `udhl + 1` payload octets, present
    /// only when esm_class carries the UDHI flag.
    pub fn user_data_header(&self) -> Option<Bytes> {
        if !self.esm_class().has_udhi() {
            return None;
        }
        let payload = self.short_message()?;
        if payload.is_empty() {
            return None;
        }
        let udh_end = (payload[0] as usize + 1).min(payload.len());
        Some(payload.slice(..udh_end))
    }

    /// The message text with any user data header stripped.
    pub fn message_text(&self) -> Option<Bytes> {
        let payload = self.short_message()?;
        if !self.esm_class().has_udhi() || payload.is_empty() {
            return Some(payload.clone());
        }
        let udh_end = (payload[0] as usize + 1).min(payload.len());
        Some(payload.slice(udh_end..))
    }

    /// Parse one complete frame: header, mandatory body in declared order,
    /// then TLV triplets until the frame is exhausted.
    ///
    /// The frame ending exactly at a field boundary is legal and leaves the
    /// remaining declared fields unset; ending inside a field is a length
    /// error, as is a partial trailing TLV.
    pub fn parse(frame: &[u8]) -> Result<Self, CodecError> {
        let mut buf = Cursor::new(frame);
        let header = PduHeader::decode(&mut buf)?;

        if header.command_length as usize != frame.len() {
            return Err(CodecError::LengthMismatch {
                declared: header.command_length,
                actual: frame.len(),
            });
        }

        let mut body = FieldStore::new();
        for spec in mandatory_fields(header.command_id) {
            if !buf.has_remaining() {
                break;
            }
            match spec.kind {
                FieldKind::Byte => body.insert(spec.name, FieldValue::Byte(buf.get_u8())),
                FieldKind::CString => body.insert(
                    spec.name,
                    FieldValue::Text(get_cstring(&mut buf, spec.name.as_str())?),
                ),
                FieldKind::SmPayload => {
                    let declared = body.byte(FieldName::SmLength).unwrap_or(0) as usize;
                    if buf.remaining() < declared {
                        return Err(CodecError::TruncatedField(spec.name.as_str()));
                    }
                    body.insert(spec.name, FieldValue::Text(buf.copy_to_bytes(declared)));
                }
            }
        }

        while buf.has_remaining() {
            body.put_tlv(Tlv::decode(&mut buf)?);
        }

        Ok(Self {
            command_id: header.command_id,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            body,
        })
    }

    /// Serialize: mandatory fields in declared order (unset strings become
    /// a lone NUL, unset bytes 0x00), TLVs in insertion order, then the
    /// length word is patched with the final size.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(PduHeader::SIZE + 64);

        PduHeader {
            command_length: 0, // patched below
            command_id: self.command_id,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        }
        .encode(&mut buf);

        for spec in mandatory_fields(self.command_id) {
            match spec.kind {
                FieldKind::Byte => {
                    let value = if spec.name == FieldName::SmLength {
                        // sm_length always mirrors the stored payload
                        self.body
                            .text(FieldName::ShortMessage)
                            .map(|m| m.len() as u8)
                            .or_else(|| self.body.byte(FieldName::SmLength))
                            .unwrap_or(0)
                    } else {
                        self.body.byte(spec.name).unwrap_or(0)
                    };
                    buf.put_u8(value);
                }
                FieldKind::CString => {
                    let value = self.body.text(spec.name).map(|b| b.as_ref()).unwrap_or(b"");
                    put_cstring(&mut buf, value);
                }
                FieldKind::SmPayload => {
                    if let Some(payload) = self.body.text(spec.name) {
                        buf.put_slice(payload);
                    }
                }
            }
        }

        for tlv in self.body.tlvs() {
            tlv.encode(&mut buf);
        }

        let length = buf.len() as u32;
        buf[0..4].copy_from_slice(&length.to_be_bytes());
        buf.freeze()
    }

    // --- constructors for the common operations ---

    /// A bind request for the given bind command, with protocol defaults
    /// for the optional parameters. Over-length credentials are rejected
    /// here, before they can reach the socket.
    pub fn bind(
        command_id: CommandId,
        system_id: &str,
        password: &str,
    ) -> Result<Self, CodecError> {
        let mut pdu = Self::new(command_id, 0);
        pdu.set(FieldName::SystemId, system_id)?;
        pdu.set(FieldName::Password, password)?;
        pdu.set(FieldName::SystemType, "")?;
        pdu.set(FieldName::InterfaceVersion, INTERFACE_VERSION_SMPP_34)?;
        pdu.set(FieldName::AddrTon, 0u8)?;
        pdu.set(FieldName::AddrNpi, 0u8)?;
        pdu.set(FieldName::AddressRange, "")?;
        Ok(pdu)
    }

    /// A submit_sm carrying `text` from `source` to `destination`, with
    /// default service type, numbering and coding. Fails if the message
    /// exceeds the short-message limit.
    pub fn submit_sm(source: &str, destination: &str, text: &[u8]) -> Result<Self, CodecError> {
        let mut pdu = Self::new(CommandId::SubmitSm, 0);
        pdu.fill_sm_defaults(source, destination);
        pdu.set(FieldName::ShortMessage, text)?;
        Ok(pdu)
    }

    /// A deliver_sm, the mirror image of [`Pdu::submit_sm`].
    pub fn deliver_sm(source: &str, destination: &str, text: &[u8]) -> Result<Self, CodecError> {
        let mut pdu = Self::new(CommandId::DeliverSm, 0);
        pdu.fill_sm_defaults(source, destination);
        pdu.set(FieldName::ShortMessage, text)?;
        Ok(pdu)
    }

    fn fill_sm_defaults(&mut self, source: &str, destination: &str) {
        self.body
            .insert(FieldName::ServiceType, FieldValue::from(""));
        self.body.insert(FieldName::SourceAddrTon, FieldValue::Byte(0));
        self.body.insert(FieldName::SourceAddrNpi, FieldValue::Byte(0));
        self.body
            .insert(FieldName::SourceAddr, FieldValue::from(source));
        self.body.insert(FieldName::DestAddrTon, FieldValue::Byte(0));
        self.body.insert(FieldName::DestAddrNpi, FieldValue::Byte(0));
        self.body
            .insert(FieldName::DestinationAddr, FieldValue::from(destination));
        self.body.insert(FieldName::EsmClass, FieldValue::Byte(0));
        self.body.insert(FieldName::ProtocolId, FieldValue::Byte(0));
        self.body.insert(FieldName::PriorityFlag, FieldValue::Byte(0));
        self.body
            .insert(FieldName::ScheduleDeliveryTime, FieldValue::from(""));
        self.body
            .insert(FieldName::ValidityPeriod, FieldValue::from(""));
        self.body
            .insert(FieldName::RegisteredDelivery, FieldValue::Byte(0));
        self.body
            .insert(FieldName::ReplaceIfPresentFlag, FieldValue::Byte(0));
        self.body.insert(FieldName::DataCoding, FieldValue::Byte(0));
        self.body
            .insert(FieldName::SmDefaultMsgId, FieldValue::Byte(0));
    }

    /// A query_sm for a previously submitted message.
    pub fn query_sm(message_id: &str, source: &str) -> Self {
        let mut pdu = Self::new(CommandId::QuerySm, 0);
        pdu.body
            .insert(FieldName::MessageId, FieldValue::from(message_id));
        pdu.body.insert(FieldName::SourceAddrTon, FieldValue::Byte(0));
        pdu.body.insert(FieldName::SourceAddrNpi, FieldValue::Byte(0));
        pdu.body
            .insert(FieldName::SourceAddr, FieldValue::from(source));
        pdu
    }

    pub fn enquire_link(sequence_number: u32) -> Self {
        Self::new(CommandId::EnquireLink, sequence_number)
    }

    pub fn enquire_link_resp(sequence_number: u32) -> Self {
        Self::with_status(CommandId::EnquireLinkResp, CommandStatus::Ok, sequence_number)
    }

    pub fn unbind(sequence_number: u32) -> Self {
        Self::new(CommandId::Unbind, sequence_number)
    }

    pub fn unbind_resp(sequence_number: u32) -> Self {
        Self::with_status(CommandId::UnbindResp, CommandStatus::Ok, sequence_number)
    }

    /// A deliver_sm_resp echoing the delivery's sequence number.
    pub fn deliver_sm_resp(sequence_number: u32) -> Self {
        let mut pdu =
            Self::with_status(CommandId::DeliverSmResp, CommandStatus::Ok, sequence_number);
        pdu.body.insert(FieldName::MessageId, FieldValue::from(""));
        pdu
    }

    /// A generic_nack naming the offence; malformed-input nacks carry
    /// sequence 0 because the offending sequence cannot be trusted.
    pub fn generic_nack(status: CommandStatus, sequence_number: u32) -> Self {
        Self::with_status(CommandId::GenericNack, status, sequence_number)
    }
}
