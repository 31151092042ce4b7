// Per-command mandatory-field declarations. One ordered table per PDU
// family drives both the body parser and the writer, so the two can never
// disagree about layout.

use crate::datatypes::CommandId;
use crate::pdu::fields::{FieldKind, FieldName};

/// One slot in a PDU body: a field name and its wire shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: FieldName,
    pub kind: FieldKind,
}

const fn byte(name: FieldName) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Byte,
    }
}

const fn cstring(name: FieldName) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::CString,
    }
}

/// bind_transmitter / bind_receiver / bind_transceiver (Section 4.1.1)
const BIND: &[FieldSpec] = &[
    cstring(FieldName::SystemId),
    cstring(FieldName::Password),
    cstring(FieldName::SystemType),
    byte(FieldName::InterfaceVersion),
    byte(FieldName::AddrTon),
    byte(FieldName::AddrNpi),
    cstring(FieldName::AddressRange),
];

/// bind_*_resp (Section 4.1.2)
const BIND_RESP: &[FieldSpec] = &[cstring(FieldName::SystemId)];

/// submit_sm (Section 4.4.1) and deliver_sm (Section 4.6.1) share a body.
const SM: &[FieldSpec] = &[
    cstring(FieldName::ServiceType),
    byte(FieldName::SourceAddrTon),
    byte(FieldName::SourceAddrNpi),
    cstring(FieldName::SourceAddr),
    byte(FieldName::DestAddrTon),
    byte(FieldName::DestAddrNpi),
    cstring(FieldName::DestinationAddr),
    byte(FieldName::EsmClass),
    byte(FieldName::ProtocolId),
    byte(FieldName::PriorityFlag),
    cstring(FieldName::ScheduleDeliveryTime),
    cstring(FieldName::ValidityPeriod),
    byte(FieldName::RegisteredDelivery),
    byte(FieldName::ReplaceIfPresentFlag),
    byte(FieldName::DataCoding),
    byte(FieldName::SmDefaultMsgId),
    byte(FieldName::SmLength),
    FieldSpec {
        name: FieldName::ShortMessage,
        kind: FieldKind::SmPayload,
    },
];

/// submit_sm_resp (Section 4.4.2) and deliver_sm_resp (Section 4.6.2)
const SM_RESP: &[FieldSpec] = &[cstring(FieldName::MessageId)];

/// query_sm (Section 4.8.1)
const QUERY_SM: &[FieldSpec] = &[
    cstring(FieldName::MessageId),
    byte(FieldName::SourceAddrTon),
    byte(FieldName::SourceAddrNpi),
    cstring(FieldName::SourceAddr),
];

/// query_sm_resp (Section 4.8.2)
const QUERY_SM_RESP: &[FieldSpec] = &[
    cstring(FieldName::MessageId),
    cstring(FieldName::FinalDate),
    byte(FieldName::MessageState),
    byte(FieldName::ErrorCode),
];

/// enquire_link, unbind, their responses, generic_nack: header only.
const EMPTY: &[FieldSpec] = &[];

/// The ordered mandatory-field list for a command.
pub fn mandatory_fields(command_id: CommandId) -> &'static [FieldSpec] {
    match command_id {
        CommandId::BindTransmitter | CommandId::BindReceiver | CommandId::BindTransceiver => BIND,
        CommandId::BindTransmitterResp
        | CommandId::BindReceiverResp
        | CommandId::BindTransceiverResp => BIND_RESP,
        CommandId::SubmitSm | CommandId::DeliverSm => SM,
        CommandId::SubmitSmResp | CommandId::DeliverSmResp => SM_RESP,
        CommandId::QuerySm => QUERY_SM,
        CommandId::QuerySmResp => QUERY_SM_RESP,
        CommandId::EnquireLink
        | CommandId::EnquireLinkResp
        | CommandId::Unbind
        | CommandId::UnbindResp
        | CommandId::GenericNack => EMPTY,
    }
}

/// The declared shape of a field within a command's body, if the command
/// carries it at all.
pub fn field_kind(command_id: CommandId, name: FieldName) -> Option<FieldKind> {
    mandatory_fields(command_id)
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.kind)
}
