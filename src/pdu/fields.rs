// Typed storage for PDU mandatory fields and optional parameters.
//
// A mandatory field is either a 1-byte integer (TON, NPI, flags, codings)
// or a NUL-terminated C-octet string stored without its terminator. Which
// fields a PDU carries, and in what order, is declared by the registry.

use bytes::Bytes;

use crate::datatypes::{
    MAX_PASSWORD_LENGTH, MAX_SHORT_MESSAGE_LENGTH, MAX_SYSTEM_ID_LENGTH, Tlv,
};

/// Names of every mandatory field the recognized PDU set uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldName {
    // bind operations
    SystemId,
    Password,
    SystemType,
    InterfaceVersion,
    AddrTon,
    AddrNpi,
    AddressRange,
    // short-message operations
    ServiceType,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    DestAddrTon,
    DestAddrNpi,
    DestinationAddr,
    EsmClass,
    ProtocolId,
    PriorityFlag,
    ScheduleDeliveryTime,
    ValidityPeriod,
    RegisteredDelivery,
    ReplaceIfPresentFlag,
    DataCoding,
    SmDefaultMsgId,
    SmLength,
    ShortMessage,
    // responses and queries
    MessageId,
    FinalDate,
    MessageState,
    ErrorCode,
}

impl FieldName {
    /// The field name as it appears in the protocol specification.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::SystemId => "system_id",
            FieldName::Password => "password",
            FieldName::SystemType => "system_type",
            FieldName::InterfaceVersion => "interface_version",
            FieldName::AddrTon => "addr_ton",
            FieldName::AddrNpi => "addr_npi",
            FieldName::AddressRange => "address_range",
            FieldName::ServiceType => "service_type",
            FieldName::SourceAddrTon => "source_addr_ton",
            FieldName::SourceAddrNpi => "source_addr_npi",
            FieldName::SourceAddr => "source_addr",
            FieldName::DestAddrTon => "dest_addr_ton",
            FieldName::DestAddrNpi => "dest_addr_npi",
            FieldName::DestinationAddr => "destination_addr",
            FieldName::EsmClass => "esm_class",
            FieldName::ProtocolId => "protocol_id",
            FieldName::PriorityFlag => "priority_flag",
            FieldName::ScheduleDeliveryTime => "schedule_delivery_time",
            FieldName::ValidityPeriod => "validity_period",
            FieldName::RegisteredDelivery => "registered_delivery",
            FieldName::ReplaceIfPresentFlag => "replace_if_present_flag",
            FieldName::DataCoding => "data_coding",
            FieldName::SmDefaultMsgId => "sm_default_msg_id",
            FieldName::SmLength => "sm_length",
            FieldName::ShortMessage => "short_message",
            FieldName::MessageId => "message_id",
            FieldName::FinalDate => "final_date",
            FieldName::MessageState => "message_state",
            FieldName::ErrorCode => "error_code",
        }
    }

    /// Wire length limit for the variable-length fields that carry one
    /// (Section 4.1 / 5.2), excluding the NUL terminator. Assignment
    /// rejects longer values before they reach the socket.
    pub fn max_len(self) -> Option<usize> {
        match self {
            FieldName::SystemId => Some(MAX_SYSTEM_ID_LENGTH),
            FieldName::Password => Some(MAX_PASSWORD_LENGTH),
            FieldName::ShortMessage => Some(MAX_SHORT_MESSAGE_LENGTH),
            _ => None,
        }
    }
}

/// Wire shape of a mandatory field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// One octet, fixed width
    Byte,
    /// NUL-terminated C-octet string, variable width
    CString,
    /// Octet payload whose length is the preceding sm_length field
    SmPayload,
}

/// A mandatory field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Byte(u8),
    Text(Bytes),
}

impl FieldValue {
    /// What this value is, for type-mismatch diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Byte(_) => "a 1-byte integer",
            FieldValue::Text(_) => "a byte-string",
        }
    }

    /// Whether this value fits a slot of the given kind.
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Byte(_), FieldKind::Byte)
                | (FieldValue::Text(_), FieldKind::CString)
                | (FieldValue::Text(_), FieldKind::SmPayload)
        )
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::Byte(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        FieldValue::Text(Bytes::copy_from_slice(value))
    }
}

/// Holder for a PDU body: mandatory fields plus the unordered TLV bag.
///
/// TLVs are keyed by tag with last-write-wins replacement; insertion order
/// is preserved for serialization but carries no protocol meaning, which is
/// why equality treats the bag as a set.
#[derive(Clone, Debug, Default)]
pub struct FieldStore {
    values: Vec<(FieldName, FieldValue)>,
    tlvs: Vec<Tlv>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, name: FieldName, value: FieldValue) {
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: FieldName) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn byte(&self, name: FieldName) -> Option<u8> {
        match self.get(name) {
            Some(FieldValue::Byte(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, name: FieldName) -> Option<&Bytes> {
        match self.get(name) {
            Some(FieldValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn is_set(&self, name: FieldName) -> bool {
        self.get(name).is_some()
    }

    /// Add an optional parameter. A TLV with the same tag is overwritten
    /// in place.
    pub fn put_tlv(&mut self, tlv: Tlv) {
        match self.tlvs.iter_mut().find(|t| t.tag == tlv.tag) {
            Some(slot) => *slot = tlv,
            None => self.tlvs.push(tlv),
        }
    }

    pub fn tlv(&self, tag: u16) -> Option<&Tlv> {
        self.tlvs.iter().find(|t| t.tag == tag)
    }

    pub fn tlvs(&self) -> &[Tlv] {
        &self.tlvs
    }
}

impl PartialEq for FieldStore {
    fn eq(&self, other: &Self) -> bool {
        // Field and TLV bags compare as maps: order is observable on the
        // wire but not semantic.
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .all(|(name, value)| other.get(*name) == Some(value))
            && self.tlvs.len() == other.tlvs.len()
            && self.tlvs.iter().all(|tlv| other.tlv(tlv.tag) == Some(tlv))
    }
}

impl Eq for FieldStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces() {
        let mut store = FieldStore::new();
        store.insert(FieldName::SystemId, "first".into());
        store.insert(FieldName::SystemId, "second".into());
        assert_eq!(store.text(FieldName::SystemId).unwrap().as_ref(), b"second");
    }

    #[test]
    fn typed_accessors_do_not_cross() {
        let mut store = FieldStore::new();
        store.insert(FieldName::EsmClass, FieldValue::Byte(0x40));
        assert_eq!(store.byte(FieldName::EsmClass), Some(0x40));
        assert!(store.text(FieldName::EsmClass).is_none());
    }

    #[test]
    fn duplicate_tlv_tag_last_wins() {
        let mut store = FieldStore::new();
        store.put_tlv(Tlv::new(0x0204, &[0x00, 0x01][..]));
        store.put_tlv(Tlv::new(0x020A, &[0x1F, 0x90][..]));
        store.put_tlv(Tlv::new(0x0204, &[0x00, 0x02][..]));

        assert_eq!(store.tlvs().len(), 2);
        assert_eq!(store.tlv(0x0204).unwrap().value.as_ref(), &[0x00, 0x02]);
        // replacement keeps the original slot
        assert_eq!(store.tlvs()[0].tag, 0x0204);
    }

    #[test]
    fn equality_ignores_order() {
        let mut a = FieldStore::new();
        a.insert(FieldName::SourceAddr, "1000".into());
        a.insert(FieldName::EsmClass, FieldValue::Byte(0));
        a.put_tlv(Tlv::new(1, &[1][..]));
        a.put_tlv(Tlv::new(2, &[2][..]));

        let mut b = FieldStore::new();
        b.put_tlv(Tlv::new(2, &[2][..]));
        b.put_tlv(Tlv::new(1, &[1][..]));
        b.insert(FieldName::EsmClass, FieldValue::Byte(0));
        b.insert(FieldName::SourceAddr, "1000".into());

        assert_eq!(a, b);
    }

    #[test]
    fn length_limits_cover_credentials_and_payload() {
        assert_eq!(FieldName::SystemId.max_len(), Some(15));
        assert_eq!(FieldName::Password.max_len(), Some(8));
        assert_eq!(FieldName::ShortMessage.max_len(), Some(254));
        assert_eq!(FieldName::SourceAddr.max_len(), None);
    }

    #[test]
    fn value_shape_check() {
        assert!(FieldValue::Byte(1).fits(FieldKind::Byte));
        assert!(!FieldValue::Byte(1).fits(FieldKind::CString));
        assert!(FieldValue::from("x").fits(FieldKind::CString));
        assert!(FieldValue::from("x").fits(FieldKind::SmPayload));
        assert!(!FieldValue::from("x").fits(FieldKind::Byte));
    }
}
