// ABOUTME: Defines the SMPP v3.4 command identifiers this client exchanges
// ABOUTME: Implements response-bit handling and rejection of reserved ids

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// SMPP v3.4 command identifiers (Section 5.1.2.1), restricted to the set
/// an ESME session exchanges.
///
/// Bit 31 is the response indicator: a response PDU carries the request's
/// command_id with the top bit set. Values outside this set are reserved or
/// belong to operations this client does not implement; they fail
/// conversion, and the session answers them with a generic_nack carrying
/// ESME_RINVCMDID.
#[derive(TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// generic_nack (Section 4.3.1), the error reply for unparseable PDUs
    GenericNack = 0x8000_0000,

    /// bind_receiver (Section 4.1.1)
    BindReceiver = 0x0000_0001,
    /// bind_receiver_resp (Section 4.1.2)
    BindReceiverResp = 0x8000_0001,
    /// bind_transmitter (Section 4.1.1)
    BindTransmitter = 0x0000_0002,
    /// bind_transmitter_resp (Section 4.1.2)
    BindTransmitterResp = 0x8000_0002,

    /// query_sm (Section 4.8.1)
    QuerySm = 0x0000_0003,
    /// query_sm_resp (Section 4.8.2)
    QuerySmResp = 0x8000_0003,

    /// submit_sm (Section 4.4.1)
    SubmitSm = 0x0000_0004,
    /// submit_sm_resp (Section 4.4.2)
    SubmitSmResp = 0x8000_0004,

    /// deliver_sm (Section 4.6.1)
    DeliverSm = 0x0000_0005,
    /// deliver_sm_resp (Section 4.6.2)
    DeliverSmResp = 0x8000_0005,

    /// unbind (Section 4.2.1)
    Unbind = 0x0000_0006,
    /// unbind_resp (Section 4.2.2)
    UnbindResp = 0x8000_0006,

    /// bind_transceiver (Section 4.1.5)
    BindTransceiver = 0x0000_0009,
    /// bind_transceiver_resp (Section 4.1.6)
    BindTransceiverResp = 0x8000_0009,

    /// enquire_link (Section 4.11.1), the application-layer keep-alive
    EnquireLink = 0x0000_0015,
    /// enquire_link_resp (Section 4.11.2)
    EnquireLinkResp = 0x8000_0015,
}

impl CommandId {
    /// Whether this command_id names a response PDU (bit 31 set).
    pub fn is_response(self) -> bool {
        u32::from(self) & 0x8000_0000 != 0
    }
}
