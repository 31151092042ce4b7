// ABOUTME: Defines SMPP v3.4 command status codes per specification Section 5.1.3
// ABOUTME: Provides status descriptions and a catch-all for vendor-specific codes

use num_enum::{FromPrimitive, IntoPrimitive};

/// SMPP v3.4 command status codes (Section 5.1.3).
///
/// Zero means success. Requests always carry zero; only responses carry a
/// meaningful status (generic_nack uses it to name the offence). Codes not
/// in the table fall into `Other` so a response with a vendor-specific
/// status still parses.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// No error
    Ok = 0x0000_0000,
    /// Message length is invalid
    InvalidMsgLength = 0x0000_0001,
    /// Command length is invalid
    InvalidCommandLength = 0x0000_0002,
    /// Invalid command id
    InvalidCommandId = 0x0000_0003,
    /// Incorrect bind status for the given command
    IncorrectBindStatus = 0x0000_0004,
    /// ESME already in bound state
    AlreadyBound = 0x0000_0005,
    /// Invalid priority flag
    InvalidPriorityFlag = 0x0000_0006,
    /// Invalid registered-delivery flag
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    /// System error on the SMSC side
    SystemError = 0x0000_0008,
    /// Invalid source address
    InvalidSourceAddress = 0x0000_000A,
    /// Invalid destination address
    InvalidDestinationAddress = 0x0000_000B,
    /// Message id invalid or unknown
    InvalidMessageId = 0x0000_000C,
    /// Bind failed
    BindFailed = 0x0000_000D,
    /// Invalid password
    InvalidPassword = 0x0000_000E,
    /// Invalid system id
    InvalidSystemId = 0x0000_000F,
    /// cancel_sm request failed
    CancelSmFailed = 0x0000_0011,
    /// replace_sm request failed
    ReplaceSmFailed = 0x0000_0013,
    /// Message queue full
    MessageQueueFull = 0x0000_0014,
    /// Invalid service type
    InvalidServiceType = 0x0000_0015,
    /// Invalid esm_class field data
    InvalidEsmClass = 0x0000_0043,
    /// Submit to distribution list failed
    SubmitToDistributionListFailed = 0x0000_0044,
    /// submit_sm or submit_multi failed
    SubmitFailed = 0x0000_0045,
    /// Invalid source-address TON
    InvalidSourceTon = 0x0000_0048,
    /// Invalid source-address NPI
    InvalidSourceNpi = 0x0000_0049,
    /// Invalid destination-address TON
    InvalidDestinationTon = 0x0000_0050,
    /// Invalid destination-address NPI
    InvalidDestinationNpi = 0x0000_0051,
    /// Invalid system_type
    InvalidSystemType = 0x0000_0053,
    /// Invalid replace_if_present flag
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    /// Invalid number of messages
    InvalidNumberOfMessages = 0x0000_0055,
    /// Throttling error: ESME exceeded its allowed message limits
    Throttled = 0x0000_0058,
    /// Invalid scheduled delivery time
    InvalidScheduledDeliveryTime = 0x0000_0061,
    /// Invalid validity-period value
    InvalidValidityPeriod = 0x0000_0062,
    /// Predefined message invalid or not found
    InvalidPredefinedMessage = 0x0000_0063,
    /// ESME receiver temporary application error
    ReceiverTemporaryError = 0x0000_0064,
    /// ESME receiver permanent application error
    ReceiverPermanentError = 0x0000_0065,
    /// ESME receiver reject-message error
    ReceiverRejectError = 0x0000_0066,
    /// query_sm request failed
    QuerySmFailed = 0x0000_0067,
    /// Error in the optional-parameter section of the PDU body
    InvalidOptionalPart = 0x0000_00C0,
    /// Optional parameter not allowed
    OptionalParameterNotAllowed = 0x0000_00C1,
    /// Invalid parameter length
    InvalidParameterLength = 0x0000_00C2,
    /// Expected optional parameter missing
    MissingOptionalParameter = 0x0000_00C3,
    /// Invalid optional-parameter value
    InvalidOptionalParameterValue = 0x0000_00C4,
    /// Delivery failure (used by data_sm_resp)
    DeliveryFailure = 0x0000_00FE,
    /// Unknown error
    UnknownError = 0x0000_00FF,
    /// Vendor-specific or reserved code
    #[num_enum(catch_all)]
    Other(u32),
}

impl CommandStatus {
    /// Short human-readable description, as the status strings appear in
    /// bind failures and logs.
    pub fn description(self) -> &'static str {
        match self {
            CommandStatus::Ok => "No Error",
            CommandStatus::InvalidMsgLength => "Message Length is invalid",
            CommandStatus::InvalidCommandLength => "Command Length is invalid",
            CommandStatus::InvalidCommandId => "Invalid Command ID",
            CommandStatus::IncorrectBindStatus => "Incorrect BIND Status for given command",
            CommandStatus::AlreadyBound => "ESME Already in Bound State",
            CommandStatus::InvalidPriorityFlag => "Invalid Priority Flag",
            CommandStatus::InvalidRegisteredDeliveryFlag => "Invalid Registered Delivery Flag",
            CommandStatus::SystemError => "System Error",
            CommandStatus::InvalidSourceAddress => "Invalid Source Address",
            CommandStatus::InvalidDestinationAddress => "Invalid Dest Addr",
            CommandStatus::InvalidMessageId => "Message ID is invalid",
            CommandStatus::BindFailed => "Bind Failed",
            CommandStatus::InvalidPassword => "Invalid Password",
            CommandStatus::InvalidSystemId => "Invalid System ID",
            CommandStatus::CancelSmFailed => "Cancel SM Failed",
            CommandStatus::ReplaceSmFailed => "Replace SM Failed",
            CommandStatus::MessageQueueFull => "Message Queue Full",
            CommandStatus::InvalidServiceType => "Invalid Service Type",
            CommandStatus::InvalidEsmClass => "Invalid esm_class field data",
            CommandStatus::SubmitToDistributionListFailed => "Cannot Submit to Distribution List",
            CommandStatus::SubmitFailed => "submit_sm or submit_multi failed",
            CommandStatus::InvalidSourceTon => "Invalid Source address TON",
            CommandStatus::InvalidSourceNpi => "Invalid Source address NPI",
            CommandStatus::InvalidDestinationTon => "Invalid Destination address TON",
            CommandStatus::InvalidDestinationNpi => "Invalid Destination address NPI",
            CommandStatus::InvalidSystemType => "Invalid system_type field",
            CommandStatus::InvalidReplaceIfPresentFlag => "Invalid replace_if_present flag",
            CommandStatus::InvalidNumberOfMessages => "Invalid number of messages",
            CommandStatus::Throttled => "Throttling error (ESME has exceeded allowed message limits)",
            CommandStatus::InvalidScheduledDeliveryTime => "Invalid Scheduled Delivery Time",
            CommandStatus::InvalidValidityPeriod => "Invalid message validity period",
            CommandStatus::InvalidPredefinedMessage => "Predefined Message Invalid or Not Found",
            CommandStatus::ReceiverTemporaryError => "ESME Receiver Temporary App Error Code",
            CommandStatus::ReceiverPermanentError => "ESME Receiver Permanent App Error Code",
            CommandStatus::ReceiverRejectError => "ESME Receiver Reject Message Error Code",
            CommandStatus::QuerySmFailed => "query_sm request failed",
            CommandStatus::InvalidOptionalPart => "Error in the optional part of the PDU Body",
            CommandStatus::OptionalParameterNotAllowed => "Optional Parameter not allowed",
            CommandStatus::InvalidParameterLength => "Invalid Parameter Length",
            CommandStatus::MissingOptionalParameter => "Expected Optional Parameter missing",
            CommandStatus::InvalidOptionalParameterValue => "Invalid Optional Parameter Value",
            CommandStatus::DeliveryFailure => "Delivery Failure",
            CommandStatus::UnknownError => "Unknown Error",
            CommandStatus::Other(_) => "Vendor-specific or reserved error code",
        }
    }
}
