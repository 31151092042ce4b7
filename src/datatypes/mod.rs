mod command_id;
mod command_status;
mod esm_class;
mod tlv;

pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use esm_class::{EsmClass, GsmFeatures, MessageType, MessagingMode};
pub use tlv::{Tlv, tags};

/// interface_version value for SMPP v3.4 (Section 5.2.4).
pub const INTERFACE_VERSION_SMPP_34: u8 = 0x34;

// SMPP v3.4 field length limits (excluding the NUL terminator)
pub const MAX_SYSTEM_ID_LENGTH: usize = 15;
pub const MAX_PASSWORD_LENGTH: usize = 8;
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;
