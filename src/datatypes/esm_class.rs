// ABOUTME: Decomposes the esm_class bitfield (Section 5.2.12) into messaging mode, message type and GSM features
// ABOUTME: Keeps the decomposition total so every byte value reassembles losslessly

use std::fmt;

/// Decomposed esm_class byte.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EsmClass {
    mode: MessagingMode,
    message_type: MessageType,
    features: GsmFeatures,
}

impl EsmClass {
    pub fn new(mode: MessagingMode, message_type: MessageType, features: GsmFeatures) -> Self {
        Self {
            mode,
            message_type,
            features,
        }
    }

    /// Split a raw esm_class byte into its slices. Total over all 256
    /// values.
    pub fn from_byte(value: u8) -> Self {
        Self {
            mode: MessagingMode::from_bits(value & 0x03),
            message_type: MessageType::from_bits((value >> 2) & 0x0F),
            features: GsmFeatures::from_bits(value >> 6),
        }
    }

    /// Reassemble the wire byte: mode | type | features.
    pub fn to_byte(self) -> u8 {
        self.mode as u8 | (self.message_type.to_bits() << 2) | (self.features.to_bits() << 6)
    }

    pub fn messaging_mode(self) -> MessagingMode {
        self.mode
    }

    pub fn message_type(self) -> MessageType {
        self.message_type
    }

    pub fn features(self) -> GsmFeatures {
        self.features
    }

    /// Whether the user-data-header indicator is set: the first
    /// `udhl + 1` bytes of the short message are a UDH.
    pub fn has_udhi(self) -> bool {
        self.features.udhi
    }

    pub fn with_udhi(mut self) -> Self {
        self.features.udhi = true;
        self
    }

    pub fn with_reply_path(mut self) -> Self {
        self.features.reply_path = true;
        self
    }
}

/// Messaging mode, bits 1-0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(u8)]
pub enum MessagingMode {
    /// Default SMSC mode
    #[default]
    Default = 0b00,
    /// Datagram mode
    Datagram = 0b01,
    /// Forward (transaction) mode
    Forward = 0b10,
    /// Store and forward mode
    StoreAndForward = 0b11,
}

impl MessagingMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => MessagingMode::Default,
            0b01 => MessagingMode::Datagram,
            0b10 => MessagingMode::Forward,
            _ => MessagingMode::StoreAndForward,
        }
    }
}

/// Message type, bits 5-2. Known values get named variants; the remaining
/// reserved patterns are carried verbatim so decomposition stays total.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum MessageType {
    /// Default message type
    #[default]
    Default,
    /// Short message contains an SMSC delivery receipt (deliver_sm)
    DeliveryReceipt,
    /// Short message contains a delivery acknowledgement
    DeliveryAck,
    /// Short message contains a manual/user acknowledgement
    UserAck,
    /// Short message contains a conversation abort (Korean CDMA)
    ConversationAbort,
    /// Short message contains an intermediate delivery notification
    IntermediateNotification,
    /// Reserved bit pattern, preserved as-is
    Reserved(u8),
}

impl MessageType {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0b0000 => MessageType::Default,
            0b0001 => MessageType::DeliveryReceipt,
            0b0010 => MessageType::DeliveryAck,
            0b0100 => MessageType::UserAck,
            0b0110 => MessageType::ConversationAbort,
            0b1000 => MessageType::IntermediateNotification,
            other => MessageType::Reserved(other),
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            MessageType::Default => 0b0000,
            MessageType::DeliveryReceipt => 0b0001,
            MessageType::DeliveryAck => 0b0010,
            MessageType::UserAck => 0b0100,
            MessageType::ConversationAbort => 0b0110,
            MessageType::IntermediateNotification => 0b1000,
            MessageType::Reserved(bits) => bits & 0x0F,
        }
    }
}

/// GSM network feature flags, bits 7-6.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GsmFeatures {
    /// User data header indicator, bit 6
    pub udhi: bool,
    /// Reply path, bit 7
    pub reply_path: bool,
}

impl GsmFeatures {
    fn from_bits(bits: u8) -> Self {
        Self {
            udhi: bits & 0b01 != 0,
            reply_path: bits & 0b10 != 0,
        }
    }

    fn to_bits(self) -> u8 {
        (self.udhi as u8) | (self.reply_path as u8) << 1
    }
}

impl From<u8> for EsmClass {
    fn from(value: u8) -> Self {
        Self::from_byte(value)
    }
}

impl From<EsmClass> for u8 {
    fn from(esm: EsmClass) -> Self {
        esm.to_byte()
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsmClass")
            .field("mode", &self.mode)
            .field("message_type", &self.message_type)
            .field("features", &self.features)
            .field("byte", &format_args!("{:#04x}", self.to_byte()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_reassembles() {
        for value in 0..=u8::MAX {
            let esm = EsmClass::from_byte(value);
            assert_eq!(esm.to_byte(), value, "esm_class {value:#04x} not lossless");
        }
    }

    #[test]
    fn udhi_is_bit_six() {
        let esm = EsmClass::from_byte(0x40);
        assert!(esm.has_udhi());
        assert!(!esm.features().reply_path);
        assert_eq!(esm.messaging_mode(), MessagingMode::Default);
        assert_eq!(esm.message_type(), MessageType::Default);

        assert!(!EsmClass::from_byte(0x00).has_udhi());
        assert_eq!(EsmClass::default().with_udhi().to_byte(), 0x40);
    }

    #[test]
    fn delivery_receipt_type() {
        let esm = EsmClass::from_byte(0x04);
        assert_eq!(esm.message_type(), MessageType::DeliveryReceipt);
    }

    #[test]
    fn slices_land_in_their_bits() {
        let esm = EsmClass::new(
            MessagingMode::Datagram,
            MessageType::DeliveryAck,
            GsmFeatures {
                udhi: true,
                reply_path: true,
            },
        );
        assert_eq!(esm.to_byte(), 0b1100_1001);
    }
}
