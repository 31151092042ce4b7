use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::datatypes::CommandId;
use crate::pdu::{FieldName, Pdu};
use crate::session::error::{SessionError, SessionResult};

/// Hard floor for the enquire-link interval; configured values below it
/// clamp up.
pub const MIN_ENQUIRE_LINK_INTERVAL: u16 = 10;

const RECOGNIZED_PARAMS: &[&str] = &[
    "system_id",
    "password",
    "system_type",
    "interface_version",
    "addr_ton",
    "addr_npi",
    "address_range",
];

/// A bind parameter: the text keys take strings, the numbering keys take
/// single bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    Byte(u8),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<u8> for ParamValue {
    fn from(value: u8) -> Self {
        ParamValue::Byte(value)
    }
}

/// Session configuration: where to connect, how often to probe liveness,
/// and the bind parameters.
///
/// Recognized parameter keys are `system_id` (required), `password`
/// (required), `system_type`, `interface_version`, `addr_ton`, `addr_npi`
/// and `address_range`. Unknown keys are ignored.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    eli_seconds: u16,
    params: HashMap<String, ParamValue>,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            eli_seconds: 30,
            params: HashMap::new(),
        }
    }

    /// Seconds between keep-alive probes, clamped to at least
    /// [`MIN_ENQUIRE_LINK_INTERVAL`].
    pub fn enquire_link_interval(mut self, seconds: u16) -> Self {
        self.eli_seconds = seconds;
        self
    }

    /// Add a bind parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub(crate) fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.eli_seconds.max(MIN_ENQUIRE_LINK_INTERVAL)))
    }

    fn text_param(&self, key: &str) -> Option<&str> {
        match self.params.get(key) {
            Some(ParamValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    fn byte_param(&self, key: &str) -> Option<u8> {
        match self.params.get(key) {
            Some(ParamValue::Byte(value)) => Some(*value),
            _ => None,
        }
    }

    /// Build the bind request this configuration describes.
    pub(crate) fn bind_pdu(&self, command_id: CommandId) -> SessionResult<Pdu> {
        for key in self.params.keys() {
            if !RECOGNIZED_PARAMS.contains(&key.as_str()) {
                warn!("ignoring unrecognized bind parameter '{key}'");
            }
        }

        let system_id = self
            .text_param("system_id")
            .ok_or(SessionError::MissingParameter("system_id"))?;
        let password = self
            .text_param("password")
            .ok_or(SessionError::MissingParameter("password"))?;

        let mut pdu = Pdu::bind(command_id, system_id, password)?;
        if let Some(value) = self.text_param("system_type") {
            pdu.set(FieldName::SystemType, value)?;
        }
        if let Some(value) = self.byte_param("interface_version") {
            pdu.set(FieldName::InterfaceVersion, value)?;
        }
        if let Some(value) = self.byte_param("addr_ton") {
            pdu.set(FieldName::AddrTon, value)?;
        }
        if let Some(value) = self.byte_param("addr_npi") {
            pdu.set(FieldName::AddrNpi, value)?;
        }
        if let Some(value) = self.text_param("address_range") {
            pdu.set(FieldName::AddressRange, value)?;
        }
        Ok(pdu)
    }
}
