//! An SMPP v3.4 client core: the PDU codec and the bound-session state
//! machine an ESME needs to talk to an SMSC.
//!
//! The codec side is schema-driven: [`pdu::Pdu`] pairs the 16-byte header
//! with a typed field store, and a per-command registry of mandatory-field
//! declarations drives both parsing and serialization. The session side
//! multiplexes one TCP connection between application traffic, automatic
//! housekeeping replies (enquire_link, unbind), keep-alive supervision and
//! teardown, specialized by bind role (transmitter, receiver, transceiver).
//!
//! ```rust,no_run
//! use esme::pdu::Pdu;
//! use esme::session::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("localhost", 2775)
//!         .enquire_link_interval(30)
//!         .param("system_id", "user")
//!         .param("password", "pass");
//!
//!     // Connect and bind as a transmitter (Section 4.1 - Bind Operations)
//!     let session = Session::transmitter(&config).await?;
//!
//!     // Send a short message (Section 4.4.1 - submit_sm)
//!     let sequence = session
//!         .submit_sm(Pdu::submit_sm("1000", "447911123456", b"Hello!")?)
//!         .await?;
//!
//!     // Responses correlate by sequence number
//!     while let Some(pdu) = session.read().await? {
//!         if pdu.sequence_number == sequence {
//!             println!("message id: {:?}", pdu.text(esme::pdu::FieldName::MessageId));
//!             break;
//!         }
//!     }
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod pdu;
pub mod session;

#[cfg(test)]
mod tests;

pub use codec::{CodecError, PduHeader};
pub use pdu::{FieldName, FieldValue, Pdu};
pub use session::{Session, SessionConfig, SessionError, SessionResult, SessionRole};
