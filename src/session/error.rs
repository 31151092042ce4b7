// ABOUTME: Session error types covering bind, liveness, admission and transport failures
// ABOUTME: Provides the cloneable last-error surface read after a session closes

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::codec::CodecError;
use crate::datatypes::CommandId;
use crate::session::SessionRole;

/// Why a session operation failed, or why the session went down.
///
/// Failures raised inside background tasks (the liveness supervisor, the
/// bind watchdog) cannot be returned to a caller; they are stored in the
/// session's last-error slot and the session is closed, which makes any
/// blocked read or write surface an I/O error. The application then reads
/// [`Session::last_error`](crate::session::Session::last_error) for the
/// cause.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The bind handshake got no response in time, or the wrong one.
    #[error("bind failed: {0}")]
    BindResponse(String),

    /// The peer answered the bind with a non-OK status.
    #[error("bind rejected by peer: {0}")]
    BindRejected(String),

    /// A keep-alive enquire_link could not be written.
    #[error("enquire_link write failed: {0}")]
    EnquireLinkWrite(io::Error),

    /// No enquire_link_resp arrived within the response window.
    #[error("no enquire_link_resp within {0:?}")]
    EnquireLinkTimeout(Duration),

    /// A legal PDU that this session's role or state does not admit.
    #[error("{pdu:?} is not admissible on a {role:?} session")]
    Inadmissible { pdu: CommandId, role: SessionRole },

    /// The inbound byte stream did not parse.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The operation ran against an already closed session.
    #[error("session is closed")]
    Closed,

    /// The configuration parameter map lacks a required key.
    #[error("missing required bind parameter '{0}'")]
    MissingParameter(&'static str),
}

// io::Error is not Clone; the copy keeps its kind and message so the
// last-error slot can be read any number of times after close.
impl Clone for SessionError {
    fn clone(&self) -> Self {
        match self {
            SessionError::BindResponse(reason) => SessionError::BindResponse(reason.clone()),
            SessionError::BindRejected(reason) => SessionError::BindRejected(reason.clone()),
            SessionError::EnquireLinkWrite(e) => {
                SessionError::EnquireLinkWrite(io::Error::new(e.kind(), e.to_string()))
            }
            SessionError::EnquireLinkTimeout(window) => {
                SessionError::EnquireLinkTimeout(*window)
            }
            SessionError::Inadmissible { pdu, role } => SessionError::Inadmissible {
                pdu: *pdu,
                role: *role,
            },
            SessionError::Codec(e) => SessionError::Codec(e.clone()),
            SessionError::Io(e) => SessionError::Io(io::Error::new(e.kind(), e.to_string())),
            SessionError::Closed => SessionError::Closed,
            SessionError::MissingParameter(key) => SessionError::MissingParameter(key),
        }
    }
}

/// A specialized `Result` for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
