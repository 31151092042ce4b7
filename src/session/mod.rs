// ABOUTME: SMPP bound-session state machine with role-based PDU admission
// ABOUTME: Handles the bind handshake, automatic housekeeping replies and teardown

//! The bound-session state machine.
//!
//! One TCP connection multiplexes three activities: application-driven
//! writes, the application's read loop, and the keep-alive supervisor.
//! The write end sits behind an async mutex so writes serialize; reads are
//! single-consumer; the bound and closed flags are atomics; background
//! failures land in the last-error slot and close the session.

mod config;
mod error;
mod liveness;
mod sequence;

pub use config::{MIN_ENQUIRE_LINK_INTERVAL, ParamValue, SessionConfig};
pub use error::{SessionError, SessionResult};
pub use sequence::SequenceGenerator;

use std::io;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

use crate::codec::CodecError;
use crate::connection::{FrameReader, FrameWriter};
use crate::datatypes::{CommandId, CommandStatus};
use crate::pdu::Pdu;

/// How long the bind handshake may wait for its response.
pub const BIND_TIMEOUT: Duration = Duration::from_secs(5);

/// The SMPP bind roles. Which inbound PDUs a session admits, and which
/// operations it offers, is a function of its role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionRole {
    Transmitter,
    Receiver,
    Transceiver,
}

impl SessionRole {
    fn bind_command(self) -> CommandId {
        match self {
            SessionRole::Transmitter => CommandId::BindTransmitter,
            SessionRole::Receiver => CommandId::BindReceiver,
            SessionRole::Transceiver => CommandId::BindTransceiver,
        }
    }

    fn bind_response(self) -> CommandId {
        match self {
            SessionRole::Transmitter => CommandId::BindTransmitterResp,
            SessionRole::Receiver => CommandId::BindReceiverResp,
            SessionRole::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    /// Whether this role may originate submit/query traffic.
    pub fn can_transmit(self) -> bool {
        matches!(self, SessionRole::Transmitter | SessionRole::Transceiver)
    }

    /// Whether this role may carry deliver traffic.
    pub fn can_receive(self) -> bool {
        matches!(self, SessionRole::Receiver | SessionRole::Transceiver)
    }
}

/// State shared between the session handle and its background tasks.
pub(crate) struct SessionInner<T> {
    role: SessionRole,
    bound: AtomicBool,
    closed: AtomicBool,
    pub(crate) sequence: SequenceGenerator,
    last_error: StdMutex<Option<SessionError>>,
    pub(crate) shutdown: watch::Sender<bool>,
    pub(crate) writer: Mutex<FrameWriter<WriteHalf<T>>>,
    pub(crate) enquire_link_interval: Duration,
    resp_events: StdMutex<Option<mpsc::UnboundedSender<()>>>,
}

impl<T> SessionInner<T> {
    /// Record why the session is going down. The first failure wins: later
    /// ones are consequences of the teardown it triggered.
    pub(crate) fn fail(&self, error: SessionError) {
        let mut slot = self
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.get_or_insert(error);
    }

    fn notify_enquire_link_resp(&self) {
        let guard = self
            .resp_events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(());
        }
    }
}

/// Stop timers, say goodbye if still bound, and close the transport.
/// Idempotent, and callable from any task, the liveness supervisor and the
/// bind watchdog included.
pub(crate) async fn teardown<T: AsyncWrite>(inner: &SessionInner<T>) {
    if inner.closed.swap(true, Ordering::SeqCst) {
        return;
    }

    // Stops both liveness timers and unblocks any in-flight read. The
    // value is recorded even with no receiver subscribed, so a later read
    // attempt still observes the closed state.
    inner.shutdown.send_replace(true);

    let was_bound = inner.bound.swap(false, Ordering::SeqCst);
    let mut writer = inner.writer.lock().await;
    if was_bound {
        // best-effort goodbye
        let _ = writer.write_pdu(&Pdu::unbind(inner.sequence.next())).await;
    }
    let _ = writer.shutdown().await;
}

/// A bound SMPP session over a byte stream.
///
/// Created in two phases: establish the transport, then perform the bind
/// handshake. The role-specific constructors ([`Session::transmitter`],
/// [`Session::receiver`], [`Session::transceiver`]) do both over TCP;
/// [`Session::bind_on`] runs the handshake over any transport.
pub struct Session<T = TcpStream> {
    inner: Arc<SessionInner<T>>,
    reader: Mutex<FrameReader<ReadHalf<T>>>,
}

impl Session<TcpStream> {
    /// Connect and bind as a transmitter.
    pub async fn transmitter(config: &SessionConfig) -> SessionResult<Self> {
        Self::establish(SessionRole::Transmitter, config).await
    }

    /// Connect and bind as a receiver.
    pub async fn receiver(config: &SessionConfig) -> SessionResult<Self> {
        Self::establish(SessionRole::Receiver, config).await
    }

    /// Connect and bind as a transceiver.
    pub async fn transceiver(config: &SessionConfig) -> SessionResult<Self> {
        Self::establish(SessionRole::Transceiver, config).await
    }

    async fn establish(role: SessionRole, config: &SessionConfig) -> SessionResult<Self> {
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        Self::bind_on(stream, role, config).await
    }
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Perform the bind handshake over an already established transport.
    ///
    /// Sends the role's bind request, arms a [`BIND_TIMEOUT`] watchdog, and
    /// reads exactly one PDU. A wrong response command fails with
    /// [`SessionError::BindResponse`]; a non-OK status with
    /// [`SessionError::BindRejected`]. On success the liveness supervisor
    /// starts and the session is bound.
    pub async fn bind_on(stream: T, role: SessionRole, config: &SessionConfig) -> SessionResult<Self> {
        let bind = config.bind_pdu(role.bind_command())?;

        let (read_half, write_half) = tokio::io::split(stream);
        let (shutdown, _) = watch::channel(false);
        let inner = Arc::new(SessionInner {
            role,
            bound: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            sequence: SequenceGenerator::new(),
            last_error: StdMutex::new(None),
            shutdown,
            writer: Mutex::new(FrameWriter::new(write_half)),
            enquire_link_interval: config.interval(),
            resp_events: StdMutex::new(None),
        });
        let session = Session {
            inner,
            reader: Mutex::new(FrameReader::new(read_half)),
        };

        session.bind(bind).await?;
        Ok(session)
    }

    async fn bind(&self, mut bind: Pdu) -> SessionResult<()> {
        bind.sequence_number = self.inner.sequence.next();
        let expected = self.inner.role.bind_response();

        self.inner.writer.lock().await.write_pdu(&bind).await?;

        // The watchdog force-closes the session if the bound flag has not
        // gone true in time; the blocked read below then unblocks.
        let watchdog = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(BIND_TIMEOUT).await;
            if !watchdog.bound.load(Ordering::SeqCst) && !watchdog.closed.load(Ordering::SeqCst) {
                watchdog.fail(SessionError::BindResponse(format!(
                    "no response within {BIND_TIMEOUT:?}"
                )));
                teardown(&watchdog).await;
            }
        });

        let response = match self.read_raw().await {
            Ok(Some(pdu)) => pdu,
            Ok(None) => {
                let error =
                    SessionError::BindResponse("connection closed before response".to_owned());
                return Err(self.bind_failure(error).await);
            }
            Err(error) => return Err(self.bind_failure(error).await),
        };

        if response.command_id != expected {
            let error = SessionError::BindResponse(format!(
                "expected {expected:?}, got {:?}",
                response.command_id
            ));
            return Err(self.bind_failure(error).await);
        }

        if !response.is_ok() {
            let status = response.command_status;
            let error = SessionError::BindRejected(format!(
                "{} ({:#010x})",
                status.description(),
                u32::from(status)
            ));
            return Err(self.bind_failure(error).await);
        }

        self.inner.bound.store(true, Ordering::SeqCst);
        debug!(role = ?self.inner.role, "session bound");

        let (tx, rx) = mpsc::unbounded_channel();
        *self
            .inner
            .resp_events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tx);
        liveness::spawn(Arc::clone(&self.inner), rx);

        Ok(())
    }

    /// Store the bind failure, tear the session down, and hand the caller
    /// the stored cause (the watchdog may have raced us to it).
    async fn bind_failure(&self, error: SessionError) -> SessionError {
        self.inner.fail(error);
        teardown(&self.inner).await;
        self.last_error().unwrap_or(SessionError::Closed)
    }

    /// Read the next application-facing PDU.
    ///
    /// Housekeeping traffic is consumed internally: enquire_link gets an
    /// automatic response, enquire_link_resp feeds the liveness watchdog,
    /// and a peer unbind is answered with unbind_resp before the session
    /// closes (returned as `Ok(None)`, like a peer disconnect). A legal PDU
    /// the session's role does not admit fails with
    /// [`SessionError::Inadmissible`] and leaves the session bound.
    pub async fn read(&self) -> SessionResult<Option<Pdu>> {
        loop {
            let pdu = match self.read_raw().await? {
                Some(pdu) => pdu,
                None => {
                    teardown(&self.inner).await;
                    return Ok(None);
                }
            };

            match pdu.command_id {
                CommandId::EnquireLink => {
                    debug!(sequence = pdu.sequence_number, "answering enquire_link");
                    let resp = Pdu::enquire_link_resp(pdu.sequence_number);
                    self.inner.writer.lock().await.write_pdu(&resp).await?;
                }
                CommandId::EnquireLinkResp => {
                    self.inner.notify_enquire_link_resp();
                }
                CommandId::Unbind => {
                    debug!(sequence = pdu.sequence_number, "peer unbind, closing");
                    let resp = Pdu::unbind_resp(pdu.sequence_number);
                    if let Err(e) = self.inner.writer.lock().await.write_pdu(&resp).await {
                        warn!("unbind_resp not delivered: {e}");
                    }
                    self.inner.bound.store(false, Ordering::SeqCst);
                    teardown(&self.inner).await;
                    return Ok(None);
                }
                CommandId::SubmitSmResp | CommandId::QuerySmResp
                    if self.inner.role.can_transmit() =>
                {
                    return Ok(Some(pdu));
                }
                CommandId::DeliverSm if self.inner.role.can_receive() => {
                    return Ok(Some(pdu));
                }
                other => {
                    return Err(SessionError::Inadmissible {
                        pdu: other,
                        role: self.inner.role,
                    });
                }
            }
        }
    }

    /// Read one PDU off the wire, without admission dispatch. Classifiable
    /// malformed input earns a best-effort generic_nack (sequence 0) before
    /// the error surfaces; a session closed underneath the read surfaces an
    /// I/O error, with the cause in the last-error slot.
    async fn read_raw(&self) -> SessionResult<Option<Pdu>> {
        let mut reader = self.reader.lock().await;
        let mut shutdown = self.inner.shutdown.subscribe();
        if *shutdown.borrow() {
            return Err(closed_io_error());
        }

        tokio::select! {
            _ = shutdown.changed() => Err(closed_io_error()),
            result = reader.read_pdu() => match result {
                Ok(pdu) => Ok(pdu),
                Err(error) => {
                    if let Some(status) = error.nack_status() {
                        let nack = Pdu::generic_nack(status, 0);
                        if let Err(e) = self.inner.writer.lock().await.write_pdu(&nack).await {
                            debug!("generic_nack not delivered: {e}");
                        }
                    }
                    // transport failures surface as themselves
                    Err(match error {
                        CodecError::Io(e) => SessionError::Io(e),
                        other => SessionError::Codec(other),
                    })
                }
            },
        }
    }

    /// Send a submit_sm. Transmitter and transceiver sessions only.
    /// Returns the assigned sequence number for response correlation.
    pub async fn submit_sm(&self, pdu: Pdu) -> SessionResult<u32> {
        if !self.inner.role.can_transmit() {
            return Err(self.rejected(CommandId::SubmitSm));
        }
        self.send_request(CommandId::SubmitSm, pdu).await
    }

    /// Send a query_sm. Transmitter and transceiver sessions only.
    pub async fn query_sm(&self, pdu: Pdu) -> SessionResult<u32> {
        if !self.inner.role.can_transmit() {
            return Err(self.rejected(CommandId::QuerySm));
        }
        self.send_request(CommandId::QuerySm, pdu).await
    }

    /// Send a deliver_sm. Receiver and transceiver sessions only; a
    /// transmitter rejects locally without touching the wire.
    pub async fn deliver_sm(&self, pdu: Pdu) -> SessionResult<u32> {
        if !self.inner.role.can_receive() {
            return Err(self.rejected(CommandId::DeliverSm));
        }
        self.send_request(CommandId::DeliverSm, pdu).await
    }

    /// Acknowledge a deliver_sm, echoing its sequence number.
    pub async fn deliver_sm_resp(&self, sequence_number: u32) -> SessionResult<u32> {
        if !self.inner.role.can_receive() {
            return Err(self.rejected(CommandId::DeliverSmResp));
        }
        self.send_response(Pdu::deliver_sm_resp(sequence_number)).await
    }

    /// Answer a peer unbind, echoing its sequence number.
    pub async fn unbind_resp(&self, sequence_number: u32) -> SessionResult<u32> {
        self.send_response(Pdu::unbind_resp(sequence_number)).await
    }

    /// Send a generic_nack with an explicit status and sequence.
    pub async fn generic_nack(
        &self,
        status: CommandStatus,
        sequence_number: u32,
    ) -> SessionResult<u32> {
        self.send_response(Pdu::generic_nack(status, sequence_number)).await
    }

    async fn send_request(&self, expected: CommandId, mut pdu: Pdu) -> SessionResult<u32> {
        if pdu.command_id != expected {
            return Err(self.rejected(pdu.command_id));
        }
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        let sequence = self.inner.sequence.next();
        pdu.sequence_number = sequence;
        self.inner.writer.lock().await.write_pdu(&pdu).await?;
        Ok(sequence)
    }

    async fn send_response(&self, pdu: Pdu) -> SessionResult<u32> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        self.inner.writer.lock().await.write_pdu(&pdu).await?;
        Ok(pdu.sequence_number)
    }

    fn rejected(&self, pdu: CommandId) -> SessionError {
        SessionError::Inadmissible {
            pdu,
            role: self.inner.role,
        }
    }

    /// Close the session: stop the liveness timers, send a best-effort
    /// unbind while still bound, and shut the transport down. Idempotent;
    /// later calls are no-ops.
    pub async fn close(&self) {
        teardown(&self.inner).await;
    }

    /// Whether the bind handshake completed and no teardown has run.
    pub fn is_bound(&self) -> bool {
        self.inner.bound.load(Ordering::SeqCst)
    }

    pub fn role(&self) -> SessionRole {
        self.inner.role
    }

    /// Why the session went down, once it has. Set by the bind watchdog,
    /// the liveness supervisor, or whichever failure closed the session
    /// first.
    pub fn last_error(&self) -> Option<SessionError> {
        self.inner
            .last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.inner.role)
            .field("bound", &self.inner.bound.load(Ordering::SeqCst))
            .field("closed", &self.inner.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        // Backstop: a dropped handle must not leave the supervisor ticking.
        self.inner.shutdown.send_replace(true);
    }
}

fn closed_io_error() -> SessionError {
    SessionError::Io(io::Error::new(
        io::ErrorKind::ConnectionAborted,
        "session closed",
    ))
}
