//! End-to-end session scenarios against an in-memory SMSC peer.
//!
//! The peer side drives the raw frame reader/writer over a duplex pipe;
//! timer behavior runs under the paused test clock, which advances to the
//! next deadline whenever every task is otherwise idle.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf, duplex};
use tokio::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::codec::CodecError;
use crate::connection::FrameReader;
use crate::datatypes::{CommandId, CommandStatus};
use crate::pdu::{FieldName, Pdu};
use crate::session::{Session, SessionConfig, SessionError, SessionRole};

/// The SMSC side of the wire.
struct Peer {
    reader: FrameReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
}

impl Peer {
    fn new(stream: DuplexStream) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: FrameReader::new(read_half),
            writer: write_half,
        }
    }

    async fn expect(&mut self, command_id: CommandId) -> Pdu {
        let pdu = self
            .reader
            .read_pdu()
            .await
            .expect("peer read failed")
            .expect("peer hit eof");
        assert_eq!(pdu.command_id, command_id);
        pdu
    }

    async fn send(&mut self, pdu: &Pdu) {
        self.send_frame(&pdu.to_bytes()).await;
    }

    /// Write raw bytes, so malformed traffic can be injected.
    async fn send_frame(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("peer write failed");
    }
}

/// Capture session tracing in test output. Only the first call installs
/// the subscriber; the rest are no-ops.
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn config(eli_seconds: u16) -> SessionConfig {
    SessionConfig::new("localhost", 2775)
        .enquire_link_interval(eli_seconds)
        .param("system_id", "user")
        .param("password", "pass")
}

fn bind_response_for(role: SessionRole, sequence_number: u32) -> Pdu {
    let command_id = match role {
        SessionRole::Transmitter => CommandId::BindTransmitterResp,
        SessionRole::Receiver => CommandId::BindReceiverResp,
        SessionRole::Transceiver => CommandId::BindTransceiverResp,
    };
    let mut resp = Pdu::with_status(command_id, CommandStatus::Ok, sequence_number);
    resp.set(FieldName::SystemId, "SMSC").unwrap();
    resp
}

/// Bind a session of the given role against a fresh peer.
async fn bound_session(role: SessionRole, eli_seconds: u16) -> (Session<DuplexStream>, Peer) {
    init_tracing();
    let (client, server) = duplex(16 * 1024);
    let mut peer = Peer::new(server);

    let cfg = config(eli_seconds);
    let binding = tokio::spawn(async move { Session::bind_on(client, role, &cfg).await });

    let bind = peer.reader.read_pdu().await.unwrap().unwrap();
    peer.send(&bind_response_for(role, bind.sequence_number)).await;

    let session = binding.await.unwrap().expect("bind failed");
    assert!(session.is_bound());
    (session, peer)
}

#[tokio::test]
async fn happy_submit() {
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 10).await;

    let pdu = Pdu::submit_sm("1000", "447911123456", b"hi").unwrap();
    let sequence = session.submit_sm(pdu).await.unwrap();
    assert_eq!(sequence, 2); // the bind took 1

    let submit = peer.expect(CommandId::SubmitSm).await;
    assert_eq!(submit.sequence_number, sequence);
    assert_eq!(submit.text(FieldName::SourceAddr).unwrap().as_ref(), b"1000");
    assert_eq!(submit.short_message().unwrap().as_ref(), b"hi");

    let mut resp = Pdu::with_status(CommandId::SubmitSmResp, CommandStatus::Ok, sequence);
    resp.set(FieldName::MessageId, "id-0042").unwrap();
    peer.send(&resp).await;

    let answer = session.read().await.unwrap().unwrap();
    assert_eq!(answer.command_id, CommandId::SubmitSmResp);
    assert_eq!(answer.sequence_number, sequence);
    assert_eq!(answer.command_status, CommandStatus::Ok);
    assert_eq!(answer.text(FieldName::MessageId).unwrap().as_ref(), b"id-0042");

    session.close().await;
}

#[tokio::test]
async fn udhi_concat_fragment() {
    let (session, mut peer) = bound_session(SessionRole::Receiver, 10).await;

    let payload = [0x05, 0x00, 0x03, 0xAA, 0x02, 0x01, b'H', b'i', b'!', b'!'];
    let mut deliver = Pdu::deliver_sm("447911123456", "1000", &payload).unwrap();
    deliver.set(FieldName::EsmClass, 0x40u8).unwrap();
    deliver.sequence_number = 12;
    peer.send(&deliver).await;

    let pdu = session.read().await.unwrap().unwrap();
    assert_eq!(pdu.command_id, CommandId::DeliverSm);
    assert_eq!(pdu.byte(FieldName::SmLength), Some(10));
    assert_eq!(
        pdu.user_data_header().unwrap().as_ref(),
        &[0x05, 0x00, 0x03, 0xAA, 0x02, 0x01]
    );
    assert_eq!(pdu.message_text().unwrap().as_ref(), b"Hi!!");
    assert_eq!(pdu.short_message().unwrap().as_ref(), &payload);

    // acknowledge with the delivery's own sequence
    let echoed = session.deliver_sm_resp(pdu.sequence_number).await.unwrap();
    assert_eq!(echoed, 12);
    let resp = peer.expect(CommandId::DeliverSmResp).await;
    assert_eq!(resp.sequence_number, 12);
}

#[tokio::test]
async fn query_sm_roundtrip() {
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 10).await;

    let sequence = session
        .query_sm(Pdu::query_sm("id-0042", "1000"))
        .await
        .unwrap();

    let query = peer.expect(CommandId::QuerySm).await;
    assert_eq!(query.sequence_number, sequence);
    assert_eq!(query.text(FieldName::MessageId).unwrap().as_ref(), b"id-0042");
    assert_eq!(query.text(FieldName::SourceAddr).unwrap().as_ref(), b"1000");

    let mut resp = Pdu::with_status(CommandId::QuerySmResp, CommandStatus::Ok, sequence);
    resp.set(FieldName::MessageId, "id-0042").unwrap();
    resp.set(FieldName::FinalDate, "").unwrap();
    resp.set(FieldName::MessageState, 2u8).unwrap();
    resp.set(FieldName::ErrorCode, 0u8).unwrap();
    peer.send(&resp).await;

    let answer = session.read().await.unwrap().unwrap();
    assert_eq!(answer.command_id, CommandId::QuerySmResp);
    assert_eq!(answer.byte(FieldName::MessageState), Some(2));
}

#[tokio::test]
async fn unknown_command_is_nacked_with_sequence_zero() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;

    let mut frame = Pdu::enquire_link(77).to_bytes().to_vec();
    frame[4..8].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
    peer.send_frame(&frame).await;

    let error = session.read().await.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Codec(CodecError::InvalidCommandId(0xDEAD_BEEF))
    ));

    let nack = peer.expect(CommandId::GenericNack).await;
    assert_eq!(nack.command_status, CommandStatus::InvalidCommandId);
    assert_eq!(nack.sequence_number, 0);
}

#[tokio::test]
async fn length_inconsistent_pdu_is_nacked() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;

    // a well-framed unbind_resp with half an optional parameter behind it
    let mut frame = Pdu::unbind_resp(5).to_bytes().to_vec();
    frame.extend_from_slice(&[0x02, 0x04, 0x00]);
    let declared = frame.len() as u32;
    frame[0..4].copy_from_slice(&declared.to_be_bytes());
    peer.send_frame(&frame).await;

    let error = session.read().await.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Codec(CodecError::TruncatedTlv)
    ));

    let nack = peer.expect(CommandId::GenericNack).await;
    assert_eq!(nack.command_status, CommandStatus::InvalidCommandLength);
    assert_eq!(nack.sequence_number, 0);

    // the malformed frame was consumed whole; the session still works
    let mut deliver = Pdu::deliver_sm("2000", "1000", b"still here").unwrap();
    deliver.sequence_number = 6;
    peer.send(&deliver).await;
    let pdu = session.read().await.unwrap().unwrap();
    assert_eq!(pdu.command_id, CommandId::DeliverSm);
    assert!(session.is_bound());
}

#[tokio::test]
async fn peer_unbind_gets_resp_and_closes() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;

    peer.send(&Pdu::unbind(7)).await;

    assert!(session.read().await.unwrap().is_none());
    assert!(!session.is_bound());
    assert!(session.last_error().is_none());

    let resp = peer.expect(CommandId::UnbindResp).await;
    assert_eq!(resp.sequence_number, 7);

    // the session no longer accepts work
    let pdu = Pdu::submit_sm("1000", "2000", b"late").unwrap();
    assert!(matches!(
        session.submit_sm(pdu).await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn transmitter_rejects_deliver_sm_but_stays_bound() {
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 10).await;

    let mut deliver = Pdu::deliver_sm("2000", "1000", b"not for you").unwrap();
    deliver.sequence_number = 3;
    peer.send(&deliver).await;

    let error = session.read().await.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Inadmissible {
            pdu: CommandId::DeliverSm,
            role: SessionRole::Transmitter,
        }
    ));
    assert!(session.is_bound());
}

#[tokio::test]
async fn receiver_rejects_submit_sm_resp() {
    let (session, mut peer) = bound_session(SessionRole::Receiver, 10).await;

    let mut resp = Pdu::with_status(CommandId::SubmitSmResp, CommandStatus::Ok, 9);
    resp.set(FieldName::MessageId, "nope").unwrap();
    peer.send(&resp).await;

    assert!(matches!(
        session.read().await.unwrap_err(),
        SessionError::Inadmissible {
            pdu: CommandId::SubmitSmResp,
            role: SessionRole::Receiver,
        }
    ));
    assert!(session.is_bound());
}

#[tokio::test]
async fn transmitter_rejects_outbound_deliver_locally() {
    let (session, _peer) = bound_session(SessionRole::Transmitter, 10).await;

    let pdu = Pdu::deliver_sm("1000", "2000", b"wrong way").unwrap();
    assert!(matches!(
        session.deliver_sm(pdu).await,
        Err(SessionError::Inadmissible {
            pdu: CommandId::DeliverSm,
            role: SessionRole::Transmitter,
        })
    ));
}

#[tokio::test]
async fn enquire_link_is_answered_automatically() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;
    let session = Arc::new(session);

    let reading = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.read().await })
    };

    peer.send(&Pdu::enquire_link(99)).await;
    let resp = peer.expect(CommandId::EnquireLinkResp).await;
    assert_eq!(resp.sequence_number, 99);

    // unblock the pending read with real traffic
    let mut deliver = Pdu::deliver_sm("2000", "1000", b"wake up").unwrap();
    deliver.sequence_number = 4;
    peer.send(&deliver).await;
    let pdu = reading.await.unwrap().unwrap().unwrap();
    assert_eq!(pdu.command_id, CommandId::DeliverSm);
}

#[tokio::test]
async fn sequence_numbers_increase_per_request() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;

    let mut sequences = Vec::new();
    for text in [&b"one"[..], &b"two"[..], &b"three"[..]] {
        let pdu = Pdu::submit_sm("1000", "2000", text).unwrap();
        sequences.push(session.submit_sm(pdu).await.unwrap());
    }
    assert_eq!(sequences, vec![2, 3, 4]);

    for expected in 2..=4 {
        let submit = peer.expect(CommandId::SubmitSm).await;
        assert_eq!(submit.sequence_number, expected);
    }
}

#[tokio::test]
async fn close_is_idempotent() {
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 10).await;

    session.close().await;
    session.close().await;
    session.close().await;

    assert!(!session.is_bound());
    assert!(session.last_error().is_none());

    // exactly one unbind went out, then the stream ended
    let goodbye = peer.expect(CommandId::Unbind).await;
    assert_eq!(goodbye.sequence_number, 2);
    assert!(peer.reader.read_pdu().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn bind_watchdog_closes_after_five_seconds() {
    init_tracing();
    let (client, server) = duplex(16 * 1024);
    let mut peer = Peer::new(server);
    let started = Instant::now();

    let cfg = config(10);
    let binding =
        tokio::spawn(
            async move { Session::bind_on(client, SessionRole::Transmitter, &cfg).await },
        );

    // the request goes out, but no response ever comes
    peer.expect(CommandId::BindTransmitter).await;

    let error = binding.await.unwrap().unwrap_err();
    assert!(matches!(error, SessionError::BindResponse(_)));
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn bind_rejected_status_is_an_auth_error() {
    init_tracing();
    let (client, server) = duplex(16 * 1024);
    let mut peer = Peer::new(server);

    let cfg = config(10);
    let binding =
        tokio::spawn(
            async move { Session::bind_on(client, SessionRole::Transmitter, &cfg).await },
        );

    let bind = peer.expect(CommandId::BindTransmitter).await;
    let mut resp = Pdu::with_status(
        CommandId::BindTransmitterResp,
        CommandStatus::InvalidPassword,
        bind.sequence_number,
    );
    resp.set(FieldName::SystemId, "SMSC").unwrap();
    peer.send(&resp).await;

    match binding.await.unwrap().unwrap_err() {
        SessionError::BindRejected(reason) => assert!(reason.contains("Invalid Password")),
        other => panic!("expected BindRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn bind_with_wrong_response_id_fails() {
    init_tracing();
    let (client, server) = duplex(16 * 1024);
    let mut peer = Peer::new(server);

    let cfg = config(10);
    let binding =
        tokio::spawn(async move { Session::bind_on(client, SessionRole::Receiver, &cfg).await });

    let bind = peer.expect(CommandId::BindReceiver).await;
    peer.send(&bind_response_for(SessionRole::Transmitter, bind.sequence_number))
        .await;

    assert!(matches!(
        binding.await.unwrap().unwrap_err(),
        SessionError::BindResponse(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn enquire_link_timeout_closes_the_session() {
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 10).await;
    let started = Instant::now();

    // t=10: the ticker probes
    let probe = peer.expect(CommandId::EnquireLink).await;
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert!(probe.sequence_number > 1);

    // no response: at t=15 the watchdog tears the session down and the
    // blocked read surfaces an I/O error
    let error = session.read().await.unwrap_err();
    assert!(matches!(error, SessionError::Io(_)));
    assert_eq!(started.elapsed(), Duration::from_secs(15));

    assert!(!session.is_bound());
    assert!(matches!(
        session.last_error(),
        Some(SessionError::EnquireLinkTimeout(window)) if window == Duration::from_secs(5)
    ));
}

#[tokio::test(start_paused = true)]
async fn answered_probes_keep_the_session_alive() {
    let (session, mut peer) = bound_session(SessionRole::Transceiver, 10).await;
    let session = Arc::new(session);
    let started = Instant::now();

    // something must be consuming the inbound side for the supervisor to
    // see the responses
    let reader = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.read().await })
    };

    for round in 1..=3u64 {
        let probe = peer.expect(CommandId::EnquireLink).await;
        assert_eq!(started.elapsed(), Duration::from_secs(10 * round));
        peer.send(&Pdu::enquire_link_resp(probe.sequence_number)).await;
    }

    assert!(session.is_bound());
    assert!(session.last_error().is_none());

    session.close().await;
    let result = reader.await.unwrap();
    assert!(result.is_err() || result.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn interval_below_minimum_is_clamped() {
    // configured at 3 seconds; the first probe must still wait the 10s floor
    let (session, mut peer) = bound_session(SessionRole::Transmitter, 3).await;
    let started = Instant::now();

    peer.expect(CommandId::EnquireLink).await;
    assert_eq!(started.elapsed(), Duration::from_secs(10));

    session.close().await;
}
