// ABOUTME: Keep-alive supervision for bound sessions via periodic enquire_link probes
// ABOUTME: Runs the probe ticker and the single-shot response watchdog in one task

//! Keep-alive supervision.
//!
//! Once bound, one supervisor task owns two timers: a ticker that sends
//! enquire_link every interval, and a single-shot watchdog bounding the
//! wait for each response. The read path forwards enquire_link_resp
//! arrivals over a channel; the supervisor never touches session state
//! except through atomics, the last-error slot and the writer mutex.

use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Sleep};
use tracing::{debug, warn};

use crate::pdu::Pdu;
use crate::session::error::SessionError;
use crate::session::{SessionInner, teardown};

pub(super) fn spawn<T>(
    inner: Arc<SessionInner<T>>,
    mut resp_events: mpsc::UnboundedReceiver<()>,
) where
    T: AsyncRead + AsyncWrite + Send + 'static,
{
    tokio::spawn(async move {
        let interval = inner.enquire_link_interval;
        let window = interval / 2;

        let mut shutdown = inner.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        // Single-shot, initially stopped; armed after each probe goes out.
        let mut watchdog: Pin<Box<Sleep>> = Box::pin(time::sleep(window));
        let mut armed = false;

        loop {
            // biased: a due tick re-arms the watchdog before the watchdog
            // branch can see a deadline the tick was about to move, and a
            // queued response is honored before an expiry it beat
            tokio::select! {
                biased;

                _ = shutdown.changed() => break,

                _ = ticker.tick() => {
                    let probe = Pdu::enquire_link(inner.sequence.next());
                    debug!(sequence = probe.sequence_number, "sending enquire_link");
                    let result = inner.writer.lock().await.write_pdu(&probe).await;
                    match result {
                        Ok(()) => {
                            watchdog.as_mut().reset(Instant::now() + window);
                            armed = true;
                        }
                        Err(e) => {
                            warn!("enquire_link write failed: {e}");
                            inner.fail(SessionError::EnquireLinkWrite(e));
                            teardown(&inner).await;
                            break;
                        }
                    }
                }

                Some(()) = resp_events.recv() => {
                    // Reset rather than cancel: pushing the deadline a full
                    // interval out guarantees the next tick re-arms the
                    // watchdog before it can expire, so every outstanding
                    // probe keeps a bounded window and an idle watchdog
                    // never fires between probes.
                    if armed {
                        watchdog.as_mut().reset(Instant::now() + interval);
                    }
                }

                () = watchdog.as_mut(), if armed => {
                    warn!("enquire_link unanswered for {window:?}, closing session");
                    inner.fail(SessionError::EnquireLinkTimeout(window));
                    teardown(&inner).await;
                    break;
                }
            }
        }
    });
}
