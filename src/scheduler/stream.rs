use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{ExecutionError, TrackError, TrackResult};

use super::events::{SubscriptionId, TickEvent};
use super::worker::Command;

fn disconnected() -> TrackError {
    TrackError::Execution(ExecutionError::Disconnected {
        path: "snapshot_stream".to_string(),
    })
}

/// A subscription to simulator snapshots.
///
/// The worker never blocks on a slow reader: if the buffer is full the event
/// is dropped and counted. Dropping the stream unsubscribes.
#[derive(Debug)]
pub struct SnapshotStream {
    subscription_id: SubscriptionId,
    rx: Receiver<TickEvent>,
    control_tx: Sender<Command>,
    unsubscribed: AtomicBool,
}

impl SnapshotStream {
    pub(crate) fn new(subscription_id: SubscriptionId, rx: Receiver<TickEvent>, control_tx: Sender<Command>) -> Self {
        Self {
            subscription_id,
            rx,
            control_tx,
            unsubscribed: AtomicBool::new(false),
        }
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Best-effort explicit unsubscription. Non-blocking and idempotent.
    pub fn unsubscribe(&self) {
        if self.unsubscribed.swap(true, Ordering::AcqRel) {
            return;
        }

        let _ = self.control_tx.try_send(Command::Unsubscribe {
            subscription_id: self.subscription_id,
        });
    }

    /// Receive the next event (blocking).
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` once the simulator has shut down and the buffer
    /// is drained.
    pub fn recv(&self) -> TrackResult<TickEvent> {
        self.rx.recv().map_err(|_| disconnected())
    }

    /// Receive the next event with a timeout.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if nothing arrives in time, or `Disconnected` once the
    /// simulator has shut down.
    pub fn recv_timeout(&self, timeout: Duration) -> TrackResult<TickEvent> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => TrackError::Execution(ExecutionError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            }),
            RecvTimeoutError::Disconnected => disconnected(),
        })
    }

    /// Returns the next buffered event, if any, without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` once the simulator has shut down and the buffer
    /// is drained.
    pub fn try_recv(&self) -> TrackResult<Option<TickEvent>> {
        match self.rx.try_recv() {
            Ok(ev) => Ok(Some(ev)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    /// Drains every buffered event.
    #[must_use]
    pub fn drain(&self) -> Vec<TickEvent> {
        self.rx.try_iter().collect()
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        // Best-effort: do not block on shutdown.
        self.unsubscribe();
    }
}
