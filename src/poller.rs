//! Fixed-interval ticks that drive [`StoryController::poll`].
//!
//! [`every`] spawns a timer thread that sends a [`Tick`] per interval until
//! its [`Subscription`] is cancelled or dropped. The tick channel holds a
//! single tick: a consumer that falls behind sees one pending tick, not a
//! backlog, which is all a viewport poll needs.
//!
//! [`drive`] is the consumer side. It runs on the thread that owns the page,
//! so the controller and the document never cross threads.

use crate::controller::{Evaluation, PollState, StoryController, ViewportSource};
use crate::page::Document;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based count of intervals elapsed since the subscription started.
    pub seq: u64,
}

/// Stops a running timer. Cheap to clone and hand to other code.
#[derive(Debug, Clone)]
pub struct Canceller(Sender<()>);

impl Canceller {
    /// Idempotent; cancelling a finished timer is a no-op.
    pub fn cancel(&self) {
        let _ = self.0.send(());
    }
}

/// Handle to a running timer. Dropping it cancels the timer and waits for
/// the thread to exit.
#[derive(Debug)]
pub struct Subscription {
    canceller: Canceller,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.canceller.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start a timer that ticks every `interval`.
pub fn every(interval: Duration) -> (Subscription, Receiver<Tick>) {
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
    let (tick_tx, tick_rx) = mpsc::sync_channel(1);

    let handle = thread::spawn(move || {
        let mut seq = 0;
        loop {
            match cancel_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    seq += 1;
                    match tick_tx.try_send(Tick { seq }) {
                        Ok(()) | Err(TrySendError::Full(_)) => {}
                        // Nobody is listening any more
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        trace!(ticks = seq, "poll timer stopped");
    });

    (
        Subscription {
            canceller: Canceller(cancel_tx),
            handle: Some(handle),
        },
        tick_rx,
    )
}

/// Poll the controller once per tick until the ticks end or the controller
/// stops. `on_change` sees every evaluation a size change triggered.
///
/// Returns the number of evaluations.
pub fn drive<D, S, F>(
    controller: &mut StoryController,
    doc: &mut D,
    source: &S,
    ticks: &Receiver<Tick>,
    mut on_change: F,
) -> usize
where
    D: Document + ?Sized,
    S: ViewportSource + ?Sized,
    F: FnMut(&Evaluation),
{
    let mut evaluations = 0;
    while controller.state() == PollState::Polling {
        let Ok(tick) = ticks.recv() else {
            break;
        };
        trace!(seq = tick.seq, "tick");
        if let Some(evaluation) = controller.poll(doc, source) {
            evaluations += 1;
            on_change(&evaluation);
        }
    }
    debug!(evaluations, "poll loop finished");
    evaluations
}
