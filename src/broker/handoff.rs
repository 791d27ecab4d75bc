//! Rendezvous channel used for message and ack delivery
//!
//! A send only completes once a receiver has actually taken the item, which
//! gives delivery its backpressure: a slow or absent receiver stalls the
//! sending task and nothing else.
//!
//! Built from tokio primitives:
//! - a single-slot `mpsc` queue carries the item together with a `oneshot`
//!   acceptance sender
//! - the receiver completes the `oneshot` when it takes the item, releasing
//!   the sender
//! - a shared `watch` flag marks the channel closed; blocked senders then
//!   report "not delivered" and blocked receivers return `None`
//!
//! Receivers are cloneable handles over one queue, so several consumers
//! compete for items just like readers of a shared channel.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

struct Handoff<T> {
    item: T,
    accepted: oneshot::Sender<()>,
}

pub struct HandoffSender<T> {
    tx: mpsc::Sender<Handoff<T>>,
    closed: watch::Receiver<bool>,
}

pub struct HandoffReceiver<T> {
    rx: Arc<Mutex<mpsc::Receiver<Handoff<T>>>>,
    closed: watch::Receiver<bool>,
}

/// Creates a handoff channel that is closed once `closed` turns `true`.
pub fn channel<T>(closed: watch::Receiver<bool>) -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (
        HandoffSender {
            tx,
            closed: closed.clone(),
        },
        HandoffReceiver {
            rx: Arc::new(Mutex::new(rx)),
            closed,
        },
    )
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    // an error means the flag owner is gone, which closes the channel too
    let _ = closed.wait_for(|closed| *closed).await;
}

impl<T> HandoffSender<T> {
    /// Hands `item` to a receiver, waiting until one accepts it.
    ///
    /// Returns `false` if the channel was closed before the item was taken.
    pub async fn send(&self, item: T) -> bool {
        let mut closed = self.closed.clone();
        let (accepted_tx, mut accepted_rx) = oneshot::channel();

        let handoff = Handoff {
            item,
            accepted: accepted_tx,
        };
        let queued = tokio::select! {
            biased;
            _ = wait_closed(&mut closed) => false,
            queued = self.tx.send(handoff) => queued.is_ok(),
        };
        if !queued {
            return false;
        }

        // an item taken before the close still counts as delivered
        tokio::select! {
            biased;
            accepted = &mut accepted_rx => accepted.is_ok(),
            _ = wait_closed(&mut closed) => accepted_rx.try_recv().is_ok(),
        }
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl<T> HandoffReceiver<T> {
    /// Waits for the next item.
    ///
    /// Returns `None` once the channel is closed; items left behind by senders
    /// that gave up are skipped.
    pub async fn recv(&mut self) -> Option<T> {
        let mut rx = self.rx.lock().await;
        loop {
            let handoff = tokio::select! {
                biased;
                _ = wait_closed(&mut self.closed) => return None,
                handoff = rx.recv() => handoff?,
            };

            if handoff.accepted.send(()).is_ok() {
                return Some(handoff.item);
            }
        }
    }

    /// Whether the channel has been closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Turns this handle into a [`Stream`] that ends when the channel closes.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |mut receiver| async move {
            receiver.recv().await.map(|item| (item, receiver))
        })
    }
}

impl<T> Clone for HandoffReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            closed: self.closed.clone(),
        }
    }
}

impl<T> std::fmt::Debug for HandoffReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffReceiver")
            .field("closed", &self.is_closed())
            .finish()
    }
}
