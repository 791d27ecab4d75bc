//! Subscriber delivery endpoint
//!
//! A `Subscriber` owns its topic set, a message handoff channel, an ack
//! handoff channel and a liveness flag. Its life is one-way:
//! `active -> destroyed`. Once destroyed it accepts no messages and produces
//! no acks, and any task blocked on either channel is released.
//!
//! The broker holds subscribers behind `Arc` and is the only party that binds
//! topics or destroys them.

use std::collections::HashSet;

use parking_lot::RwLock;
use rand::RngCore;
use rand::rngs::OsRng;
use tokio::sync::watch;
use tracing::trace;

use crate::broker::handoff::{self, HandoffReceiver, HandoffSender};
use crate::broker::message::{Ack, Message};
use crate::broker::topic::SubscriberId;
use crate::utils::error::BrokerError;

/// Number of random bytes behind a subscriber id (hex-encoded to twice as many chars).
pub const ID_BYTES: usize = 10;

/// Receive handle for the messages delivered to a subscriber.
pub type MessageStream<P> = HandoffReceiver<Message<P>>;

/// Receive handle for the acknowledgments a subscriber sends back.
pub type AckStream<P> = HandoffReceiver<Ack<P>>;

/// How delivery attempts treat a subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Keep re-sending each message until the subscriber acknowledges it.
    #[default]
    AtLeastOnce,
    /// A message is done as soon as the subscriber takes it; acks are ignored.
    FireAndForget,
}

struct SubscriberState {
    topics: HashSet<String>,
    destroyed: bool,
}

pub struct Subscriber<P> {
    id: SubscriberId,
    mode: DeliveryMode,
    state: RwLock<SubscriberState>,
    destroyed: watch::Sender<bool>,
    messages_tx: HandoffSender<Message<P>>,
    messages_rx: MessageStream<P>,
    acks_tx: HandoffSender<Ack<P>>,
    acks_rx: AckStream<P>,
}

/// Generates a fresh subscriber id from the OS randomness source.
pub fn generate_id() -> Result<SubscriberId, BrokerError> {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

impl<P> Subscriber<P> {
    /// Creates an active subscriber with a fresh random id and no topics.
    pub fn new(mode: DeliveryMode) -> Result<Self, BrokerError> {
        Ok(Self::with_id(generate_id()?, mode))
    }

    /// Creates an active subscriber with a caller-chosen id.
    pub(crate) fn with_id(id: SubscriberId, mode: DeliveryMode) -> Self {
        let (destroyed, closed) = watch::channel(false);
        let (messages_tx, messages_rx) = handoff::channel(closed.clone());
        let (acks_tx, acks_rx) = handoff::channel(closed);

        Self {
            id,
            mode,
            state: RwLock::new(SubscriberState {
                topics: HashSet::new(),
                destroyed: false,
            }),
            destroyed,
            messages_tx,
            messages_rx,
            acks_tx,
            acks_rx,
        }
    }

    /// Random hex id assigned at creation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// How delivery attempts treat this subscriber.
    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Topics this subscriber is currently bound to, in no particular order.
    pub fn topics(&self) -> Vec<String> {
        self.state.read().topics.iter().cloned().collect()
    }

    /// Whether `topic` is in this subscriber's topic set.
    pub fn is_subscribed_to(&self, topic: &str) -> bool {
        self.state.read().topics.contains(topic)
    }

    /// Whether the broker has unsubscribed this subscriber.
    pub fn is_destroyed(&self) -> bool {
        self.state.read().destroyed
    }

    /// Records a topic binding. Returns `false` if the subscriber is destroyed.
    pub(crate) fn create_topic(&self, topic: &str) -> bool {
        let mut state = self.state.write();
        if state.destroyed {
            return false;
        }
        state.topics.insert(topic.to_string());
        true
    }

    /// Drops a topic binding; unknown topics are ignored.
    pub(crate) fn delete_topic(&self, topic: &str) {
        self.state.write().topics.remove(topic);
    }

    /// Hands `message` to whoever reads [`Subscriber::messages`], waiting until
    /// a reader takes it.
    ///
    /// Returns `false` without blocking if the subscriber is destroyed, or once
    /// it gets destroyed while the handoff is pending.
    pub async fn signal(&self, message: Message<P>) -> bool {
        if self.is_destroyed() {
            trace!(subscriber = %self.id, "signal on destroyed subscriber dropped");
            return false;
        }
        self.messages_tx.send(message).await
    }

    /// Acknowledges `message` to the delivery attempt that sent it, waiting
    /// until the attempt takes the ack.
    ///
    /// A no-op returning `false` for destroyed or fire-and-forget subscribers.
    pub async fn ack(&self, message: &Message<P>) -> bool
    where
        P: Clone,
    {
        if self.mode == DeliveryMode::FireAndForget || self.is_destroyed() {
            return false;
        }
        let ack = Ack::new(self.id.clone(), message.payload().clone());
        self.acks_tx.send(ack).await
    }

    /// The stream consumers read delivered messages from.
    ///
    /// Every handle reads from the same queue; it yields `None` once the
    /// subscriber is destroyed.
    pub fn messages(&self) -> MessageStream<P> {
        self.messages_rx.clone()
    }

    /// The stream delivery attempts read acknowledgments from.
    pub fn acks(&self) -> AckStream<P> {
        self.acks_rx.clone()
    }

    /// Marks the subscriber destroyed, then closes both channels so blocked
    /// readers and senders are released. The topic set is left to the broker.
    pub(crate) fn destroy(&self) {
        self.state.write().destroyed = true;
        self.destroyed.send_replace(true);
    }
}

impl<P> std::fmt::Debug for Subscriber<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("topics", &state.topics)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}
