//! Message and acknowledgment envelopes
//!
//! Both types are immutable once constructed and only live for the duration
//! of one delivery attempt: a `Message` travels from the broker to a
//! subscriber, an `Ack` travels back carrying the subscriber id and the
//! payload it confirms.

use crate::broker::topic::SubscriberId;

/// Types that can be published as payloads.
///
/// The payload is cloned into every delivery attempt and every retry, so
/// prefer cheaply clonable types (or wrap large payloads in an [`Arc`][std::sync::Arc]).
pub trait Payload: Clone + Send + Sync + 'static {}
impl<T> Payload for T where T: Clone + Send + Sync + 'static {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<P> {
    topic: String,
    payload: P,
}

impl<P> Message<P> {
    /// Wraps `payload` for delivery on `topic`.
    pub fn new(topic: impl Into<String>, payload: P) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// The topic this message was published on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The published payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the message, returning its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack<P> {
    subscriber_id: SubscriberId,
    payload: P,
}

impl<P> Ack<P> {
    /// Builds the acknowledgment `subscriber_id` sends for `payload`.
    pub fn new(subscriber_id: impl Into<SubscriberId>, payload: P) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            payload,
        }
    }

    /// Id of the subscriber that acknowledged the message.
    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// The payload of the acknowledged message.
    pub fn payload(&self) -> &P {
        &self.payload
    }
}
