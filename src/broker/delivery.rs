//! Publish/ack retry protocol
//!
//! Each (topic, subscriber) pair selected by a publish gets its own delivery
//! attempt, run as an independent tokio task:
//!
//! 1. signal the message to the subscriber and wait until it is taken
//! 2. wait up to `ack_timeout` for an acknowledgment
//! 3. stop on an ack, otherwise go back to 1
//!
//! With the default policy there is no retry limit, so a subscriber that reads
//! but never acknowledges gets the same message re-signalled forever. A
//! configured `max_retries` drops the message once the re-sends are used up.
//! Destroying the subscriber ends the attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::broker::message::{Message, Payload};
use crate::broker::subscriber::{DeliveryMode, Subscriber};
use crate::config::BrokerSettings;

/// Default time a delivery attempt waits for an ack before re-sending.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub ack_timeout: Duration,
    /// Re-sends allowed after the first signal; `None` retries without limit.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            max_retries: None,
        }
    }
}

impl From<&BrokerSettings> for RetryPolicy {
    fn from(settings: &BrokerSettings) -> Self {
        Self {
            ack_timeout: Duration::from_millis(settings.ack_timeout_ms),
            max_retries: settings.max_retries,
        }
    }
}

/// How a delivery attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The subscriber acknowledged the message.
    Acknowledged { attempts: u32 },
    /// A fire-and-forget subscriber took the message.
    Delivered,
    /// No ack arrived within the allowed number of re-sends.
    Dropped { attempts: u32 },
    /// The subscriber was destroyed before the message was acknowledged.
    Abandoned { attempts: u32 },
}

/// Starts an independent delivery attempt of `message` to `subscriber`.
pub(crate) fn spawn<P: Payload>(
    subscriber: Arc<Subscriber<P>>,
    message: Message<P>,
    policy: RetryPolicy,
) -> JoinHandle<DeliveryOutcome> {
    tokio::spawn(deliver(subscriber, message, policy))
}

async fn deliver<P: Payload>(
    subscriber: Arc<Subscriber<P>>,
    message: Message<P>,
    policy: RetryPolicy,
) -> DeliveryOutcome {
    let mut acks = subscriber.acks();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;

        if !subscriber.signal(message.clone()).await {
            debug!(
                subscriber = subscriber.id(),
                topic = message.topic(),
                attempts,
                "subscriber destroyed, abandoning delivery"
            );
            return DeliveryOutcome::Abandoned { attempts };
        }

        if subscriber.mode() == DeliveryMode::FireAndForget {
            return DeliveryOutcome::Delivered;
        }

        match tokio::time::timeout(policy.ack_timeout, acks.recv()).await {
            Ok(Some(ack)) => {
                debug!(
                    subscriber = ack.subscriber_id(),
                    topic = message.topic(),
                    attempts,
                    "ack received"
                );
                return DeliveryOutcome::Acknowledged { attempts };
            }
            Ok(None) => return DeliveryOutcome::Abandoned { attempts },
            Err(_) => {
                if policy.max_retries.is_some_and(|max| attempts > max) {
                    warn!(
                        subscriber = subscriber.id(),
                        topic = message.topic(),
                        attempts,
                        "no ack received, dropping message"
                    );
                    return DeliveryOutcome::Dropped { attempts };
                }
                debug!(
                    subscriber = subscriber.id(),
                    topic = message.topic(),
                    attempts,
                    "no ack within {:?}, re-sending",
                    policy.ack_timeout
                );
            }
        }
    }
}
