//! Broker engine
//!
//! This module contains the in-memory broker responsible for:
//! - the subscriber registry (id -> subscriber)
//! - the topic index (topic -> bound subscribers)
//! - publishing messages by starting one delivery attempt per bound subscriber
//!
//! Concurrency and usage notes:
//! - The registry and the topic index each sit behind their own reader/writer
//!   lock. No operation holds both at once, and neither is held across an
//!   `.await`; delivery work starts only after the topic snapshot is taken.
//! - `publish` spawns tokio tasks and must be called from within a runtime.
//!   It never waits for delivery.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::broker::delivery::{self, DeliveryOutcome, RetryPolicy};
use crate::broker::message::{Message, Payload};
use crate::broker::subscriber::{DeliveryMode, Subscriber};
use crate::broker::topic::{SubscriberId, Topic};
use crate::config::BrokerSettings;
use crate::utils::error::BrokerError;

pub struct Broker<P> {
    topics: RwLock<HashMap<String, Topic<P>>>,
    subscribers: RwLock<HashMap<SubscriberId, Arc<Subscriber<P>>>>,
    policy: RetryPolicy,
}

impl<P: Payload> Default for Broker<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Payload> Broker<P> {
    /// Creates a broker with the default retry policy: five second ack
    /// timeout and unbounded retries.
    pub fn new() -> Self {
        Self::with_policy(RetryPolicy::default())
    }

    /// Creates a broker whose delivery attempts follow `policy`.
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Creates a broker from the `[broker]` section of the loaded configuration.
    pub fn from_settings(settings: &BrokerSettings) -> Self {
        Self::with_policy(RetryPolicy::from(settings))
    }

    /// The retry policy applied to every delivery attempt.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Registers a new at-least-once subscriber with no topic bindings.
    ///
    /// Fails only if a random id cannot be generated, leaving the broker untouched.
    pub fn subscribe(&self) -> Result<Arc<Subscriber<P>>, BrokerError> {
        self.subscribe_with_mode(DeliveryMode::AtLeastOnce)
    }

    /// Registers a new subscriber using the given delivery mode.
    pub fn subscribe_with_mode(
        &self,
        mode: DeliveryMode,
    ) -> Result<Arc<Subscriber<P>>, BrokerError> {
        let subscriber = Arc::new(Subscriber::new(mode)?);

        self.subscribers
            .write()
            .insert(subscriber.id().to_string(), Arc::clone(&subscriber));

        debug!(subscriber = subscriber.id(), ?mode, "subscriber registered");
        Ok(subscriber)
    }

    /// Destroys the subscriber, removes all of its topic bindings and drops it
    /// from the registry, in that order.
    ///
    /// The subscriber must currently be subscribed to this broker.
    pub fn unsubscribe(&self, subscriber: &Subscriber<P>) {
        subscriber.destroy();

        let topics = subscriber.topics();
        let topics: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.delete_subscription(subscriber, &topics);

        self.subscribers.write().remove(subscriber.id());
        debug!(subscriber = subscriber.id(), "subscriber removed");
    }

    /// Binds the subscriber to each of `topics`, creating topics on first use.
    ///
    /// Binding twice is a no-op. A destroyed subscriber is never bound.
    pub fn add_subscription(&self, subscriber: &Arc<Subscriber<P>>, topics: &[&str]) {
        let mut index = self.topics.write();

        for &name in topics {
            if !subscriber.create_topic(name) {
                debug!(subscriber = subscriber.id(), topic = name, "subscriber destroyed, not binding");
                continue;
            }
            index
                .entry(name.to_string())
                .or_insert_with(|| Topic::new(name))
                .subscribe(subscriber);
        }
    }

    /// Removes the subscriber's binding to each of `topics`. Unknown topics
    /// are ignored.
    ///
    /// Both sides are updated under the topic-index lock, the same lock
    /// `add_subscription` binds under, so a concurrent bind of the same topic
    /// cannot leave the index and the subscriber's topic set disagreeing.
    pub fn delete_subscription(&self, subscriber: &Subscriber<P>, topics: &[&str]) {
        let mut index = self.topics.write();

        for &name in topics {
            if let Some(topic) = index.get_mut(name) {
                topic.unsubscribe(subscriber.id());
            }
            subscriber.delete_topic(name);
        }
    }

    /// Publishes `payload` on each of `topics`.
    ///
    /// Starts one delivery attempt per bound subscriber per topic and returns
    /// their handles without waiting on them. Dropping the handles detaches
    /// the attempts. Topics without subscribers are skipped.
    pub fn publish(&self, payload: P, topics: &[&str]) -> Vec<JoinHandle<DeliveryOutcome>> {
        let mut attempts = Vec::new();

        for &name in topics {
            let bound = match self.topics.read().get(name) {
                Some(topic) if !topic.is_empty() => topic.snapshot(),
                _ => {
                    debug!(topic = name, "no subscribers, nothing to deliver");
                    continue;
                }
            };

            for subscriber in bound {
                let message = Message::new(name, payload.clone());
                attempts.push(delivery::spawn(subscriber, message, self.policy));
            }
        }

        attempts
    }

    /// Number of subscribers currently bound to `topic`.
    pub fn subscribers(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Topic::len)
    }

    /// Every topic the broker has seen, in no particular order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().cloned().collect()
    }

    /// Looks up a registered subscriber by id.
    pub fn subscriber(&self, id: &str) -> Option<Arc<Subscriber<P>>> {
        self.subscribers.read().get(id).cloned()
    }

    /// Ids of every registered subscriber, in no particular order.
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.read().keys().cloned().collect()
    }

    /// Whether `subscriber` is bound to `topic` in the topic index.
    pub fn is_bound(&self, subscriber: &Subscriber<P>, topic: &str) -> bool {
        self.topics
            .read()
            .get(topic)
            .is_some_and(|t| t.contains(subscriber.id()))
    }
}

impl<P> std::fmt::Debug for Broker<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("topics", &self.topics.read().len())
            .field("subscribers", &self.subscribers.read().len())
            .field("policy", &self.policy)
            .finish()
    }
}
