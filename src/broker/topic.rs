//! Topic management
//!
//! A `Topic` holds the subscribers currently bound to one topic name, keyed by
//! subscriber id. Binding the same subscriber twice is a no-op.
//!
//! Concurrency note: callers must synchronize access to `Topic` (the broker
//! keeps every topic behind its topic-index lock).

use std::collections::HashMap;
use std::sync::Arc;

use crate::broker::subscriber::Subscriber;

pub type SubscriberId = String;

#[derive(Debug)]
pub struct Topic<P> {
    pub name: String,
    subscribers: HashMap<SubscriberId, Arc<Subscriber<P>>>,
}

impl<P> Topic<P> {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: HashMap::new(),
        }
    }

    /// Bind a subscriber to the topic. Duplicate binds are ignored.
    pub fn subscribe(&mut self, subscriber: &Arc<Subscriber<P>>) {
        self.subscribers
            .entry(subscriber.id().to_string())
            .or_insert_with(|| Arc::clone(subscriber));
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&mut self, id: &str) {
        self.subscribers.remove(id);
    }

    /// Whether the subscriber with `id` is bound to this topic.
    pub fn contains(&self, id: &str) -> bool {
        self.subscribers.contains_key(id)
    }

    /// Number of bound subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether no subscriber is bound.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Snapshot of the bound subscribers, so the caller can release the
    /// topic-index lock before doing any delivery work.
    pub fn snapshot(&self) -> Vec<Arc<Subscriber<P>>> {
        self.subscribers.values().cloned().collect()
    }
}
