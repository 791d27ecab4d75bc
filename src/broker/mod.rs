//! The broker: subscriber registry, topic index and the publish/ack retry
//! protocol.

pub mod delivery;
pub mod engine;
pub mod handoff;
pub mod message;
pub mod subscriber;
pub mod topic;

pub use delivery::{DeliveryOutcome, RetryPolicy};
pub use engine::Broker;
pub use message::{Ack, Message, Payload};
pub use subscriber::{AckStream, DeliveryMode, MessageStream, Subscriber};
