//! # acksub
//!
//! `acksub` is an in-process publish/subscribe broker built on tokio.
//! Publishers push payloads tagged with a topic; subscribers bind to topics
//! and receive matching messages through their own delivery stream. A
//! subscriber can acknowledge what it receives, and the broker keeps
//! re-sending unacknowledged messages (at-least-once delivery).
//!
//! ## Core Modules
//!
//! - `broker`: the registry, the topic index and the publish/ack retry protocol.
//! - `config`: loads broker and logging settings from files and the environment.
//! - `utils`: shared error type and logging setup.
//!
//! ## Example
//!
//! ```rust
//! # #[tokio::main]
//! # async fn main() -> Result<(), acksub::BrokerError> {
//! use acksub::Broker;
//!
//! let broker = Broker::<String>::new();
//! let subscriber = broker.subscribe()?;
//! broker.add_subscription(&subscriber, &["news"]);
//!
//! let mut messages = subscriber.messages();
//! broker.publish("hello".to_string(), &["news"]);
//!
//! let message = messages.recv().await.expect("subscriber is alive");
//! assert_eq!(message.topic(), "news");
//! subscriber.ack(&message).await;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod config;
pub mod utils;

pub use broker::{
    Ack, AckStream, Broker, DeliveryMode, DeliveryOutcome, Message, MessageStream, Payload,
    RetryPolicy, Subscriber,
};
pub use utils::error::BrokerError;
