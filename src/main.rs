//! Demo driver for acksub
//!
//! Creates a few subscribers bound to the requested topics, publishes random
//! hex payloads at a fixed interval and lets every subscriber log and
//! acknowledge what it receives. Stops after `--count` publishes or on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use acksub::config::load_config;
use acksub::utils::logging;
use acksub::{Broker, Subscriber};
use clap::Parser;
use futures::StreamExt;
use rand::RngCore;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "acksub", about = "In-process pub/sub broker demo")]
struct Args {
    /// Topics to publish on; every subscriber binds to all of them
    #[arg(long, value_delimiter = ',', default_value = "ABCDE")]
    topics: Vec<String>,
    /// Number of subscribers to create
    #[arg(long, default_value_t = 2)]
    subscribers: usize,
    /// Number of payloads to publish per topic
    #[arg(long, default_value_t = 5)]
    count: usize,
    /// Delay between publishes in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return;
        }
    };
    logging::init(&config.logging.level);

    tokio::select! {
        result = run(args, Broker::from_settings(&config.broker)) => {
            if let Err(e) = result {
                error!("Demo failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }
}

async fn run(args: Args, broker: Broker<String>) -> Result<(), acksub::BrokerError> {
    let topics: Vec<&str> = args.topics.iter().map(String::as_str).collect();

    let mut receivers = Vec::with_capacity(args.subscribers);
    for _ in 0..args.subscribers {
        let subscriber = broker.subscribe()?;
        broker.add_subscription(&subscriber, &topics);
        info!(
            subscriber = subscriber.id(),
            topics = ?subscriber.topics(),
            "subscribed"
        );
        receivers.push(tokio::spawn(receive(subscriber)));
    }

    for topic in &topics {
        info!(topic, subscribers = broker.subscribers(topic), "topic ready");
    }

    for _ in 0..args.count {
        for &topic in &topics {
            let payload = random_payload();
            info!(topic, %payload, "publishing");
            broker.publish(payload, &[topic]);
        }
        tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
    }

    for id in broker.subscriber_ids() {
        if let Some(subscriber) = broker.subscriber(&id) {
            broker.unsubscribe(&subscriber);
        }
    }
    for receiver in receivers {
        let _ = receiver.await;
    }
    info!("done");
    Ok(())
}

async fn receive(subscriber: Arc<Subscriber<String>>) {
    let mut messages = Box::pin(subscriber.messages().into_stream());
    while let Some(message) = messages.next().await {
        info!(
            subscriber = subscriber.id(),
            topic = message.topic(),
            payload = %message.payload(),
            "received"
        );
        subscriber.ack(&message).await;
    }
    info!(subscriber = subscriber.id(), "stream closed");
}

fn random_payload() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
