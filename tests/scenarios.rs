use std::collections::HashSet;
use std::time::Duration;

use acksub::{Broker, DeliveryOutcome, Message};

const WAIT: Duration = Duration::from_secs(5);

async fn next(stream: &mut acksub::MessageStream<String>) -> Message<String> {
    tokio::time::timeout(WAIT, stream.recv())
        .await
        .expect("message not delivered in time")
        .expect("stream closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_subscribers_on_one_topic_both_receive() {
    let broker = Broker::<String>::new();
    let s1 = broker.subscribe().unwrap();
    let s2 = broker.subscribe().unwrap();
    broker.add_subscription(&s1, &["T"]);
    broker.add_subscription(&s2, &["T"]);
    assert_eq!(broker.subscribers("T"), 2);

    let handles = broker.publish("x".to_string(), &["T"]);
    assert_eq!(handles.len(), 2);

    // s2 reads first; s1 must not be held up by it
    let mut m2 = s2.messages();
    let got2 = next(&mut m2).await;
    let mut m1 = s1.messages();
    let got1 = next(&mut m1).await;

    for (s, got) in [(&s1, &got1), (&s2, &got2)] {
        assert_eq!(got.topic(), "T");
        assert_eq!(got.payload(), "x");
        assert!(s.ack(got).await);
    }

    for handle in handles {
        assert_eq!(
            handle.await.unwrap(),
            DeliveryOutcome::Acknowledged { attempts: 1 }
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn one_subscriber_on_two_topics_gets_both_tagged() {
    let broker = Broker::<String>::new();
    let s1 = broker.subscribe().unwrap();
    broker.add_subscription(&s1, &["A", "B"]);

    let _a = broker.publish("p1".to_string(), &["A"]);
    let _b = broker.publish("p2".to_string(), &["B"]);

    let mut messages = s1.messages();
    let mut seen = HashSet::new();
    for _ in 0..2 {
        let message = next(&mut messages).await;
        assert!(s1.ack(&message).await);
        seen.insert((message.topic().to_string(), message.into_payload()));
    }

    let expected: HashSet<_> = [
        ("A".to_string(), "p1".to_string()),
        ("B".to_string(), "p2".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn publish_to_many_topics_at_once() {
    let broker = Broker::<String>::new();
    let s1 = broker.subscribe().unwrap();
    broker.add_subscription(&s1, &["A", "B"]);

    let handles = broker.publish("both".to_string(), &["A", "B", "C"]);
    assert_eq!(handles.len(), 2);

    let mut messages = s1.messages();
    let mut topics = HashSet::new();
    for _ in 0..2 {
        let message = next(&mut messages).await;
        assert_eq!(message.payload(), "both");
        assert!(s1.ack(&message).await);
        topics.insert(message.topic().to_string());
    }
    assert_eq!(topics.len(), 2);
}

#[tokio::test]
async fn unsubscribed_subscriber_receives_nothing() {
    let broker = Broker::<String>::new();
    let s1 = broker.subscribe().unwrap();
    broker.add_subscription(&s1, &["T"]);
    let mut messages = s1.messages();

    broker.unsubscribe(&s1);
    assert_eq!(broker.subscribers("T"), 0);
    assert!(broker.subscriber(s1.id()).is_none());

    assert!(broker.publish("x".to_string(), &["T"]).is_empty());
    assert!(messages.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn stream_adapter_yields_retries_until_ack() {
    use futures::StreamExt;

    let broker = Broker::<u64>::new();
    let s1 = broker.subscribe().unwrap();
    broker.add_subscription(&s1, &["numbers"]);

    let handle = broker.publish(7, &["numbers"]).pop().unwrap();
    let mut stream = Box::pin(s1.messages().into_stream());

    let first = stream.next().await.unwrap();
    let retry = stream.next().await.unwrap();
    assert_eq!(first, retry);
    assert!(s1.ack(&retry).await);

    assert_eq!(
        handle.await.unwrap(),
        DeliveryOutcome::Acknowledged { attempts: 2 }
    );
}
