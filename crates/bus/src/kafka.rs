//! Kafka adapters: keyed producer and the per-topic consumer runtime.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use rdkafka::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Header, Headers, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, warn};

use crate::message::{MessageContext, OutboundMessage};
use crate::producer::{Producer, ProducerError};

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("failed to create consumer: {0}")]
    Create(#[source] rdkafka::error::KafkaError),

    #[error("failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },
}

/// Producer adapter over a shared Kafka connection.
///
/// Thread-safe; one instance serves every handler in the process.
pub struct KafkaProducer {
    inner: FutureProducer,
}

impl KafkaProducer {
    pub fn new(bootstrap_servers: &str) -> Result<Self, ProducerError> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(ProducerError::Create)?;
        Ok(Self { inner })
    }
}

#[async_trait::async_trait]
impl Producer for KafkaProducer {
    async fn send(
        &self,
        ctx: &MessageContext,
        topic: &str,
        batch: Vec<OutboundMessage>,
    ) -> Result<(), ProducerError> {
        for message in batch {
            let mut headers = OwnedHeaders::new();
            for (key, value) in ctx.header_pairs() {
                headers = headers.insert(Header {
                    key,
                    value: Some(value),
                });
            }

            let record = FutureRecord::to(topic)
                .key(&message.key)
                .payload(&message.payload)
                .headers(headers);

            self.inner
                .send(record, Duration::from_secs(30))
                .await
                .map_err(|(source, _)| ProducerError::Delivery {
                    topic: topic.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Connection settings shared by every consumer of this process.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub bootstrap_servers: String,
    pub group_id: String,
}

/// Create a consumer subscribed to a single topic.
///
/// Offsets are committed manually, after the handler reports success.
pub fn build_consumer(config: &ConsumerConfig, topic: &str) -> Result<StreamConsumer, ConsumerError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.bootstrap_servers)
        .set("group.id", &config.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .create()
        .map_err(ConsumerError::Create)?;

    consumer
        .subscribe(&[topic])
        .map_err(|source| ConsumerError::Subscribe {
            topic: topic.to_string(),
            source,
        })?;

    Ok(consumer)
}

/// Receive-decode-dispatch-commit loop for one topic.
///
/// Commit discipline, per message:
/// - undecodable payload: warn, commit (drop);
/// - handler success: commit;
/// - handler failure or panic: offset stays uncommitted, the message is
///   redelivered (at-least-once).
///
/// Runs until the cancellation token fires.
pub async fn run_consumer<T, H, Fut, E>(
    consumer: StreamConsumer,
    topic: String,
    token: CancellationToken,
    handler: H,
) where
    T: serde::de::DeserializeOwned,
    H: Fn(MessageContext, T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    info!(topic = %topic, "consumer started");
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            received = consumer.recv() => match received {
                Ok(message) => handle_message(&consumer, &topic, &handler, &message).await,
                Err(err) => warn!(topic = %topic, error = %err, "failed to receive from bus"),
            },
        }
    }
    info!(topic = %topic, "consumer stopped");
}

async fn handle_message<T, H, Fut, E>(
    consumer: &StreamConsumer,
    topic: &str,
    handler: &H,
    message: &BorrowedMessage<'_>,
) where
    T: serde::de::DeserializeOwned,
    H: Fn(MessageContext, T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let ctx = context_from(message);

    let Some(payload) = message.payload() else {
        warn!(topic, "dropping message with no payload");
        commit(consumer, topic, message);
        return;
    };

    let value: T = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(topic, error = %err, "dropping undecodable message");
            commit(consumer, topic, message);
            return;
        }
    };

    // Everything the handler logs carries the message's origin.
    let span = tracing::info_span!(
        "message",
        topic,
        tenant_id = ctx.tenant_id.as_deref(),
        span_id = ctx.span_id.as_deref(),
    );

    let outcome = AssertUnwindSafe(async { handler(ctx, value).await }.instrument(span))
        .catch_unwind()
        .await;
    match outcome {
        Ok(Ok(())) => commit(consumer, topic, message),
        Ok(Err(err)) => warn!(topic, error = %err, "handler failed; offset left uncommitted"),
        Err(_) => error!(topic, "handler panicked; offset left uncommitted"),
    }
}

fn commit(consumer: &StreamConsumer, topic: &str, message: &BorrowedMessage<'_>) {
    if let Err(err) = consumer.commit_message(message, CommitMode::Async) {
        warn!(topic, error = %err, "failed to commit offset");
    }
}

fn context_from(message: &BorrowedMessage<'_>) -> MessageContext {
    match message.headers() {
        Some(headers) => MessageContext::from_header_pairs(
            headers.iter().filter_map(|h| h.value.map(|v| (h.key, v))),
        ),
        None => MessageContext::default(),
    }
}
