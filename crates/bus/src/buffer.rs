//! Per-handler staging of outbound messages, flushed transactionally.

use std::collections::HashMap;

use thiserror::Error;

use crate::message::{MessageContext, OutboundMessage};
use crate::producer::{Producer, ProducerError};

#[derive(Debug, Error)]
pub enum BufferError {
    #[error("failed to encode outbound payload: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Producer(#[from] ProducerError),
}

/// In-memory staging area for the messages one handler invocation produces.
///
/// Created empty per inbound message, appended to while the handler runs,
/// then flushed as a whole once the handler returns success. Never shared
/// across handlers; it has no existence after the flush.
///
/// Within a topic, insertion order is preserved and transmitted as such.
/// Across topics no order is guaranteed.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    queued: HashMap<String, Vec<OutboundMessage>>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `provider` and append its batch under `topic`.
    ///
    /// Provider failures propagate; nothing is appended in that case.
    pub fn put<F>(&mut self, topic: &str, provider: F) -> Result<(), BufferError>
    where
        F: FnOnce() -> Result<Vec<OutboundMessage>, BufferError>,
    {
        let batch = provider()?;
        self.queued.entry(topic.to_string()).or_default().extend(batch);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Messages staged for `topic`, in insertion order.
    pub fn staged(&self, topic: &str) -> &[OutboundMessage] {
        self.queued.get(topic).map(Vec::as_slice).unwrap_or_default()
    }

    /// Emit everything through `producer` in topic-grouped batches.
    ///
    /// Every batch must be accepted; the first failure aborts the flush and
    /// propagates. Batches already accepted stay emitted (at-least-once).
    pub async fn flush<P>(self, producer: &P, ctx: &MessageContext) -> Result<(), ProducerError>
    where
        P: Producer + ?Sized,
    {
        for (topic, batch) in self.queued {
            producer.send(ctx, &topic, batch).await?;
        }
        Ok(())
    }
}

/// Run `handler` against a fresh buffer and flush it on success.
///
/// On handler failure nothing is emitted.
pub async fn emit<P, F>(producer: &P, ctx: &MessageContext, handler: F) -> Result<(), EmitError>
where
    P: Producer + ?Sized,
    F: FnOnce(&mut MessageBuffer) -> Result<(), BufferError>,
{
    let mut buffer = MessageBuffer::new();
    handler(&mut buffer)?;
    buffer.flush(producer, ctx).await?;
    Ok(())
}
