//! In-memory producer for tests/dev.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::message::{MessageContext, OutboundMessage};
use crate::producer::{Producer, ProducerError};

/// One accepted `Producer::send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBatch {
    pub topic: String,
    pub context: MessageContext,
    pub messages: Vec<OutboundMessage>,
}

/// Producer that records every batch instead of talking to a bus.
///
/// `rejecting()` builds one that fails every send, for exercising the
/// flush-failure path.
#[derive(Debug, Default)]
pub struct RecordingProducer {
    sent: Mutex<Vec<SentBatch>>,
    reject: bool,
}

impl RecordingProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    /// Everything accepted so far, in acceptance order.
    pub fn sent(&self) -> Vec<SentBatch> {
        self.sent.lock().unwrap().clone()
    }

    /// All accepted messages for one topic, flattened across batches.
    pub fn messages_for(&self, topic: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|batch| batch.topic == topic)
            .flat_map(|batch| batch.messages.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl Producer for RecordingProducer {
    async fn send(
        &self,
        ctx: &MessageContext,
        topic: &str,
        batch: Vec<OutboundMessage>,
    ) -> Result<(), ProducerError> {
        if self.reject {
            return Err(ProducerError::Rejected(topic.to_string()));
        }
        self.sent.lock().unwrap().push(SentBatch {
            topic: topic.to_string(),
            context: ctx.clone(),
            messages: batch,
        });
        Ok(())
    }
}
