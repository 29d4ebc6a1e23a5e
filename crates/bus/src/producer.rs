//! Producer contract for keyed, topic-grouped emission.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::{MessageContext, OutboundMessage};

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("failed to create producer: {0}")]
    Create(#[source] rdkafka::error::KafkaError),

    #[error("delivery to topic {topic} failed: {source}")]
    Delivery {
        topic: String,
        #[source]
        source: rdkafka::error::KafkaError,
    },

    /// Used by in-memory producers to simulate delivery failure.
    #[error("batch for topic {0} rejected")]
    Rejected(String),
}

/// Submits a batch of keyed messages to one topic.
///
/// No retry logic lives here: a failed batch surfaces to the handler, the
/// inbound offset stays uncommitted and redelivery reattempts the work.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn send(
        &self,
        ctx: &MessageContext,
        topic: &str,
        batch: Vec<OutboundMessage>,
    ) -> Result<(), ProducerError>;
}

#[async_trait]
impl<P> Producer for std::sync::Arc<P>
where
    P: Producer + ?Sized,
{
    async fn send(
        &self,
        ctx: &MessageContext,
        topic: &str,
        batch: Vec<OutboundMessage>,
    ) -> Result<(), ProducerError> {
        (**self).send(ctx, topic, batch).await
    }
}
