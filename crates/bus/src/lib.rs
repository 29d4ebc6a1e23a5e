//! Message-bus plumbing: the per-handler outbound buffer, the producer
//! contract, the Kafka adapters and the consumer runtime.

pub mod buffer;
pub mod kafka;
pub mod memory;
pub mod message;
pub mod producer;

pub use buffer::{BufferError, EmitError, MessageBuffer, emit};
pub use kafka::{ConsumerConfig, ConsumerError, KafkaProducer, build_consumer, run_consumer};
pub use memory::{RecordingProducer, SentBatch};
pub use message::{MessageContext, OutboundMessage, partition_key};
pub use producer::{Producer, ProducerError};
