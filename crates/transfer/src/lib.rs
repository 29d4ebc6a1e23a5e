//! The transfer saga orchestrator.
//!
//! A transfer is a two-phase protocol: the destination compartment accepts
//! the asset, then the source compartment releases it. Each phase is driven
//! by one inbound message; the state carried across messages lives in the
//! [`cache::SagaCache`], keyed by transaction id. There is no long-lived task
//! per saga: the message bus is the event queue.

pub mod cache;
pub mod processor;
pub mod producers;
pub mod saga;

pub use cache::SagaCache;
pub use processor::{OutboundTopics, TransferProcessor};
pub use saga::{ReleaseStep, SagaRecord};
