//! Outbound message representation, partition keys and tracing headers.

use serde::Serialize;

use crate::buffer::BufferError;

/// Header carrying the tenant a message belongs to.
pub const HEADER_TENANT_ID: &str = "TENANT_ID";

/// Header carrying the trace span of the message's origin.
pub const HEADER_SPAN_ID: &str = "SPAN_ID";

/// A keyed message staged for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub key: Vec<u8>,
    pub payload: Vec<u8>,
}

impl OutboundMessage {
    /// Encode `value` as a single-message batch under `key`.
    ///
    /// Encoding is deferred to the moment the provider runs, so a
    /// serialization failure surfaces from `MessageBuffer::put`.
    pub fn single<V: Serialize>(key: Vec<u8>, value: &V) -> Result<Vec<Self>, BufferError> {
        let payload = serde_json::to_vec(value)?;
        Ok(vec![Self { key, payload }])
    }
}

/// Derive the partition key for a numeric principal.
///
/// Every message addressing the same principal must use this derivation so
/// the bus keeps them on one partition, in order.
pub fn partition_key(id: u32) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Tracing headers recognised on inbound messages and propagated to every
/// message emitted while handling them. Orchestration logic never reads
/// these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContext {
    pub tenant_id: Option<String>,
    pub span_id: Option<String>,
}

impl MessageContext {
    /// Pick the recognised headers out of a message's header list.
    pub fn from_header_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut ctx = Self::default();
        for (key, value) in pairs {
            match key {
                HEADER_TENANT_ID => ctx.tenant_id = String::from_utf8(value.to_vec()).ok(),
                HEADER_SPAN_ID => ctx.span_id = String::from_utf8(value.to_vec()).ok(),
                _ => {}
            }
        }
        ctx
    }

    /// The headers to stamp on outbound messages.
    pub fn header_pairs(&self) -> Vec<(&'static str, &[u8])> {
        let mut pairs = Vec::new();
        if let Some(tenant) = &self.tenant_id {
            pairs.push((HEADER_TENANT_ID, tenant.as_bytes()));
        }
        if let Some(span) = &self.span_id {
            pairs.push((HEADER_SPAN_ID, span.as_bytes()));
        }
        pairs
    }
}
