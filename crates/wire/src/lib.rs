//! Message schemas for every topic this service touches.
//!
//! All payloads are JSON with camelCase field names. Envelopes carry routing
//! fields at the top level plus an adjacently tagged `type`/`body` pair.
//! Unknown fields on inbound messages are tolerated and ignored.

pub mod cash_shop;
pub mod character;
pub mod transfer;
