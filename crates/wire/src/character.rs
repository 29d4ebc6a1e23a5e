//! Character-compartment command and status-event schemas.

use serde::{Deserialize, Serialize};

use stashport_core::{CompartmentId, CompartmentType, TransactionId};

/// Environment variable naming the character compartment command topic.
pub const ENV_COMMAND_TOPIC: &str = "COMMAND_TOPIC_COMPARTMENT";

/// Environment variable naming the character compartment status topic.
pub const ENV_EVENT_TOPIC_STATUS: &str = "EVENT_TOPIC_COMPARTMENT_STATUS";

pub const ERROR_ACCEPT_COMMAND_FAILED: &str = "ACCEPT_COMMAND_FAILED";
pub const ERROR_RELEASE_COMMAND_FAILED: &str = "RELEASE_COMMAND_FAILED";

/// Command to the character compartment service.
///
/// `inventory_type` carries the compartment type tag of the addressed
/// slot-group; the character service resolves the concrete compartment
/// from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub character_id: u32,
    pub inventory_type: CompartmentType,
    #[serde(flatten)]
    pub kind: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Accept(AcceptBody),
    Release(ReleaseBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptBody {
    pub transaction_id: TransactionId,
    pub reference_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseBody {
    pub transaction_id: TransactionId,
    pub asset_id: u32,
}

/// Status event published by the character compartment service.
///
/// One topic carries all three kinds; the kind is dispatched on after decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub character_id: u32,
    pub compartment_id: CompartmentId,
    #[serde(flatten)]
    pub kind: StatusEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusEventKind {
    Accepted(TransactionBody),
    Released(TransactionBody),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: String,
    pub transaction_id: TransactionId,
}
