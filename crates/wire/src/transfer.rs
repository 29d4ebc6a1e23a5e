//! Orchestration input and the terminal transfer-status event.

use serde::{Deserialize, Serialize};

use stashport_core::{CompartmentId, CompartmentType, InventoryType, TransactionId};

/// Environment variable naming the topic transfer commands arrive on.
pub const ENV_COMMAND_TOPIC: &str = "COMMAND_TOPIC_COMPARTMENT_TRANSFER";

/// Environment variable naming the topic terminal saga events are published to.
pub const ENV_EVENT_TOPIC_STATUS: &str = "EVENT_TOPIC_COMPARTMENT_TRANSFER_STATUS";

/// Request to move one asset between two compartments.
///
/// `reference_id` is the logical item identifier used when addressing
/// character inventory; `asset_id` is the concrete instance identifier used
/// when addressing cash-shop inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCommand {
    pub transaction_id: TransactionId,
    pub account_id: u32,
    pub character_id: u32,
    pub asset_id: u32,
    pub reference_id: u32,
    pub from_compartment_id: CompartmentId,
    pub from_compartment_type: CompartmentType,
    pub from_inventory_type: InventoryType,
    pub to_compartment_id: CompartmentId,
    pub to_compartment_type: CompartmentType,
    pub to_inventory_type: InventoryType,
}

/// Terminal saga status event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub character_id: u32,
    #[serde(flatten)]
    pub kind: StatusEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusEventKind {
    Completed(CompletedBody),
    /// Reserved: emitted only when the saga-failed feature of the
    /// orchestrator is enabled.
    Failed(FailedBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedBody {
    pub transaction_id: TransactionId,
    pub account_id: u32,
    pub asset_id: u32,
    pub compartment_id: CompartmentId,
    pub compartment_type: CompartmentType,
    pub inventory_type: InventoryType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedBody {
    pub transaction_id: TransactionId,
}
