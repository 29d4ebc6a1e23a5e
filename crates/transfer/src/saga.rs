//! Per-transaction saga state.

use stashport_bus::{BufferError, MessageBuffer};
use stashport_core::{CompartmentId, CompartmentType, InventoryType, TransactionId};
use stashport_wire::transfer::TransferCommand;

use crate::processor::OutboundTopics;
use crate::producers;

/// The queued release action, precomputed from the source side of the
/// command when the accept phase is issued.
///
/// This is the strongly-typed equivalent of storing a closure over the
/// original command: everything the release needs is captured here, because
/// the command itself is not replayed when the accept status arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStep {
    Character {
        character_id: u32,
        compartment_type: CompartmentType,
        asset_id: u32,
    },
    CashShop {
        account_id: u32,
        compartment_id: CompartmentId,
        compartment_type: CompartmentType,
        asset_id: u32,
    },
}

impl ReleaseStep {
    /// Capture the release for the command's source side.
    ///
    /// Either source releases by the logical item identifier
    /// (`reference_id`); the wire field is named `assetId` on both command
    /// surfaces. An unknown source inventory yields no step: the saga then
    /// has nothing to release.
    pub fn for_command(cmd: &TransferCommand) -> Option<Self> {
        match cmd.from_inventory_type {
            InventoryType::Character => Some(ReleaseStep::Character {
                character_id: cmd.character_id,
                compartment_type: cmd.from_compartment_type,
                asset_id: cmd.reference_id,
            }),
            InventoryType::CashShop => Some(ReleaseStep::CashShop {
                account_id: cmd.account_id,
                compartment_id: cmd.from_compartment_id,
                compartment_type: cmd.from_compartment_type,
                asset_id: cmd.reference_id,
            }),
            InventoryType::Unknown => None,
        }
    }

    /// Stage the release command against the handler's buffer.
    pub(crate) fn stage(
        &self,
        mb: &mut MessageBuffer,
        topics: &OutboundTopics,
        transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        match *self {
            ReleaseStep::Character {
                character_id,
                compartment_type,
                asset_id,
            } => mb.put(
                &topics.compartment_command,
                producers::character_release_command(
                    character_id,
                    compartment_type,
                    transaction_id,
                    asset_id,
                ),
            ),
            ReleaseStep::CashShop {
                account_id,
                compartment_id,
                compartment_type,
                asset_id,
            } => mb.put(
                &topics.cash_compartment_command,
                producers::cash_shop_release_command(
                    account_id,
                    compartment_id,
                    compartment_type,
                    transaction_id,
                    asset_id,
                ),
            ),
        }
    }
}

/// State kept for one in-flight transfer.
///
/// Created when the accept command is issued, deleted on the terminal event.
/// The completion fields are denormalised from the originating command; the
/// record does not change while the saga advances through its phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaRecord {
    pub release: Option<ReleaseStep>,
    pub character_id: u32,
    pub account_id: u32,
    /// Surfaced in the completion event. For a cash-shop destination this
    /// holds the command's `reference_id` rather than its `asset_id`: the
    /// cash shop materialises a new asset identity from the reference.
    pub asset_id: u32,
    pub to_compartment_id: CompartmentId,
    pub to_compartment_type: CompartmentType,
    pub to_inventory_type: InventoryType,
}
