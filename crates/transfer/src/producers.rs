//! Deferred message providers for every outbound shape.
//!
//! Each provider captures its arguments and encodes the payload only when
//! the buffer runs it, so encoding failures surface from `put`.

use stashport_bus::{BufferError, OutboundMessage, partition_key};
use stashport_core::{CompartmentId, CompartmentType, InventoryType, TransactionId};
use stashport_wire::{cash_shop, character, transfer};

pub fn character_accept_command(
    character_id: u32,
    compartment_type: CompartmentType,
    transaction_id: TransactionId,
    reference_id: u32,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let command = character::Command {
            character_id,
            inventory_type: compartment_type,
            kind: character::CommandKind::Accept(character::AcceptBody {
                transaction_id,
                reference_id,
            }),
        };
        OutboundMessage::single(partition_key(character_id), &command)
    }
}

pub fn character_release_command(
    character_id: u32,
    compartment_type: CompartmentType,
    transaction_id: TransactionId,
    asset_id: u32,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let command = character::Command {
            character_id,
            inventory_type: compartment_type,
            kind: character::CommandKind::Release(character::ReleaseBody {
                transaction_id,
                asset_id,
            }),
        };
        OutboundMessage::single(partition_key(character_id), &command)
    }
}

pub fn cash_shop_accept_command(
    account_id: u32,
    compartment_id: CompartmentId,
    compartment_type: CompartmentType,
    transaction_id: TransactionId,
    reference_id: u32,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let command = cash_shop::Command {
            account_id,
            compartment_type,
            kind: cash_shop::CommandKind::Accept(cash_shop::AcceptBody {
                transaction_id,
                compartment_id,
                reference_id,
            }),
        };
        OutboundMessage::single(partition_key(account_id), &command)
    }
}

pub fn cash_shop_release_command(
    account_id: u32,
    compartment_id: CompartmentId,
    compartment_type: CompartmentType,
    transaction_id: TransactionId,
    asset_id: u32,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let command = cash_shop::Command {
            account_id,
            compartment_type,
            kind: cash_shop::CommandKind::Release(cash_shop::ReleaseBody {
                transaction_id,
                compartment_id,
                asset_id,
            }),
        };
        OutboundMessage::single(partition_key(account_id), &command)
    }
}

pub fn completed_status_event(
    character_id: u32,
    transaction_id: TransactionId,
    account_id: u32,
    asset_id: u32,
    compartment_id: CompartmentId,
    compartment_type: CompartmentType,
    inventory_type: InventoryType,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let event = transfer::StatusEvent {
            character_id,
            kind: transfer::StatusEventKind::Completed(transfer::CompletedBody {
                transaction_id,
                account_id,
                asset_id,
                compartment_id,
                compartment_type,
                inventory_type,
            }),
        };
        OutboundMessage::single(partition_key(character_id), &event)
    }
}

#[cfg(feature = "saga-failed-event")]
pub fn failed_status_event(
    character_id: u32,
    transaction_id: TransactionId,
) -> impl FnOnce() -> Result<Vec<OutboundMessage>, BufferError> {
    move || {
        let event = transfer::StatusEvent {
            character_id,
            kind: transfer::StatusEventKind::Failed(transfer::FailedBody { transaction_id }),
        };
        OutboundMessage::single(partition_key(character_id), &event)
    }
}
