//! The four handler entry points of the transfer saga.
//!
//! ```text
//! (start) ──► process ──► accept pending ──► handle_accepted ──► release pending
//!                              │                                     │
//!                              ▼                                     ▼
//!                         handle_error ────────► (errored)      handle_released ──► (completed)
//! ```
//!
//! The phases are implicit: a saga is "accept pending" or "release pending"
//! purely by cache presence and what was last emitted; terminal states hold
//! no cache entry.
//!
//! Each entry point exists in two forms: the buffer-parameterised form
//! stages messages without emitting, and the `_and_emit` form wraps it in a
//! fresh buffer that is flushed once the handler succeeds. The cache is
//! always updated before anything is flushed, so a racing status event never
//! finds the saga missing.

use std::sync::Arc;

use tracing::{debug, warn};

use stashport_bus::{BufferError, EmitError, MessageBuffer, MessageContext, Producer, emit};
use stashport_core::{InventoryType, TransactionId};
use stashport_wire::transfer::TransferCommand;

use crate::cache::SagaCache;
use crate::producers;
use crate::saga::{ReleaseStep, SagaRecord};

/// Resolved names of the topics this service emits on.
#[derive(Debug, Clone)]
pub struct OutboundTopics {
    pub compartment_command: String,
    pub cash_compartment_command: String,
    pub transfer_status: String,
}

/// Drives transfer sagas against the cache and the outbound topics.
pub struct TransferProcessor<P> {
    producer: P,
    cache: Arc<SagaCache>,
    topics: OutboundTopics,
}

impl<P: Producer> TransferProcessor<P> {
    pub fn new(producer: P, cache: Arc<SagaCache>, topics: OutboundTopics) -> Self {
        Self {
            producer,
            cache,
            topics,
        }
    }

    /// Initial entry: issue the accept command for the destination and
    /// record the saga.
    ///
    /// A command naming an unknown destination inventory is accepted but
    /// non-actionable: nothing is emitted and nothing is stored. An existing
    /// saga under the same transaction id is overwritten (saga restart).
    pub fn process(&self, mb: &mut MessageBuffer, cmd: &TransferCommand) -> Result<(), BufferError> {
        debug!(
            transaction_id = %cmd.transaction_id,
            character_id = cmd.character_id,
            "initiating compartment transfer"
        );

        let release = ReleaseStep::for_command(cmd);

        let record = match cmd.to_inventory_type {
            InventoryType::Character => {
                debug!(
                    transaction_id = %cmd.transaction_id,
                    inventory = %cmd.to_inventory_type,
                    reference_id = cmd.reference_id,
                    "asking destination inventory to accept asset"
                );
                mb.put(
                    &self.topics.compartment_command,
                    producers::character_accept_command(
                        cmd.character_id,
                        cmd.to_compartment_type,
                        cmd.transaction_id,
                        cmd.reference_id,
                    ),
                )?;

                SagaRecord {
                    release,
                    character_id: cmd.character_id,
                    account_id: cmd.account_id,
                    asset_id: cmd.asset_id,
                    to_compartment_id: cmd.to_compartment_id,
                    to_compartment_type: cmd.to_compartment_type,
                    to_inventory_type: cmd.to_inventory_type,
                }
            }
            InventoryType::CashShop => {
                debug!(
                    transaction_id = %cmd.transaction_id,
                    inventory = %cmd.to_inventory_type,
                    reference_id = cmd.reference_id,
                    "asking destination inventory to accept asset"
                );
                mb.put(
                    &self.topics.cash_compartment_command,
                    producers::cash_shop_accept_command(
                        cmd.account_id,
                        cmd.to_compartment_id,
                        cmd.to_compartment_type,
                        cmd.transaction_id,
                        cmd.reference_id,
                    ),
                )?;

                SagaRecord {
                    release,
                    character_id: cmd.character_id,
                    account_id: cmd.account_id,
                    // The cash shop materialises a new asset identity whose
                    // value is the reference, so the completion surfaces the
                    // reference id here.
                    asset_id: cmd.reference_id,
                    to_compartment_id: cmd.to_compartment_id,
                    to_compartment_type: cmd.to_compartment_type,
                    to_inventory_type: cmd.to_inventory_type,
                }
            }
            InventoryType::Unknown => {
                warn!(
                    transaction_id = %cmd.transaction_id,
                    "transfer names an unknown destination inventory; ignoring"
                );
                return Ok(());
            }
        };

        self.cache.store(cmd.transaction_id, record);
        Ok(())
    }

    pub async fn process_and_emit(
        &self,
        ctx: &MessageContext,
        cmd: &TransferCommand,
    ) -> Result<(), EmitError> {
        emit(&self.producer, ctx, |mb| self.process(mb, cmd)).await
    }

    /// The destination accepted: execute the stored release step.
    ///
    /// The saga entry is retained; `handle_released` still needs it. A
    /// missing saga is treated as a late or duplicate delivery and ignored.
    pub fn handle_accepted(
        &self,
        mb: &mut MessageBuffer,
        transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        debug!(%transaction_id, "destination accepted transfer; releasing from source inventory");

        let Some(record) = self.cache.get(transaction_id) else {
            warn!(%transaction_id, "no saga state for transaction");
            return Ok(());
        };

        if let Some(release) = &record.release {
            release.stage(mb, &self.topics, transaction_id)?;
        }
        Ok(())
    }

    pub async fn handle_accepted_and_emit(
        &self,
        ctx: &MessageContext,
        transaction_id: TransactionId,
    ) -> Result<(), EmitError> {
        emit(&self.producer, ctx, |mb| self.handle_accepted(mb, transaction_id)).await
    }

    /// The source released: the transfer is complete. Publish the terminal
    /// event and drop the saga.
    pub fn handle_released(
        &self,
        mb: &mut MessageBuffer,
        transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        debug!(%transaction_id, "asset released from source inventory; transfer completed");

        let Some(record) = self.cache.get(transaction_id) else {
            warn!(%transaction_id, "no saga state for transaction");
            return Ok(());
        };

        mb.put(
            &self.topics.transfer_status,
            producers::completed_status_event(
                record.character_id,
                transaction_id,
                record.account_id,
                record.asset_id,
                record.to_compartment_id,
                record.to_compartment_type,
                record.to_inventory_type,
            ),
        )?;

        self.cache.delete(transaction_id);
        Ok(())
    }

    pub async fn handle_released_and_emit(
        &self,
        ctx: &MessageContext,
        transaction_id: TransactionId,
    ) -> Result<(), EmitError> {
        emit(&self.producer, ctx, |mb| self.handle_released(mb, transaction_id)).await
    }

    /// A downstream compartment reported an error: record the failure by
    /// dropping the saga. No compensation is attempted.
    pub fn handle_error(
        &self,
        mb: &mut MessageBuffer,
        transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        debug!(%transaction_id, "transfer failed downstream");

        let Some(record) = self.cache.get(transaction_id) else {
            warn!(%transaction_id, "no saga state for transaction");
            return Ok(());
        };

        self.stage_failed_event(mb, &record, transaction_id)?;
        self.cache.delete(transaction_id);
        Ok(())
    }

    pub async fn handle_error_and_emit(
        &self,
        ctx: &MessageContext,
        transaction_id: TransactionId,
    ) -> Result<(), EmitError> {
        emit(&self.producer, ctx, |mb| self.handle_error(mb, transaction_id)).await
    }

    #[cfg(feature = "saga-failed-event")]
    fn stage_failed_event(
        &self,
        mb: &mut MessageBuffer,
        record: &SagaRecord,
        transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        mb.put(
            &self.topics.transfer_status,
            producers::failed_status_event(record.character_id, transaction_id),
        )
    }

    #[cfg(not(feature = "saga-failed-event"))]
    fn stage_failed_event(
        &self,
        _mb: &mut MessageBuffer,
        _record: &SagaRecord,
        _transaction_id: TransactionId,
    ) -> Result<(), BufferError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;
    use uuid::Uuid;

    use stashport_bus::{OutboundMessage, RecordingProducer, partition_key};
    use stashport_core::{CompartmentId, CompartmentType};

    use super::*;

    const COMPARTMENT_COMMAND: &str = "compartment-command";
    const CASH_COMPARTMENT_COMMAND: &str = "cash-compartment-command";
    const TRANSFER_STATUS: &str = "transfer-status";

    fn topics() -> OutboundTopics {
        OutboundTopics {
            compartment_command: COMPARTMENT_COMMAND.into(),
            cash_compartment_command: CASH_COMPARTMENT_COMMAND.into(),
            transfer_status: TRANSFER_STATUS.into(),
        }
    }

    fn setup() -> (
        Arc<RecordingProducer>,
        Arc<SagaCache>,
        TransferProcessor<Arc<RecordingProducer>>,
    ) {
        let producer = Arc::new(RecordingProducer::new());
        let cache = Arc::new(SagaCache::new());
        let processor = TransferProcessor::new(producer.clone(), cache.clone(), topics());
        (producer, cache, processor)
    }

    fn command(from: InventoryType, to: InventoryType) -> TransferCommand {
        TransferCommand {
            transaction_id: TransactionId::from_uuid(Uuid::now_v7()),
            account_id: 100,
            character_id: 200,
            asset_id: 5000,
            reference_id: 4001,
            from_compartment_id: CompartmentId::from_uuid(Uuid::now_v7()),
            from_compartment_type: CompartmentType(1),
            from_inventory_type: from,
            to_compartment_id: CompartmentId::from_uuid(Uuid::now_v7()),
            to_compartment_type: CompartmentType(2),
            to_inventory_type: to,
        }
    }

    fn ctx() -> MessageContext {
        MessageContext::default()
    }

    fn payload_json(message: &OutboundMessage) -> Value {
        serde_json::from_slice(&message.payload).unwrap()
    }

    #[tokio::test]
    async fn character_to_character_happy_path() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::Character);
        let tx = cmd.transaction_id;

        // Phase 1: accept for the destination compartment.
        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        let accepts = producer.messages_for(COMPARTMENT_COMMAND);
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0].key, partition_key(200));
        assert_eq!(
            payload_json(&accepts[0]),
            serde_json::json!({
                "characterId": 200,
                "inventoryType": 2,
                "type": "ACCEPT",
                "body": { "transactionId": tx.to_string(), "referenceId": 4001 },
            })
        );
        assert!(cache.get(tx).is_some());

        // Phase 2: release from the source compartment.
        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        let commands = producer.messages_for(COMPARTMENT_COMMAND);
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].key, partition_key(200));
        assert_eq!(
            payload_json(&commands[1]),
            serde_json::json!({
                "characterId": 200,
                "inventoryType": 1,
                "type": "RELEASE",
                "body": { "transactionId": tx.to_string(), "assetId": 4001 },
            })
        );
        // Still in flight: the completion still needs the record.
        assert!(cache.get(tx).is_some());

        // Phase 3: terminal event, saga dropped.
        processor.handle_released_and_emit(&ctx(), tx).await.unwrap();
        let statuses = producer.messages_for(TRANSFER_STATUS);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].key, partition_key(200));
        assert_eq!(
            payload_json(&statuses[0]),
            serde_json::json!({
                "characterId": 200,
                "type": "COMPLETED",
                "body": {
                    "transactionId": tx.to_string(),
                    "accountId": 100,
                    "assetId": 5000,
                    "compartmentId": cmd.to_compartment_id.to_string(),
                    "compartmentType": 2,
                    "inventoryType": "CHARACTER",
                },
            })
        );
        assert!(cache.get(tx).is_none());
    }

    #[tokio::test]
    async fn character_to_cash_shop_happy_path() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::CashShop);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        let accepts = producer.messages_for(CASH_COMPARTMENT_COMMAND);
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0].key, partition_key(100));
        assert_eq!(
            payload_json(&accepts[0]),
            serde_json::json!({
                "accountId": 100,
                "compartmentType": 2,
                "type": "ACCEPT",
                "body": {
                    "transactionId": tx.to_string(),
                    "compartmentId": cmd.to_compartment_id.to_string(),
                    "referenceId": 4001,
                },
            })
        );

        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        let releases = producer.messages_for(COMPARTMENT_COMMAND);
        assert_eq!(releases.len(), 1);
        assert_eq!(
            payload_json(&releases[0]),
            serde_json::json!({
                "characterId": 200,
                "inventoryType": 1,
                "type": "RELEASE",
                "body": { "transactionId": tx.to_string(), "assetId": 4001 },
            })
        );

        processor.handle_released_and_emit(&ctx(), tx).await.unwrap();
        let statuses = producer.messages_for(TRANSFER_STATUS);
        assert_eq!(statuses.len(), 1);
        // For a cash-shop destination the completion surfaces the reference
        // id as the asset id.
        assert_eq!(
            payload_json(&statuses[0])["body"]["assetId"],
            serde_json::json!(4001)
        );
        assert_eq!(
            payload_json(&statuses[0])["body"]["inventoryType"],
            serde_json::json!("CASH_SHOP")
        );
        assert!(cache.get(tx).is_none());
    }

    #[tokio::test]
    async fn cash_shop_source_releases_on_the_cash_topic() {
        let (producer, _cache, processor) = setup();
        let cmd = command(InventoryType::CashShop, InventoryType::Character);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();

        let releases = producer.messages_for(CASH_COMPARTMENT_COMMAND);
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].key, partition_key(100));
        assert_eq!(
            payload_json(&releases[0]),
            serde_json::json!({
                "accountId": 100,
                "compartmentType": 1,
                "type": "RELEASE",
                "body": {
                    "transactionId": tx.to_string(),
                    "compartmentId": cmd.from_compartment_id.to_string(),
                    "assetId": 4001,
                },
            })
        );
    }

    #[tokio::test]
    async fn process_stores_denormalised_completion_fields() {
        let (_producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::Character);

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();

        let record = cache.get(cmd.transaction_id).unwrap();
        assert_eq!(record.character_id, cmd.character_id);
        assert_eq!(record.account_id, cmd.account_id);
        assert_eq!(record.asset_id, cmd.asset_id);
        assert_eq!(record.to_compartment_id, cmd.to_compartment_id);
        assert_eq!(record.to_compartment_type, cmd.to_compartment_type);
        assert_eq!(record.to_inventory_type, cmd.to_inventory_type);
        assert_eq!(
            record.release,
            Some(ReleaseStep::Character {
                character_id: 200,
                compartment_type: CompartmentType(1),
                asset_id: 4001,
            })
        );
    }

    #[tokio::test]
    async fn unknown_destination_is_accepted_but_non_actionable() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::Unknown);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        assert!(producer.sent().is_empty());
        assert!(cache.get(tx).is_none());

        // A later status event for the same transaction is a no-op too.
        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        assert!(producer.sent().is_empty());
    }

    #[tokio::test]
    async fn handlers_are_no_ops_for_unknown_transactions() {
        let (producer, _cache, processor) = setup();
        let tx = TransactionId::from_uuid(Uuid::now_v7());

        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        processor.handle_released_and_emit(&ctx(), tx).await.unwrap();
        processor.handle_error_and_emit(&ctx(), tx).await.unwrap();

        assert!(producer.sent().is_empty());
    }

    #[tokio::test]
    async fn duplicate_accept_reissues_the_release() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::Character);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();

        // The saga survives until released, so both deliveries stage the
        // release; downstream idempotence is assumed.
        let commands = producer.messages_for(COMPARTMENT_COMMAND);
        assert_eq!(commands.len(), 3);
        assert_eq!(payload_json(&commands[1]), payload_json(&commands[2]));
        assert!(cache.get(tx).is_some());
    }

    #[tokio::test]
    async fn error_clears_the_saga_without_completion() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Character, InventoryType::Character);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        processor.handle_error_and_emit(&ctx(), tx).await.unwrap();

        assert!(cache.get(tx).is_none());
        let statuses = producer.messages_for(TRANSFER_STATUS);
        #[cfg(not(feature = "saga-failed-event"))]
        assert!(statuses.is_empty());
        #[cfg(feature = "saga-failed-event")]
        {
            assert_eq!(statuses.len(), 1);
            assert_eq!(
                payload_json(&statuses[0]),
                serde_json::json!({
                    "characterId": 200,
                    "type": "FAILED",
                    "body": { "transactionId": tx.to_string() },
                })
            );
        }

        // Late release after the error is ignored.
        processor.handle_released_and_emit(&ctx(), tx).await.unwrap();
        assert!(producer.messages_for(TRANSFER_STATUS).len() <= 1);
    }

    #[tokio::test]
    async fn unknown_source_leaves_nothing_to_release() {
        let (producer, cache, processor) = setup();
        let cmd = command(InventoryType::Unknown, InventoryType::Character);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        assert!(cache.get(tx).unwrap().release.is_none());

        processor.handle_accepted_and_emit(&ctx(), tx).await.unwrap();
        // Only the accept from phase 1 was ever emitted.
        assert_eq!(producer.messages_for(COMPARTMENT_COMMAND).len(), 1);
    }

    #[tokio::test]
    async fn reprocessing_a_transaction_overwrites_the_saga() {
        let (_producer, cache, processor) = setup();
        let mut cmd = command(InventoryType::Character, InventoryType::Character);
        let tx = cmd.transaction_id;

        processor.process_and_emit(&ctx(), &cmd).await.unwrap();
        cmd.asset_id = 6000;
        processor.process_and_emit(&ctx(), &cmd).await.unwrap();

        assert_eq!(cache.get(tx).unwrap().asset_id, 6000);
    }

    #[tokio::test]
    async fn flush_failure_surfaces_but_the_saga_stays_stored() {
        let producer = Arc::new(RecordingProducer::rejecting());
        let cache = Arc::new(SagaCache::new());
        let processor = TransferProcessor::new(producer.clone(), cache.clone(), topics());
        let cmd = command(InventoryType::Character, InventoryType::Character);

        let result = processor.process_and_emit(&ctx(), &cmd).await;
        assert!(result.is_err());

        // The cache was updated before the flush; redelivery overwrites it
        // idempotently.
        assert!(cache.get(cmd.transaction_id).is_some());
    }
}
