//! Consumer wiring: binds the three inbound topics to their handlers.
//!
//! Status topics carry all three event kinds; dispatching on the decoded
//! kind guarantees an event can never reach the wrong entry point.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use stashport_bus::{
    ConsumerConfig, ConsumerError, EmitError, KafkaProducer, MessageContext, Producer,
    build_consumer, run_consumer,
};
use stashport_transfer::TransferProcessor;
use stashport_wire::transfer::TransferCommand;
use stashport_wire::{cash_shop, character};

use crate::config::Config;

/// Consumer group shared by every subscription of this service.
pub const CONSUMER_GROUP_ID: &str = "Compartment Transfer Service";

/// Spawn one consumer task per inbound topic.
pub fn spawn(
    config: &Config,
    processor: Arc<TransferProcessor<KafkaProducer>>,
    token: &CancellationToken,
) -> Result<Vec<JoinHandle<()>>, ConsumerError> {
    let consumer_config = ConsumerConfig {
        bootstrap_servers: config.bootstrap_servers.clone(),
        group_id: CONSUMER_GROUP_ID.to_string(),
    };

    let transfer_commands = {
        let consumer = build_consumer(&consumer_config, &config.transfer_command_topic)?;
        let topic = config.transfer_command_topic.clone();
        let token = token.clone();
        let processor = processor.clone();
        tokio::spawn(async move {
            run_consumer(consumer, topic, token, move |ctx, cmd: TransferCommand| {
                let processor = processor.clone();
                async move { processor.process_and_emit(&ctx, &cmd).await }
            })
            .await;
        })
    };

    let character_status = {
        let consumer = build_consumer(&consumer_config, &config.character_status_topic)?;
        let topic = config.character_status_topic.clone();
        let token = token.clone();
        let processor = processor.clone();
        tokio::spawn(async move {
            run_consumer(consumer, topic, token, move |ctx, event: character::StatusEvent| {
                let processor = processor.clone();
                async move { route_character_status(&processor, &ctx, event).await }
            })
            .await;
        })
    };

    let cash_shop_status = {
        let consumer = build_consumer(&consumer_config, &config.cash_shop_status_topic)?;
        let topic = config.cash_shop_status_topic.clone();
        let token = token.clone();
        let processor = processor.clone();
        tokio::spawn(async move {
            run_consumer(consumer, topic, token, move |ctx, event: cash_shop::StatusEvent| {
                let processor = processor.clone();
                async move { route_cash_shop_status(&processor, &ctx, event).await }
            })
            .await;
        })
    };

    Ok(vec![transfer_commands, character_status, cash_shop_status])
}

async fn route_character_status<P: Producer>(
    processor: &TransferProcessor<P>,
    ctx: &MessageContext,
    event: character::StatusEvent,
) -> Result<(), EmitError> {
    match event.kind {
        character::StatusEventKind::Accepted(body) => {
            processor.handle_accepted_and_emit(ctx, body.transaction_id).await
        }
        character::StatusEventKind::Released(body) => {
            processor.handle_released_and_emit(ctx, body.transaction_id).await
        }
        character::StatusEventKind::Error(body) => {
            debug!(
                transaction_id = %body.transaction_id,
                error_code = %body.error_code,
                "character compartment reported an error"
            );
            processor.handle_error_and_emit(ctx, body.transaction_id).await
        }
    }
}

async fn route_cash_shop_status<P: Producer>(
    processor: &TransferProcessor<P>,
    ctx: &MessageContext,
    event: cash_shop::StatusEvent,
) -> Result<(), EmitError> {
    match event.kind {
        cash_shop::StatusEventKind::Accepted(body) => {
            processor.handle_accepted_and_emit(ctx, body.transaction_id).await
        }
        cash_shop::StatusEventKind::Released(body) => {
            processor.handle_released_and_emit(ctx, body.transaction_id).await
        }
        cash_shop::StatusEventKind::Error(body) => {
            debug!(
                transaction_id = %body.transaction_id,
                error_code = %body.error_code,
                "cash-shop compartment reported an error"
            );
            processor.handle_error_and_emit(ctx, body.transaction_id).await
        }
    }
}
