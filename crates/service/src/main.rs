//! Service entry point: wire consumers, run until told to stop.

mod config;
mod consumers;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use stashport_bus::KafkaProducer;
use stashport_transfer::{OutboundTopics, SagaCache, TransferProcessor};

use crate::config::Config;

const SERVICE_NAME: &str = "stashport";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stashport_observability::init(SERVICE_NAME);
    info!("starting compartment transfer service");

    let config = Config::from_env()?;
    let producer = KafkaProducer::new(&config.bootstrap_servers)?;
    let cache = Arc::new(SagaCache::new());
    let processor = Arc::new(TransferProcessor::new(
        producer,
        cache,
        OutboundTopics {
            compartment_command: config.compartment_command_topic.clone(),
            cash_compartment_command: config.cash_compartment_command_topic.clone(),
            transfer_status: config.transfer_status_topic.clone(),
        },
    ));

    let token = CancellationToken::new();
    let consumers = consumers::spawn(&config, processor, &token)?;

    shutdown_signal().await;
    info!("shutdown signal received; draining consumers");
    token.cancel();
    for consumer in consumers {
        let _ = consumer.await;
    }

    info!("service shutdown");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
