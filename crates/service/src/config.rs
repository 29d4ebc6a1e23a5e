//! Environment-driven configuration, resolved once at startup.

use anyhow::Context;

use stashport_wire::{cash_shop, character, transfer};

/// Environment variable naming the bus bootstrap servers.
pub const ENV_BOOTSTRAP_SERVERS: &str = "BOOTSTRAP_SERVERS";

#[derive(Debug, Clone)]
pub struct Config {
    pub bootstrap_servers: String,
    /// Inbound: transfer commands.
    pub transfer_command_topic: String,
    /// Inbound: character compartment status events.
    pub character_status_topic: String,
    /// Inbound: cash-shop compartment status events.
    pub cash_shop_status_topic: String,
    /// Outbound: character compartment commands.
    pub compartment_command_topic: String,
    /// Outbound: cash-shop compartment commands.
    pub cash_compartment_command_topic: String,
    /// Outbound: terminal transfer status events.
    pub transfer_status_topic: String,
}

impl Config {
    /// Resolve every topic from the environment; any missing variable fails
    /// startup.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bootstrap_servers: require(ENV_BOOTSTRAP_SERVERS)?,
            transfer_command_topic: require(transfer::ENV_COMMAND_TOPIC)?,
            character_status_topic: require(character::ENV_EVENT_TOPIC_STATUS)?,
            cash_shop_status_topic: require(cash_shop::ENV_EVENT_TOPIC_STATUS)?,
            compartment_command_topic: require(character::ENV_COMMAND_TOPIC)?,
            cash_compartment_command_topic: require(cash_shop::ENV_COMMAND_TOPIC)?,
            transfer_status_topic: require(transfer::ENV_EVENT_TOPIC_STATUS)?,
        })
    }
}

fn require(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}
