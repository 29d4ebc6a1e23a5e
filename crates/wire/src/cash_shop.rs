//! Cash-shop compartment command and status-event schemas.
//!
//! Unlike character compartments, cash-shop compartments are addressed by
//! account plus an explicit compartment id in the command body.

use serde::{Deserialize, Serialize};

use stashport_core::{CompartmentId, CompartmentType, TransactionId};

/// Environment variable naming the cash-shop compartment command topic.
pub const ENV_COMMAND_TOPIC: &str = "COMMAND_TOPIC_CASH_COMPARTMENT";

/// Environment variable naming the cash-shop compartment status topic.
pub const ENV_EVENT_TOPIC_STATUS: &str = "EVENT_TOPIC_CASH_COMPARTMENT_STATUS";

/// Command to the cash-shop compartment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub account_id: u32,
    pub compartment_type: CompartmentType,
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
    pub compartment_id: CompartmentId,
    pub reference_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseBody {
    pub transaction_id: TransactionId,
    pub compartment_id: CompartmentId,
    pub asset_id: u32,
}

/// Status event published by the cash-shop compartment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub compartment_id: CompartmentId,
    pub compartment_type: CompartmentType,
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

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn accept_command_carries_the_destination_compartment() {
        let tx = Uuid::now_v7();
        let compartment = Uuid::now_v7();
        let command = Command {
            account_id: 100,
            compartment_type: CompartmentType(2),
            kind: CommandKind::Accept(AcceptBody {
                transaction_id: TransactionId::from_uuid(tx),
                compartment_id: CompartmentId::from_uuid(compartment),
                reference_id: 4001,
            }),
        };

        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "accountId": 100,
                "compartmentType": 2,
                "type": "ACCEPT",
                "body": {
                    "transactionId": tx.to_string(),
                    "compartmentId": compartment.to_string(),
                    "referenceId": 4001,
                },
            })
        );
    }

    #[test]
    fn released_status_event_decodes() {
        let tx = Uuid::now_v7();
        let event: StatusEvent = serde_json::from_value(serde_json::json!({
            "compartmentId": Uuid::now_v7().to_string(),
            "compartmentType": 1,
            "type": "RELEASED",
            "body": { "transactionId": tx.to_string() },
        }))
        .unwrap();
        assert_eq!(
            event.kind,
            StatusEventKind::Released(TransactionBody {
                transaction_id: TransactionId::from_uuid(tx)
            })
        );
    }
}
