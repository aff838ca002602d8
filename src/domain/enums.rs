//! Shared domain enums.

use serde::{Deserialize, Serialize};

/// Who authored a message. The widget never sees any finer identity
/// than this; agent identities stay on the dashboard side.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SenderType {
    Agent,
    Visitor,
}

/// Delivery state of an agent-authored message. Visitor messages keep
/// `Sent` forever; only the agent side tracks read receipts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}
