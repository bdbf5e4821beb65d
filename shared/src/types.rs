//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Result of a mutation endpoint (movements, order status changes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<uuid::Uuid>,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>, id: uuid::Uuid) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(id),
        }
    }

    pub fn ok_without_id(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
        }
    }
}
