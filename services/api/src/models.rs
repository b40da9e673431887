//! API Models
//!
//! Request and response bodies for the HTTP API, annotated for OpenAPI
//! generation with `utoipa`.

use chrono::{DateTime, Utc};
use parle_core::StructuredReply;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatPayload {
    /// The user's message. Missing and empty are both rejected.
    #[schema(example = "Je suis allé au magasin hier")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    #[schema(example = "Cool ! Qu'est-ce que tu as acheté ?")]
    pub reply: String,
    #[schema(example = "Aucune correction nécessaire.")]
    pub correction: String,
}

impl From<StructuredReply> for ChatResponse {
    fn from(reply: StructuredReply) -> Self {
        Self {
            reply: reply.reply,
            correction: reply.correction,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct HealthResponse {
    #[schema(example = "Server is running")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
