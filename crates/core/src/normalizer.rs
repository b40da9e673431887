//! Reply Service
//!
//! Server-side half of a conversational exchange: prompt the generation
//! backend with the user's message and reduce whatever comes back to a
//! [`StructuredReply`]. Nothing in here returns an error; backend failures and
//! malformed output both end in the fixed fallback record.

use crate::{
    llm_client::GenerationClient,
    prompt::build_prompt,
    reply::{StructuredReply, normalize},
};
use std::sync::Arc;
use tracing::{error, info};

pub struct ReplyService {
    client: Arc<dyn GenerationClient>,
}

impl ReplyService {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }

    /// Produces the companion's reply to one user message.
    pub async fn respond(&self, message: &str) -> StructuredReply {
        let prompt = build_prompt(message);
        match self.client.generate(prompt).await {
            Ok(raw) => {
                let reply = normalize(&raw);
                info!(has_correction = reply.has_correction(), "Reply generated");
                reply
            }
            Err(e) => {
                error!(error = ?e, "Generation backend call failed, using fallback reply");
                StructuredReply::fallback()
            }
        }
    }
}
