//! Shared Application State

use parle_core::normalizer::ReplyService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub reply_service: Arc<ReplyService>,
}
