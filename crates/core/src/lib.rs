pub mod capture;
pub mod chat_client;
pub mod conversation;
pub mod correction;
pub mod dispatcher;
pub mod llm_client;
pub mod normalizer;
pub mod playback;
pub mod prompt;
pub mod reply;

#[cfg(test)]
pub(crate) mod testing;

pub use reply::{NO_CORRECTION, StructuredReply, normalize};
