//! Structured Reply Contract
//!
//! This module defines the two-field record every companion reply is reduced
//! to, along with the fixed texts used when the generation backend produces
//! something unusable. `normalize` is total: whatever the model emits, the
//! caller receives a reply with both fields populated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Correction text meaning "nothing to correct".
pub const NO_CORRECTION: &str = "Aucune correction nécessaire.";

/// Reply used when the model output cannot be parsed at all.
pub const PARSE_FALLBACK_REPLY: &str =
    "Désolé, j'ai eu un petit problème technique. Peux-tu répéter ?";

/// Reply used when the model output parsed but carried no usable `reply`.
pub const DEFAULT_GREETING_REPLY: &str = "Salut ! Comment ça va ?";

/// The normalized output of one conversational exchange.
///
/// Both fields are always non-empty once a value has left [`normalize`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StructuredReply {
    /// What the companion says back.
    pub reply: String,
    /// A short grammar correction, or [`NO_CORRECTION`].
    pub correction: String,
}

impl StructuredReply {
    pub fn new(reply: impl Into<String>, correction: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            correction: correction.into(),
        }
    }

    /// The fixed record substituted for unparseable or unreachable upstream output.
    pub fn fallback() -> Self {
        Self::new(PARSE_FALLBACK_REPLY, NO_CORRECTION)
    }

    /// Fills an empty `reply` or `correction` with its default text.
    ///
    /// Used on records that did not come through [`normalize`], such as a
    /// reply decoded from a chat server.
    pub fn repaired(mut self) -> Self {
        if self.reply.is_empty() {
            warn!("Reply is empty, substituting greeting");
            self.reply = DEFAULT_GREETING_REPLY.to_string();
        }
        if self.correction.is_empty() {
            self.correction = NO_CORRECTION.to_string();
        }
        self
    }

    /// Whether the correction carries something worth showing to the user.
    pub fn has_correction(&self) -> bool {
        is_actionable_correction(&self.correction)
    }
}

/// Returns `true` unless the text is empty or the "nothing to correct" sentinel.
pub fn is_actionable_correction(correction: &str) -> bool {
    !correction.is_empty() && correction != NO_CORRECTION
}

/// Turns raw model output into a well-formed [`StructuredReply`].
///
/// The input must be a JSON object to count as parsed. Each field is then
/// repaired on its own: a missing, empty or non-string `reply` becomes
/// [`DEFAULT_GREETING_REPLY`], and the same for `correction` becomes
/// [`NO_CORRECTION`].
pub fn normalize(raw: &str) -> StructuredReply {
    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Model output is JSON but not an object, using fallback");
            return StructuredReply::fallback();
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse model output as JSON, using fallback");
            return StructuredReply::fallback();
        }
    };

    let field = |name: &str| {
        object
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    StructuredReply::new(field("reply"), field("correction")).repaired()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
