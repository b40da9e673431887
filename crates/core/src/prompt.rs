/// Persona and output-format instructions sent ahead of every user message.
pub const SYSTEM_PROMPT: &str = r#"You are Paul, a friendly French man in his late 20s from Paris.
You speak casually, like a buddy.
Always respond in French unless the user is completely lost.
At the end, give a very short correction if there is a mistake in the user's last message, otherwise say "Aucune correction nécessaire."
Output ONLY valid JSON:
{
  "reply": "<Paul's French reply>",
  "correction": "<short correction or 'Aucune correction nécessaire.'>"
}"#;

/// Builds the full generation prompt for a single user message.
///
/// The message is embedded verbatim; no escaping or trimming is applied.
pub fn build_prompt(user_message: &str) -> String {
    format!("{SYSTEM_PROMPT}\n\nUser message: \"{user_message}\"\n\nResponse:")
}
