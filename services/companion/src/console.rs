//! Terminal rendering and input parsing.

use parle_core::conversation::{Sender, Turn};

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Say(&'a str),
    ToggleMute,
    /// Starts voice capture. A terminal has no recognizer, so this only
    /// reports that voice input is unavailable.
    Listen,
    History,
    Quit,
    Unknown(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "/mute" => Input::ToggleMute,
        "/listen" => Input::Listen,
        "/history" => Input::History,
        "/quit" | "/exit" => Input::Quit,
        other if other.starts_with('/') => Input::Unknown(other),
        _ => Input::Say(line),
    }
}

pub fn render_turn(turn: &Turn) -> String {
    let who = match turn.sender {
        Sender::User => "Toi",
        Sender::Assistant => "Paul",
    };
    format!("[{}] {}: {}", turn.created_at.format("%H:%M"), who, turn.text)
}

pub fn render_correction(correction: &str) -> String {
    format!("  ✎ {correction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("Bonjour"), Input::Say("Bonjour"));
        assert_eq!(parse_input("  /mute "), Input::ToggleMute);
        assert_eq!(parse_input("/listen"), Input::Listen);
        assert_eq!(parse_input("/history"), Input::History);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/dance"), Input::Unknown("/dance"));
        // Blank lines are passed through; the dispatcher ignores them.
        assert_eq!(parse_input("   "), Input::Say("   "));
    }

    #[test]
    fn test_render_turn() {
        let turn = Turn {
            id: 1,
            text: "Salut !".to_string(),
            sender: Sender::Assistant,
            correction: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 0).unwrap(),
        };
        assert_eq!(render_turn(&turn), "[09:26] Paul: Salut !");
    }
}
