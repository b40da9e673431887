//! Utterance Capture
//!
//! Wraps a platform speech-to-text engine as a single-session state machine.
//! A session yields at most one finalized transcript; errors, aborts and
//! explicit stops return to `Idle` without emitting anything.

use std::sync::Arc;
use tracing::{debug, info};

/// Language recognition sessions are configured for.
pub const RECOGNITION_LANG: &str = "fr-FR";

/// Configuration handed to the engine when a session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSession {
    pub id: u64,
    pub lang: &'static str,
    pub continuous: bool,
    pub interim_results: bool,
}

/// A platform speech-to-text engine.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, session: &RecognitionSession);
    /// Ends the session; the engine may still flush a result, which is discarded.
    fn stop(&self);
    /// Ends the session immediately without producing a result.
    fn abort(&self);
}

/// Whether the platform offers speech-to-text, resolved once at startup.
#[derive(Clone)]
pub enum Recognition {
    Available(Arc<dyn SpeechRecognizer>),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Listening { session: u64 },
}

/// Events reported by the engine for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    TranscriptFinalized { session: u64, text: String },
    RecognitionAborted { session: u64 },
    RecognitionEnded { session: u64 },
}

impl CaptureEvent {
    fn session(&self) -> u64 {
        match self {
            CaptureEvent::TranscriptFinalized { session, .. }
            | CaptureEvent::RecognitionAborted { session }
            | CaptureEvent::RecognitionEnded { session } => *session,
        }
    }
}

pub struct UtteranceCapture {
    recognition: Recognition,
    state: CaptureState,
    next_session: u64,
}

impl UtteranceCapture {
    pub fn new(recognition: Recognition) -> Self {
        Self {
            recognition,
            state: CaptureState::Idle,
            next_session: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.recognition, Recognition::Available(_))
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.state, CaptureState::Listening { .. })
    }

    /// Begins a recognition session. Returns the session id, or `None` if a
    /// session is already live or the platform cannot recognize speech.
    pub fn start(&mut self) -> Option<u64> {
        let Recognition::Available(engine) = &self.recognition else {
            return None;
        };
        if self.is_listening() {
            debug!("Capture already listening, ignoring start");
            return None;
        }

        self.next_session += 1;
        let session = RecognitionSession {
            id: self.next_session,
            lang: RECOGNITION_LANG,
            continuous: false,
            interim_results: false,
        };
        engine.start(&session);
        self.state = CaptureState::Listening {
            session: session.id,
        };
        info!(session = session.id, "Listening");
        Some(session.id)
    }

    /// Stops the live session, discarding whatever it had heard.
    pub fn stop(&mut self) {
        if let CaptureState::Listening { session } = self.state {
            if let Recognition::Available(engine) = &self.recognition {
                engine.stop();
            }
            self.state = CaptureState::Idle;
            debug!(session, "Capture stopped");
        }
    }

    /// Aborts the live session on teardown.
    pub fn shutdown(&mut self) {
        if self.is_listening() {
            if let Recognition::Available(engine) = &self.recognition {
                engine.abort();
            }
            self.state = CaptureState::Idle;
        }
    }

    /// Consumes an engine event. Returns the transcript when the live
    /// session finalizes one.
    pub fn handle(&mut self, event: CaptureEvent) -> Option<String> {
        let CaptureState::Listening { session } = self.state else {
            return None;
        };
        if event.session() != session {
            debug!(stale = event.session(), live = session, "Ignoring event for stale session");
            return None;
        }

        self.state = CaptureState::Idle;
        match event {
            CaptureEvent::TranscriptFinalized { text, .. } => Some(text),
            CaptureEvent::RecognitionAborted { .. } => {
                debug!(session, "Recognition aborted, returning to idle");
                None
            }
            CaptureEvent::RecognitionEnded { .. } => None,
        }
    }
}
