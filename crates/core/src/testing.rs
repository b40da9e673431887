//! Recording engine doubles shared by unit tests.

use crate::capture::{RecognitionSession, SpeechRecognizer};
use crate::playback::{SpeechSynthesizer, Utterance};
use parking_lot::Mutex;

#[derive(Default)]
pub(crate) struct RecordingSynthesizer {
    spoken: Mutex<Vec<Utterance>>,
    cancels: Mutex<usize>,
}

impl RecordingSynthesizer {
    pub(crate) fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().clone()
    }

    pub(crate) fn cancel_count(&self) -> usize {
        *self.cancels.lock()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&self, utterance: &Utterance) {
        self.spoken.lock().push(utterance.clone());
    }

    fn cancel(&self) {
        *self.cancels.lock() += 1;
    }
}

#[derive(Default)]
pub(crate) struct RecordingRecognizer {
    sessions: Mutex<Vec<RecognitionSession>>,
    stops: Mutex<usize>,
    aborts: Mutex<usize>,
}

impl RecordingRecognizer {
    pub(crate) fn sessions(&self) -> Vec<RecognitionSession> {
        self.sessions.lock().clone()
    }

    pub(crate) fn stop_count(&self) -> usize {
        *self.stops.lock()
    }

    pub(crate) fn abort_count(&self) -> usize {
        *self.aborts.lock()
    }
}

impl SpeechRecognizer for RecordingRecognizer {
    fn start(&self, session: &RecognitionSession) {
        self.sessions.lock().push(session.clone());
    }

    fn stop(&self) {
        *self.stops.lock() += 1;
    }

    fn abort(&self) {
        *self.aborts.lock() += 1;
    }
}
