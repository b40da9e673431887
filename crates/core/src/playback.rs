//! Playback Synchronizer
//!
//! Drives speech synthesis of assistant replies and the lip-sync "mouth open"
//! signal that accompanies it. At most one utterance is active at a time: a
//! new `speak` cancels whatever was playing before it starts.
//!
//! The synthesis engine reports progress through [`SynthesisEvent`]s tagged
//! with the utterance id. Events for an utterance that has since been
//! superseded or cancelled are ignored.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

/// Language every utterance is synthesized in.
pub const SPEECH_LANG: &str = "fr-FR";

/// Engines should prefer a voice whose language starts with this prefix.
pub const VOICE_LANG_PREFIX: &str = "fr";

/// Period of the mouth-open toggle while audio plays.
pub const MOUTH_TOGGLE_PERIOD: Duration = Duration::from_millis(120);

/// A single synthesis request handed to the platform engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub lang: &'static str,
    pub voice_lang_prefix: &'static str,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    fn new(id: u64, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            lang: SPEECH_LANG,
            voice_lang_prefix: VOICE_LANG_PREFIX,
            rate: 0.9,
            pitch: 1.1,
            volume: 0.8,
        }
    }
}

/// A platform text-to-speech engine.
///
/// Implementations report back through [`PlaybackSynchronizer::handle`].
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, utterance: &Utterance);
    fn cancel(&self);
}

/// Whether the platform offers text-to-speech, resolved once at startup.
#[derive(Clone)]
pub enum Synthesis {
    Available(Arc<dyn SpeechSynthesizer>),
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started(u64),
    Ended(u64),
}

struct ActiveUtterance {
    id: u64,
    /// Present once the engine reported the utterance as started.
    mouth_toggle: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct PlaybackState {
    muted: bool,
    next_id: u64,
    active: Option<ActiveUtterance>,
}

struct Shared {
    state: Mutex<PlaybackState>,
    mouth_open: watch::Sender<bool>,
}

impl Shared {
    fn close_mouth(&self) {
        self.mouth_open.send_replace(false);
    }
}

pub struct PlaybackSynchronizer {
    synthesis: Synthesis,
    toggle_period: Duration,
    shared: Arc<Shared>,
}

impl PlaybackSynchronizer {
    pub fn new(synthesis: Synthesis) -> Self {
        Self::with_toggle_period(synthesis, MOUTH_TOGGLE_PERIOD)
    }

    pub fn with_toggle_period(synthesis: Synthesis, toggle_period: Duration) -> Self {
        let (mouth_open, _) = watch::channel(false);
        Self {
            synthesis,
            toggle_period,
            shared: Arc::new(Shared {
                state: Mutex::new(PlaybackState::default()),
                mouth_open,
            }),
        }
    }

    /// Speaks `text`, replacing any utterance already in progress.
    ///
    /// Returns the id of the new utterance, or `None` when muted or when the
    /// platform has no synthesis engine.
    pub fn speak(&self, text: &str) -> Option<u64> {
        let Synthesis::Available(engine) = &self.synthesis else {
            return None;
        };

        let (utterance, superseded) = {
            let mut state = self.shared.state.lock();
            if state.muted {
                return None;
            }
            let superseded = state.active.take();
            state.next_id += 1;
            let id = state.next_id;
            state.active = Some(ActiveUtterance {
                id,
                mouth_toggle: None,
            });
            (Utterance::new(id, text), superseded)
        };

        if let Some(previous) = superseded {
            Self::stop(&self.shared, previous);
            engine.cancel();
        }
        debug!(id = utterance.id, "Starting synthesis");
        engine.speak(&utterance);
        Some(utterance.id)
    }

    /// Stops any active synthesis and mouth toggle, leaving the mouth closed.
    pub fn cancel(&self) {
        let active = self.shared.state.lock().active.take();
        if let Some(active) = active {
            debug!(id = active.id, "Cancelling synthesis");
            Self::stop(&self.shared, active);
            if let Synthesis::Available(engine) = &self.synthesis {
                engine.cancel();
            }
        }
    }

    pub fn set_muted(&self, muted: bool) {
        if muted {
            self.cancel();
        }
        self.shared.state.lock().muted = muted;
        info!(muted, "Playback mute changed");
    }

    /// Flips the mute state and returns the new value.
    pub fn toggle_mute(&self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    /// Consumes a progress event from the synthesis engine.
    pub fn handle(&self, event: SynthesisEvent) {
        match event {
            SynthesisEvent::Started(id) => {
                let mut state = self.shared.state.lock();
                match state.active.as_mut() {
                    Some(active) if active.id == id && active.mouth_toggle.is_none() => {
                        active.mouth_toggle = Some(self.spawn_mouth_toggle(id));
                    }
                    _ => debug!(id, "Ignoring start of inactive utterance"),
                }
            }
            SynthesisEvent::Ended(id) => {
                let mut state = self.shared.state.lock();
                if state.active.as_ref().is_some_and(|a| a.id == id) {
                    if let Some(active) = state.active.take() {
                        Self::stop(&self.shared, active);
                    }
                } else {
                    debug!(id, "Ignoring end of inactive utterance");
                }
            }
        }
    }

    fn spawn_mouth_toggle(&self, id: u64) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let period = self.toggle_period;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let state = shared.state.lock();
                if !state.active.as_ref().is_some_and(|a| a.id == id) {
                    break;
                }
                shared.mouth_open.send_modify(|open| *open = !*open);
            }
        })
    }

    fn stop(shared: &Shared, active: ActiveUtterance) {
        if let Some(toggle) = active.mouth_toggle {
            toggle.abort();
        }
        shared.close_mouth();
    }

    pub fn is_muted(&self) -> bool {
        self.shared.state.lock().muted
    }

    /// Id of the utterance currently queued or playing.
    pub fn active_utterance(&self) -> Option<u64> {
        self.shared.state.lock().active.as_ref().map(|a| a.id)
    }

    /// Whether the active utterance has started playing.
    pub fn is_speaking(&self) -> bool {
        self.shared
            .state
            .lock()
            .active
            .as_ref()
            .is_some_and(|a| a.mouth_toggle.is_some())
    }

    pub fn is_mouth_open(&self) -> bool {
        *self.shared.mouth_open.borrow()
    }

    pub fn subscribe_mouth(&self) -> watch::Receiver<bool> {
        self.shared.mouth_open.subscribe()
    }
}

impl Drop for PlaybackSynchronizer {
    fn drop(&mut self) {
        if let Some(active) = self.shared.state.lock().active.take() {
            Self::stop(&self.shared, active);
        }
    }
}
