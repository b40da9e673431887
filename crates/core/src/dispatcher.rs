//! Turn Dispatcher
//!
//! Runs one conversational exchange at a time: record the user's turn, ask
//! the chat backend for a reply, record the assistant's turn, then fan the
//! reply out to the correction notifier and playback.
//!
//! Only one exchange may be in flight. A dispatch that arrives while another
//! is outstanding is dropped, not queued.

use crate::{
    chat_client::ChatBackend,
    conversation::{ConversationLog, Turn},
    correction::CorrectionNotifier,
    playback::PlaybackSynchronizer,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Assistant reply used when the chat server cannot be reached.
pub const CONNECTION_FALLBACK_REPLY: &str =
    "Désolé, j'ai un problème de connexion. Vérifie que le serveur est en marche !";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank input, or another exchange was already in flight.
    Ignored,
    /// The backend replied and its reply was recorded.
    Replied,
    /// The backend could not be reached; the local fallback was recorded.
    Fallback,
}

/// Clears the in-flight flag when dropped, whichever way the dispatch ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct TurnDispatcher {
    backend: Arc<dyn ChatBackend>,
    log: RwLock<ConversationLog>,
    playback: Arc<PlaybackSynchronizer>,
    notifier: Arc<CorrectionNotifier>,
    in_flight: AtomicBool,
}

impl TurnDispatcher {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        log: ConversationLog,
        playback: Arc<PlaybackSynchronizer>,
        notifier: Arc<CorrectionNotifier>,
    ) -> Self {
        Self {
            backend,
            log: RwLock::new(log),
            playback,
            notifier,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Sends `text` as the user's next turn.
    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        if text.trim().is_empty() {
            return DispatchOutcome::Ignored;
        }
        let Some(_in_flight) = InFlight::acquire(&self.in_flight) else {
            debug!("A turn is already in flight, dropping dispatch");
            return DispatchOutcome::Ignored;
        };

        let user_turn_id = self.log.write().append_user(text).id;
        debug!(turn = user_turn_id, "User turn recorded");

        match self.backend.send(text.to_string()).await {
            Ok(reply) => {
                let reply = reply.repaired();
                self.log
                    .write()
                    .append_assistant(reply.reply.clone(), Some(reply.correction.clone()));
                info!(has_correction = reply.has_correction(), "Assistant turn recorded");

                if reply.has_correction() {
                    self.notifier.show(&reply.correction);
                }
                self.playback.speak(&reply.reply);
                DispatchOutcome::Replied
            }
            Err(e) => {
                error!(error = %e, "Chat request failed, using connection fallback");
                self.log
                    .write()
                    .append_assistant(CONNECTION_FALLBACK_REPLY, None);
                self.playback.speak(CONNECTION_FALLBACK_REPLY);
                DispatchOutcome::Fallback
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A snapshot of the conversation for rendering.
    pub fn turns(&self) -> Vec<Turn> {
        self.log.read().turns().to_vec()
    }

    pub fn turn_count(&self) -> usize {
        self.log.read().len()
    }

    pub fn playback(&self) -> &PlaybackSynchronizer {
        &self.playback
    }

    pub fn notifier(&self) -> &CorrectionNotifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_client::{MockChatBackend, TransportError};
    use crate::conversation::Sender;
    use crate::playback::Synthesis;
    use crate::reply::{DEFAULT_GREETING_REPLY, NO_CORRECTION, StructuredReply};
    use crate::testing::RecordingSynthesizer;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::sleep;

    struct Harness {
        dispatcher: Arc<TurnDispatcher>,
        engine: Arc<RecordingSynthesizer>,
    }

    fn harness(backend: impl ChatBackend + 'static) -> Harness {
        let engine = Arc::new(RecordingSynthesizer::default());
        let playback = Arc::new(PlaybackSynchronizer::new(Synthesis::Available(engine.clone())));
        let dispatcher = Arc::new(TurnDispatcher::new(
            Arc::new(backend),
            ConversationLog::new(),
            playback,
            Arc::new(CorrectionNotifier::default()),
        ));
        Harness { dispatcher, engine }
    }

    fn replying(reply: &'static str, correction: &'static str) -> MockChatBackend {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(move |_| Ok(StructuredReply::new(reply, correction)));
        backend
    }

    fn spoken_texts(engine: &RecordingSynthesizer) -> Vec<String> {
        engine.spoken().into_iter().map(|u| u.text).collect()
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let mut backend = MockChatBackend::new();
        backend.expect_send().never();
        let h = harness(backend);

        for text in ["", "   ", "\n\t "] {
            assert_eq!(h.dispatcher.dispatch(text).await, DispatchOutcome::Ignored);
        }
        assert_eq!(h.dispatcher.turn_count(), 0);
        assert!(!h.dispatcher.is_in_flight());
    }

    #[tokio::test]
    async fn test_reply_without_correction() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .withf(|message| message == "Bonjour")
            .times(1)
            .returning(|_| Ok(StructuredReply::new("Salut !", NO_CORRECTION)));
        let h = harness(backend);

        assert_eq!(h.dispatcher.dispatch("Bonjour").await, DispatchOutcome::Replied);

        let turns = h.dispatcher.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!((turns[0].sender, turns[0].text.as_str()), (Sender::User, "Bonjour"));
        assert_eq!(turns[0].correction, None);
        assert_eq!((turns[1].sender, turns[1].text.as_str()), (Sender::Assistant, "Salut !"));
        assert_eq!(turns[1].correction.as_deref(), Some(NO_CORRECTION));

        assert!(h.dispatcher.notifier().current().is_none());
        assert!(!h.dispatcher.notifier().has_pending_dismissal());
        assert_eq!(spoken_texts(&h.engine), vec!["Salut !"]);
        assert!(!h.dispatcher.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_correction_is_shown_then_cleared() {
        let correction = "On dit 'je suis allé', bien joué.";
        let h = harness(replying("Cool !", correction));

        let outcome = h.dispatcher.dispatch("Je suis allé au magasin hier").await;
        assert_eq!(outcome, DispatchOutcome::Replied);
        assert_eq!(h.dispatcher.notifier().current().as_deref(), Some(correction));
        assert_eq!(spoken_texts(&h.engine), vec!["Cool !"]);

        sleep(Duration::from_millis(5001)).await;
        assert!(h.dispatcher.notifier().current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_dispatch_does_not_clear_displayed_correction() {
        let mut backend = MockChatBackend::new();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StructuredReply::new("Cool !", "On dit 'allé'.")));
        backend
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(StructuredReply::new("Super.", NO_CORRECTION)));
        let h = harness(backend);

        h.dispatcher.dispatch("Je suis allé").await;
        sleep(Duration::from_millis(1000)).await;
        h.dispatcher.dispatch("Merci").await;
        assert_eq!(h.dispatcher.notifier().current().as_deref(), Some("On dit 'allé'."));

        sleep(Duration::from_millis(4001)).await;
        assert!(h.dispatcher.notifier().current().is_none());
    }

    #[tokio::test]
    async fn test_empty_server_reply_is_repaired() {
        let h = harness(replying("", ""));

        assert_eq!(h.dispatcher.dispatch("Bonjour").await, DispatchOutcome::Replied);

        let turns = h.dispatcher.turns();
        assert_eq!(turns[1].text, DEFAULT_GREETING_REPLY);
        assert_eq!(turns[1].correction.as_deref(), Some(NO_CORRECTION));
        assert!(h.dispatcher.notifier().current().is_none());
        assert_eq!(spoken_texts(&h.engine), vec![DEFAULT_GREETING_REPLY]);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_local_fallback() {
        let mut backend = MockChatBackend::new();
        backend
            .expect_send()
            .returning(|_| Err(TransportError::Status(reqwest::StatusCode::BAD_GATEWAY)));
        let h = harness(backend);

        assert_eq!(h.dispatcher.dispatch("Bonjour").await, DispatchOutcome::Fallback);

        let turns = h.dispatcher.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].sender, Sender::Assistant);
        assert_eq!(turns[1].text, CONNECTION_FALLBACK_REPLY);
        assert_eq!(turns[1].correction, None);
        assert!(h.dispatcher.notifier().current().is_none());
        assert_eq!(spoken_texts(&h.engine), vec![CONNECTION_FALLBACK_REPLY]);
        assert!(!h.dispatcher.is_in_flight());
    }

    /// Backend that holds every request until released.
    struct GatedBackend {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn send(&self, _message: String) -> Result<StructuredReply, TransportError> {
            self.gate.notified().await;
            Ok(StructuredReply::new("Salut !", NO_CORRECTION))
        }
    }

    #[tokio::test]
    async fn test_overlapping_dispatch_is_dropped() {
        let gate = Arc::new(Notify::new());
        let h = harness(GatedBackend { gate: gate.clone() });

        let first = {
            let dispatcher = h.dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch("Bonjour").await })
        };
        while !h.dispatcher.is_in_flight() {
            tokio::task::yield_now().await;
        }
        // The user turn is recorded before the round trip completes.
        assert_eq!(h.dispatcher.turn_count(), 1);

        assert_eq!(h.dispatcher.dispatch("Encore").await, DispatchOutcome::Ignored);
        assert_eq!(h.dispatcher.turn_count(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), DispatchOutcome::Replied);
        assert!(!h.dispatcher.is_in_flight());
        assert_eq!(h.dispatcher.turn_count(), 2);

        gate.notify_one();
        assert_eq!(h.dispatcher.dispatch("Encore").await, DispatchOutcome::Replied);
        assert_eq!(h.dispatcher.turn_count(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_releases_in_flight() {
        let gate = Arc::new(Notify::new());
        let h = harness(GatedBackend { gate });

        let dispatcher = h.dispatcher.clone();
        let pending = tokio::spawn(async move { dispatcher.dispatch("Bonjour").await });
        while !h.dispatcher.is_in_flight() {
            tokio::task::yield_now().await;
        }
        pending.abort();
        let _ = pending.await;
        assert!(!h.dispatcher.is_in_flight());
    }

    #[tokio::test]
    async fn test_muted_playback_still_records_reply() {
        let h = harness(replying("Salut !", NO_CORRECTION));
        h.dispatcher.playback().set_muted(true);

        assert_eq!(h.dispatcher.dispatch("Bonjour").await, DispatchOutcome::Replied);
        assert_eq!(h.dispatcher.turn_count(), 2);
        assert!(h.engine.spoken().is_empty());
    }
}
