//! Correction Notifier
//!
//! Shows a grammar correction for a fixed window. A newer correction replaces
//! the one on display and restarts the window; it is never queued behind it.

use crate::reply::is_actionable_correction;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

/// How long a correction stays on display.
pub const DEFAULT_DISPLAY_WINDOW: Duration = Duration::from_millis(5000);

#[derive(Default)]
struct DismissalTimer {
    /// Bumped on every `show`; a timer only clears the display if its token is still current.
    token: u64,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    timer: Mutex<DismissalTimer>,
    displayed: watch::Sender<Option<String>>,
}

pub struct CorrectionNotifier {
    window: Duration,
    shared: Arc<Shared>,
}

impl Default for CorrectionNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_WINDOW)
    }
}

impl CorrectionNotifier {
    pub fn new(window: Duration) -> Self {
        let (displayed, _) = watch::channel(None);
        Self {
            window,
            shared: Arc::new(Shared {
                timer: Mutex::new(DismissalTimer::default()),
                displayed,
            }),
        }
    }

    /// Displays `correction` and (re)starts the dismissal timer.
    ///
    /// The "nothing to correct" sentinel is ignored and leaves any current
    /// display untouched. Must be called from within a Tokio runtime.
    pub fn show(&self, correction: &str) {
        if !is_actionable_correction(correction) {
            return;
        }

        let mut timer = self.shared.timer.lock();
        if let Some(previous) = timer.handle.take() {
            previous.abort();
        }
        timer.token += 1;
        let token = timer.token;

        self.shared
            .displayed
            .send_replace(Some(correction.to_string()));
        debug!(token, "Showing correction");

        let shared = Arc::clone(&self.shared);
        let window = self.window;
        timer.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let mut timer = shared.timer.lock();
            if timer.token != token {
                return;
            }
            timer.handle = None;
            shared.displayed.send_replace(None);
            debug!(token, "Correction dismissed");
        }));
    }

    /// The correction currently on display, if any.
    pub fn current(&self) -> Option<String> {
        self.shared.displayed.borrow().clone()
    }

    /// Subscribes to changes of the displayed correction.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.shared.displayed.subscribe()
    }

    pub fn has_pending_dismissal(&self) -> bool {
        self.shared.timer.lock().handle.is_some()
    }
}

impl Drop for CorrectionNotifier {
    fn drop(&mut self) {
        if let Some(handle) = self.shared.timer.lock().handle.take() {
            handle.abort();
        }
    }
}
