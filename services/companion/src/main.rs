//! Terminal companion
//!
//! Typed front-end for the conversation companion. Wires the turn
//! dispatcher, playback and correction notifier against a running
//! `parle-api` and renders the conversation log as it grows.
//!
//! A terminal offers neither speech recognition nor synthesis, so both
//! capabilities resolve to `Unavailable` at startup and the companion runs
//! text-only.

mod config;
mod console;

use anyhow::Context;
use clap::Parser;
use config::Args;
use console::{Input, parse_input, render_correction, render_turn};
use parle_core::{
    capture::{Recognition, UtteranceCapture},
    chat_client::HttpChatBackend,
    conversation::ConversationLog,
    correction::CorrectionNotifier,
    dispatcher::{DispatchOutcome, TurnDispatcher},
    playback::{PlaybackSynchronizer, Synthesis},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

fn print_new_turns(dispatcher: &TurnDispatcher, printed: &mut usize) {
    for turn in dispatcher.turns().iter().skip(*printed) {
        println!("{}", render_turn(turn));
        *printed += 1;
    }
}

/// Runs one exchange in the background and reports its outcome on `done_tx`.
fn spawn_turn(
    dispatcher: &Arc<TurnDispatcher>,
    text: &str,
    done_tx: &mpsc::Sender<DispatchOutcome>,
) -> JoinHandle<()> {
    let task_dispatcher = Arc::clone(dispatcher);
    let done_tx = done_tx.clone();
    let text = text.to_string();
    tokio::spawn(async move {
        let outcome = task_dispatcher.dispatch(&text).await;
        let _ = done_tx.send(outcome).await;
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let backend = HttpChatBackend::new(&args.server_url, args.timeout())
        .context("Failed to build chat client")?;
    let mut capture = UtteranceCapture::new(Recognition::Unavailable);
    let playback = Arc::new(PlaybackSynchronizer::new(Synthesis::Unavailable));
    playback.set_muted(args.muted);
    let notifier = Arc::new(CorrectionNotifier::default());
    let dispatcher = Arc::new(TurnDispatcher::new(
        Arc::new(backend),
        ConversationLog::with_opening_line(),
        playback.clone(),
        notifier.clone(),
    ));
    info!(server = %args.server_url, voice_input = capture.is_available(), "Companion ready");

    println!("Parle avec Paul ! (/mute, /listen, /history, /quit)");
    let mut printed = 0;
    print_new_turns(&dispatcher, &mut printed);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut corrections = notifier.subscribe();
    let (done_tx, mut done_rx) = mpsc::channel::<DispatchOutcome>(4);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_input(&line) {
                    Input::Say(text) => {
                        if text.trim().is_empty() {
                            continue;
                        }
                        if dispatcher.is_in_flight() {
                            println!("(Paul réfléchit encore…)");
                            continue;
                        }
                        // Both new turns are printed when the exchange completes.
                        spawn_turn(&dispatcher, text, &done_tx);
                    }
                    Input::ToggleMute => {
                        let muted = playback.toggle_mute();
                        println!("{}", if muted { "(son coupé)" } else { "(son activé)" });
                    }
                    Input::Listen => {
                        if capture.start().is_none() {
                            println!("(la saisie vocale n'est pas disponible ici)");
                        }
                    }
                    Input::History => {
                        for turn in dispatcher.turns() {
                            println!("{}", render_turn(&turn));
                        }
                    }
                    Input::Quit => break,
                    Input::Unknown(command) => println!("(commande inconnue : {command})"),
                }
            },
            Some(outcome) = done_rx.recv() => {
                debug!(?outcome, "Turn finished");
                print_new_turns(&dispatcher, &mut printed);
            },
            Ok(()) = corrections.changed() => {
                if let Some(correction) = corrections.borrow_and_update().clone() {
                    println!("{}", render_correction(&correction));
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    capture.shutdown();
    playback.cancel();
    info!("Companion shutting down.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_server() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_spawned_turn_reports_outcome_and_leaves_dispatcher_usable() {
        let backend = HttpChatBackend::new(&unreachable_server(), Duration::from_secs(2)).unwrap();
        let dispatcher = Arc::new(TurnDispatcher::new(
            Arc::new(backend),
            ConversationLog::with_opening_line(),
            Arc::new(PlaybackSynchronizer::new(Synthesis::Unavailable)),
            Arc::new(CorrectionNotifier::default()),
        ));
        let (done_tx, mut done_rx) = mpsc::channel(1);

        spawn_turn(&dispatcher, "Bonjour", &done_tx).await.unwrap();
        assert_eq!(done_rx.recv().await, Some(DispatchOutcome::Fallback));

        let mut printed = 0;
        print_new_turns(&dispatcher, &mut printed);
        assert_eq!(printed, 3);
        assert!(!dispatcher.is_in_flight());
    }
}
