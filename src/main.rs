//! fox-voice-daemon: wake-phrase voice assistant with a waveform visualizer
//!
//! The daemon listens for the wake phrase, captures one spoken query, asks
//! the answering backend about the active document and reads the answer
//! aloud. It provides:
//! - An explicit interaction state machine driving recognition and speech
//! - A waveform animator whose accent follows the interaction state
//! - IPC server for the start trigger, status queries and live frames
//!
//! Audio is stood in for by the console: typed lines are heard utterances
//! and answers are printed as they are spoken.

mod config;
mod events;
mod ipc;
mod lifecycle;
mod query;
mod recognition;
mod speech;
mod state;
mod waveform;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::InteractionEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::query::HttpAnswerService;
use crate::recognition::{ConsoleRecognizer, RecognitionSession};
use crate::speech::{ConsoleSynthesizer, SpeechOutputPlayer};
use crate::state::{Command, InteractionState, InteractionStateMachine, MachineOptions};
use crate::waveform::{Animator, BroadcastSink, WaveFrame};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "fox-voice-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        socket = ?config.socket_path,
        backend = %config.backend_url,
        wake_phrase = config.wake_phrase.as_str(),
        "configuration loaded"
    );

    // Create shutdown signal handler
    let mut shutdown = ShutdownSignal::new()?;

    // Create channels for inter-component communication
    // IPC / autostart -> state machine
    let (command_tx, command_rx) = mpsc::channel::<Command>(8);
    // Recognizer -> state machine
    let (recognition_tx, recognition_rx) = mpsc::channel(16);
    // State machine -> IPC server and subscribers
    let (event_tx, _event_rx) = broadcast::channel::<InteractionEvent>(64);
    // State machine -> animator
    let (state_tx, state_rx) = watch::channel(InteractionState::default());
    // Animator -> frame subscribers
    let (frame_tx, _frame_rx) = broadcast::channel::<WaveFrame>(4);

    // Speech input
    let recognizer = ConsoleRecognizer::stdin(recognition_tx, config.listen_timeout);
    let recognition = RecognitionSession::new(Box::new(recognizer), config.settle_delay);

    // Speech output
    let synthesizer = Arc::new(ConsoleSynthesizer::new(config.words_per_minute));
    let player =
        SpeechOutputPlayer::new(synthesizer, config.chunk_delay, config.speech_retry_limit);

    // Answering backend
    let answers = HttpAnswerService::new(&config.backend_url, config.request_timeout)
        .context("failed to build backend client")?;
    info!(endpoint = answers.endpoint(), "answering backend configured");

    // Create the state machine
    let mut state_machine = InteractionStateMachine::new(
        recognition,
        Arc::new(answers),
        player,
        MachineOptions {
            wake_phrase: config.wake_phrase.clone(),
            max_chunk_len: config.max_chunk_len,
        },
        event_tx.clone(),
        state_tx,
    );

    let animator = Animator::new(state_rx, config.frame_interval);

    // Create IPC server
    let server = Server::new(
        &config.socket_path,
        command_tx.clone(),
        event_tx.clone(),
        frame_tx.clone(),
    )?;

    // Subscribe to interaction events for IPC status updates
    let mut ipc_event_rx = event_tx.subscribe();
    let server_for_events = &server;

    if let Some(document) = &config.document {
        info!(%document, "starting session at launch");
        command_tx
            .send(Command::Start {
                document: document.clone(),
            })
            .await
            .context("failed to queue start trigger")?;
    } else {
        info!("waiting for a start request over IPC");
    }

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the state machine (processes commands, recognition and completions)
        _ = state_machine.run(command_rx, recognition_rx) => {
            info!("state machine exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Draw the waveform every frame
        _ = animator.run(BroadcastSink::new(frame_tx)) => {
            info!("animator exited");
        }

        // Handle interaction events for IPC synchronization
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "interaction event");
                        server_for_events.observe(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "interaction event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("interaction event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!(state = %state_machine.state(), "shutting down...");

    server.shutdown().await;

    info!("fox-voice-daemon stopped");

    Ok(())
}
