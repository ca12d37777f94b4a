//! Events broadcast by the interaction state machine
//!
//! Subscribers (the IPC server, logging) see every state change, status
//! line and the milestones of each query episode.

use serde::{Deserialize, Serialize};

use crate::state::{InteractionState, StatusLine};

/// Events emitted by the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// The session was started with a document name
    SessionStarted { document: String },

    /// State changed
    StateChanged {
        from: InteractionState,
        to: InteractionState,
        /// Time spent in the previous state
        duration_ms: u64,
    },

    /// New status line for the user
    Status(StatusLine),

    /// Wake phrase found in a transcript
    WakePhraseDetected { transcript: String },

    /// Query captured and sent to the backend
    QuerySubmitted { query: String },

    /// Backend answered
    AnswerReceived { chars: usize },

    /// Backend failed; the apology is spoken instead
    QueryFailed { reason: String },

    /// Playback of an answer began
    SpeechStarted { chunks: usize },

    /// Playback of an answer ended
    SpeechFinished {
        spoken: usize,
        skipped: usize,
        abandoned: bool,
    },
}

impl std::fmt::Display for InteractionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionEvent::SessionStarted { document } => {
                write!(f, "SESSION_STARTED ({})", document)
            }
            InteractionEvent::StateChanged { from, to, duration_ms } => {
                write!(f, "STATE_CHANGED ({} -> {}, {}ms)", from, to, duration_ms)
            }
            InteractionEvent::Status(status) => write!(f, "STATUS ({})", status.text),
            InteractionEvent::WakePhraseDetected { .. } => write!(f, "WAKE_PHRASE_DETECTED"),
            InteractionEvent::QuerySubmitted { .. } => write!(f, "QUERY_SUBMITTED"),
            InteractionEvent::AnswerReceived { chars } => {
                write!(f, "ANSWER_RECEIVED ({} chars)", chars)
            }
            InteractionEvent::QueryFailed { .. } => write!(f, "QUERY_FAILED"),
            InteractionEvent::SpeechStarted { chunks } => {
                write!(f, "SPEECH_STARTED ({} chunks)", chunks)
            }
            InteractionEvent::SpeechFinished { spoken, .. } => {
                write!(f, "SPEECH_FINISHED ({} spoken)", spoken)
            }
        }
    }
}
