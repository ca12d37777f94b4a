//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::events::InteractionEvent;
use crate::state::{InteractionState, StatusLine};
use crate::waveform::WaveFrame;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from a client to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Start the voice session for a document
    Start {
        #[serde(default)]
        document: Option<String>,
    },

    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Receive interaction events, and optionally every waveform frame
    Subscribe {
        #[serde(default)]
        frames: bool,
    },
}

/// Responses from the daemon to a client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Start trigger handed to the state machine. A trigger that races an
    /// earlier one is still dropped there; `session_started` confirms it.
    Started,

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed { frames: bool },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification for subscribed clients
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Interaction event occurred
    Event { event: InteractionEvent },
    /// Waveform frame to draw
    Frame { frame: WaveFrame },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current interaction state
    pub state: InteractionState,

    /// Status line last shown to the user
    pub status: Option<StatusLine>,

    /// Document the session was started with
    pub document: Option<String>,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            state: InteractionState::default(),
            status: None,
            document: None,
            uptime_secs: 0,
        }
    }
}
