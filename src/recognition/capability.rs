//! Listen-once recognition capability
//!
//! A [`Recognizer`] listens for a single utterance per cycle and reports
//! exactly one terminal [`RecognitionEvent`] for it, tagged with the cycle
//! id it was started with.

use async_trait::async_trait;

/// Identifies one start-to-terminal-event listen cycle
pub type CycleId = u64;

/// A completed transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    raw_text: String,
}

impl Utterance {
    /// Normalize a transcript (lowercased, trimmed)
    pub fn new(transcript: &str) -> Self {
        Self {
            raw_text: transcript.trim().to_lowercase(),
        }
    }

    pub fn text(&self) -> &str {
        &self.raw_text
    }

    pub fn into_text(self) -> String {
        self.raw_text
    }
}

/// Errors reported by the recognizer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("microphone access not allowed")]
    NotAllowed,

    #[error("audio capture unavailable: {0}")]
    AudioCapture(String),

    #[error("no speech detected")]
    NoSpeech,

    #[error("recognizer already started")]
    AlreadyStarted,
}

impl RecognitionError {
    /// Errors that end the session until the user intervenes
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecognitionError::NotAllowed | RecognitionError::AudioCapture(_))
    }

    /// Message shown to the user for a fatal error
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionError::NotAllowed => "Please allow microphone access",
            _ => "Error: Please check microphone permissions",
        }
    }
}

/// How a listen cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    Heard(Utterance),
    /// Ended without a result (single-utterance timeout)
    Ended,
    Failed(RecognitionError),
}

/// Terminal event of one listen cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub cycle: CycleId,
    pub outcome: RecognitionOutcome,
}

impl RecognitionEvent {
    pub fn heard(cycle: CycleId, transcript: &str) -> Self {
        Self {
            cycle,
            outcome: RecognitionOutcome::Heard(Utterance::new(transcript)),
        }
    }

    pub fn ended(cycle: CycleId) -> Self {
        Self {
            cycle,
            outcome: RecognitionOutcome::Ended,
        }
    }

    pub fn failed(cycle: CycleId, error: RecognitionError) -> Self {
        Self {
            cycle,
            outcome: RecognitionOutcome::Failed(error),
        }
    }
}

/// Underlying listen-once capability
///
/// Implementations deliver events through a channel handed to them at
/// construction.
#[async_trait]
pub trait Recognizer: Send {
    /// Begin listening for one utterance
    async fn start(&mut self, cycle: CycleId) -> Result<(), RecognitionError>;

    /// Stop listening; the current cycle produces no further events
    async fn stop(&mut self);

    /// Whether a listen cycle is running
    fn is_active(&self) -> bool;
}
