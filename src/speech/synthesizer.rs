//! Speech synthesis capability

use async_trait::async_trait;

/// A voice offered by a synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP 47 language tag, e.g. `en-US`
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }

    fn is_english(&self) -> bool {
        self.lang.starts_with("en")
    }
}

/// Errors reported while speaking one utterance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("speech output not allowed")]
    NotAllowed,

    #[error("speech output interrupted")]
    Interrupted,

    #[error("speech output failed: {0}")]
    Failed(String),
}

/// Something that can speak text aloud
///
/// `speak` resolves when the utterance has finished playing.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Voices available on this synthesizer
    fn voices(&self) -> Vec<Voice>;

    /// Speak `text`, waiting for playback to complete
    async fn speak(&self, text: &str, voice: Option<&Voice>) -> Result<(), SynthesisError>;

    /// Drop anything queued or playing
    async fn cancel(&self);
}

/// Pick a voice: an English "female" voice first, then any English voice
pub fn select_voice(voices: &[Voice]) -> Option<Voice> {
    voices
        .iter()
        .find(|v| v.name.to_lowercase().contains("female") && v.is_english())
        .or_else(|| voices.iter().find(|v| v.is_english()))
        .cloned()
}
