//! Wake phrase matching

use super::capability::Utterance;

/// Case-insensitive containment match for the activation phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakePhrase {
    phrase: String,
}

impl WakePhrase {
    pub fn new(phrase: &str) -> Self {
        Self {
            phrase: phrase.trim().to_lowercase(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.phrase
    }

    /// Whether the transcript contains the phrase
    pub fn matches(&self, utterance: &Utterance) -> bool {
        !self.phrase.is_empty() && utterance.text().contains(&self.phrase)
    }
}

impl Default for WakePhrase {
    fn default() -> Self {
        Self::new("fox")
    }
}
