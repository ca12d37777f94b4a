//! Console speech backend
//!
//! Writes each utterance to stdout and holds for roughly the time it would
//! take to say it aloud.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;

use super::synthesizer::{SynthesisError, Synthesizer, Voice};

pub struct ConsoleSynthesizer {
    words_per_minute: u32,
    cancelled: Notify,
}

impl ConsoleSynthesizer {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            cancelled: Notify::new(),
        }
    }

    fn speaking_time(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count() as u64;
        Duration::from_millis(words * 60_000 / u64::from(self.words_per_minute))
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        vec![Voice::new("Console Female", "en-US")]
    }

    async fn speak(&self, text: &str, voice: Option<&Voice>) -> Result<(), SynthesisError> {
        let speaker = voice.map(|v| v.name.as_str()).unwrap_or("default");
        let line = format!("[{speaker}] {text}\n");

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SynthesisError::Failed(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| SynthesisError::Failed(e.to_string()))?;

        tokio::select! {
            _ = tokio::time::sleep(self.speaking_time(text)) => Ok(()),
            _ = self.cancelled.notified() => Err(SynthesisError::Interrupted),
        }
    }

    async fn cancel(&self) {
        self.cancelled.notify_waiters();
    }
}
