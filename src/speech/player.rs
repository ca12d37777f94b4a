//! Sequential chunked playback
//!
//! Plays one chunk at a time, waiting for each to complete before moving on.
//! A "not allowed" failure cancels pending output and retries the same chunk
//! after the inter-chunk delay, up to a retry limit.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::synthesizer::{select_voice, SynthesisError, Synthesizer, Voice};

/// Outcome of one speak cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Chunks played to completion
    pub spoken: usize,
    /// Chunks skipped after a non-recoverable error
    pub skipped: usize,
    /// Playback stopped early because permission kept lapsing
    pub abandoned: bool,
}

/// Speaks answers through a [`Synthesizer`]
#[derive(Clone)]
pub struct SpeechOutputPlayer {
    synthesizer: Arc<dyn Synthesizer>,
    voice: Option<Voice>,
    chunk_delay: Duration,
    retry_limit: u32,
}

impl SpeechOutputPlayer {
    /// Create a player and select its voice
    pub fn new(synthesizer: Arc<dyn Synthesizer>, chunk_delay: Duration, retry_limit: u32) -> Self {
        let voices = synthesizer.voices();
        let voice = select_voice(&voices);

        debug!(
            available = ?voices.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            "voices loaded"
        );
        match &voice {
            Some(v) => info!(voice = %v.name, lang = %v.lang, "selected voice"),
            None => info!("no English voice found, using synthesizer default"),
        }

        Self {
            synthesizer,
            voice,
            chunk_delay,
            retry_limit,
        }
    }

    #[cfg(test)]
    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    /// Play `chunks` strictly in order
    pub async fn speak(&self, chunks: &[String]) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let mut cursor = 0;
        let mut lapses = 0;

        while cursor < chunks.len() {
            let chunk = &chunks[cursor];
            debug!(chunk = cursor + 1, total = chunks.len(), "speaking chunk");

            match self.synthesizer.speak(chunk, self.voice.as_ref()).await {
                Ok(()) => {
                    debug!(chunk = cursor + 1, "chunk finished");
                    report.spoken += 1;
                    cursor += 1;
                    lapses = 0;
                }
                Err(SynthesisError::NotAllowed) => {
                    lapses += 1;
                    if lapses > self.retry_limit {
                        warn!(
                            chunk = cursor + 1,
                            attempts = lapses,
                            "speech output still not allowed, abandoning playback"
                        );
                        self.synthesizer.cancel().await;
                        report.abandoned = true;
                        break;
                    }

                    warn!(chunk = cursor + 1, attempt = lapses, "speech output not allowed, retrying");
                    self.synthesizer.cancel().await;
                    tokio::time::sleep(self.chunk_delay).await;
                    continue;
                }
                Err(e) => {
                    warn!(chunk = cursor + 1, error = %e, "skipping chunk");
                    report.skipped += 1;
                    cursor += 1;
                    lapses = 0;
                }
            }

            if cursor < chunks.len() {
                tokio::time::sleep(self.chunk_delay).await;
            }
        }

        report
    }
}
