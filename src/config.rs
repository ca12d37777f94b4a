//! Configuration loading and management

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::recognition::WakePhrase;
use crate::speech::DEFAULT_MAX_CHUNK_LEN;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Base URL of the answering backend
    pub backend_url: String,

    /// Timeout for one backend request
    pub request_timeout: Duration,

    /// Document to start the session with at launch
    pub document: Option<String>,

    pub wake_phrase: WakePhrase,

    /// How long one listen cycle waits for speech
    pub listen_timeout: Duration,

    /// Pause between stopping and restarting recognition
    pub settle_delay: Duration,

    /// Pause between spoken chunks
    pub chunk_delay: Duration,

    /// Longest chunk handed to the synthesizer, in characters
    pub max_chunk_len: usize,

    /// Not-allowed synthesis errors tolerated before playback is abandoned
    pub speech_retry_limit: u32,

    /// Waveform frame interval
    pub frame_interval: Duration,

    /// Speaking rate of the console synthesizer
    pub words_per_minute: u32,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("fox-voice");

        let socket_path = data_dir.join("daemon.sock");

        let document = std::env::var("FOX_DOCUMENT")
            .ok()
            .filter(|d| !d.trim().is_empty());

        let wake_phrase = std::env::var("FOX_WAKE_PHRASE")
            .map(|p| WakePhrase::new(&p))
            .unwrap_or_default();

        let max_chunk_len = env_or("FOX_MAX_CHUNK_LEN", DEFAULT_MAX_CHUNK_LEN)?;
        if max_chunk_len == 0 {
            anyhow::bail!("FOX_MAX_CHUNK_LEN must be greater than zero");
        }

        Ok(Self {
            socket_path,
            data_dir,
            backend_url: std::env::var("FOX_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            request_timeout: Duration::from_secs(env_or("FOX_REQUEST_TIMEOUT_SECS", 30)?),
            document,
            wake_phrase,
            listen_timeout: Duration::from_secs(env_or("FOX_LISTEN_TIMEOUT_SECS", 8)?),
            settle_delay: Duration::from_millis(env_or("FOX_SETTLE_MS", 100)?),
            chunk_delay: Duration::from_millis(env_or("FOX_CHUNK_DELAY_MS", 100)?),
            max_chunk_len,
            speech_retry_limit: env_or("FOX_SPEECH_RETRY_LIMIT", 5)?,
            frame_interval: Duration::from_millis(env_or("FOX_FRAME_INTERVAL_MS", 16)?),
            words_per_minute: env_or("FOX_WORDS_PER_MINUTE", 180)?,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

/// Parse an environment variable, falling back to `default` when unset
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
