//! Console recognition backend
//!
//! Treats each line typed on stdin as a finished transcript. A listen cycle
//! takes the next line, or ends without result after the listen timeout. A
//! blank line counts as no speech.
//! Lines typed while no cycle is live are discarded when the next cycle
//! starts. Closing stdin is reported as lost audio capture.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::capability::{CycleId, RecognitionError, RecognitionEvent, Recognizer};

pub struct ConsoleRecognizer {
    lines: Arc<Mutex<mpsc::Receiver<String>>>,
    events: mpsc::Sender<RecognitionEvent>,
    listen_timeout: Duration,
    listener: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    /// Create a recognizer fed by an arbitrary line source
    pub fn new(
        lines: mpsc::Receiver<String>,
        events: mpsc::Sender<RecognitionEvent>,
        listen_timeout: Duration,
    ) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            events,
            listen_timeout,
            listener: None,
        }
    }

    /// Create a recognizer reading lines from stdin
    pub fn stdin(events: mpsc::Sender<RecognitionEvent>, listen_timeout: Duration) -> Self {
        let (line_tx, line_rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line_tx.send(line).await.is_err() {
                    break;
                }
            }
            info!("console input closed");
        });

        Self::new(line_rx, events, listen_timeout)
    }
}

#[async_trait]
impl Recognizer for ConsoleRecognizer {
    async fn start(&mut self, cycle: CycleId) -> Result<(), RecognitionError> {
        if self.is_active() {
            return Err(RecognitionError::AlreadyStarted);
        }

        // the previous listener is gone, so the lock is free
        if let Ok(mut pending) = self.lines.try_lock() {
            let mut stale = 0;
            while pending.try_recv().is_ok() {
                stale += 1;
            }
            if stale > 0 {
                debug!(cycle, stale, "discarded input typed between cycles");
            }
        }

        let lines = Arc::clone(&self.lines);
        let events = self.events.clone();
        let listen_timeout = self.listen_timeout;

        self.listener = Some(tokio::spawn(async move {
            let event = {
                let mut lines = lines.lock().await;
                match tokio::time::timeout(listen_timeout, lines.recv()).await {
                    Ok(Some(line)) if line.trim().is_empty() => {
                        RecognitionEvent::failed(cycle, RecognitionError::NoSpeech)
                    }
                    Ok(Some(line)) => RecognitionEvent::heard(cycle, &line),
                    Ok(None) => RecognitionEvent::failed(
                        cycle,
                        RecognitionError::AudioCapture("console input closed".to_string()),
                    ),
                    Err(_) => RecognitionEvent::ended(cycle),
                }
            };
            debug!(cycle, outcome = ?event.outcome, "console listen cycle finished");
            let _ = events.send(event).await;
        }));

        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            let _ = listener.await;
        }
    }

    fn is_active(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }
}
