//! Start/stop sequencing over a [`Recognizer`]
//!
//! Every start is preceded by a stop and a fixed settle delay, so the
//! recognizer never sees a start before its previous stop took effect.
//! At most one listen cycle is live; events from any other cycle are
//! dropped.

use std::time::Duration;

use tracing::{debug, warn};

use super::capability::{
    CycleId, RecognitionError, RecognitionEvent, RecognitionOutcome, Recognizer,
};

/// What a listen cycle is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// Waiting for the wake phrase
    Activation,
    /// Capturing the query
    Query,
}

impl std::fmt::Display for ListenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenMode::Activation => write!(f, "activation"),
            ListenMode::Query => write!(f, "query"),
        }
    }
}

pub struct RecognitionSession {
    recognizer: Box<dyn Recognizer>,
    settle_delay: Duration,
    cycle: CycleId,
    /// Mode of the live cycle, if any
    live: Option<ListenMode>,
}

impl RecognitionSession {
    pub fn new(recognizer: Box<dyn Recognizer>, settle_delay: Duration) -> Self {
        Self {
            recognizer,
            settle_delay,
            cycle: 0,
            live: None,
        }
    }

    /// Mode of the live cycle
    #[cfg(test)]
    pub fn mode(&self) -> Option<ListenMode> {
        self.live
    }

    /// Stop, wait the settle delay, then start a new cycle in `mode`.
    ///
    /// A refused start leaves the session stopped and is returned to the
    /// caller.
    pub async fn start(&mut self, mode: ListenMode) -> Result<(), RecognitionError> {
        self.stop().await;
        tokio::time::sleep(self.settle_delay).await;

        self.cycle += 1;
        match self.recognizer.start(self.cycle).await {
            Ok(()) => {
                debug!(cycle = self.cycle, %mode, "recognition started");
                self.live = Some(mode);
                Ok(())
            }
            Err(e) => {
                warn!(cycle = self.cycle, %mode, error = %e, "failed to start recognition");
                self.live = None;
                Err(e)
            }
        }
    }

    /// Stop the live cycle; no-op when already stopped
    pub async fn stop(&mut self) {
        if self.live.is_none() && !self.recognizer.is_active() {
            return;
        }

        debug!(cycle = self.cycle, "recognition stopping");
        self.recognizer.stop().await;
        self.live = None;
    }

    /// Accept the terminal event of the live cycle.
    ///
    /// Returns `None` for events of stale cycles or when nothing is live.
    pub fn accept(&mut self, event: RecognitionEvent) -> Option<(ListenMode, RecognitionOutcome)> {
        if event.cycle != self.cycle {
            debug!(cycle = event.cycle, live = self.cycle, "dropping event from stale cycle");
            return None;
        }

        let Some(mode) = self.live.take() else {
            debug!(cycle = event.cycle, "dropping event for stopped cycle");
            return None;
        };

        Some((mode, event.outcome))
    }
}
