//! Per-frame animation driver
//!
//! Ticks at a fixed frame interval, reads the current interaction state and
//! hands a freshly computed frame to the render sink. It never waits on
//! interaction I/O.

use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::state::InteractionState;

use super::synth::{WaveFrame, WaveformSynthesizer, ANIMATION_PERIOD};

/// Animation time added per frame, in seconds
pub const TIME_STEP: f64 = 0.016;

/// Consumer of computed frames
pub trait RenderSink: Send {
    fn present(&mut self, frame: &WaveFrame);
}

/// Publishes frames on a broadcast channel, skipping work when nobody listens
pub struct BroadcastSink {
    tx: broadcast::Sender<WaveFrame>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<WaveFrame>) -> Self {
        Self { tx }
    }
}

impl RenderSink for BroadcastSink {
    fn present(&mut self, frame: &WaveFrame) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(frame.clone());
        }
    }
}

pub struct Animator {
    synth: WaveformSynthesizer,
    state_rx: watch::Receiver<InteractionState>,
    frame_interval: Duration,
    /// Frames presented so far
    frames: u64,
    frame: WaveFrame,
}

impl Animator {
    pub fn new(state_rx: watch::Receiver<InteractionState>, frame_interval: Duration) -> Self {
        Self {
            synth: WaveformSynthesizer::new(),
            state_rx,
            frame_interval,
            frames: 0,
            frame: WaveFrame::new(),
        }
    }

    /// Advance one frame and present it
    pub fn step<S: RenderSink>(&mut self, sink: &mut S) {
        self.frames += 1;
        // wrapped in f64 so the f32 handed to the bands keeps its precision
        let t = (self.frames as f64 * TIME_STEP) % ANIMATION_PERIOD;
        let state = *self.state_rx.borrow();
        self.synth.render_into(t as f32, state, &mut self.frame);
        sink.present(&self.frame);
    }

    /// Run forever, one frame per tick
    pub async fn run<S: RenderSink>(mut self, mut sink: S) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = self.frame_interval.as_millis() as u64, "animator started");

        let mut last_state = *self.state_rx.borrow();
        loop {
            ticker.tick().await;

            let state = *self.state_rx.borrow();
            if state != last_state {
                debug!(accent = %format!("#{:06x}", state.accent().rgb()), %state, "accent changed");
                last_state = state;
            }

            self.step(&mut sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::state::Accent;

    #[derive(Default)]
    struct RecordingSink {
        frames: Vec<(f32, Accent, f32)>,
    }

    impl RenderSink for RecordingSink {
        fn present(&mut self, frame: &WaveFrame) {
            self.frames.push((frame.time, frame.accent, frame.reactive[150]));
        }
    }

    #[test]
    fn test_time_accumulates_per_frame() {
        let (_tx, rx) = watch::channel(InteractionState::ActivationListening);
        let mut animator = Animator::new(rx, Duration::from_millis(16));
        let mut sink = RecordingSink::default();

        for _ in 0..3 {
            animator.step(&mut sink);
        }

        let times: Vec<f32> = sink.frames.iter().map(|f| f.0).collect();
        assert!((times[0] - 0.016).abs() < 1e-6);
        assert!((times[2] - 0.048).abs() < 1e-6);
    }

    #[test]
    fn test_time_keeps_advancing_after_days() {
        let (_tx, rx) = watch::channel(InteractionState::ActivationListening);
        let mut animator = Animator::new(rx, Duration::from_millis(16));
        let mut sink = RecordingSink::default();

        // about ten days of frames at 16ms
        animator.frames = 54_000_000;
        for _ in 0..100 {
            animator.step(&mut sink);
        }

        for pair in sink.frames.windows(2) {
            let step = (pair[1].0 as f64 - pair[0].0 as f64).rem_euclid(ANIMATION_PERIOD);
            assert!((step - TIME_STEP).abs() < 1e-4, "step was {step}");
        }
    }

    #[test]
    fn test_accent_switches_with_state() {
        let (tx, rx) = watch::channel(InteractionState::ActivationListening);
        let mut animator = Animator::new(rx, Duration::from_millis(16));
        let mut sink = RecordingSink::default();

        animator.step(&mut sink);
        tx.send_replace(InteractionState::Processing);
        animator.step(&mut sink);

        assert_eq!(sink.frames[0].1, Accent::Red);
        assert_eq!(sink.frames[1].1, Accent::Yellow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_ticking() {
        let (_state_tx, state_rx) = watch::channel(InteractionState::Speaking);
        let (frame_tx, mut frame_rx) = broadcast::channel(8);
        let animator = Animator::new(state_rx, Duration::from_millis(16));

        let task = tokio::spawn(animator.run(BroadcastSink::new(frame_tx)));

        let first = frame_rx.recv().await.unwrap();
        let second = frame_rx.recv().await.unwrap();
        assert_eq!(first.accent, Accent::Green);
        assert!(second.time > first.time);

        task.abort();
    }

    #[test]
    fn test_broadcast_sink_without_receivers() {
        let (frame_tx, frame_rx) = broadcast::channel(1);
        drop(frame_rx);
        let mut sink = BroadcastSink::new(frame_tx);
        // must not panic or error with nobody listening
        sink.present(&WaveFrame::new());
    }
}
