//! Waveform visualization: band shapes and the frame driver

mod driver;
mod synth;

pub use driver::{Animator, BroadcastSink, RenderSink};
pub use synth::{WaveFrame, WaveformSynthesizer};
