//! Procedural waveform shapes for the two visual bands
//!
//! Both bands are pure functions of elapsed time and interaction state.
//! The synthesizer only writes into the buffers of a [`WaveFrame`]; it keeps
//! no per-frame state of its own.

use serde::Serialize;

use crate::state::{Accent, InteractionState};

/// Number of spatial segments in one ambient layer (samples = segments + 1)
pub const AMBIENT_SEGMENTS: usize = 100;
/// Number of stacked ambient layers
pub const AMBIENT_LAYERS: usize = 50;
/// Number of spatial segments in the reactive band (samples = segments + 1)
pub const REACTIVE_SEGMENTS: usize = 200;

/// Every band repeats after this many seconds of animation time
pub const ANIMATION_PERIOD: f64 = 4.0 * std::f64::consts::PI;

const AMBIENT_SPACING: f32 = 0.1;
const AMBIENT_LAYER_PHASE: f32 = 0.2;
const REACTIVE_SPACING: f32 = 0.02;
const REACTIVE_SPEED: f32 = 5.0;

/// Shape parameters of the ambient band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientParams {
    pub frequency: f32,
    pub amplitude: f32,
}

impl AmbientParams {
    /// Parameters at rest
    pub const REST: Self = Self {
        frequency: 0.5,
        amplitude: 0.2,
    };

    /// Elevated parameters used while speaking
    pub const SPEAKING: Self = Self {
        frequency: 1.0,
        amplitude: 0.4,
    };

    pub fn for_state(state: InteractionState) -> Self {
        if state.is_speaking() {
            Self::SPEAKING
        } else {
            Self::REST
        }
    }
}

/// Shape parameters of the reactive band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactiveParams {
    pub frequency: f32,
    pub amplitude: f32,
}

impl ReactiveParams {
    const BASE_FREQUENCY: f32 = 2.0;
    const BASE_AMPLITUDE: f32 = 0.3;

    pub fn for_state(state: InteractionState) -> Self {
        if state.is_speaking() {
            Self {
                frequency: Self::BASE_FREQUENCY * 2.0,
                amplitude: Self::BASE_AMPLITUDE * 1.5,
            }
        } else {
            Self {
                frequency: Self::BASE_FREQUENCY,
                amplitude: Self::BASE_AMPLITUDE,
            }
        }
    }
}

/// One line of the ambient band
#[derive(Debug, Clone, Serialize)]
pub struct AmbientLayer {
    /// Opacity of the layer, fading with depth
    pub opacity: f32,
    /// Vertical displacement per sample
    pub heights: Vec<f32>,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct WaveFrame {
    /// Animation time in seconds, wrapped to [`ANIMATION_PERIOD`]
    pub time: f32,
    /// Color shared by every band in this frame
    pub accent: Accent,
    pub ambient: Vec<AmbientLayer>,
    pub reactive: Vec<f32>,
}

impl WaveFrame {
    /// Allocate a zeroed frame with the standard band sizes
    pub fn new() -> Self {
        let ambient = (0..AMBIENT_LAYERS)
            .map(|layer| AmbientLayer {
                opacity: layer_opacity(layer),
                heights: vec![0.0; AMBIENT_SEGMENTS + 1],
            })
            .collect();

        Self {
            time: 0.0,
            accent: InteractionState::default().accent(),
            ambient,
            reactive: vec![0.0; REACTIVE_SEGMENTS + 1],
        }
    }
}

impl Default for WaveFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Opacity of an ambient layer; deeper layers are fainter
pub fn layer_opacity(layer: usize) -> f32 {
    1.0 - (layer as f32 / AMBIENT_LAYERS as f32) * 0.5
}

/// Computes band displacements for a given time and state
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveformSynthesizer;

impl WaveformSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Recompute every buffer of `frame` for time `t`
    pub fn render_into(&self, t: f32, state: InteractionState, frame: &mut WaveFrame) {
        frame.time = t;
        frame.accent = state.accent();

        let params = AmbientParams::for_state(state);
        let boost = speaking_boost(t, state);
        for (index, layer) in frame.ambient.iter_mut().enumerate() {
            fill_ambient(&mut layer.heights, t, index, params, boost);
        }

        fill_reactive(&mut frame.reactive, t, ReactiveParams::for_state(state));
    }

    /// Render a fresh frame
    #[cfg(test)]
    pub fn render(&self, t: f32, state: InteractionState) -> WaveFrame {
        let mut frame = WaveFrame::new();
        self.render_into(t, state, &mut frame);
        frame
    }
}

/// Amplitude pulse applied to the ambient band while speaking
fn speaking_boost(t: f32, state: InteractionState) -> f32 {
    if state.is_speaking() {
        1.0 + (t * 10.0).sin() * 0.5
    } else {
        1.0
    }
}

fn fill_ambient(heights: &mut [f32], t: f32, layer: usize, params: AmbientParams, boost: f32) {
    let center = AMBIENT_SEGMENTS as f32 / 2.0;
    let half_width = AMBIENT_SEGMENTS as f32 * AMBIENT_SPACING / 2.0;
    let phase = t + layer as f32 * AMBIENT_LAYER_PHASE;

    for (i, height) in heights.iter_mut().enumerate() {
        let x = (i as f32 - center) * AMBIENT_SPACING;
        let fade = 1.0 - x.abs() / half_width;
        *height = (x * params.frequency + phase).sin() * params.amplitude * boost * fade;
    }
}

fn fill_reactive(heights: &mut [f32], t: f32, params: ReactiveParams) {
    let center = REACTIVE_SEGMENTS as f32 / 2.0;
    let half_width = REACTIVE_SEGMENTS as f32 * REACTIVE_SPACING / 2.0;
    let primary_phase = t * REACTIVE_SPEED;
    let secondary_phase = t * REACTIVE_SPEED * 0.5;

    for (i, height) in heights.iter_mut().enumerate() {
        let x = (i as f32 - center) * REACTIVE_SPACING;
        let primary = (x * params.frequency + primary_phase).sin() * 0.6;
        let secondary = (x * params.frequency * 0.5 + secondary_phase).sin() * 0.4;
        *height = (primary + secondary) * params.amplitude * (1.0 - x.abs() / half_width);
    }
}
