//! Interaction state machine
//!
//! Five states, each bound to an accent color and a status line:
//! - ActivationListening: waiting for the wake phrase (red)
//! - QueryListening: capturing the query (blue)
//! - Processing: waiting for the backend (yellow)
//! - Speaking: reading the answer aloud (green)
//! - Error: microphone unavailable until restarted (grey)

mod interaction;
mod machine;

pub use interaction::{Accent, InteractionState, StatusClass, StatusLine};
pub use machine::{Command, InteractionStateMachine, MachineOptions};
