//! Speech recognition: listen-once capability, session sequencing and
//! wake phrase matching

mod capability;
mod console;
mod session;
mod wake;

pub use capability::{
    CycleId, RecognitionError, RecognitionEvent, RecognitionOutcome, Recognizer, Utterance,
};
pub use console::ConsoleRecognizer;
pub use session::{ListenMode, RecognitionSession};
pub use wake::WakePhrase;
