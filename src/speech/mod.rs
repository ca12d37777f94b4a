//! Speech output: chunking, voice selection and sequential playback

mod chunk;
mod console;
mod player;
mod synthesizer;

pub use chunk::{split_into_chunks, DEFAULT_MAX_CHUNK_LEN};
pub use console::ConsoleSynthesizer;
pub use player::{PlaybackReport, SpeechOutputPlayer};
pub use synthesizer::{select_voice, SynthesisError, Synthesizer, Voice};
