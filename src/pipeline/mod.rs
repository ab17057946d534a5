//! Request pipeline: input resolution, provider dispatch, fallback and progress.

pub mod extract;
pub mod fallback;
pub mod orchestrator;
pub mod progress;

pub use extract::{ContentExtractor, ExtractedContent, HttpPageExtractor, NoExtractor, StaticExtractor};
pub use fallback::{FALLBACK_PROVIDER_ID, FallbackSynthesizer, SYNTHETIC_MARKER};
pub use orchestrator::{MAX_INPUT_CHARS, Orchestrator};
pub use progress::{
    ChannelReporter, LogReporter, NoopReporter, ProgressReporter, ProgressTracker,
};
