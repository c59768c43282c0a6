//! Error types shared by the lyric and audio stages.

use crate::assets::AssetHandle;

/// Configuration mistakes: an unrecognised song length or a malformed lexicon.
///
/// None of these can happen on the built-in data with a well-typed
/// [`SongLength`](crate::SongLength); they surface only at the string and
/// file boundaries.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Unknown song length '{0}'. Expected one of: short, medium, long.")]
    UnknownLength(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),
}

/// Waveform rendering or container encoding could not complete.
///
/// No asset is registered when one of these is returned.
#[derive(thiserror::Error, Debug)]
pub enum SynthesisError {
    #[error("Nothing to compose: the verse list has no non-blank lines")]
    EmptyComposition,
    #[error("Unsupported sample rate {0} Hz (expected 8000..=96000)")]
    UnsupportedSampleRate(u32),
    #[error("Invalid tempo {0} BPM (expected 40..=220)")]
    InvalidTempo(f32),
    #[error("Invalid maximum duration {0}s (expected at least 2s)")]
    InvalidDuration(f32),
    #[error("Rendered buffer of {samples} samples does not fit in a WAV container")]
    BufferTooLarge { samples: usize },
    #[error("WAV encoding failed: {0}")]
    Encode(#[from] hound::Error),
    #[error("Render task did not complete: {0}")]
    RenderTask(String),
}

/// Umbrella error for the session and asset-store surface.
#[derive(thiserror::Error, Debug)]
pub enum SerenadeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("Asset handle {0} is unknown or has already been released")]
    UnknownHandle(AssetHandle),
    #[error("No song has been composed yet")]
    NoComposition,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
