//! # serenade-rs
//!
//! A Rust library that writes and sings short Malayalam love songs without
//! any model or media dependency: lyrics are assembled from a template bank,
//! a melody is planned from the lyric structure, and the result is rendered
//! with additive synthesis into a WAV asset.
//!
//! ## Features
//!
//! - **Procedural lyrics**: title, verses, refrain and outro from a bundled
//!   (or user-supplied) lexicon
//! - **Structural melody planning**: pentatonic motifs, chord pads and a
//!   distinct refrain register, scaled to the number of lyric lines
//! - **In-memory WAV assets**: fetchable, downloadable, explicitly releasable
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serenade-rs = "2026.10"
//! ```
//!
//! ```ignore
//! use serenade_rs::{assets::AssetStore, compose_song, generate_lyrics, SongLength};
//!
//! let lyrics = generate_lyrics(SongLength::Short);
//! let store = AssetStore::new();
//! let composition = compose_song(&store, lyrics.verses.clone()).await?;
//! println!("{} -> {}", lyrics.title, composition.audio_url);
//! store.release(&composition.audio_url);
//! # Ok::<(), serenade_rs::SerenadeError>(())
//! ```

pub mod assets;
pub mod engines;
pub mod error;
pub mod studio;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use engines::serenade::lyrics::{LengthPolicy, LONG_POLICY, MEDIUM_POLICY, SHORT_POLICY};

pub use error::{ConfigError, SerenadeError, SynthesisError};
pub use studio::{compose_song, generate_lyrics, Composition, Studio};

/// Coarse length selector for a generated song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongLength {
    Short,
    Medium,
    Long,
}

impl SongLength {
    pub const ALL: [SongLength; 3] = [SongLength::Short, SongLength::Medium, SongLength::Long];

    /// The verse-count and duration policy for this length.
    pub fn policy(self) -> LengthPolicy {
        match self {
            SongLength::Short => SHORT_POLICY,
            SongLength::Medium => MEDIUM_POLICY,
            SongLength::Long => LONG_POLICY,
        }
    }

    /// Malayalam label shown on the length selector.
    pub fn label(self) -> &'static str {
        match self {
            SongLength::Short => "ചുരുങ്ങിയത്",
            SongLength::Medium => "ഹൃദയ സ്പർശം",
            SongLength::Long => "ആഴമുള്ള",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SongLength::Short => "short",
            SongLength::Medium => "medium",
            SongLength::Long => "long",
        }
    }
}

impl fmt::Display for SongLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SongLength {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(SongLength::Short),
            "medium" => Ok(SongLength::Medium),
            "long" => Ok(SongLength::Long),
            _ => Err(ConfigError::UnknownLength(s.to_string())),
        }
    }
}

/// A generated song text.
///
/// Every document handed out by the composer has a non-empty title, refrain
/// and outro, and 1 or more verses of 1..=4 non-empty lines each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricDocument {
    pub title: String,
    pub verses: Vec<Vec<String>>,
    /// Shared refrain; may span several lines separated by `\n`.
    pub refrain: String,
    pub outro: String,
}

impl LyricDocument {
    /// Check the structural invariants, returning a description of the first
    /// violation.
    pub fn validate(&self) -> Result<(), String> {
        use engines::serenade::lyrics::MAX_LINES_PER_VERSE;

        if self.title.trim().is_empty() {
            return Err("title is empty".to_string());
        }
        if self.refrain.trim().is_empty() {
            return Err("refrain is empty".to_string());
        }
        if self.outro.trim().is_empty() {
            return Err("outro is empty".to_string());
        }
        if self.verses.is_empty() {
            return Err("document has no verses".to_string());
        }
        for (i, verse) in self.verses.iter().enumerate() {
            if verse.is_empty() || verse.len() > MAX_LINES_PER_VERSE {
                return Err(format!(
                    "verse {} has {} lines (expected 1..={MAX_LINES_PER_VERSE})",
                    i + 1,
                    verse.len()
                ));
            }
            if verse.iter().any(|line| line.trim().is_empty()) {
                return Err(format!("verse {} contains an empty line", i + 1));
            }
        }
        Ok(())
    }

    /// Total number of verse lines.
    pub fn line_count(&self) -> usize {
        self.verses.iter().map(Vec::len).sum()
    }

    /// Non-blank refrain lines.
    pub fn refrain_lines(&self) -> Vec<&str> {
        self.refrain
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// File name used when the rendered song is downloaded.
    pub fn download_filename(&self) -> String {
        assets::download_filename(Some(self.title.as_str()))
    }
}

/// Raw output of a render: mono `f32` samples in `-1.0..=1.0`.
#[derive(Debug)]
pub struct RenderedSong {
    /// Normalised mono samples
    pub samples: Vec<f32>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl RenderedSong {
    /// Write the audio to a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), SynthesisError> {
        engines::serenade::wav::write_wav(&self.samples, self.sample_rate, path)
    }

    /// Encode into an in-memory WAV asset.
    pub fn encode(&self) -> Result<assets::AudioAsset, SynthesisError> {
        let bytes = engines::serenade::wav::encode_wav(&self.samples, self.sample_rate)?;
        Ok(assets::AudioAsset::new(
            bytes,
            self.sample_rate,
            self.samples.len(),
        ))
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Common interface for song engines.
///
/// An engine owns a lexicon and a randomness source for lyrics, and knows how
/// to turn verse lines into audio.
pub trait SongEngine {
    /// Parameters for configuring a render (sample rate, tempo, etc.)
    type RenderParams: Default;

    /// Replace the engine's lexicon with the one found in `model_dir`.
    fn load_model(&mut self, model_dir: &Path) -> Result<(), ConfigError>;

    /// Compose a fresh lyric document.
    fn generate_lyrics(&mut self, length: SongLength) -> LyricDocument;

    /// Render verse lines into audio.
    fn render(
        &self,
        verses: &[Vec<String>],
        params: Option<Self::RenderParams>,
    ) -> Result<RenderedSong, SynthesisError>;

    /// Render verse lines and write them to a WAV file.
    ///
    /// Default implementation calls `render()` then `RenderedSong::write_wav()`.
    fn render_to_file(
        &self,
        verses: &[Vec<String>],
        wav_path: &Path,
        params: Option<Self::RenderParams>,
    ) -> Result<(), SynthesisError> {
        self.render(verses, params)?.write_wav(wav_path)
    }
}
