use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ConfigError, SynthesisError};
use crate::{LyricDocument, RenderedSong, SongEngine, SongLength};

use super::model::SongModel;
use super::planner::{DEFAULT_TEMPO_BPM, MAX_SONG_SECS, MIN_SONG_SECS};

/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Accepted sample-rate range, in Hz.
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=96_000;

/// Accepted tempo range, in BPM.
pub const TEMPO_RANGE: RangeInclusive<f32> = 40.0..=220.0;

/// Parameters for configuring a render.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct RenderParams {
    /// Output sample rate in Hz. Range: 8000–96000, default 22050.
    pub sample_rate: u32,
    /// Preferred tempo. Range: 40–220 BPM, default 100. Long songs may be
    /// sped up beyond this to respect `max_duration_secs`.
    pub tempo_bpm: f32,
    /// Hard ceiling on the rendered length, in seconds. Must be at least
    /// `MIN_SONG_SECS`, default 55.
    pub max_duration_secs: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            max_duration_secs: MAX_SONG_SECS,
        }
    }
}

impl RenderParams {
    /// Reject parameters the renderer cannot honour.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        if !SAMPLE_RATE_RANGE.contains(&self.sample_rate) {
            return Err(SynthesisError::UnsupportedSampleRate(self.sample_rate));
        }
        if !TEMPO_RANGE.contains(&self.tempo_bpm) {
            return Err(SynthesisError::InvalidTempo(self.tempo_bpm));
        }
        if !(self.max_duration_secs.is_finite() && self.max_duration_secs >= MIN_SONG_SECS) {
            return Err(SynthesisError::InvalidDuration(self.max_duration_secs));
        }
        Ok(())
    }
}

/// Procedural love-song engine.
///
/// Writes Malayalam lyrics from a template lexicon and sings them with a
/// small additive synthesizer.
///
/// # Quick Start
///
/// ```rust,no_run
/// use serenade_rs::{SongEngine, SongLength, engines::serenade::SerenadeEngine};
/// use std::path::PathBuf;
///
/// let mut engine = SerenadeEngine::new();
/// let lyrics = engine.generate_lyrics(SongLength::Medium);
/// engine.render_to_file(&lyrics.verses, &PathBuf::from("song.wav"), None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// # Reproducible lyrics
///
/// ```rust,no_run
/// use serenade_rs::{SongEngine, SongLength, engines::serenade::SerenadeEngine};
///
/// let mut a = SerenadeEngine::with_seed(7);
/// let mut b = SerenadeEngine::with_seed(7);
/// assert_eq!(a.generate_lyrics(SongLength::Long), b.generate_lyrics(SongLength::Long));
/// ```
pub struct SerenadeEngine {
    model: SongModel,
    model_path: Option<PathBuf>,
    rng: StdRng,
}

impl Default for SerenadeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SerenadeEngine {
    /// Create an engine with the built-in lexicon and an OS-seeded RNG.
    pub fn new() -> Self {
        Self {
            model: SongModel::default(),
            model_path: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create an engine whose lyric choices are fixed by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            model: SongModel::default(),
            model_path: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Use an already-built model.
    pub fn with_model(mut self, model: SongModel) -> Self {
        self.model = model;
        self
    }

    /// Shared handle to the current model, for rendering off this thread.
    pub fn model(&self) -> &SongModel {
        &self.model
    }

    /// Directory the current lexicon was loaded from, if any.
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }
}

impl SongEngine for SerenadeEngine {
    type RenderParams = RenderParams;

    fn load_model(&mut self, model_dir: &Path) -> Result<(), ConfigError> {
        self.model = SongModel::load(model_dir)?;
        self.model_path = Some(model_dir.to_path_buf());
        Ok(())
    }

    fn generate_lyrics(&mut self, length: SongLength) -> LyricDocument {
        self.model.compose_lyrics(length, &mut self.rng)
    }

    fn render(
        &self,
        verses: &[Vec<String>],
        params: Option<Self::RenderParams>,
    ) -> Result<RenderedSong, SynthesisError> {
        let p = params.unwrap_or_default();
        self.model.render_verses(verses, &p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_defaults() {
        let params = RenderParamsBuilder::default().tempo_bpm(80.0).build().unwrap();
        assert_eq!(params.tempo_bpm, 80.0);
        assert_eq!(params.sample_rate, DEFAULT_SAMPLE_RATE);
        assert_eq!(params.max_duration_secs, MAX_SONG_SECS);
    }

    #[test]
    fn ceiling_below_minimum_length_is_rejected() {
        let params = RenderParamsBuilder::default()
            .max_duration_secs(1.0)
            .build()
            .unwrap();
        assert!(matches!(
            params.validate(),
            Err(SynthesisError::InvalidDuration(d)) if d == 1.0
        ));

        let engine = SerenadeEngine::with_seed(4);
        let verses = vec![vec!["ഒന്ന്".to_string()]];
        assert!(matches!(
            engine.render(&verses, Some(params)),
            Err(SynthesisError::InvalidDuration(_))
        ));

        let at_minimum = RenderParamsBuilder::default()
            .max_duration_secs(MIN_SONG_SECS)
            .build()
            .unwrap();
        let song = engine.render(&verses, Some(at_minimum)).unwrap();
        assert!(song.duration_secs() <= MIN_SONG_SECS as f64 + 1e-3);
    }

    #[test]
    fn with_model_uses_a_validated_lexicon() {
        let mut lexicon = crate::engines::serenade::lexicon::hardcoded_lexicon();
        lexicon.outros = vec!["ഒരു രാവ്".to_string()];
        let model = SongModel::new(lexicon).unwrap();
        let mut engine = SerenadeEngine::with_seed(5).with_model(model);
        assert_eq!(engine.generate_lyrics(SongLength::Medium).outro, "ഒരു രാവ്");
    }

    #[test]
    fn seeded_engines_agree() {
        let mut a = SerenadeEngine::with_seed(99);
        let mut b = SerenadeEngine::with_seed(99);
        for length in SongLength::ALL {
            assert_eq!(a.generate_lyrics(length), b.generate_lyrics(length));
        }
    }

    #[test]
    fn renders_generated_verses() {
        let mut engine = SerenadeEngine::with_seed(1);
        let lyrics = engine.generate_lyrics(SongLength::Short);
        let song = engine.render(&lyrics.verses, None).unwrap();
        assert_eq!(song.sample_rate, DEFAULT_SAMPLE_RATE);
        assert!(song.duration_secs() > 0.0);
        assert!(song.duration_secs() < SongLength::Short.policy().max_duration_secs as f64);
    }

    #[test]
    fn render_to_file_writes_playable_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        let mut engine = SerenadeEngine::with_seed(2);
        let lyrics = engine.generate_lyrics(SongLength::Medium);
        let params = RenderParamsBuilder::default().sample_rate(16_000).build().unwrap();
        engine.render_to_file(&lyrics.verses, &path, Some(params)).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 16_000);
        assert!(reader.len() > 0);
    }

    #[test]
    fn load_model_records_path_and_keeps_builtin_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = SerenadeEngine::with_seed(3);
        engine.load_model(dir.path()).unwrap();
        assert_eq!(engine.model_path(), Some(dir.path()));
        assert!(engine.generate_lyrics(SongLength::Long).validate().is_ok());
    }
}
