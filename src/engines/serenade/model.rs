use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use super::engine::RenderParams;
use super::lexicon::{hardcoded_lexicon, load_lexicon, Lexicon};
use super::lyrics::compose_lyrics;
use super::planner::{plan_shape, CompositionPlan, SongShape};
use super::synth::render_plan;
use crate::assets::AudioAsset;
use crate::error::{ConfigError, SynthesisError};
use crate::{LyricDocument, RenderedSong, SongLength};

/// File name looked up inside a model directory.
pub const LEXICON_FILE: &str = "lexicon.json";

/// Immutable song-making state: the lexicon plus everything derived from it.
///
/// Cheap to clone; clones share the lexicon.
#[derive(Debug, Clone)]
pub struct SongModel {
    lexicon: Arc<Lexicon>,
}

impl Default for SongModel {
    fn default() -> Self {
        Self {
            lexicon: Arc::new(hardcoded_lexicon()),
        }
    }
}

impl SongModel {
    /// Wrap a hand-built lexicon, rejecting it if it breaks the rules
    /// [`Lexicon::validate`] checks.
    pub fn new(lexicon: Lexicon) -> Result<Self, ConfigError> {
        lexicon.validate()?;
        Ok(Self {
            lexicon: Arc::new(lexicon),
        })
    }

    /// Load the model from a directory.
    ///
    /// Uses `lexicon.json` from the directory when present and falls back to
    /// the built-in bank otherwise.
    pub fn load(model_dir: &Path) -> Result<Self, ConfigError> {
        let lexicon_path = model_dir.join(LEXICON_FILE);
        let lexicon = if lexicon_path.exists() {
            log::info!("Loading lexicon from {}", lexicon_path.display());
            load_lexicon(&lexicon_path)?
        } else {
            log::warn!(
                "{} not found in {}, using built-in lexicon",
                LEXICON_FILE,
                model_dir.display()
            );
            hardcoded_lexicon()
        };
        Ok(Self {
            lexicon: Arc::new(lexicon),
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn compose_lyrics(&self, length: SongLength, rng: &mut impl Rng) -> LyricDocument {
        compose_lyrics(&self.lexicon, length, rng)
    }

    /// Plan the reduced view used by the audio stage: verses only, with a
    /// generic refrain and outro.
    pub fn plan_verses(
        &self,
        verses: &[Vec<String>],
        params: &RenderParams,
    ) -> Result<CompositionPlan, SynthesisError> {
        params.validate()?;
        let shape = SongShape::from_verses(verses).ok_or(SynthesisError::EmptyComposition)?;
        Ok(plan_shape(&shape, params.tempo_bpm, params.max_duration_secs))
    }

    /// Render verse lines into normalised samples.
    pub fn render_verses(
        &self,
        verses: &[Vec<String>],
        params: &RenderParams,
    ) -> Result<RenderedSong, SynthesisError> {
        let plan = self.plan_verses(verses, params)?;
        self.render_plan(&plan, params)
    }

    /// Render a full document, using its own refrain length.
    pub fn render_document(
        &self,
        doc: &LyricDocument,
        params: &RenderParams,
    ) -> Result<RenderedSong, SynthesisError> {
        params.validate()?;
        let plan = plan_shape(
            &SongShape::from_document(doc),
            params.tempo_bpm,
            params.max_duration_secs,
        );
        self.render_plan(&plan, params)
    }

    /// Render and encode verse lines into a finished WAV asset.
    pub fn render_asset(
        &self,
        verses: &[Vec<String>],
        params: &RenderParams,
    ) -> Result<AudioAsset, SynthesisError> {
        self.render_verses(verses, params)?.encode()
    }

    fn render_plan(
        &self,
        plan: &CompositionPlan,
        params: &RenderParams,
    ) -> Result<RenderedSong, SynthesisError> {
        let start = Instant::now();
        let samples = render_plan(plan, params.sample_rate)?;
        log::info!(
            "Rendered {} notes in {} sections: {:.2}s of audio at {:.0} BPM in {:.2?}",
            plan.note_count(),
            plan.sections.len(),
            plan.duration_secs(),
            plan.tempo_bpm,
            start.elapsed()
        );
        Ok(RenderedSong {
            samples,
            sample_rate: params.sample_rate,
        })
    }
}
