//! Caller-facing pipeline: the two entry points and a session that owns at
//! most one live audio handle.
//!
//! Rendering is CPU-bound, so the async entry points move it onto tokio's
//! blocking pool. A handle is only registered after the blocking task has
//! produced a complete WAV, so a failed or abandoned render leaves nothing
//! behind in the store.

use std::path::{Path, PathBuf};

use crate::assets::{AssetHandle, AssetStore};
use crate::engines::serenade::{RenderParams, SerenadeEngine, SongModel};
use crate::error::{SerenadeError, SynthesisError};
use crate::{LyricDocument, SongEngine, SongLength};

/// Result of a successful composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Handle to the registered WAV asset.
    pub audio_url: AssetHandle,
    pub duration_secs: f64,
    pub sample_rate: u32,
}

/// Compose lyrics for `length` with the built-in lexicon.
pub fn generate_lyrics(length: SongLength) -> LyricDocument {
    SongModel::default().compose_lyrics(length, &mut rand::rng())
}

/// Render `verses` with default parameters and register the result in
/// `store`.
///
/// Fails with [`SynthesisError::EmptyComposition`] when `verses` holds no
/// non-blank line.
pub async fn compose_song(
    store: &AssetStore,
    verses: Vec<Vec<String>>,
) -> Result<Composition, SerenadeError> {
    compose_song_with(store, SongModel::default(), verses, RenderParams::default()).await
}

/// [`compose_song`] with an explicit model and render parameters.
pub async fn compose_song_with(
    store: &AssetStore,
    model: SongModel,
    verses: Vec<Vec<String>>,
    params: RenderParams,
) -> Result<Composition, SerenadeError> {
    let sample_rate = params.sample_rate;
    let asset = tokio::task::spawn_blocking(move || model.render_asset(&verses, &params))
        .await
        .map_err(|e| SynthesisError::RenderTask(e.to_string()))??;

    let duration_secs = asset.duration_secs();
    let audio_url = store.register(asset);
    Ok(Composition {
        audio_url,
        duration_secs,
        sample_rate,
    })
}

/// One caller's song-making session.
///
/// Mirrors a "create my song" button: each [`Studio::create_song`] writes new
/// lyrics, releases the previous audio handle, then composes the new one.
/// The session holds at most one live handle at any time and releases it
/// when dropped.
pub struct Studio {
    engine: SerenadeEngine,
    store: AssetStore,
    params: RenderParams,
    lyrics: Option<LyricDocument>,
    current: Option<Composition>,
}

impl Studio {
    pub fn new(store: AssetStore) -> Self {
        Self::with_engine(SerenadeEngine::new(), store)
    }

    pub fn with_engine(engine: SerenadeEngine, store: AssetStore) -> Self {
        Self {
            engine,
            store,
            params: RenderParams::default(),
            lyrics: None,
            current: None,
        }
    }

    pub fn with_params(mut self, params: RenderParams) -> Self {
        self.params = params;
        self
    }

    /// Lyrics from the most recent generation, kept even if its audio failed.
    pub fn lyrics(&self) -> Option<&LyricDocument> {
        self.lyrics.as_ref()
    }

    /// The composition currently on offer, if any.
    pub fn current(&self) -> Option<&Composition> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Generate lyrics and audio for `length`.
    ///
    /// The render is capped at the shorter of the session's
    /// `max_duration_secs` and the length's own limit, so a slow tempo
    /// speeds the song up rather than overrunning. On failure the new lyrics are kept, no handle is live, and the error
    /// is returned for the caller to report. No retry is attempted.
    pub async fn create_song(&mut self, length: SongLength) -> Result<&Composition, SerenadeError> {
        let lyrics = self.engine.generate_lyrics(length);
        let verses = lyrics.verses.clone();
        self.lyrics = Some(lyrics);
        self.release();

        let mut params = self.params.clone();
        params.max_duration_secs = params
            .max_duration_secs
            .min(length.policy().max_duration_secs);

        let composition = compose_song_with(&self.store, self.engine.model().clone(), verses, params)
        .await
        .inspect_err(|e| log::error!("Song creation failed: {e}"))?;

        let composition: &Composition = self.current.insert(composition);
        Ok(composition)
    }

    /// Save the current song to `dir` under its title-derived file name.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, SerenadeError> {
        let current = self
            .current
            .as_ref()
            .ok_or(SerenadeError::NoComposition)?;
        let title = self.lyrics.as_ref().map(|l| l.title.as_str());
        self.store.save(&current.audio_url, dir, title)
    }

    /// Release the current handle, if any.
    pub fn release(&mut self) {
        if let Some(previous) = self.current.take() {
            self.store.release(&previous.audio_url);
        }
    }
}

impl Drop for Studio {
    fn drop(&mut self) {
        self.release();
    }
}
