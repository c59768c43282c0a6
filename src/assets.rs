//! Encoded audio assets and the handles that reference them.
//!
//! The store plays the role of a blob-URL registry: registering an asset
//! yields an opaque [`AssetHandle`], the handle can be fetched or saved while
//! it is live, and it must be released once the owner is done with it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::engines::serenade::wav::{BITS_PER_SAMPLE, CHANNELS, MIME_TYPE};
use crate::error::SerenadeError;

/// Download name used when a song has no usable title.
pub const FALLBACK_FILENAME: &str = "romantic-malayalam-song";

/// Opaque reference to a registered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(Uuid);

impl AssetHandle {
    /// The fetchable URL form, e.g. `blob:serenade/6f1c…`.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:serenade/{}", self.0)
    }
}

/// A complete, self-contained WAV file in memory.
#[derive(Debug)]
pub struct AudioAsset {
    bytes: Vec<u8>,
    sample_rate: u32,
    sample_count: usize,
}

impl AudioAsset {
    pub fn new(bytes: Vec<u8>, sample_rate: u32, sample_count: usize) -> Self {
        Self {
            bytes,
            sample_rate,
            sample_count,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn channels(&self) -> u16 {
        CHANNELS
    }

    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    pub fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }
}

/// Registry of live assets. Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: Arc<Mutex<HashMap<AssetHandle, Arc<AudioAsset>>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AssetHandle, Arc<AudioAsset>>> {
        self.assets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an asset and issue a fresh handle for it.
    pub fn register(&self, asset: AudioAsset) -> AssetHandle {
        let handle = AssetHandle(Uuid::new_v4());
        log::debug!(
            "Registered {handle} ({} bytes, {:.2}s)",
            asset.bytes.len(),
            asset.duration_secs()
        );
        self.lock().insert(handle, Arc::new(asset));
        handle
    }

    /// The asset behind `handle`, if it has not been released.
    pub fn fetch(&self, handle: &AssetHandle) -> Option<Arc<AudioAsset>> {
        self.lock().get(handle).cloned()
    }

    /// Release `handle`. Returns `false` if it was already released or never
    /// issued by this store.
    pub fn release(&self, handle: &AssetHandle) -> bool {
        let released = self.lock().remove(handle).is_some();
        if released {
            log::debug!("Released {handle}");
        } else {
            log::warn!("Release of unknown handle {handle}");
        }
        released
    }

    /// Number of handles currently live.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Write the asset to `dir` under a file name derived from `title`.
    pub fn save(
        &self,
        handle: &AssetHandle,
        dir: &Path,
        title: Option<&str>,
    ) -> Result<PathBuf, SerenadeError> {
        let asset = self
            .fetch(handle)
            .ok_or(SerenadeError::UnknownHandle(*handle))?;
        let path = dir.join(download_filename(title));
        std::fs::write(&path, asset.bytes())?;
        log::info!("Saved {handle} to {}", path.display());
        Ok(path)
    }
}

/// `<title>.wav`, with path separators and reserved characters replaced.
pub fn download_filename(title: Option<&str>) -> String {
    let cleaned: String = title
        .unwrap_or_default()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem = cleaned.trim_matches(|c: char| c == '.' || c == '-' || c.is_whitespace());
    if stem.is_empty() {
        format!("{FALLBACK_FILENAME}.wav")
    } else {
        format!("{stem}.wav")
    }
}
